use crate::data::AvailabilityError;
use chrono::{DateTime, Duration, LocalResult, NaiveDate, NaiveTime, TimeZone, Timelike};
use chrono_tz::Tz;
use log::trace;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Number of histogram slots in a reference day
pub const HOURS_PER_DAY: u8 = 24;

/// The calendar date wall-clock times are pinned to before zone conversion.
/// A mid-January date, away from DST transition days.
pub fn default_anchor_date() -> NaiveDate {
    NaiveDate::from_ymd_opt(2024, 1, 15).unwrap_or(NaiveDate::MIN)
}

/// Looks up an IANA zone identifier
///
/// # Examples
/// ```
/// use heatmap_libs::time::parse_timezone;
///
/// assert!(parse_timezone("America/New_York").is_ok());
/// assert!(parse_timezone("Mars/Olympus_Mons").is_err());
/// ```
pub fn parse_timezone(zone: &str) -> Result<Tz, AvailabilityError> {
    zone.trim()
        .parse::<Tz>()
        .map_err(|_| AvailabilityError::InvalidTimezone {
            zone: zone.to_string(),
        })
}

/// A wall-clock time of day, `00:00:00` through `23:59:59`.
/// Serialized as a 24-hour `"HH:MM:SS"` string.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
#[serde(try_from = "String", into = "String")]
pub struct TimeOfDay(NaiveTime);

impl TimeOfDay {
    /// Construct a TimeOfDay from its parts
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::TimeOfDay;
    ///
    /// let nine = TimeOfDay::from_hms(9, 0, 0).unwrap();
    /// assert_eq!(nine.hour(), 9);
    ///
    /// assert!(TimeOfDay::from_hms(24, 0, 0).is_err());
    /// ```
    pub fn from_hms(hour: u32, minute: u32, second: u32) -> Result<TimeOfDay, AvailabilityError> {
        NaiveTime::from_hms_opt(hour, minute, second)
            .map(TimeOfDay)
            .ok_or_else(|| AvailabilityError::InvalidInterval {
                value: format!("{:02}:{:02}:{:02}", hour, minute, second),
            })
    }

    /// Parses the 24-hour `"HH:MM:SS"` form used by the profile store.
    /// `"HH:MM"` is accepted as well.
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::TimeOfDay;
    ///
    /// assert_eq!(TimeOfDay::parse("17:30:00").unwrap().to_string(), "17:30:00");
    /// assert_eq!(TimeOfDay::parse("08:15").unwrap().to_string(), "08:15:00");
    /// assert!(TimeOfDay::parse("25:00:00").is_err());
    /// assert!(TimeOfDay::parse("5pm").is_err());
    /// ```
    pub fn parse(value: &str) -> Result<TimeOfDay, AvailabilityError> {
        let trimmed = value.trim();
        NaiveTime::parse_from_str(trimmed, "%H:%M:%S")
            .or_else(|_| NaiveTime::parse_from_str(trimmed, "%H:%M"))
            .ok()
            .and_then(Self::reject_leap_second)
            .ok_or_else(|| AvailabilityError::InvalidInterval {
                value: value.to_string(),
            })
    }

    /// Parses a 12-hour clock reading such as `"9:00 AM"`
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::TimeOfDay;
    ///
    /// assert_eq!(TimeOfDay::parse_meridiem("9:00 AM").unwrap().hour(), 9);
    /// assert_eq!(TimeOfDay::parse_meridiem("5:30 PM").unwrap().to_string(), "17:30:00");
    /// assert_eq!(TimeOfDay::parse_meridiem("12:00 AM").unwrap().hour(), 0);
    /// ```
    pub fn parse_meridiem(value: &str) -> Result<TimeOfDay, AvailabilityError> {
        NaiveTime::parse_from_str(value.trim(), "%I:%M %p")
            .ok()
            .and_then(Self::reject_leap_second)
            .ok_or_else(|| AvailabilityError::InvalidInterval {
                value: value.to_string(),
            })
    }

    fn reject_leap_second(time: NaiveTime) -> Option<TimeOfDay> {
        if time.nanosecond() >= 1_000_000_000 {
            None
        } else {
            Some(TimeOfDay(time))
        }
    }

    pub fn hour(self) -> u8 {
        self.0.hour() as u8
    }

    pub fn as_naive(self) -> NaiveTime {
        self.0
    }

    /// Drops minutes and seconds
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::TimeOfDay;
    ///
    /// let time = TimeOfDay::parse("19:45:10").unwrap();
    /// assert_eq!(time.truncate_to_hour().to_string(), "19:00:00");
    /// ```
    pub fn truncate_to_hour(self) -> TimeOfDay {
        TimeOfDay::from_hms(self.0.hour(), 0, 0).unwrap_or(self)
    }

    fn is_on_the_hour(self) -> bool {
        self.0.minute() == 0 && self.0.second() == 0 && self.0.nanosecond() == 0
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0.format("%H:%M:%S"))
    }
}

impl FromStr for TimeOfDay {
    type Err = AvailabilityError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TimeOfDay::parse(s)
    }
}

impl TryFrom<String> for TimeOfDay {
    type Error = AvailabilityError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        TimeOfDay::parse(&value)
    }
}

impl From<TimeOfDay> for String {
    fn from(time: TimeOfDay) -> Self {
        time.to_string()
    }
}

/// Half-open `[start, end)` hour-of-day range.
/// `end < start` wraps past midnight; `start == end` covers nothing.
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Hash)]
pub struct HourSpan {
    pub start: u8,
    pub end: u8,
}

impl HourSpan {
    /// Both bounds are reduced modulo 24
    pub fn new(start: u8, end: u8) -> HourSpan {
        HourSpan {
            start: start % HOURS_PER_DAY,
            end: end % HOURS_PER_DAY,
        }
    }

    pub fn wraps_midnight(self) -> bool {
        self.end < self.start
    }

    pub fn is_empty(self) -> bool {
        self.start == self.end
    }

    /// Hour membership, wraparound aware
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::HourSpan;
    ///
    /// let office = HourSpan::new(9, 17);
    /// assert!(office.covers(9));
    /// assert!(office.covers(16));
    /// assert!(!office.covers(17));
    ///
    /// let night = HourSpan::new(22, 6);
    /// assert!(night.covers(23));
    /// assert!(night.covers(0));
    /// assert!(!night.covers(6));
    /// assert!(!night.covers(12));
    /// ```
    pub fn covers(self, hour: u8) -> bool {
        if self.start <= self.end {
            self.start <= hour && hour < self.end
        } else {
            hour >= self.start || hour < self.end
        }
    }

    /// Covered hours in ascending order, `0..24`
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::HourSpan;
    ///
    /// assert_eq!(
    ///     HourSpan::new(22, 6).hours().collect::<Vec<_>>(),
    ///     vec![0, 1, 2, 3, 4, 5, 22, 23]
    /// );
    /// ```
    pub fn hours(self) -> impl Iterator<Item = u8> {
        (0..HOURS_PER_DAY).filter(move |&hour| self.covers(hour))
    }

    /// Covered hours in the order a clock reads them, starting at `start`
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::HourSpan;
    ///
    /// assert_eq!(
    ///     HourSpan::new(22, 6).clock_hours().collect::<Vec<_>>(),
    ///     vec![22, 23, 0, 1, 2, 3, 4, 5]
    /// );
    /// assert_eq!(HourSpan::new(7, 7).clock_hours().count(), 0);
    /// ```
    pub fn clock_hours(self) -> impl Iterator<Item = u8> {
        (0..self.len()).map(move |offset| (self.start + offset) % HOURS_PER_DAY)
    }

    pub fn len(self) -> u8 {
        if self.start <= self.end {
            self.end - self.start
        } else {
            HOURS_PER_DAY - self.start + self.end
        }
    }
}

impl fmt::Display for HourSpan {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "[{}:00, {}:00)", self.start, self.end)
    }
}

/// A recurring daily `[start, end)` range of wall-clock time in a named zone.
///
/// The zone is kept as text; an identifier that is not in the IANA database
/// only surfaces once the interval is converted.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq, Hash)]
pub struct WorkInterval {
    #[serde(rename = "startTimeOfDay")]
    pub start: TimeOfDay,
    #[serde(rename = "endTimeOfDay")]
    pub end: TimeOfDay,
    pub timezone: String,
}

impl WorkInterval {
    pub fn new(start: TimeOfDay, end: TimeOfDay, timezone: &str) -> WorkInterval {
        WorkInterval {
            start,
            end,
            timezone: timezone.to_string(),
        }
    }

    /// Builds an interval from the store's `"HH:MM:SS"` strings
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::WorkInterval;
    ///
    /// let interval = WorkInterval::parse("09:00:00", "17:00:00", "Europe/Berlin").unwrap();
    /// assert_eq!(interval.start.hour(), 9);
    /// assert!(!interval.wraps_midnight());
    ///
    /// assert!(WorkInterval::parse("9am", "17:00:00", "Europe/Berlin").is_err());
    /// ```
    pub fn parse(start: &str, end: &str, timezone: &str) -> Result<WorkInterval, AvailabilityError> {
        Ok(WorkInterval::new(
            TimeOfDay::parse(start)?,
            TimeOfDay::parse(end)?,
            timezone,
        ))
    }

    pub fn wraps_midnight(&self) -> bool {
        self.end < self.start
    }

    /// The hours this interval touches in its own zone.
    /// Both bounds round down to the containing hour.
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::{HourSpan, WorkInterval};
    ///
    /// let interval = WorkInterval::parse("08:30:00", "16:45:00", "UTC").unwrap();
    /// assert_eq!(interval.hour_span(), HourSpan::new(8, 16));
    /// ```
    pub fn hour_span(&self) -> HourSpan {
        HourSpan::new(self.start.hour(), self.end.hour())
    }

    pub fn covers_hour(&self, hour: u8) -> bool {
        self.hour_span().covers(hour)
    }

    /// Converts this interval into `target_zone` using the default anchor date.
    /// See [`WorkInterval::convert_to_zone_on`].
    pub fn convert_to_zone(&self, target_zone: &str) -> Result<WorkInterval, AvailabilityError> {
        self.convert_to_zone_on(target_zone, default_anchor_date())
    }

    /// Pins `start` and `end` to `anchor` in this interval's zone, moves both
    /// instants into `target_zone` and keeps only the resulting clock times.
    ///
    /// The converted bounds are quantized: each is truncated to the whole hour
    /// containing it, so a `+05:30` zone loses its half hour. A local time in a
    /// DST gap is read one hour later; an ambiguous local time takes the
    /// earlier instant.
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::time::{HourSpan, WorkInterval};
    /// use chrono::NaiveDate;
    ///
    /// let tokyo = WorkInterval::parse("09:00:00", "18:00:00", "Asia/Tokyo").unwrap();
    ///
    /// let winter = NaiveDate::from_ymd_opt(2024, 1, 15).unwrap();
    /// let converted = tokyo.convert_to_zone_on("America/New_York", winter).unwrap();
    /// assert_eq!(converted.hour_span(), HourSpan::new(19, 4));
    /// assert_eq!(converted.timezone, "America/New_York");
    ///
    /// let summer = NaiveDate::from_ymd_opt(2024, 7, 15).unwrap();
    /// let converted = tokyo.convert_to_zone_on("America/New_York", summer).unwrap();
    /// assert_eq!(converted.hour_span(), HourSpan::new(20, 5));
    ///
    /// let new_york = WorkInterval::parse("09:00:00", "17:00:00", "America/New_York").unwrap();
    /// let converted = new_york.convert_to_zone_on("Asia/Kolkata", winter).unwrap();
    /// assert_eq!(converted.start.to_string(), "19:00:00");
    /// ```
    pub fn convert_to_zone_on(
        &self,
        target_zone: &str,
        anchor: NaiveDate,
    ) -> Result<WorkInterval, AvailabilityError> {
        let source = parse_timezone(&self.timezone)?;
        let target = parse_timezone(target_zone)?;

        let start = shift_time_of_day(self.start, source, target, anchor).truncate_to_hour();
        let end = shift_time_of_day(self.end, source, target, anchor).truncate_to_hour();

        trace!(
            "converted {}-{} {} to {}-{} {} on {}",
            self.start,
            self.end,
            source.name(),
            start,
            end,
            target.name(),
            anchor
        );

        Ok(WorkInterval {
            start,
            end,
            timezone: target.name().to_string(),
        })
    }
}

/// Converts `interval` into `target_zone`, quantized to whole hours.
/// The default anchor date fixes which offsets apply.
///
/// # Examples
/// ```
/// use heatmap_libs::time::{convert_interval_to_zone, HourSpan, WorkInterval};
///
/// let new_york = WorkInterval::parse("09:00:00", "17:00:00", "America/New_York").unwrap();
/// let tokyo = convert_interval_to_zone(&new_york, "Asia/Tokyo").unwrap();
/// assert_eq!(tokyo.hour_span(), HourSpan::new(23, 7));
///
/// assert!(convert_interval_to_zone(&new_york, "Asia/Atlantis").is_err());
/// ```
pub fn convert_interval_to_zone(
    interval: &WorkInterval,
    target_zone: &str,
) -> Result<WorkInterval, AvailabilityError> {
    interval.convert_to_zone(target_zone)
}

fn shift_time_of_day(time: TimeOfDay, from: Tz, to: Tz, anchor: NaiveDate) -> TimeOfDay {
    let local = anchor.and_time(time.as_naive());

    let instant: DateTime<Tz> = match from.from_local_datetime(&local) {
        LocalResult::Single(instant) => instant,
        LocalResult::Ambiguous(earliest, _) => earliest,
        LocalResult::None => from
            .from_local_datetime(&(local + Duration::hours(1)))
            .earliest()
            .unwrap_or_else(|| from.from_utc_datetime(&local)),
    };

    TimeOfDay(instant.with_timezone(&to).time())
}

/// Clock time of `instant` in `zone`, rounded up to the next whole hour
/// unless it already sits on one.
pub(crate) fn ceil_hour_in_zone<T: TimeZone>(instant: &DateTime<T>, zone: Tz) -> u8 {
    let local = TimeOfDay(instant.with_timezone(&zone).time());
    if local.is_on_the_hour() {
        local.hour()
    } else {
        (local.hour() + 1) % HOURS_PER_DAY
    }
}

pub(crate) fn floor_hour_in_zone<T: TimeZone>(instant: &DateTime<T>, zone: Tz) -> u8 {
    instant.with_timezone(&zone).time().hour() as u8
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for TimeOfDay {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let seconds = u.int_in_range(0..=86_399_u32)?;
        NaiveTime::from_num_seconds_from_midnight_opt(seconds, 0)
            .map(TimeOfDay)
            .ok_or(arbitrary::Error::IncorrectFormat)
    }
}

#[cfg(feature = "arbitrary")]
impl<'a> arbitrary::Arbitrary<'a> for WorkInterval {
    fn arbitrary(u: &mut arbitrary::Unstructured<'a>) -> arbitrary::Result<Self> {
        let start = u.arbitrary::<TimeOfDay>()?;
        let end = u.arbitrary::<TimeOfDay>()?;
        let zone = u.choose(&chrono_tz::TZ_VARIANTS[..])?;
        Ok(WorkInterval::new(start, end, zone.name()))
    }
}
