use crate::participant::{Participant, ReferenceFrame};
use crate::time::{ceil_hour_in_zone, floor_hour_in_zone, parse_timezone, TimeOfDay, WorkInterval};
use chrono::{DateTime, NaiveDate, Utc};
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Serialize, Deserialize, Error, Debug, Clone, Eq, PartialEq)]
pub enum AvailabilityError {
    #[error("Unrecognized IANA timezone: {zone}")]
    InvalidTimezone { zone: String },
    #[error("Invalid time of day. Expected HH:MM:SS, got {value}")]
    InvalidInterval { value: String },
    #[error("No timezone set for {id}")]
    MissingTimezone { id: String },
    #[error("Meeting host {id} has no profile")]
    UnknownHost { id: String },
    #[error("Participant {id} has no profile")]
    UnknownParticipant { id: String },
}

/// A row of the profile store, as fetched.
///
/// Work hours arrive in one of two shapes depending on the store revision:
/// `work_range`, a pair of `"HH:MM:SS"` strings, or the older free text
/// `work_hours` such as `"9:00 AM - 5:00 PM"`.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct ProfileRecord {
    pub id: String,
    pub first_name: Option<String>,
    pub last_name: Option<String>,
    pub email: Option<String>,
    pub timezone: Option<String>,
    pub work_range: Option<Vec<String>>,
    pub work_hours: Option<String>,
}

impl ProfileRecord {
    pub fn new(id: &str, timezone: Option<&str>, work_range: Option<(&str, &str)>) -> Self {
        ProfileRecord {
            id: id.to_string(),
            timezone: timezone.map(str::to_string),
            work_range: work_range.map(|(start, end)| vec![start.to_string(), end.to_string()]),
            ..Default::default()
        }
    }

    /// The profile's zone identifier. Blank counts as unset.
    pub fn timezone(&self) -> Result<&str, AvailabilityError> {
        match self.timezone.as_deref().map(str::trim) {
            Some(zone) if !zone.is_empty() => Ok(zone),
            _ => Err(AvailabilityError::MissingTimezone {
                id: self.id.clone(),
            }),
        }
    }

    /// Reads the work hours into the canonical interval.
    ///
    /// `Ok(None)` means no work hours are on file. A `work_range` with fewer
    /// than two entries counts as absent.
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::data::ProfileRecord;
    ///
    /// let profile = ProfileRecord::new("a", Some("Europe/Paris"), Some(("08:00:00", "16:00:00")));
    /// let interval = profile.work_interval().unwrap().unwrap();
    /// assert_eq!(interval.start.hour(), 8);
    /// assert_eq!(interval.timezone, "Europe/Paris");
    ///
    /// let mut legacy = ProfileRecord::new("b", Some("Europe/Paris"), None);
    /// legacy.work_hours = Some("9:00 AM - 5:30 PM".to_string());
    /// let interval = legacy.work_interval().unwrap().unwrap();
    /// assert_eq!(interval.end.to_string(), "17:30:00");
    ///
    /// let empty = ProfileRecord::new("c", Some("Europe/Paris"), None);
    /// assert_eq!(empty.work_interval(), Ok(None));
    /// ```
    pub fn work_interval(&self) -> Result<Option<WorkInterval>, AvailabilityError> {
        let bounds = match (self.work_range.as_deref(), self.work_hours.as_deref()) {
            (Some([start, end, ..]), _) => (TimeOfDay::parse(start)?, TimeOfDay::parse(end)?),
            (_, Some(text)) if !text.trim().is_empty() => parse_work_hours(text)?,
            _ => return Ok(None),
        };

        let timezone = self.timezone()?;
        Ok(Some(WorkInterval::new(bounds.0, bounds.1, timezone)))
    }

    pub fn to_participant(&self) -> Result<Participant, AvailabilityError> {
        Ok(Participant::new(&self.id, self.work_interval()?))
    }

    /// The frame this profile's local day defines. A host needs a timezone;
    /// work hours stay optional.
    pub fn to_reference_frame(&self) -> Result<ReferenceFrame, AvailabilityError> {
        let timezone = self.timezone()?;
        Ok(ReferenceFrame::new(timezone, self.work_interval()?))
    }
}

/// Splits the legacy `"9:00 AM - 5:00 PM"` text. Either side may also be
/// 24-hour.
///
/// # Examples
/// ```
/// use heatmap_libs::data::parse_work_hours;
///
/// let (start, end) = parse_work_hours("9:00 AM - 5:00 PM").unwrap();
/// assert_eq!((start.hour(), end.hour()), (9, 17));
///
/// let (start, end) = parse_work_hours("22:00 - 06:00").unwrap();
/// assert_eq!((start.hour(), end.hour()), (22, 6));
///
/// assert!(parse_work_hours("all day").is_err());
/// ```
pub fn parse_work_hours(text: &str) -> Result<(TimeOfDay, TimeOfDay), AvailabilityError> {
    let invalid = || AvailabilityError::InvalidInterval {
        value: text.to_string(),
    };

    let (start, end) = text.split_once(" - ").ok_or_else(invalid)?;
    let parse_side =
        |side: &str| TimeOfDay::parse_meridiem(side).or_else(|_| TimeOfDay::parse(side));

    Ok((
        parse_side(start).map_err(|_| invalid())?,
        parse_side(end).map_err(|_| invalid())?,
    ))
}

/// Renders an interval back into the store's two-element array shape
///
/// # Examples
/// ```
/// use heatmap_libs::{data::format_work_range, time::WorkInterval};
///
/// let interval = WorkInterval::parse("9:00", "17:00", "UTC").unwrap();
/// assert_eq!(format_work_range(&interval), ["09:00:00", "17:00:00"]);
/// ```
pub fn format_work_range(interval: &WorkInterval) -> [String; 2] {
    [interval.start.to_string(), interval.end.to_string()]
}

/// A row of the meeting store, as fetched.
#[derive(Clone, Debug, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(default)]
pub struct MeetingRecord {
    pub id: String,
    pub host: String,
    pub participants: Vec<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub title: Option<String>,
}

impl MeetingRecord {
    pub fn new(id: &str, host: &str, participants: &[&str]) -> Self {
        MeetingRecord {
            id: id.to_string(),
            host: host.to_string(),
            participants: participants.iter().map(|p| p.to_string()).collect(),
            ..Default::default()
        }
    }

    pub fn scheduled(mut self, start_time: DateTime<Utc>, end_time: DateTime<Utc>) -> Self {
        self.start_time = Some(start_time);
        self.end_time = Some(end_time);
        self
    }

    /// The meeting's calendar date in `zone`, when it has been scheduled
    pub fn anchor_date(&self, zone: Tz) -> Option<NaiveDate> {
        self.start_time
            .map(|start| start.with_timezone(&zone).date_naive())
    }

    /// The hours of `zone`'s day the scheduled meeting touches.
    ///
    /// The start rounds down and the end rounds up to whole hours. A meeting
    /// that is unscheduled, reversed, or touches every hour imposes no window.
    ///
    /// # Examples
    /// ```
    /// use chrono::{TimeZone, Utc};
    /// use heatmap_libs::{data::MeetingRecord, time::HourSpan};
    ///
    /// let meeting = MeetingRecord::new("m", "host", &["a"]).scheduled(
    ///     Utc.with_ymd_and_hms(2024, 3, 1, 14, 0, 0).unwrap(),
    ///     Utc.with_ymd_and_hms(2024, 3, 1, 14, 30, 0).unwrap(),
    /// );
    ///
    /// let window = meeting.candidate_window("America/New_York").unwrap().unwrap();
    /// assert_eq!(window.hour_span(), HourSpan::new(9, 10));
    /// ```
    pub fn candidate_window(&self, zone: &str) -> Result<Option<WorkInterval>, AvailabilityError> {
        let tz = parse_timezone(zone)?;

        let (start, end) = match (self.start_time, self.end_time) {
            (Some(start), Some(end)) if start < end => (start, end),
            _ => return Ok(None),
        };

        if end - start >= chrono::Duration::hours(24) {
            return Ok(None);
        }

        let start_hour = floor_hour_in_zone(&start, tz);
        let end_hour = ceil_hour_in_zone(&end, tz);
        if start_hour == end_hour {
            return Ok(None);
        }

        Ok(Some(WorkInterval::new(
            TimeOfDay::from_hms(start_hour.into(), 0, 0)?,
            TimeOfDay::from_hms(end_hour.into(), 0, 0)?,
            tz.name(),
        )))
    }
}
