use crate::data::{AvailabilityError, MeetingRecord, ProfileRecord};
use crate::participant::{Participant, ReferenceFrame};
use crate::time::{default_anchor_date, parse_timezone, HourSpan, WorkInterval, HOURS_PER_DAY};
use chrono::NaiveDate;
use itertools::Itertools;
use log::{debug, info, warn};
use num::traits::SaturatingAdd;
use num::{Integer, One};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;

#[cfg(feature = "rayon")]
use rayon::prelude::*;

/// What to do when one participant's interval cannot be converted
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq, Default)]
#[serde(rename_all = "snake_case")]
pub enum Strictness {
    /// Log it, leave the participant out, keep going
    #[default]
    Lenient,
    /// Fail the whole aggregation
    Strict,
}

/// Which calendar date wall-clock intervals are pinned to for conversion
#[derive(Serialize, Deserialize, Debug, Copy, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum AnchorDate {
    Fixed(NaiveDate),
    /// The meeting's own start date in the host zone, when it has one.
    /// Falls back to [`default_anchor_date`].
    MeetingDate,
}

impl Default for AnchorDate {
    fn default() -> Self {
        AnchorDate::Fixed(default_anchor_date())
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(default)]
pub struct AggregatorConfig {
    pub strictness: Strictness,
    pub anchor: AnchorDate,
    /// Meeting heatmaps pick best times inside the host's work window
    /// unless the meeting itself is scheduled
    pub restrict_to_host_window: bool,
    /// Count the host as one of the participants
    pub include_host: bool,
}

impl Default for AggregatorConfig {
    fn default() -> Self {
        AggregatorConfig {
            strictness: Strictness::Lenient,
            anchor: AnchorDate::default(),
            restrict_to_host_window: true,
            include_host: false,
        }
    }
}

/// Count of participants available at each hour of the reference day.
/// A slot saturates at `N`'s maximum.
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HourHistogram<N = u32>(pub [N; 24])
where
    N: Integer + Copy;

impl<N> HourHistogram<N>
where
    N: Integer + One + SaturatingAdd + Copy,
{
    pub fn zeroed() -> HourHistogram<N> {
        HourHistogram([N::zero(); 24])
    }

    /// Count at `hour`. Hours past 23 read as zero.
    pub fn get(&self, hour: u8) -> N {
        self.0.get(usize::from(hour)).copied().unwrap_or_else(N::zero)
    }

    pub fn counts(&self) -> &[N] {
        &self.0
    }

    pub fn max(&self) -> N {
        self.0.iter().copied().max().unwrap_or_else(N::zero)
    }

    /// Counts stop at `N`'s maximum rather than wrapping
    fn add_one(&mut self, hour: u8) {
        if let Some(slot) = self.0.get_mut(usize::from(hour)) {
            *slot = slot.saturating_add(&N::one());
        }
    }

    pub fn best_times(&self, restrict_to_window: Option<&WorkInterval>) -> BestTimes<N> {
        best_times(self, restrict_to_window)
    }
}

impl<N> Default for HourHistogram<N>
where
    N: Integer + One + SaturatingAdd + Copy,
{
    fn default() -> Self {
        HourHistogram::zeroed()
    }
}

pub trait HourCoverage<N>
where
    N: Integer + One + SaturatingAdd + Copy,
{
    fn hour_coverage(self) -> HourHistogram<N>;
}

impl<'a, T, N> HourCoverage<N> for T
where
    T: Iterator<Item = &'a HourSpan>,
    N: Integer + One + SaturatingAdd + Copy,
{
    /// Stacks `HourSpan`s into a histogram, one count per covered hour
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::heatmap::{HourCoverage, HourHistogram};
    /// use heatmap_libs::time::HourSpan;
    ///
    /// let spans = vec![HourSpan::new(9, 12), HourSpan::new(11, 13), HourSpan::new(23, 1)];
    /// let histogram: HourHistogram<u8> = spans.iter().hour_coverage();
    ///
    /// assert_eq!(histogram.get(10), 1);
    /// assert_eq!(histogram.get(11), 2);
    /// assert_eq!(histogram.get(12), 1);
    /// assert_eq!(histogram.get(13), 0);
    /// assert_eq!(histogram.get(23), 1);
    /// assert_eq!(histogram.get(0), 1);
    /// ```
    fn hour_coverage(self) -> HourHistogram<N> {
        self.fold(HourHistogram::zeroed(), |mut histogram, span| {
            span.hours().for_each(|hour| histogram.add_one(hour));
            histogram
        })
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct BestTimes<N = u32> {
    #[serde(rename = "maxCount")]
    pub max_count: N,
    pub hours: Vec<u8>,
}

/// Hours sharing the highest count.
///
/// With a window, only hours inside it are candidates and `max_count` is the
/// highest count among them. The window's bounds are read as hours of the
/// histogram's own reference day.
///
/// # Examples
/// ```
/// use heatmap_libs::heatmap::{best_times, HourHistogram};
/// use heatmap_libs::time::WorkInterval;
///
/// let mut counts = [0_u32; 24];
/// counts[3] = 5;
/// counts[10] = 2;
/// counts[14] = 2;
/// let histogram = HourHistogram(counts);
///
/// let best = best_times(&histogram, None);
/// assert_eq!((best.max_count, best.hours), (5, vec![3]));
///
/// let office = WorkInterval::parse("09:00:00", "17:00:00", "UTC").unwrap();
/// let best = best_times(&histogram, Some(&office));
/// assert_eq!((best.max_count, best.hours), (2, vec![10, 14]));
///
/// let nothing = WorkInterval::parse("09:00:00", "09:00:00", "UTC").unwrap();
/// let best = best_times(&histogram, Some(&nothing));
/// assert_eq!((best.max_count, best.hours), (0, vec![]));
/// ```
pub fn best_times<N>(histogram: &HourHistogram<N>, restrict_to_window: Option<&WorkInterval>) -> BestTimes<N>
where
    N: Integer + One + SaturatingAdd + Copy,
{
    let window = restrict_to_window.map(WorkInterval::hour_span);
    let candidates = (0..HOURS_PER_DAY)
        .filter(|&hour| window.map_or(true, |span| span.covers(hour)))
        .collect_vec();

    match candidates.iter().map(|&hour| histogram.get(hour)).max() {
        Some(max_count) => BestTimes {
            max_count,
            hours: candidates
                .into_iter()
                .filter(|&hour| histogram.get(hour) == max_count)
                .collect(),
        },
        None => BestTimes {
            max_count: N::zero(),
            hours: vec![],
        },
    }
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    NoWorkHours,
    Failed(AvailabilityError),
}

/// A participant left out of the histogram
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Skipped {
    pub id: String,
    pub reason: SkipReason,
}

/// A histogram together with who did and did not make it in
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct Aggregation<N = u32>
where
    N: Integer + Copy,
{
    pub histogram: HourHistogram<N>,
    /// Participants whose intervals were counted
    pub counted: usize,
    pub skipped: Vec<Skipped>,
}

#[derive(Debug, Clone, Default)]
pub struct Aggregator {
    pub config: AggregatorConfig,
}

impl Aggregator {
    pub fn new(config: AggregatorConfig) -> Aggregator {
        Aggregator { config }
    }

    fn fixed_anchor(&self) -> NaiveDate {
        match self.config.anchor {
            AnchorDate::Fixed(date) => date,
            AnchorDate::MeetingDate => default_anchor_date(),
        }
    }

    fn exclude(
        &self,
        skipped: &mut Vec<Skipped>,
        id: &str,
        error: AvailabilityError,
    ) -> Result<(), AvailabilityError> {
        match self.config.strictness {
            Strictness::Strict => Err(error),
            Strictness::Lenient => {
                warn!(participant = id; "leaving participant out of heatmap: {}", error);
                skipped.push(Skipped {
                    id: id.to_string(),
                    reason: SkipReason::Failed(error),
                });
                Ok(())
            }
        }
    }

    /// Histogram of `participants` over `reference`'s day, using the
    /// configured anchor date.
    ///
    /// # Errors
    /// A reference timezone outside the IANA database fails the whole call.
    /// A participant whose conversion fails is skipped in
    /// `Strictness::Lenient`, and fails the call in `Strictness::Strict`.
    pub fn build_histogram<N>(
        &self,
        reference: &ReferenceFrame,
        participants: &[Participant],
    ) -> Result<HourHistogram<N>, AvailabilityError>
    where
        N: Integer + One + SaturatingAdd + Copy,
    {
        self.aggregate(reference, participants, self.fixed_anchor())
            .map(|aggregation| aggregation.histogram)
    }

    pub fn aggregate<N>(
        &self,
        reference: &ReferenceFrame,
        participants: &[Participant],
        anchor: NaiveDate,
    ) -> Result<Aggregation<N>, AvailabilityError>
    where
        N: Integer + One + SaturatingAdd + Copy,
    {
        let zone = reference.zone()?;

        #[cfg(feature = "rayon")]
        let converted: Vec<_> = participants
            .par_iter()
            .map(|participant| participant.work_interval_in(zone.name(), anchor))
            .collect();

        #[cfg(not(feature = "rayon"))]
        let converted: Vec<_> = participants
            .iter()
            .map(|participant| participant.work_interval_in(zone.name(), anchor))
            .collect();

        let mut spans = Vec::with_capacity(participants.len());
        let mut skipped = Vec::new();

        for (participant, outcome) in participants.iter().zip(converted) {
            match outcome {
                None => {
                    debug!("participant {} has no work hours", participant.id);
                    skipped.push(Skipped {
                        id: participant.id.clone(),
                        reason: SkipReason::NoWorkHours,
                    });
                }
                Some(Ok(interval)) => {
                    debug!(
                        "participant {} available {} in {}",
                        participant.id,
                        interval.hour_span(),
                        zone.name()
                    );
                    spans.push(interval.hour_span());
                }
                Some(Err(error)) => self.exclude(&mut skipped, &participant.id, error)?,
            }
        }

        if spans.is_empty() {
            debug!("no usable participants, histogram is empty");
        }

        Ok(Aggregation {
            histogram: spans.iter().hour_coverage(),
            counted: spans.len(),
            skipped,
        })
    }

    /// Resolves a meeting's host and participants among fetched `profiles`
    /// and aggregates them over the host's day.
    ///
    /// # Errors
    /// The host must have a profile with a valid timezone. A host work range
    /// that does not parse also fails the call, as does any participant
    /// problem under `Strictness::Strict`.
    ///
    /// # Examples
    /// ```
    /// use heatmap_libs::data::{MeetingRecord, ProfileRecord};
    /// use heatmap_libs::heatmap::Aggregator;
    ///
    /// let profiles = vec![
    ///     ProfileRecord::new("host", Some("Europe/London"), Some(("09:00:00", "17:00:00"))),
    ///     ProfileRecord::new("ana", Some("Europe/Lisbon"), Some(("10:00:00", "18:00:00"))),
    ///     ProfileRecord::new("kai", Some("Europe/Berlin"), Some(("09:00:00", "17:00:00"))),
    /// ];
    /// let meeting = MeetingRecord::new("m1", "host", &["ana", "kai"]);
    ///
    /// let heatmap = Aggregator::default().meeting_heatmap(&meeting, &profiles).unwrap();
    ///
    /// assert_eq!(heatmap.best.max_count, 2);
    /// assert_eq!(heatmap.best.hours, vec![10, 11, 12, 13, 14, 15]);
    /// assert_eq!(heatmap.cells().len(), 8);
    /// ```
    pub fn meeting_heatmap(
        &self,
        meeting: &MeetingRecord,
        profiles: &[ProfileRecord],
    ) -> Result<MeetingHeatmap, AvailabilityError> {
        let by_id: HashMap<&str, &ProfileRecord> = profiles
            .iter()
            .map(|profile| (profile.id.as_str(), profile))
            .collect();

        let host = by_id
            .get(meeting.host.as_str())
            .ok_or_else(|| AvailabilityError::UnknownHost {
                id: meeting.host.clone(),
            })?;

        let reference = host.to_reference_frame()?;
        let zone = parse_timezone(&reference.timezone)?;

        let anchor = match self.config.anchor {
            AnchorDate::Fixed(date) => date,
            AnchorDate::MeetingDate => meeting
                .anchor_date(zone)
                .unwrap_or_else(default_anchor_date),
        };

        let host_window = reference.window_on(anchor)?;
        let candidate_window = meeting.candidate_window(zone.name())?;

        let mut skipped = Vec::new();
        let mut participants = Vec::with_capacity(meeting.participants.len() + 1);

        let host_id = self.config.include_host.then(|| meeting.host.as_str());
        for id in meeting
            .participants
            .iter()
            .map(String::as_str)
            .chain(host_id)
            .unique()
        {
            let resolved = by_id
                .get(id)
                .ok_or_else(|| AvailabilityError::UnknownParticipant { id: id.to_string() })
                .and_then(|profile| profile.to_participant());

            match resolved {
                Ok(participant) => participants.push(participant),
                Err(error) => self.exclude(&mut skipped, id, error)?,
            }
        }

        let mut aggregation = self.aggregate::<u32>(&reference, &participants, anchor)?;
        skipped.append(&mut aggregation.skipped);

        let restriction = match (&candidate_window, &host_window) {
            (Some(window), _) => Some(window),
            (None, Some(window)) if self.config.restrict_to_host_window => Some(window),
            _ => None,
        };
        let best = best_times(&aggregation.histogram, restriction);

        info!(
            "meeting {} heatmap: {} counted, {} skipped, best {:?} at {}",
            meeting.id,
            aggregation.counted,
            skipped.len(),
            best.hours,
            best.max_count
        );

        Ok(MeetingHeatmap {
            meeting_id: meeting.id.clone(),
            host_timezone: zone.name().to_string(),
            histogram: aggregation.histogram,
            best,
            host_window: host_window.as_ref().map(WorkInterval::hour_span),
            candidate_window: candidate_window.as_ref().map(WorkInterval::hour_span),
            participant_count: aggregation.counted,
            skipped,
        })
    }
}

/// Histogram of participant intervals over `reference`'s day, skipping
/// participants whose intervals cannot be converted.
///
/// # Examples
/// ```
/// use heatmap_libs::heatmap::build_histogram;
/// use heatmap_libs::participant::{Participant, ReferenceFrame};
/// use heatmap_libs::time::WorkInterval;
///
/// let reference = ReferenceFrame::new("UTC", None);
/// let night = WorkInterval::parse("22:00:00", "06:00:00", "UTC").unwrap();
/// let participants = vec![Participant::new("owl", Some(night))];
///
/// let histogram = build_histogram(&reference, &participants).unwrap();
/// let covered: Vec<u8> = (0..24).filter(|&h| histogram.get(h) == 1).collect();
/// assert_eq!(covered, vec![0, 1, 2, 3, 4, 5, 22, 23]);
/// ```
pub fn build_histogram(
    reference: &ReferenceFrame,
    participants: &[Participant],
) -> Result<HourHistogram<u32>, AvailabilityError> {
    Aggregator::default().build_histogram(reference, participants)
}

/// One square of the rendered heatmap
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct HeatmapCell {
    pub hour: u8,
    pub count: u32,
    pub label: String,
}

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct MeetingHeatmap {
    pub meeting_id: String,
    pub host_timezone: String,
    pub histogram: HourHistogram<u32>,
    pub best: BestTimes<u32>,
    pub host_window: Option<HourSpan>,
    pub candidate_window: Option<HourSpan>,
    pub participant_count: usize,
    pub skipped: Vec<Skipped>,
}

impl MeetingHeatmap {
    /// Cells along the host's work window in clock order, or the whole day
    /// when the host has no work hours on file
    pub fn cells(&self) -> Vec<HeatmapCell> {
        let hours = match self.host_window {
            Some(span) => span.clock_hours().collect_vec(),
            None => (0..HOURS_PER_DAY).collect_vec(),
        };

        hours
            .into_iter()
            .map(|hour| HeatmapCell {
                hour,
                count: self.histogram.get(hour),
                label: format!("{}:00", hour),
            })
            .collect()
    }
}
