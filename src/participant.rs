use crate::data::AvailabilityError;
use crate::time::{default_anchor_date, parse_timezone, WorkInterval};
use chrono::NaiveDate;
use chrono_tz::Tz;
use serde::{Deserialize, Serialize};

#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct Participant {
    pub id: String,
    #[serde(rename = "workInterval", default)]
    pub work_interval: Option<WorkInterval>,
}

impl Participant {
    /// Constructs a new Participant available during `work_interval`.
    /// `None` means no work hours are known, and this participant adds
    /// nothing to a heatmap.
    pub fn new(id: &str, work_interval: Option<WorkInterval>) -> Participant {
        Participant {
            id: id.to_string(),
            work_interval,
        }
    }

    /// This participant's interval converted into `zone`, pinned to `anchor`.
    /// `None` when there is nothing to convert.
    pub fn work_interval_in(
        &self,
        zone: &str,
        anchor: NaiveDate,
    ) -> Option<Result<WorkInterval, AvailabilityError>> {
        self.work_interval
            .as_ref()
            .map(|interval| interval.convert_to_zone_on(zone, anchor))
    }
}

/// The party whose local day defines the heatmap's 24 hours
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ReferenceFrame {
    pub timezone: String,
    #[serde(rename = "workInterval", default)]
    pub work_interval: Option<WorkInterval>,
}

impl ReferenceFrame {
    pub fn new(timezone: &str, work_interval: Option<WorkInterval>) -> ReferenceFrame {
        ReferenceFrame {
            timezone: timezone.to_string(),
            work_interval,
        }
    }

    pub fn zone(&self) -> Result<Tz, AvailabilityError> {
        parse_timezone(&self.timezone)
    }

    /// The reference's own work window, expressed in the reference zone.
    /// An interval recorded in some other zone is converted first.
    pub fn window(&self) -> Result<Option<WorkInterval>, AvailabilityError> {
        self.window_on(default_anchor_date())
    }

    pub fn window_on(&self, anchor: NaiveDate) -> Result<Option<WorkInterval>, AvailabilityError> {
        let zone = self.zone()?;
        let interval = match &self.work_interval {
            Some(interval) => interval,
            None => return Ok(None),
        };

        if parse_timezone(&interval.timezone)? == zone {
            Ok(Some(interval.clone()))
        } else {
            interval.convert_to_zone_on(zone.name(), anchor).map(Some)
        }
    }
}
