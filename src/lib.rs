pub mod data;
pub mod heatmap;
pub mod participant;
pub mod time;

#[cfg(feature = "wasm")]
pub mod wasm;

pub use data::{AvailabilityError, MeetingRecord, ProfileRecord};
pub use heatmap::{
    best_times, build_histogram, Aggregator, AggregatorConfig, AnchorDate, BestTimes,
    HourHistogram, MeetingHeatmap, Strictness,
};
pub use participant::{Participant, ReferenceFrame};
pub use time::{convert_interval_to_zone, HourSpan, TimeOfDay, WorkInterval};
