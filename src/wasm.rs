use crate::data::{MeetingRecord, ProfileRecord};
use crate::heatmap::{Aggregator, AggregatorConfig};
use serde::Deserialize;
use wasm_bindgen::prelude::*;

#[derive(Deserialize)]
struct HeatmapRequest {
    meeting: MeetingRecord,
    profiles: Vec<ProfileRecord>,
    #[serde(default)]
    config: AggregatorConfig,
}

/// Builds the heatmap for one meeting from the rows the front end already
/// fetched: `{ meeting, profiles, config? }`.
#[wasm_bindgen(js_name = meetingHeatmap)]
pub fn meeting_heatmap(input: JsValue) -> Result<JsValue, JsValue> {
    let request: HeatmapRequest = serde_wasm_bindgen::from_value(input)?;

    let heatmap = Aggregator::new(request.config)
        .meeting_heatmap(&request.meeting, &request.profiles)
        .map_err(|e| JsValue::from_str(&e.to_string()))?;

    Ok(serde_wasm_bindgen::to_value(&heatmap)?)
}
