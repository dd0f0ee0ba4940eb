//! # Prepare
//!
//! Validated record to store payload, the shape the `submit_protest` RPC takes:
//!
//! ```json
//! {
//!   "protest_data": { "date_of_event": "2024-01-20", "crowd_size_low": 250, ... },
//!   "event_types_data": [{ "id": 0, "other": "Flash mob" }, { "id": 3, "other": null }],
//!   "participant_types_data": [{ "id": 2 }],
//!   "participant_measures_data": [],
//!   "police_measures_data": [],
//!   "notes_data": []
//! }
//! ```
use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    fields::{MultiSelect, OTHER_ID, OtherValues},
    validation::{IncidentStatus, ValidatedRecord},
};

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ProtestData {
    pub date_of_event: NaiveDate,
    pub locality: String,
    pub state_code: String,
    pub location_name: String,
    pub title: String,
    pub organization_name: String,
    pub notable_participants: String,
    pub targets: String,
    pub claims_summary: String,
    pub claims_verbatim: String,
    pub macroevent: String,
    pub is_online: bool,
    pub count_method: String,
    pub crowd_size_low: Option<i64>,
    pub crowd_size_high: Option<i64>,
    pub participant_injury: IncidentStatus,
    pub participant_injury_details: String,
    pub police_injury: IncidentStatus,
    pub police_injury_details: String,
    pub arrests: IncidentStatus,
    pub arrests_details: String,
    pub property_damage: IncidentStatus,
    pub property_damage_details: String,
    pub participant_casualties: IncidentStatus,
    pub participant_casualties_details: String,
    pub police_casualties: IncidentStatus,
    pub police_casualties_details: String,
    pub sources: String,
    pub reference_type: Option<&'static str>,
    pub referenced_protest_id: Option<String>,
    /// Only sent for `other` submissions. `protests` has no column for it, `submit_protest` reads it
    /// from the payload.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub reference_type_other: Option<String>,
}

/// Junction entry for a category with "Other". `other` is set only when `id` is `0`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct JunctionEntry {
    pub id: u32,
    pub other: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct OptionRef {
    pub id: u32,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SubmissionPayload {
    pub protest_data: ProtestData,
    pub event_types_data: Vec<JunctionEntry>,
    pub participant_types_data: Vec<OptionRef>,
    pub participant_measures_data: Vec<JunctionEntry>,
    pub police_measures_data: Vec<JunctionEntry>,
    pub notes_data: Vec<JunctionEntry>,
}

pub fn prepare(record: &ValidatedRecord, others: &OtherValues) -> SubmissionPayload {
    let junction = |field: MultiSelect| {
        prepare_junction(record.selection(field), others.get(field).unwrap_or_default())
    };

    SubmissionPayload {
        protest_data: prepare_protest(record),
        event_types_data: junction(MultiSelect::EventTypes),
        participant_types_data: record
            .participant_types
            .iter()
            .map(|&id| OptionRef { id })
            .collect(),
        participant_measures_data: junction(MultiSelect::ParticipantMeasures),
        police_measures_data: junction(MultiSelect::PoliceMeasures),
        notes_data: junction(MultiSelect::Notes),
    }
}

pub fn prepare_junction(ids: &[u32], other: &str) -> Vec<JunctionEntry> {
    ids.iter()
        .map(|&id| JunctionEntry {
            id,
            other: (id == OTHER_ID).then(|| other.to_string()),
        })
        .collect()
}

fn prepare_protest(record: &ValidatedRecord) -> ProtestData {
    // Zero and absent both store as null.
    let count = |size: Option<i64>| size.filter(|&n| n != 0);

    ProtestData {
        date_of_event: record.date_of_event,
        locality: record.locality.clone(),
        state_code: record.state_code.clone(),
        location_name: record.location_name.clone(),
        title: record.title.clone(),
        organization_name: record.organization_name.clone(),
        notable_participants: record.notable_participants.clone(),
        targets: record.targets.clone(),
        claims_summary: record.claims_summary.clone(),
        claims_verbatim: record.claims_verbatim.clone(),
        macroevent: record.macroevent.clone(),
        is_online: record.is_online,
        count_method: record.count_method.clone(),
        crowd_size_low: count(record.crowd_size_low),
        crowd_size_high: count(record.crowd_size_high),
        participant_injury: record.participant_injury.status,
        participant_injury_details: record.participant_injury.details.clone(),
        police_injury: record.police_injury.status,
        police_injury_details: record.police_injury.details.clone(),
        arrests: record.arrests.status,
        arrests_details: record.arrests.details.clone(),
        property_damage: record.property_damage.status,
        property_damage_details: record.property_damage.details.clone(),
        participant_casualties: record.participant_casualties.status,
        participant_casualties_details: record.participant_casualties.details.clone(),
        police_casualties: record.police_casualties.status,
        police_casualties_details: record.police_casualties.details.clone(),
        sources: record.sources.clone(),
        reference_type: record.submission.reference_type(),
        referenced_protest_id: record.submission.referenced_protest_id().map(str::to_string),
        reference_type_other: record.submission.description().map(str::to_string),
    }
}
