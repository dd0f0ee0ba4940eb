use serde::{Deserialize, Serialize};

/// Columns of `protests` as the store returns them.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProtestRow {
    pub id: Option<String>,
    pub title: Option<String>,
    pub date_of_event: Option<String>,
    pub locality: Option<String>,
    pub state_code: Option<String>,
    pub location_name: Option<String>,
    pub organization_name: Option<String>,
    pub notable_participants: Option<String>,
    pub targets: Option<String>,
    pub claims_summary: Option<String>,
    pub claims_verbatim: Option<String>,
    pub macroevent: Option<String>,
    pub is_online: Option<bool>,
    pub crowd_size_low: Option<i64>,
    pub crowd_size_high: Option<i64>,
    pub count_method: Option<String>,
    pub participant_injury: Option<String>,
    pub participant_injury_details: Option<String>,
    pub police_injury: Option<String>,
    pub police_injury_details: Option<String>,
    pub arrests: Option<String>,
    pub arrests_details: Option<String>,
    pub property_damage: Option<String>,
    pub property_damage_details: Option<String>,
    pub participant_casualties: Option<String>,
    pub participant_casualties_details: Option<String>,
    pub police_casualties: Option<String>,
    pub police_casualties_details: Option<String>,
    pub sources: Option<String>,
    pub created_at: Option<String>,
    pub referenced_protest_id: Option<String>,
    pub reference_type: Option<String>,
}

impl ProtestRow {
    pub const COLUMNS: &'static str = "id,title,date_of_event,locality,state_code,location_name,\
        organization_name,notable_participants,targets,claims_summary,claims_verbatim,macroevent,\
        is_online,crowd_size_low,crowd_size_high,count_method,participant_injury,\
        participant_injury_details,police_injury,police_injury_details,arrests,arrests_details,\
        property_damage,property_damage_details,participant_casualties,\
        participant_casualties_details,police_casualties,police_casualties_details,sources,\
        created_at,referenced_protest_id,reference_type";
}

/// One junction row. The id column is named per table, see [`crate::MultiSelect::link_column`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OptionLink {
    #[serde(alias = "event_type_id")]
    #[serde(alias = "participant_type_id")]
    #[serde(alias = "measure_id")]
    #[serde(alias = "note_id")]
    pub option_id: i64,

    #[serde(default)]
    pub other_value: Option<String>,
}

/// A protest together with its five junction lists.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ProtestRecord {
    #[serde(flatten)]
    pub protest: ProtestRow,

    #[serde(default)]
    pub event_types: Vec<OptionLink>,
    #[serde(default)]
    pub participant_types: Vec<OptionLink>,
    #[serde(default)]
    pub participant_measures: Vec<OptionLink>,
    #[serde(default)]
    pub police_measures: Vec<OptionLink>,
    #[serde(default)]
    pub notes: Vec<OptionLink>,
}

impl ProtestRecord {
    pub fn links(&self, field: crate::MultiSelect) -> &[OptionLink] {
        use crate::MultiSelect::*;

        match field {
            EventTypes => &self.event_types,
            ParticipantTypes => &self.participant_types,
            ParticipantMeasures => &self.participant_measures,
            PoliceMeasures => &self.police_measures,
            Notes => &self.notes,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LookupOption {
    pub id: i64,
    pub name: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct StateOption {
    pub code: String,
    pub name: String,
}
