//! # Field Catalog
//!
//! Single source of truth for the form's fields.
//!
//! ## Kinds
//!
//! - Incident: `yes`/`no` status (default `no`) plus a `<name>_details` free text
//! - Multi-select with "Other": list of option ids, `0` is "Other" and its text lives in [`OtherValues`]
//! - Multi-select without "Other": list of option ids
//! - Text: free string, default empty
//! - Special: `date_of_event` (ISO date), `is_online` (bool), crowd sizes (numbers held as strings)
//!
//! Every name is unique across kinds and [`default_record`] sets each one exactly once.
use serde::{Deserialize, Serialize};

pub const INCIDENT_FIELDS: [&str; 6] = [
    "participant_injury",
    "police_injury",
    "arrests",
    "property_damage",
    "participant_casualties",
    "police_casualties",
];

pub const MULTISELECT_WITH_OTHER: [&str; 4] =
    ["event_types", "participant_measures", "police_measures", "notes"];

pub const MULTISELECT_WITHOUT_OTHER: [&str; 1] = ["participant_types"];

pub const TEXT_FIELDS: [&str; 15] = [
    "locality",
    "state_code",
    "location_name",
    "title",
    "organization_name",
    "notable_participants",
    "targets",
    "claims_summary",
    "claims_verbatim",
    "macroevent",
    "count_method",
    "sources",
    "submission_type",
    "referenced_protest_id",
    "submission_type_other",
];

pub const SPECIAL_FIELDS: [(&str, FieldKind); 4] = [
    ("date_of_event", FieldKind::Date),
    ("is_online", FieldKind::Boolean),
    ("crowd_size_low", FieldKind::NumberString),
    ("crowd_size_high", FieldKind::NumberString),
];

pub const REQUIRED_FIELDS: [&str; 4] = ["date_of_event", "locality", "state_code", "sources"];

/// Reserved option id meaning "Other".
pub const OTHER_ID: u32 = 0;

pub const INCIDENT_NO: &str = "no";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FieldKind {
    Text,
    Date,
    Boolean,
    NumberString,
    IncidentStatus,
    IncidentDetails,
    MultiSelect { other: bool },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Incident {
    ParticipantInjury,
    PoliceInjury,
    Arrests,
    PropertyDamage,
    ParticipantCasualties,
    PoliceCasualties,
}

impl Incident {
    pub const ALL: [Incident; 6] = [
        Incident::ParticipantInjury,
        Incident::PoliceInjury,
        Incident::Arrests,
        Incident::PropertyDamage,
        Incident::ParticipantCasualties,
        Incident::PoliceCasualties,
    ];

    pub fn name(self) -> &'static str {
        match self {
            Incident::ParticipantInjury => "participant_injury",
            Incident::PoliceInjury => "police_injury",
            Incident::Arrests => "arrests",
            Incident::PropertyDamage => "property_damage",
            Incident::ParticipantCasualties => "participant_casualties",
            Incident::PoliceCasualties => "police_casualties",
        }
    }

    pub fn details_name(self) -> &'static str {
        match self {
            Incident::ParticipantInjury => "participant_injury_details",
            Incident::PoliceInjury => "police_injury_details",
            Incident::Arrests => "arrests_details",
            Incident::PropertyDamage => "property_damage_details",
            Incident::ParticipantCasualties => "participant_casualties_details",
            Incident::PoliceCasualties => "police_casualties_details",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MultiSelect {
    EventTypes,
    ParticipantTypes,
    ParticipantMeasures,
    PoliceMeasures,
    Notes,
}

impl MultiSelect {
    pub const ALL: [MultiSelect; 5] = [
        MultiSelect::EventTypes,
        MultiSelect::ParticipantTypes,
        MultiSelect::ParticipantMeasures,
        MultiSelect::PoliceMeasures,
        MultiSelect::Notes,
    ];

    pub fn name(self) -> &'static str {
        match self {
            MultiSelect::EventTypes => "event_types",
            MultiSelect::ParticipantTypes => "participant_types",
            MultiSelect::ParticipantMeasures => "participant_measures",
            MultiSelect::PoliceMeasures => "police_measures",
            MultiSelect::Notes => "notes",
        }
    }

    pub fn has_other(self) -> bool {
        !matches!(self, MultiSelect::ParticipantTypes)
    }

    /// Form field carrying the "Other" free text, e.g. `event_types_other`.
    pub fn other_field(self) -> Option<&'static str> {
        match self {
            MultiSelect::EventTypes => Some("event_types_other"),
            MultiSelect::ParticipantTypes => None,
            MultiSelect::ParticipantMeasures => Some("participant_measures_other"),
            MultiSelect::PoliceMeasures => Some("police_measures_other"),
            MultiSelect::Notes => Some("notes_other"),
        }
    }

    /// Junction table linking a protest to its selected options.
    pub fn link_table(self) -> &'static str {
        match self {
            MultiSelect::EventTypes => "protest_event_types",
            MultiSelect::ParticipantTypes => "protest_participant_types",
            MultiSelect::ParticipantMeasures => "protest_participant_measures",
            MultiSelect::PoliceMeasures => "protest_police_measures",
            MultiSelect::Notes => "protest_notes",
        }
    }

    /// Option id column in [`MultiSelect::link_table`].
    pub fn link_column(self) -> &'static str {
        match self {
            MultiSelect::EventTypes => "event_type_id",
            MultiSelect::ParticipantTypes => "participant_type_id",
            MultiSelect::ParticipantMeasures | MultiSelect::PoliceMeasures => "measure_id",
            MultiSelect::Notes => "note_id",
        }
    }

    /// Table listing the selectable options.
    pub fn lookup_table(self) -> &'static str {
        match self {
            MultiSelect::EventTypes => "event_types",
            MultiSelect::ParticipantTypes => "participant_types",
            MultiSelect::ParticipantMeasures => "participant_measures",
            MultiSelect::PoliceMeasures => "police_measures",
            MultiSelect::Notes => "notes_options",
        }
    }
}

/// Display values for the form, loosely typed the way a browser submits them.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FormRecord {
    pub date_of_event: String,
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
    pub crowd_size_low: String,
    pub crowd_size_high: String,

    pub event_types: Vec<String>,
    pub participant_types: Vec<String>,
    pub participant_measures: Vec<String>,
    pub police_measures: Vec<String>,
    pub notes: Vec<String>,

    pub participant_injury: String,
    pub participant_injury_details: String,
    pub police_injury: String,
    pub police_injury_details: String,
    pub arrests: String,
    pub arrests_details: String,
    pub property_damage: String,
    pub property_damage_details: String,
    pub participant_casualties: String,
    pub participant_casualties_details: String,
    pub police_casualties: String,
    pub police_casualties_details: String,

    pub sources: String,

    pub submission_type: String,
    pub referenced_protest_id: String,
    pub submission_type_other: String,
}

impl Default for FormRecord {
    fn default() -> Self {
        default_record()
    }
}

impl FormRecord {
    /// Any string-valued field by name: text, date, crowd sizes, incident status and details.
    pub fn text(&self, name: &str) -> Option<&str> {
        let value = match name {
            "date_of_event" => &self.date_of_event,
            "locality" => &self.locality,
            "state_code" => &self.state_code,
            "location_name" => &self.location_name,
            "title" => &self.title,
            "organization_name" => &self.organization_name,
            "notable_participants" => &self.notable_participants,
            "targets" => &self.targets,
            "claims_summary" => &self.claims_summary,
            "claims_verbatim" => &self.claims_verbatim,
            "macroevent" => &self.macroevent,
            "count_method" => &self.count_method,
            "crowd_size_low" => &self.crowd_size_low,
            "crowd_size_high" => &self.crowd_size_high,
            "participant_injury" => &self.participant_injury,
            "participant_injury_details" => &self.participant_injury_details,
            "police_injury" => &self.police_injury,
            "police_injury_details" => &self.police_injury_details,
            "arrests" => &self.arrests,
            "arrests_details" => &self.arrests_details,
            "property_damage" => &self.property_damage,
            "property_damage_details" => &self.property_damage_details,
            "participant_casualties" => &self.participant_casualties,
            "participant_casualties_details" => &self.participant_casualties_details,
            "police_casualties" => &self.police_casualties,
            "police_casualties_details" => &self.police_casualties_details,
            "sources" => &self.sources,
            "submission_type" => &self.submission_type,
            "referenced_protest_id" => &self.referenced_protest_id,
            "submission_type_other" => &self.submission_type_other,
            _ => return None,
        };

        Some(value)
    }

    pub fn text_mut(&mut self, name: &str) -> Option<&mut String> {
        let value = match name {
            "date_of_event" => &mut self.date_of_event,
            "locality" => &mut self.locality,
            "state_code" => &mut self.state_code,
            "location_name" => &mut self.location_name,
            "title" => &mut self.title,
            "organization_name" => &mut self.organization_name,
            "notable_participants" => &mut self.notable_participants,
            "targets" => &mut self.targets,
            "claims_summary" => &mut self.claims_summary,
            "claims_verbatim" => &mut self.claims_verbatim,
            "macroevent" => &mut self.macroevent,
            "count_method" => &mut self.count_method,
            "crowd_size_low" => &mut self.crowd_size_low,
            "crowd_size_high" => &mut self.crowd_size_high,
            "participant_injury" => &mut self.participant_injury,
            "participant_injury_details" => &mut self.participant_injury_details,
            "police_injury" => &mut self.police_injury,
            "police_injury_details" => &mut self.police_injury_details,
            "arrests" => &mut self.arrests,
            "arrests_details" => &mut self.arrests_details,
            "property_damage" => &mut self.property_damage,
            "property_damage_details" => &mut self.property_damage_details,
            "participant_casualties" => &mut self.participant_casualties,
            "participant_casualties_details" => &mut self.participant_casualties_details,
            "police_casualties" => &mut self.police_casualties,
            "police_casualties_details" => &mut self.police_casualties_details,
            "sources" => &mut self.sources,
            "submission_type" => &mut self.submission_type,
            "referenced_protest_id" => &mut self.referenced_protest_id,
            "submission_type_other" => &mut self.submission_type_other,
            _ => return None,
        };

        Some(value)
    }

    pub fn selection(&self, field: MultiSelect) -> &[String] {
        match field {
            MultiSelect::EventTypes => &self.event_types,
            MultiSelect::ParticipantTypes => &self.participant_types,
            MultiSelect::ParticipantMeasures => &self.participant_measures,
            MultiSelect::PoliceMeasures => &self.police_measures,
            MultiSelect::Notes => &self.notes,
        }
    }

    pub fn selection_mut(&mut self, field: MultiSelect) -> &mut Vec<String> {
        match field {
            MultiSelect::EventTypes => &mut self.event_types,
            MultiSelect::ParticipantTypes => &mut self.participant_types,
            MultiSelect::ParticipantMeasures => &mut self.participant_measures,
            MultiSelect::PoliceMeasures => &mut self.police_measures,
            MultiSelect::Notes => &mut self.notes,
        }
    }
}

/// Free text typed next to each "Other" checkbox, held at slot `0` of its category.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct OtherValues {
    pub event_types: String,
    pub participant_measures: String,
    pub police_measures: String,
    pub notes: String,
}

impl OtherValues {
    /// `None` for categories without an "Other" option.
    pub fn get(&self, field: MultiSelect) -> Option<&str> {
        match field {
            MultiSelect::EventTypes => Some(&self.event_types),
            MultiSelect::ParticipantTypes => None,
            MultiSelect::ParticipantMeasures => Some(&self.participant_measures),
            MultiSelect::PoliceMeasures => Some(&self.police_measures),
            MultiSelect::Notes => Some(&self.notes),
        }
    }

    pub fn get_mut(&mut self, field: MultiSelect) -> Option<&mut String> {
        match field {
            MultiSelect::EventTypes => Some(&mut self.event_types),
            MultiSelect::ParticipantTypes => None,
            MultiSelect::ParticipantMeasures => Some(&mut self.participant_measures),
            MultiSelect::PoliceMeasures => Some(&mut self.police_measures),
            MultiSelect::Notes => Some(&mut self.notes),
        }
    }
}

pub fn default_record() -> FormRecord {
    FormRecord {
        date_of_event: String::new(),
        locality: String::new(),
        state_code: String::new(),
        location_name: String::new(),
        title: String::new(),
        organization_name: String::new(),
        notable_participants: String::new(),
        targets: String::new(),
        claims_summary: String::new(),
        claims_verbatim: String::new(),
        macroevent: String::new(),
        is_online: false,
        count_method: String::new(),
        crowd_size_low: String::new(),
        crowd_size_high: String::new(),

        event_types: Vec::new(),
        participant_types: Vec::new(),
        participant_measures: Vec::new(),
        police_measures: Vec::new(),
        notes: Vec::new(),

        participant_injury: INCIDENT_NO.to_string(),
        participant_injury_details: String::new(),
        police_injury: INCIDENT_NO.to_string(),
        police_injury_details: String::new(),
        arrests: INCIDENT_NO.to_string(),
        arrests_details: String::new(),
        property_damage: INCIDENT_NO.to_string(),
        property_damage_details: String::new(),
        participant_casualties: INCIDENT_NO.to_string(),
        participant_casualties_details: String::new(),
        police_casualties: INCIDENT_NO.to_string(),
        police_casualties_details: String::new(),

        sources: String::new(),

        submission_type: String::new(),
        referenced_protest_id: String::new(),
        submission_type_other: String::new(),
    }
}

/// Every declared field name, in catalog order.
pub fn field_names() -> Vec<&'static str> {
    let mut names = Vec::new();

    for incident in Incident::ALL {
        names.push(incident.name());
        names.push(incident.details_name());
    }

    names.extend(MULTISELECT_WITH_OTHER);
    names.extend(MULTISELECT_WITHOUT_OTHER);
    names.extend(TEXT_FIELDS);
    names.extend(SPECIAL_FIELDS.iter().map(|(name, _)| *name));

    names
}

pub fn kind_of(name: &str) -> Option<FieldKind> {
    if INCIDENT_FIELDS.contains(&name) {
        return Some(FieldKind::IncidentStatus);
    }

    if Incident::ALL.iter().any(|i| i.details_name() == name) {
        return Some(FieldKind::IncidentDetails);
    }

    if MULTISELECT_WITH_OTHER.contains(&name) {
        return Some(FieldKind::MultiSelect { other: true });
    }

    if MULTISELECT_WITHOUT_OTHER.contains(&name) {
        return Some(FieldKind::MultiSelect { other: false });
    }

    if TEXT_FIELDS.contains(&name) {
        return Some(FieldKind::Text);
    }

    SPECIAL_FIELDS
        .iter()
        .find(|(special, _)| *special == name)
        .map(|(_, kind)| *kind)
}
