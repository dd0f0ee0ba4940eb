//! # Schema Validator
//!
//! Two passes over a [`FormRecord`], both writing into one [`FieldErrors`] accumulator.
//!
//! 1. Shape checks, one per field. Every field is checked, so a bad date does not hide a bad state code.
//! 2. Cross-field rules, each adding at most one error to one field. A rule never adds to a field that
//!    already failed its own shape check.
//!
//! The raw input always comes back with the errors so the form can be redisplayed as submitted.
//!
//! ## Crowd sizes
//!
//! Empty or unparsable text is `None`, not an error. Only a parsed negative number is rejected, and only
//! for in-person events: online events never get errors on `count_method` or either crowd size.
use std::{collections::BTreeMap, fmt, str::FromStr};

use chrono::NaiveDate;
use serde::Serialize;

use crate::{
    fields::{FormRecord, Incident, MultiSelect, OTHER_ID, REQUIRED_FIELDS},
    utils::{is_uuid, parse_count},
};

pub const DATE_FORMAT: &str = "%Y-%m-%d";

const REFERENCED_PROTEST_ID: &str = "referenced_protest_id";

/// Which fields an in-person event must carry. The two rule sets are separate versions of the form,
/// picked once at startup.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum InPersonRule {
    #[default]
    CountMethodOnly,
    CountMethodAndCrowdSize,
}

impl FromStr for InPersonRule {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "count_method_only" => Ok(InPersonRule::CountMethodOnly),
            "count_method_and_crowd_size" => Ok(InPersonRule::CountMethodAndCrowdSize),
            other => Err(format!("unknown in-person rule `{other}`")),
        }
    }
}

impl fmt::Display for InPersonRule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            InPersonRule::CountMethodOnly => f.write_str("count_method_only"),
            InPersonRule::CountMethodAndCrowdSize => f.write_str("count_method_and_crowd_size"),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum IncidentStatus {
    Yes,
    No,
}

impl IncidentStatus {
    pub fn parse(input: &str) -> Option<Self> {
        match input {
            "yes" => Some(IncidentStatus::Yes),
            "no" => Some(IncidentStatus::No),
            _ => None,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            IncidentStatus::Yes => "yes",
            IncidentStatus::No => "no",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct IncidentReport {
    pub status: IncidentStatus,
    pub details: String,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum SubmissionKind {
    New,
    Correction,
    AdditionalSource,
    Other,
}

impl SubmissionKind {
    fn parse(input: &str) -> Option<Self> {
        match input {
            "" | "new" => Some(SubmissionKind::New),
            "correction" => Some(SubmissionKind::Correction),
            "additional_source" => Some(SubmissionKind::AdditionalSource),
            "other" => Some(SubmissionKind::Other),
            _ => None,
        }
    }
}

/// Why the record is being submitted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Submission {
    New,
    Correction { referenced_protest_id: String },
    AdditionalSource { referenced_protest_id: String },
    Other { description: String },
}

impl Submission {
    pub fn reference_type(&self) -> Option<&'static str> {
        match self {
            Submission::New => None,
            Submission::Correction { .. } => Some("correction"),
            Submission::AdditionalSource { .. } => Some("additional_source"),
            Submission::Other { .. } => Some("other"),
        }
    }

    pub fn referenced_protest_id(&self) -> Option<&str> {
        match self {
            Submission::Correction {
                referenced_protest_id,
            }
            | Submission::AdditionalSource {
                referenced_protest_id,
            } => Some(referenced_protest_id),
            _ => None,
        }
    }

    pub fn description(&self) -> Option<&str> {
        match self {
            Submission::Other { description } => Some(description),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidatedRecord {
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

    pub event_types: Vec<u32>,
    pub participant_types: Vec<u32>,
    pub participant_measures: Vec<u32>,
    pub police_measures: Vec<u32>,
    pub notes: Vec<u32>,

    pub participant_injury: IncidentReport,
    pub police_injury: IncidentReport,
    pub arrests: IncidentReport,
    pub property_damage: IncidentReport,
    pub participant_casualties: IncidentReport,
    pub police_casualties: IncidentReport,

    pub sources: String,
    pub submission: Submission,
}

impl ValidatedRecord {
    pub fn selection(&self, field: MultiSelect) -> &[u32] {
        match field {
            MultiSelect::EventTypes => &self.event_types,
            MultiSelect::ParticipantTypes => &self.participant_types,
            MultiSelect::ParticipantMeasures => &self.participant_measures,
            MultiSelect::PoliceMeasures => &self.police_measures,
            MultiSelect::Notes => &self.notes,
        }
    }

    pub fn incident(&self, incident: Incident) -> &IncidentReport {
        match incident {
            Incident::ParticipantInjury => &self.participant_injury,
            Incident::PoliceInjury => &self.police_injury,
            Incident::Arrests => &self.arrests,
            Incident::PropertyDamage => &self.property_damage,
            Incident::ParticipantCasualties => &self.participant_casualties,
            Incident::PoliceCasualties => &self.police_casualties,
        }
    }

    /// Display values that validate back to this record.
    pub fn to_form(&self) -> FormRecord {
        let mut form = FormRecord {
            date_of_event: self.date_of_event.format(DATE_FORMAT).to_string(),
            locality: self.locality.clone(),
            state_code: self.state_code.clone(),
            location_name: self.location_name.clone(),
            title: self.title.clone(),
            organization_name: self.organization_name.clone(),
            notable_participants: self.notable_participants.clone(),
            targets: self.targets.clone(),
            claims_summary: self.claims_summary.clone(),
            claims_verbatim: self.claims_verbatim.clone(),
            macroevent: self.macroevent.clone(),
            is_online: self.is_online,
            count_method: self.count_method.clone(),
            crowd_size_low: self.crowd_size_low.map(|n| n.to_string()).unwrap_or_default(),
            crowd_size_high: self.crowd_size_high.map(|n| n.to_string()).unwrap_or_default(),
            sources: self.sources.clone(),
            submission_type: self.submission.reference_type().unwrap_or_default().to_string(),
            referenced_protest_id: self
                .submission
                .referenced_protest_id()
                .unwrap_or_default()
                .to_string(),
            submission_type_other: self.submission.description().unwrap_or_default().to_string(),
            ..FormRecord::default()
        };

        for field in MultiSelect::ALL {
            *form.selection_mut(field) = self
                .selection(field)
                .iter()
                .map(|id| id.to_string())
                .collect();
        }

        for incident in Incident::ALL {
            let report = self.incident(incident);

            if let Some(status) = form.text_mut(incident.name()) {
                *status = report.status.as_str().to_string();
            }
            if let Some(details) = form.text_mut(incident.details_name()) {
                *details = report.details.clone();
            }
        }

        form
    }
}

/// Field path to one or more messages, in field-name order.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
#[serde(transparent)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub fn push(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn get(&self, field: &str) -> Option<&[String]> {
        self.0.get(field).map(Vec::as_slice)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of fields with at least one error.
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn fields(&self) -> impl Iterator<Item = &str> {
        self.0.keys().map(String::as_str)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ValidationFailure {
    pub errors: FieldErrors,
    pub values: FormRecord,
}

pub fn validate(form: &FormRecord, rule: InPersonRule) -> Result<ValidatedRecord, ValidationFailure> {
    let mut errors = FieldErrors::default();

    let (mut record, kind) = check_shapes(form, &mut errors);
    check_rules(form, &mut record, kind, rule, &mut errors);

    if errors.is_empty() {
        Ok(record)
    } else {
        Err(ValidationFailure {
            errors,
            values: form.clone(),
        })
    }
}

fn required_message(field: &str) -> &'static str {
    match field {
        "date_of_event" => "Date is required",
        "locality" => "City is required",
        "state_code" => "State is required",
        "sources" => "Sources are required",
        _ => "This field is required",
    }
}

/// First pass. Fields that fail fall back to a default so the second pass still has a record to read.
fn check_shapes(form: &FormRecord, errors: &mut FieldErrors) -> (ValidatedRecord, SubmissionKind) {
    for field in REQUIRED_FIELDS {
        let missing = form.text(field).is_none_or(|value| value.trim().is_empty());

        if missing {
            errors.push(field, required_message(field));
        }
    }

    let date_of_event = check_date(form, errors).unwrap_or_default();
    let in_person = !form.is_online;

    let kind = SubmissionKind::parse(form.submission_type.trim()).unwrap_or_else(|| {
        errors.push("submission_type", "Unknown submission type");
        SubmissionKind::New
    });

    // Only submissions that point at another protest keep the reference.
    let referenced = form.referenced_protest_id.trim();
    let keeps_reference = matches!(
        kind,
        SubmissionKind::Correction | SubmissionKind::AdditionalSource
    );
    if keeps_reference && !referenced.is_empty() && !is_uuid(referenced) {
        errors.push(
            REFERENCED_PROTEST_ID,
            "Referenced protest ID must be a valid UUID",
        );
    }

    let record = ValidatedRecord {
        date_of_event,
        locality: form.locality.clone(),
        state_code: form.state_code.clone(),
        location_name: form.location_name.clone(),
        title: form.title.clone(),
        organization_name: form.organization_name.clone(),
        notable_participants: form.notable_participants.clone(),
        targets: form.targets.clone(),
        claims_summary: form.claims_summary.clone(),
        claims_verbatim: form.claims_verbatim.clone(),
        macroevent: form.macroevent.clone(),
        is_online: form.is_online,
        count_method: form.count_method.clone(),
        crowd_size_low: check_crowd_size(form, "crowd_size_low", in_person, errors),
        crowd_size_high: check_crowd_size(form, "crowd_size_high", in_person, errors),

        event_types: check_selection(form, MultiSelect::EventTypes, errors),
        participant_types: check_selection(form, MultiSelect::ParticipantTypes, errors),
        participant_measures: check_selection(form, MultiSelect::ParticipantMeasures, errors),
        police_measures: check_selection(form, MultiSelect::PoliceMeasures, errors),
        notes: check_selection(form, MultiSelect::Notes, errors),

        participant_injury: check_incident(form, Incident::ParticipantInjury, errors),
        police_injury: check_incident(form, Incident::PoliceInjury, errors),
        arrests: check_incident(form, Incident::Arrests, errors),
        property_damage: check_incident(form, Incident::PropertyDamage, errors),
        participant_casualties: check_incident(form, Incident::ParticipantCasualties, errors),
        police_casualties: check_incident(form, Incident::PoliceCasualties, errors),

        sources: form.sources.clone(),
        submission: Submission::New,
    };

    (record, kind)
}

fn check_date(form: &FormRecord, errors: &mut FieldErrors) -> Option<NaiveDate> {
    if errors.has("date_of_event") {
        return None;
    }

    NaiveDate::parse_from_str(form.date_of_event.trim(), DATE_FORMAT)
        .map_err(|_| errors.push("date_of_event", "Date must be in YYYY-MM-DD format"))
        .ok()
}

fn check_crowd_size(
    form: &FormRecord,
    field: &str,
    in_person: bool,
    errors: &mut FieldErrors,
) -> Option<i64> {
    let count = form.text(field).and_then(parse_count)?;

    if count < 0 {
        if in_person {
            errors.push(field, "Crowd size must be a non-negative whole number");
        }
        return None;
    }

    Some(count)
}

fn check_selection(form: &FormRecord, field: MultiSelect, errors: &mut FieldErrors) -> Vec<u32> {
    let mut ids = Vec::new();
    let mut invalid = false;

    for raw in form.selection(field) {
        match raw.trim().parse::<u32>() {
            Ok(OTHER_ID) if !field.has_other() => invalid = true,
            Ok(id) => ids.push(id),
            Err(_) => invalid = true,
        }
    }

    if invalid {
        errors.push(field.name(), "Invalid option selected");
    }

    ids
}

fn check_incident(form: &FormRecord, incident: Incident, errors: &mut FieldErrors) -> IncidentReport {
    let raw = form.text(incident.name()).unwrap_or_default();

    let status = IncidentStatus::parse(raw).unwrap_or_else(|| {
        errors.push(incident.name(), "Must be yes or no");
        IncidentStatus::No
    });

    IncidentReport {
        status,
        details: form
            .text(incident.details_name())
            .unwrap_or_default()
            .to_string(),
    }
}

/// Second pass.
fn check_rules(
    form: &FormRecord,
    record: &mut ValidatedRecord,
    kind: SubmissionKind,
    rule: InPersonRule,
    errors: &mut FieldErrors,
) {
    if !record.is_online {
        if form.count_method.trim().is_empty() {
            errors.push(
                "count_method",
                "Counting method is required for in-person events",
            );
        }

        let sizes = [
            ("crowd_size_low", record.crowd_size_low),
            ("crowd_size_high", record.crowd_size_high),
        ];

        if rule == InPersonRule::CountMethodAndCrowdSize {
            for (field, size) in sizes {
                if size.is_none() && !errors.has(field) {
                    errors.push(field, "Crowd size estimate is required for in-person events");
                }
            }
        }

        // Either both estimates or neither.
        let given = sizes.iter().filter(|(_, size)| size.is_some()).count();
        if given == 1 {
            for (field, size) in sizes {
                if size.is_none() && !errors.has(field) {
                    errors.push(field, "Both low and high crowd estimates are required");
                }
            }
        }
    }

    let referenced = form.referenced_protest_id.trim();

    record.submission = match kind {
        SubmissionKind::New => Submission::New,
        SubmissionKind::Correction | SubmissionKind::AdditionalSource => {
            if referenced.is_empty() && !errors.has(REFERENCED_PROTEST_ID) {
                errors.push(
                    REFERENCED_PROTEST_ID,
                    "Select the protest this submission refers to",
                );
            }

            let referenced_protest_id = referenced.to_string();
            if kind == SubmissionKind::Correction {
                Submission::Correction {
                    referenced_protest_id,
                }
            } else {
                Submission::AdditionalSource {
                    referenced_protest_id,
                }
            }
        }
        SubmissionKind::Other => {
            let description = form.submission_type_other.trim();

            if description.is_empty() {
                errors.push("submission_type_other", "Describe the submission type");
            }

            Submission::Other {
                description: description.to_string(),
            }
        }
    };
}
