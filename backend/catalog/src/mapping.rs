//! # Mapping
//!
//! Conversions in and out of display values. All total: missing input takes the catalog default.
//!
//! - [`FormSubmission`]: urlencoded body to display values, "Other" texts and the bot-check token
//! - [`hydrate`]: stored record to display values, for edit/autofill
//! - [`clear`]: back to catalog defaults
use url::form_urlencoded;

use crate::{
    fields::{FormRecord, MultiSelect, OTHER_ID, OtherValues, default_record},
    models::ProtestRecord,
    utils::{is_checked, strip_quotes},
};

pub const TURNSTILE_TOKEN: &str = "turnstile_token";

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FormSubmission {
    pub values: FormRecord,
    pub others: OtherValues,
    pub turnstile_token: Option<String>,
}

impl FormSubmission {
    pub fn from_urlencoded(body: &[u8]) -> Self {
        Self::from_pairs(form_urlencoded::parse(body).into_owned())
    }

    /// Checkbox groups arrive as repeated keys, `event_types=0&event_types=3`. Unknown keys are ignored.
    pub fn from_pairs<I, K, V>(pairs: I) -> Self
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<String>,
    {
        let mut submission = FormSubmission::default();

        for (key, value) in pairs {
            let key = key.as_ref();
            let value: String = value.into();

            if key == TURNSTILE_TOKEN {
                if !value.trim().is_empty() {
                    submission.turnstile_token = Some(value);
                }
                continue;
            }

            if key == "is_online" {
                submission.values.is_online = is_checked(&value);
                continue;
            }

            if let Some(field) = MultiSelect::ALL.into_iter().find(|f| f.name() == key) {
                if !value.trim().is_empty() {
                    submission.values.selection_mut(field).push(value);
                }
                continue;
            }

            if let Some(field) = MultiSelect::ALL
                .into_iter()
                .find(|f| f.other_field() == Some(key))
            {
                if let Some(slot) = submission.others.get_mut(field) {
                    *slot = value;
                }
                continue;
            }

            if let Some(slot) = submission.values.text_mut(key) {
                *slot = value;
            }
        }

        submission
    }
}

/// Display values for a stored record. The "Other" entry's text moves to the side table, minus one
/// layer of surrounding quotes.
pub fn hydrate(record: &ProtestRecord) -> (FormRecord, OtherValues) {
    let row = &record.protest;
    let text = |value: &Option<String>| value.clone().unwrap_or_default();
    let status = |value: &Option<String>| value.clone().unwrap_or_else(|| "no".to_string());

    let mut form = FormRecord {
        date_of_event: text(&row.date_of_event),
        locality: text(&row.locality),
        state_code: text(&row.state_code),
        location_name: text(&row.location_name),
        title: text(&row.title),
        organization_name: text(&row.organization_name),
        notable_participants: text(&row.notable_participants),
        targets: text(&row.targets),
        claims_summary: text(&row.claims_summary),
        claims_verbatim: text(&row.claims_verbatim),
        macroevent: text(&row.macroevent),
        is_online: row.is_online.unwrap_or(false),
        count_method: text(&row.count_method),
        crowd_size_low: row.crowd_size_low.map(|n| n.to_string()).unwrap_or_default(),
        crowd_size_high: row.crowd_size_high.map(|n| n.to_string()).unwrap_or_default(),

        participant_injury: status(&row.participant_injury),
        participant_injury_details: text(&row.participant_injury_details),
        police_injury: status(&row.police_injury),
        police_injury_details: text(&row.police_injury_details),
        arrests: status(&row.arrests),
        arrests_details: text(&row.arrests_details),
        property_damage: status(&row.property_damage),
        property_damage_details: text(&row.property_damage_details),
        participant_casualties: status(&row.participant_casualties),
        participant_casualties_details: text(&row.participant_casualties_details),
        police_casualties: status(&row.police_casualties),
        police_casualties_details: text(&row.police_casualties_details),

        sources: text(&row.sources),

        submission_type: text(&row.reference_type),
        referenced_protest_id: text(&row.referenced_protest_id),

        ..default_record()
    };

    let mut others = OtherValues::default();

    for field in MultiSelect::ALL {
        let links = record.links(field);

        *form.selection_mut(field) = links
            .iter()
            .map(|link| link.option_id.to_string())
            .collect();

        if let Some(slot) = others.get_mut(field) {
            *slot = links
                .iter()
                .find(|link| link.option_id == i64::from(OTHER_ID))
                .and_then(|link| link.other_value.as_deref())
                .map(strip_quotes)
                .unwrap_or_default()
                .to_string();
        }
    }

    (form, others)
}

pub fn clear(form: &mut FormRecord, others: &mut OtherValues) {
    *form = default_record();
    *others = OtherValues::default();
}
