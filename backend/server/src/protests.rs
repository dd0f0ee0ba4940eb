use catalog::{LookupOption, MultiSelect, OptionLink, ProtestRecord, StateOption, utils::is_uuid};
use serde::Serialize;
use tracing::info;

use crate::{
    database::{ProtestStore, StoreError},
    error::AppError,
    utils::or_empty,
};

/// Lookup lists the form renders as selects and checkbox groups.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FormOptions {
    pub states: Vec<StateOption>,
    pub event_types: Vec<LookupOption>,
    pub participant_types: Vec<LookupOption>,
    pub participant_measures: Vec<LookupOption>,
    pub police_measures: Vec<LookupOption>,
    pub notes_options: Vec<LookupOption>,
}

/// The protest row must load. Junction lists that fail come back empty.
pub async fn load_protest(store: &dyn ProtestStore, id: &str) -> Result<ProtestRecord, AppError> {
    if !is_uuid(id) {
        return Err(AppError::InvalidId);
    }

    let protest = store
        .fetch_protest(id)
        .await
        .map_err(AppError::upstream("Failed to fetch protest"))?
        .ok_or(AppError::NotFound)?;

    let (event_types, participant_types, participant_measures, police_measures, notes) = tokio::join!(
        store.fetch_links(id, MultiSelect::EventTypes),
        store.fetch_links(id, MultiSelect::ParticipantTypes),
        store.fetch_links(id, MultiSelect::ParticipantMeasures),
        store.fetch_links(id, MultiSelect::PoliceMeasures),
        store.fetch_links(id, MultiSelect::Notes),
    );

    let links = |field: MultiSelect, result: Result<Vec<OptionLink>, StoreError>| {
        or_empty(result, field.link_table())
    };

    info!("Loaded protest {id}");

    Ok(ProtestRecord {
        protest,
        event_types: links(MultiSelect::EventTypes, event_types),
        participant_types: links(MultiSelect::ParticipantTypes, participant_types),
        participant_measures: links(MultiSelect::ParticipantMeasures, participant_measures),
        police_measures: links(MultiSelect::PoliceMeasures, police_measures),
        notes: links(MultiSelect::Notes, notes),
    })
}

pub async fn load_form_options(store: &dyn ProtestStore) -> FormOptions {
    let (states, event_types, participant_types, participant_measures, police_measures, notes) = tokio::join!(
        store.fetch_states(),
        store.fetch_options(MultiSelect::EventTypes),
        store.fetch_options(MultiSelect::ParticipantTypes),
        store.fetch_options(MultiSelect::ParticipantMeasures),
        store.fetch_options(MultiSelect::PoliceMeasures),
        store.fetch_options(MultiSelect::Notes),
    );

    FormOptions {
        states: or_empty(states, "states"),
        event_types: or_empty(event_types, MultiSelect::EventTypes.lookup_table()),
        participant_types: or_empty(participant_types, MultiSelect::ParticipantTypes.lookup_table()),
        participant_measures: or_empty(
            participant_measures,
            MultiSelect::ParticipantMeasures.lookup_table(),
        ),
        police_measures: or_empty(police_measures, MultiSelect::PoliceMeasures.lookup_table()),
        notes_options: or_empty(notes, MultiSelect::Notes.lookup_table()),
    }
}
