//! # Supabase
//!
//! Hosted Postgres behind PostgREST. We never talk SQL, only:
//!
//! - `GET /rest/v1/<table>?select=...&<column>=eq.<value>` for reads
//! - `POST /rest/v1/rpc/<function>` for the submit and search procedures
//!
//! ## Tables
//!
//! - `protests`: one row per event, see [`ProtestRow::COLUMNS`]
//! - `protest_event_types`, `protest_participant_types`, `protest_participant_measures`,
//!   `protest_police_measures`, `protest_notes`: junction rows `(protest_id, <option>_id, other_value)`
//! - `states`, `event_types`, `participant_types`, `participant_measures`, `police_measures`,
//!   `notes_options`: lookup lists shown on the form
//!
//! ## Procedures
//!
//! - `submit_protest(protest_data, event_types_data, ...)`: writes the row and its junctions in one
//!   transaction, returns the new id
//! - `search_protests_for_reference(query_text, limit_count, offset_count)`: ranked text search
//!
//! Errors come back as `{code, message, details, hint}`. `42883` / `PGRST202` mean the function is missing.
use std::time::Duration;

use async_trait::async_trait;
use catalog::{LookupOption, MultiSelect, OptionLink, ProtestRow, StateOption, SubmissionPayload};
use reqwest::{
    Client, RequestBuilder, StatusCode,
    header::{AUTHORIZATION, HeaderMap, HeaderValue},
};
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Value, json};
use thiserror::Error;

use crate::search::SearchHit;

pub const SUBMIT_RPC: &str = "submit_protest";
pub const SEARCH_RPC: &str = "search_protests_for_reference";

const SEARCH_COLUMNS: &str =
    "id,title,date_of_event,locality,state_code,claims_summary,organization_name,created_at";

#[derive(Error, Debug)]
pub enum StoreError {
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    #[error("Store returned {status}: {message} (code {code})")]
    Api {
        status: StatusCode,
        code: String,
        message: String,
        details: Option<String>,
    },

    #[error("Store response carried no id")]
    MissingId,

    #[error("Invalid header value: {0}")]
    Header(#[from] reqwest::header::InvalidHeaderValue),
}

impl StoreError {
    /// The procedure is not deployed. Search falls back to a plain column scan.
    pub fn is_missing_function(&self) -> bool {
        match self {
            StoreError::Api { code, message, .. } => {
                code == "42883"
                    || code == "PGRST202"
                    || message.contains("function")
                    || message.contains("does not exist")
            }
            _ => false,
        }
    }
}

#[derive(Deserialize, Default)]
struct ApiErrorBody {
    #[serde(default)]
    code: Option<String>,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    details: Option<String>,
}

#[async_trait]
pub trait ProtestStore: Send + Sync {
    /// Writes the protest and its junction rows, returning the new id.
    async fn submit_protest(&self, payload: &SubmissionPayload) -> Result<String, StoreError>;

    async fn fetch_protest(&self, id: &str) -> Result<Option<ProtestRow>, StoreError>;

    async fn fetch_links(&self, id: &str, field: MultiSelect) -> Result<Vec<OptionLink>, StoreError>;

    async fn fetch_states(&self) -> Result<Vec<StateOption>, StoreError>;

    async fn fetch_options(&self, field: MultiSelect) -> Result<Vec<LookupOption>, StoreError>;

    async fn search_rpc(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SearchHit>, StoreError>;

    /// Case-insensitive substring match over `locality`, `organization_name`, `title`, `claims_summary`.
    async fn search_columns(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SearchHit>, StoreError>;
}

pub struct SupabaseStore {
    client: Client,
    rest_url: String,
}

impl SupabaseStore {
    pub fn new(supabase_url: &str, api_key: &str, timeout: Duration) -> Result<Self, StoreError> {
        let mut headers = HeaderMap::new();
        headers.insert("apikey", HeaderValue::from_str(api_key)?);
        headers.insert(
            AUTHORIZATION,
            HeaderValue::from_str(&format!("Bearer {api_key}"))?,
        );

        let client = Client::builder()
            .default_headers(headers)
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            rest_url: format!("{}/rest/v1", supabase_url.trim_end_matches('/')),
        })
    }

    fn table(&self, table: &str) -> RequestBuilder {
        self.client.get(format!("{}/{table}", self.rest_url))
    }

    fn rpc<B: Serialize + ?Sized>(&self, function: &str, body: &B) -> RequestBuilder {
        self.client
            .post(format!("{}/rpc/{function}", self.rest_url))
            .json(body)
    }
}

async fn send<T: DeserializeOwned>(request: RequestBuilder) -> Result<T, StoreError> {
    let response = request.send().await?;
    let status = response.status();

    if !status.is_success() {
        let body: ApiErrorBody = response.json().await.unwrap_or_default();

        return Err(StoreError::Api {
            status,
            code: body.code.unwrap_or_default(),
            message: body.message.unwrap_or_else(|| status.to_string()),
            details: body.details,
        });
    }

    Ok(response.json().await?)
}

/// The RPC may answer with a bare id, `{id}`, or a one-row set of either.
pub fn extract_id(value: &Value) -> Option<String> {
    match value {
        Value::String(id) if !id.is_empty() => Some(id.clone()),
        Value::Object(map) => map.get("id").and_then(extract_id),
        Value::Array(rows) => rows.first().and_then(extract_id),
        _ => None,
    }
}

/// PostgREST `or=(...)` filter. The pattern is double-quoted so commas and parens in the query stay literal.
pub fn ilike_filter(query: &str) -> String {
    let escaped = query.replace('\\', "\\\\").replace('"', "\\\"");
    let pattern = format!("\"*{escaped}*\"");

    let clauses: Vec<String> = ["locality", "organization_name", "title", "claims_summary"]
        .iter()
        .map(|column| format!("{column}.ilike.{pattern}"))
        .collect();

    format!("({})", clauses.join(","))
}

#[derive(Deserialize)]
struct ColumnHit {
    id: String,
    title: Option<String>,
    date_of_event: Option<String>,
    locality: Option<String>,
    state_code: Option<String>,
    claims_summary: Option<String>,
    organization_name: Option<String>,
    created_at: Option<String>,
}

impl From<ColumnHit> for SearchHit {
    fn from(hit: ColumnHit) -> Self {
        SearchHit {
            id: hit.id,
            title: hit.title,
            date_of_event: hit.date_of_event,
            locality: hit.locality,
            state_code: hit.state_code,
            claims_summary: hit.claims_summary,
            organization_name: hit.organization_name,
            rank: Some(1.0),
            submission_date: hit.created_at,
        }
    }
}

#[async_trait]
impl ProtestStore for SupabaseStore {
    async fn submit_protest(&self, payload: &SubmissionPayload) -> Result<String, StoreError> {
        let response: Value = send(self.rpc(SUBMIT_RPC, payload)).await?;

        extract_id(&response).ok_or(StoreError::MissingId)
    }

    async fn fetch_protest(&self, id: &str) -> Result<Option<ProtestRow>, StoreError> {
        let rows: Vec<ProtestRow> = send(self.table("protests").query(&[
            ("select", ProtestRow::COLUMNS.to_string()),
            ("id", format!("eq.{id}")),
        ]))
        .await?;

        Ok(rows.into_iter().next())
    }

    async fn fetch_links(&self, id: &str, field: MultiSelect) -> Result<Vec<OptionLink>, StoreError> {
        let select = if field.has_other() {
            format!("{},other_value", field.link_column())
        } else {
            field.link_column().to_string()
        };

        send(self.table(field.link_table()).query(&[
            ("select", select),
            ("protest_id", format!("eq.{id}")),
        ]))
        .await
    }

    async fn fetch_states(&self) -> Result<Vec<StateOption>, StoreError> {
        send(
            self.table("states")
                .query(&[("select", "*"), ("order", "name")]),
        )
        .await
    }

    async fn fetch_options(&self, field: MultiSelect) -> Result<Vec<LookupOption>, StoreError> {
        send(
            self.table(field.lookup_table())
                .query(&[("select", "*"), ("order", "name")]),
        )
        .await
    }

    async fn search_rpc(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let body = json!({
            "query_text": query,
            "limit_count": limit,
            "offset_count": offset,
        });

        send(self.rpc(SEARCH_RPC, &body)).await
    }

    async fn search_columns(
        &self,
        query: &str,
        limit: u32,
        offset: u32,
    ) -> Result<Vec<SearchHit>, StoreError> {
        let hits: Vec<ColumnHit> = send(self.table("protests").query(&[
            ("select", SEARCH_COLUMNS.to_string()),
            ("or", ilike_filter(query)),
            ("order", "date_of_event.desc".to_string()),
            ("limit", limit.to_string()),
            ("offset", offset.to_string()),
        ]))
        .await?;

        Ok(hits.into_iter().map(SearchHit::from).collect())
    }
}
