//! # Reference search
//!
//! Lets a submitter find the protest a correction or additional source refers to.
//!
//! - Queries shorter than [`MIN_QUERY_LEN`] return an empty result without touching the store
//! - `limit` defaults to [`DEFAULT_LIMIT`] and is capped at [`MAX_LIMIT`], `offset` defaults to `0`
//! - Unparsable `limit` / `offset` fall back to their defaults
//! - Ranked search goes through the `search_protests_for_reference` procedure. When the procedure is
//!   not deployed we fall back to an `ilike` scan, where every hit gets rank `1.0`
//!
//! `hasMore` is `true` when a full page came back, the store gives no total count.
use std::collections::HashMap;

use serde::{Deserialize, Serialize};
use tracing::warn;

use crate::{database::ProtestStore, error::AppError};

pub const MIN_QUERY_LEN: usize = 3;
pub const DEFAULT_LIMIT: u32 = 10;
pub const MAX_LIMIT: u32 = 50;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchHit {
    pub id: String,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub date_of_event: Option<String>,
    #[serde(default)]
    pub locality: Option<String>,
    #[serde(default)]
    pub state_code: Option<String>,
    #[serde(default)]
    pub claims_summary: Option<String>,
    #[serde(default)]
    pub organization_name: Option<String>,
    #[serde(default)]
    pub rank: Option<f64>,
    #[serde(default)]
    pub submission_date: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SearchResponse {
    pub results: Vec<SearchHit>,
    pub query: String,
    pub total: usize,
    pub has_more: bool,
}

impl SearchResponse {
    fn empty(query: String) -> Self {
        Self {
            results: Vec::new(),
            query,
            total: 0,
            has_more: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SearchParams {
    pub query: String,
    pub limit: u32,
    pub offset: u32,
}

impl SearchParams {
    pub fn from_query(params: &HashMap<String, String>) -> Self {
        let query = params
            .get("q")
            .map(|q| q.trim().to_string())
            .unwrap_or_default();

        let limit = params
            .get("limit")
            .and_then(|l| l.trim().parse::<u32>().ok())
            .filter(|&l| l > 0)
            .unwrap_or(DEFAULT_LIMIT)
            .min(MAX_LIMIT);

        let offset = params
            .get("offset")
            .and_then(|o| o.trim().parse::<u32>().ok())
            .unwrap_or(0);

        Self {
            query,
            limit,
            offset,
        }
    }
}

pub async fn search_protests(
    store: &dyn ProtestStore,
    params: SearchParams,
) -> Result<SearchResponse, AppError> {
    if params.query.chars().count() < MIN_QUERY_LEN {
        return Ok(SearchResponse::empty(params.query));
    }

    let results = match store
        .search_rpc(&params.query, params.limit, params.offset)
        .await
    {
        Ok(results) => results,
        Err(e) if e.is_missing_function() => {
            warn!("Search procedure unavailable, falling back to column scan: {e}");

            store
                .search_columns(&params.query, params.limit, params.offset)
                .await
                .map_err(AppError::upstream("Failed to search protests"))?
                .into_iter()
                .map(with_fallback_defaults)
                .collect()
        }
        Err(e) => return Err(AppError::upstream("Failed to search protests")(e)),
    };

    Ok(SearchResponse {
        total: results.len(),
        has_more: results.len() as u32 == params.limit,
        query: params.query,
        results,
    })
}

fn with_fallback_defaults(mut hit: SearchHit) -> SearchHit {
    hit.rank = Some(1.0);
    if hit.title.as_deref().is_none_or(str::is_empty) {
        hit.title = Some("Untitled Event".to_string());
    }
    hit
}
