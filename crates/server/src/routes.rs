//! Request handlers.

use crate::error::{ApiError, RETRIEVER_UNAVAILABLE, SEARCH_FAILED};
use crate::state::{RetrieverHealth, ServiceState};
use axum::{
    extract::{rejection::JsonRejection, State},
    Json,
};
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};
use simsearch_index::ScoredDocument;
use std::sync::Arc;

/// Liveness message returned by `GET /`.
pub const ONLINE_STATUS: &str = "Similarity Search API is online and ready";

/// Source reported for documents stored without one.
const UNKNOWN_SOURCE: &str = "Unknown";

/// Body of `POST /api/similarity-search`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct QueryRequest {
    /// Caller identifier, logged only
    pub user_id: String,

    /// Free-text query
    pub prompt: String,
}

/// One retrieved document.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SearchResult {
    pub source: String,
    pub content: String,
}

impl From<ScoredDocument> for SearchResult {
    fn from(scored: ScoredDocument) -> Self {
        let source = if scored.document.metadata.source.is_empty() {
            UNKNOWN_SOURCE.to_string()
        } else {
            scored.document.metadata.source
        };

        Self {
            source,
            content: scored.document.content,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SearchResponse {
    pub results: Vec<SearchResult>,
}

/// `GET /`
pub async fn root() -> Json<Value> {
    Json(json!({ "status": ONLINE_STATUS }))
}

/// `POST /api/similarity-search`
pub async fn similarity_search(
    State(state): State<Arc<ServiceState>>,
    payload: Result<Json<QueryRequest>, JsonRejection>,
) -> Result<Json<SearchResponse>, ApiError> {
    let Json(query) = payload.map_err(|rejection| {
        tracing::debug!("Rejected search body: {}", rejection.body_text());
        ApiError::UnprocessableEntity(rejection.body_text())
    })?;

    let retriever = match state.retriever() {
        RetrieverHealth::Ready(retriever) => retriever.clone(),
        RetrieverHealth::Unavailable { reason } => {
            tracing::warn!("Search requested while retriever unavailable: {}", reason);
            return Err(ApiError::ServiceUnavailable(RETRIEVER_UNAVAILABLE.to_string()));
        }
    };

    tracing::info!(user_id = %query.user_id, prompt = %query.prompt, "Similarity search request");

    let documents = retriever.retrieve(&query.prompt).await.map_err(|e| {
        tracing::error!(user_id = %query.user_id, "Similarity search failed: {}", e);
        ApiError::InternalServerError(SEARCH_FAILED.to_string())
    })?;

    let results: Vec<SearchResult> = documents.into_iter().map(SearchResult::from).collect();

    tracing::info!(user_id = %query.user_id, "Returning {} results", results.len());

    Ok(Json(SearchResponse { results }))
}
