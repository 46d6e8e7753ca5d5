// Proxy request handlers

use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Json, Response};
use bytes::Bytes;
use serde_json::{json, Value};

use super::error::ProxyError;
use super::gemini;
use super::groq::{self, GroqChatRequest};
use super::AppState;
use crate::ratelimit::RateDecision;

// Root endpoint
pub async fn root() -> Json<Value> {
    Json(json!({
        "message": "LinguaVox Groq proxy",
        "endpoints": ["POST /api/generate"]
    }))
}

/// Bare OPTIONS (non-preflight) short-circuits with an empty success;
/// real preflights are answered by the CORS layer before reaching here.
pub async fn preflight() -> StatusCode {
    StatusCode::NO_CONTENT
}

pub async fn generate(
    State(state): State<AppState>,
    headers: HeaderMap,
    body: Bytes,
) -> Response {
    let request_id = uuid::Uuid::new_v4().to_string();
    match handle_generate(&state, &headers, &body, &request_id).await {
        Ok(envelope) => Json(envelope).into_response(),
        Err(err) => err.into_response(),
    }
}

async fn handle_generate(
    state: &AppState,
    headers: &HeaderMap,
    body: &[u8],
    request_id: &str,
) -> Result<Value, ProxyError> {
    // Config guard: the deployment is broken without the credential.
    if state.config.groq_api_key.is_empty() {
        tracing::error!("GROQ_API_KEY is not configured, request_id={}", request_id);
        return Err(ProxyError::MissingApiKey);
    }

    // Rate limiting is optional hardening: no bound store, no limiting.
    if let Some(limiter) = &state.limiter {
        let ip = headers
            .get(state.config.client_ip_header.as_str())
            .and_then(|v| v.to_str().ok())
            .unwrap_or("unknown");
        let decision = limiter
            .check(ip, chrono::Utc::now())
            .await
            .inspect_err(|err| {
                tracing::error!(
                    "Rate limit store failure: {} ip={} request_id={}",
                    err,
                    ip,
                    request_id
                );
            })?;
        match decision {
            RateDecision::Limited { count } => {
                tracing::warn!(
                    "Rate limit hit: ip={} count={} request_id={}",
                    ip,
                    count,
                    request_id
                );
                return Err(ProxyError::RateLimited);
            }
            RateDecision::Allowed { .. } => {}
        }
    }

    let raw: Value = serde_json::from_slice(body).map_err(|e| {
        tracing::error!("Unparseable request body: {} request_id={}", e, request_id);
        ProxyError::Internal(format!("invalid request body: {e}"))
    })?;

    let input = gemini::extract_input(&raw);
    let upstream_request = GroqChatRequest::from_input(&input, &state.config.model);

    let reply = state
        .groq
        .chat_completion(&state.config.groq_api_key, &upstream_request)
        .await
        .inspect_err(|err| {
            tracing::error!("Upstream call failed: {} request_id={}", err, request_id);
        })?;

    Ok(gemini::success_envelope(groq::completion_text(&reply)))
}
