//! `/burst` miner-ingress routing (§6): a single endpoint dispatching on
//! `requestType`, accepting either GET query parameters or POST form fields.

use std::collections::HashMap;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::extract::{ConnectInfo, Form, Query, State};
use axum::response::{IntoResponse, Response};
use axum::Json;
use prometheus::Registry;
use round_engine::{RoundEngineError, SubmissionPipeline, WireErrorCode};

use crate::domain::error::render_error;

#[derive(Clone)]
pub struct AppState {
    pub submission_pipeline: Arc<SubmissionPipeline>,
    pub metrics_registry: Arc<Registry>,
}

pub async fn burst_get(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Query(params): Query<HashMap<String, String>>,
) -> Response {
    handle_burst(&state, &params, addr).await
}

pub async fn burst_post(
    State(state): State<AppState>,
    ConnectInfo(addr): ConnectInfo<SocketAddr>,
    Form(params): Form<HashMap<String, String>>,
) -> Response {
    handle_burst(&state, &params, addr).await
}

async fn handle_burst(state: &AppState, params: &HashMap<String, String>, addr: SocketAddr) -> Response {
    match params.get("requestType").map(String::as_str) {
        Some("getMiningInfo") => match state.submission_pipeline.get_mining_info(addr.ip()) {
            Ok(reply) => Json(reply).into_response(),
            Err(e) => render_error(&e),
        },
        Some("submitNonce") => handle_submit_nonce(state, params, addr).await,
        _ => render_error(&RoundEngineError::SubmissionRejected {
            code: WireErrorCode::MalformedAccountId,
            message: "unknown or missing requestType".to_string(),
        }),
    }
}

async fn handle_submit_nonce(state: &AppState, params: &HashMap<String, String>, addr: SocketAddr) -> Response {
    let account_id = match parse_u64(params.get("accountId")) {
        Some(id) => id,
        None => {
            return render_error(&RoundEngineError::SubmissionRejected {
                code: WireErrorCode::MalformedAccountId,
                message: "accountId must be a base-10 u64".to_string(),
            })
        }
    };
    let nonce = match parse_u64(params.get("nonce")) {
        Some(n) => n,
        None => {
            return render_error(&RoundEngineError::SubmissionRejected {
                code: WireErrorCode::MalformedNonce,
                message: "nonce must be a base-10 u64".to_string(),
            })
        }
    };
    let blockheight = match params.get("blockheight") {
        None => None,
        Some(raw) if raw.is_empty() => None,
        Some(raw) => match raw.parse::<u64>() {
            Ok(h) => Some(h),
            Err(_) => {
                return render_error(&RoundEngineError::SubmissionRejected {
                    code: WireErrorCode::WrongHeight,
                    message: "blockheight must be a base-10 u64".to_string(),
                })
            }
        },
    };

    match state.submission_pipeline.submit_nonce(addr.ip(), account_id, nonce, blockheight).await {
        Ok(reply) => Json(reply).into_response(),
        Err(e) => render_error(&e),
    }
}

fn parse_u64(raw: Option<&String>) -> Option<u64> {
    raw.and_then(|s| s.parse::<u64>().ok())
}

pub async fn metrics(State(state): State<AppState>) -> Response {
    match pc_telemetry::encode_metrics(&state.metrics_registry) {
        Ok(text) => ([("content-type", "text/plain; version=0.0.4")], text).into_response(),
        Err(e) => (axum::http::StatusCode::INTERNAL_SERVER_ERROR, e.to_string()).into_response(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_u64_rejects_non_numeric() {
        assert_eq!(parse_u64(Some(&"12a".to_string())), None);
        assert_eq!(parse_u64(Some(&"42".to_string())), Some(42));
        assert_eq!(parse_u64(None), None);
    }
}
