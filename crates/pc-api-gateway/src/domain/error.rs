//! Gateway-level errors and the wire-error JSON shape for `/burst` (§6-7).

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use round_engine::RoundEngineError;
use serde::Serialize;

/// `submitNonce` error reply body: `{"errorCode":"N","errorDescription":"…"}`.
/// `errorCode` is a string on the wire even though `WireErrorCode::code`
/// is numeric internally.
#[derive(Debug, Serialize)]
pub struct WireError {
    #[serde(rename = "errorCode")]
    error_code: String,
    #[serde(rename = "errorDescription")]
    error_description: String,
}

/// Renders a round-engine error as the HTTP response the wire contract
/// expects: a plain 429 body for rate limiting, a `WireError` JSON body with
/// the mapped status for everything else.
pub fn render_error(error: &RoundEngineError) -> Response {
    let status = StatusCode::from_u16(error.http_status()).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);

    if matches!(error, RoundEngineError::RateLimited) {
        return (status, "limit exceeded").into_response();
    }

    let error_code = match error {
        RoundEngineError::SubmissionRejected { code, .. } => code.code().to_string(),
        _ => "0".to_string(),
    };
    let body = WireError { error_code, error_description: error.to_string() };
    (status, Json(body)).into_response()
}

#[cfg(test)]
mod tests {
    use round_engine::WireErrorCode;

    use super::*;

    #[test]
    fn rate_limit_renders_as_bare_429_body() {
        let response = render_error(&RoundEngineError::RateLimited);
        assert_eq!(response.status(), StatusCode::TOO_MANY_REQUESTS);
    }

    #[test]
    fn submission_rejection_carries_stringified_code() {
        let error = RoundEngineError::SubmissionRejected {
            code: WireErrorCode::WrongHeight,
            message: "blockheight 5 does not match current round 6".to_string(),
        };
        assert_eq!(error.http_status(), 400);
    }
}
