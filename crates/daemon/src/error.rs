// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Maps [`orc_core::ErrorKind`] onto HTTP statuses, per the operational-call
//! propagation policy: start/stop/send/assign errors surface directly to
//! their caller rather than being swallowed.

use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use orc_core::ErrorKind;
use orc_engine::EngineError;
use serde_json::json;

pub struct ApiError(EngineError);

impl From<EngineError> for ApiError {
    fn from(err: EngineError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = status_for(kind);
        let body = Json(json!({
            "error": kind.to_string(),
            "message": self.0.to_string(),
        }));
        (status, body).into_response()
    }
}

fn status_for(kind: ErrorKind) -> StatusCode {
    match kind {
        ErrorKind::NotFound => StatusCode::NOT_FOUND,
        ErrorKind::InvalidState | ErrorKind::InvalidTransition => StatusCode::CONFLICT,
        ErrorKind::Timeout => StatusCode::GATEWAY_TIMEOUT,
        ErrorKind::SpawnFailure | ErrorKind::ParseFailure => StatusCode::INTERNAL_SERVER_ERROR,
        ErrorKind::ResourceExhausted => StatusCode::SERVICE_UNAVAILABLE,
        ErrorKind::UpstreamUnavailable => StatusCode::BAD_GATEWAY,
        ErrorKind::Conflict => StatusCode::CONFLICT,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn not_found_maps_to_404() {
        let err = ApiError(EngineError::SessionNotFound("s1".into()));
        assert_eq!(status_for(err.0.kind()), StatusCode::NOT_FOUND);
    }
}
