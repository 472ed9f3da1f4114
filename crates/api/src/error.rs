use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use tracing::warn;

use common::{Error, ErrorKind};

/// A failed request. Validation failures become `400` (the page shows them
/// as a blocking alert); everything else happened after submission and
/// becomes `502` with the message shown inline.
#[derive(Debug)]
pub struct ApiError(pub Error);

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        ApiError(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let kind = self.0.kind();
        let status = match kind {
            ErrorKind::Validation => StatusCode::BAD_REQUEST,
            ErrorKind::Transaction => {
                warn!(error = %self.0, "Escrow request failed");
                StatusCode::BAD_GATEWAY
            }
        };
        (
            status,
            Json(json!({ "kind": kind, "error": self.0.to_string() })),
        )
            .into_response()
    }
}
