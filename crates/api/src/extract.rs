use axum::extract::{rejection::JsonRejection, FromRequest};

use common::Error;

use crate::ApiError;

/// `axum::Json` whose rejections (bad syntax, wrong field types, missing
/// content type) come back as validation errors.
#[derive(FromRequest)]
#[from_request(via(axum::Json), rejection(ApiError))]
pub struct JsonBody<T>(pub T);

impl From<JsonRejection> for ApiError {
    fn from(rejection: JsonRejection) -> Self {
        ApiError(Error::validation(rejection.body_text()))
    }
}
