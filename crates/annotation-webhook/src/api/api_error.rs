use axum::{
    http::{header, StatusCode},
    response::IntoResponse,
};

use crate::admission::errors::AdmissionError;

#[derive(Debug)]
/// An error that can be returned by the API.
/// It's turned into a plain text response, the API server logs the body
/// verbatim when a webhook call fails.
pub struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl From<AdmissionError> for ApiError {
    fn from(error: AdmissionError) -> Self {
        Self {
            status: error.status_code(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (
            self.status,
            [(header::CONTENT_TYPE, mime::TEXT_PLAIN_UTF_8.as_ref())],
            self.message,
        )
            .into_response()
    }
}
