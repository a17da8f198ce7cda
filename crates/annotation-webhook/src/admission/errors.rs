use axum::http::StatusCode;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AdmissionError>;

#[derive(Debug, Error)]
pub enum AdmissionError {
    #[error("could not read request body: {0}")]
    MalformedBody(String),

    #[error("could not decode request body: {0}")]
    InvalidEnvelope(#[source] serde_json::Error),

    #[error("expected {expected} object, got {actual}")]
    UnsupportedKind { expected: String, actual: String },

    #[error("could not decode {kind} object: {reason}")]
    InvalidObjectBody { kind: String, reason: String },

    #[error("error creating patch: {0}")]
    PatchEncoding(#[source] serde_json::Error),

    #[error("the object has been mutated but no patch was built for it")]
    MissingPatch,

    #[error("error encoding admission review response: {0}")]
    ResponseEncoding(#[source] serde_json::Error),
}

impl AdmissionError {
    /// The HTTP status code to be returned to the API server.
    /// Problems caused by the incoming review are client errors, everything
    /// else is on us.
    pub fn status_code(&self) -> StatusCode {
        match self {
            AdmissionError::MalformedBody(_)
            | AdmissionError::InvalidEnvelope(_)
            | AdmissionError::UnsupportedKind { .. }
            | AdmissionError::InvalidObjectBody { .. } => StatusCode::BAD_REQUEST,
            AdmissionError::PatchEncoding(_)
            | AdmissionError::MissingPatch
            | AdmissionError::ResponseEncoding(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}
