use k8s_openapi::api::core::v1::Pod;
use serde::Deserialize;

use crate::admission::errors::{AdmissionError, Result};
use crate::admission::review::AdmissionReviewRequest;

/// Decode the raw body of an admission review and extract the object it
/// carries.
///
/// The kind check happens before the object is parsed: a review for any
/// other kind means the webhook has been registered for resources it does
/// not handle, the request must be rejected instead of being allowed.
pub fn decode(body: &[u8], registered_kind: &str) -> Result<(AdmissionReviewRequest, Pod)> {
    let review: AdmissionReviewRequest =
        serde_json::from_slice(body).map_err(AdmissionError::InvalidEnvelope)?;

    if review.request.kind.kind != registered_kind {
        return Err(AdmissionError::UnsupportedKind {
            expected: registered_kind.to_owned(),
            actual: review.request.kind.kind.clone(),
        });
    }

    let object = review
        .request
        .object
        .as_ref()
        .ok_or_else(|| AdmissionError::InvalidObjectBody {
            kind: registered_kind.to_owned(),
            reason: "the request does not carry any object".to_owned(),
        })?;

    let pod = Pod::deserialize(object).map_err(|e| AdmissionError::InvalidObjectBody {
        kind: registered_kind.to_owned(),
        reason: e.to_string(),
    })?;

    Ok((review, pod))
}
