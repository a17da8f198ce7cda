use base64::{engine::general_purpose, Engine as _};

use crate::admission::errors::{AdmissionError, Result};
use crate::admission::policy::PolicyDecision;
use crate::admission::review::{
    AdmissionResponse, AdmissionResponseStatus, AdmissionReviewRequest, AdmissionReviewResponse,
    PatchType,
};

/// Wrap the policy decision into the review sent back to the API server.
///
/// The patch is attached only to `AllowMutated` decisions, which must always
/// come with one: admitting the object without its mutation is an error.
pub fn encode(
    review: &AdmissionReviewRequest,
    decision: &PolicyDecision,
    patch: Option<Vec<u8>>,
) -> Result<AdmissionReviewResponse> {
    let uid = review.request.uid.clone();

    let response = match (decision, patch) {
        (PolicyDecision::AllowMutated(_), Some(patch)) => AdmissionResponse {
            uid,
            allowed: true,
            patch_type: Some(PatchType::JSONPatch),
            patch: Some(general_purpose::STANDARD.encode(patch)),
            status: None,
        },
        (PolicyDecision::AllowMutated(_), None) => return Err(AdmissionError::MissingPatch),
        (PolicyDecision::AllowUnmodified, _) => AdmissionResponse {
            uid,
            allowed: true,
            ..Default::default()
        },
        (PolicyDecision::Deny { message, code }, _) => AdmissionResponse {
            uid,
            allowed: false,
            status: Some(AdmissionResponseStatus {
                message: Some(message.clone()),
                code: *code,
            }),
            ..Default::default()
        },
    };

    Ok(AdmissionReviewResponse::new(review, response))
}

/// Serialize the review, nothing is written back when this fails.
pub fn to_body(review: &AdmissionReviewResponse) -> Result<Vec<u8>> {
    serde_json::to_vec(review).map_err(AdmissionError::ResponseEncoding)
}

#[cfg(test)]
mod tests {
    use super::*;
    use k8s_openapi::api::core::v1::Pod;
    use serde_json::json;

    fn review() -> AdmissionReviewRequest {
        serde_json::from_value(json!({
            "apiVersion": "admission.k8s.io/v1",
            "kind": "AdmissionReview",
            "request": {
                "uid": "0df28fbd-5f5f-11e8-bc74-36e6bb280816",
                "kind": {"group": "", "version": "v1", "kind": "Pod"},
            }
        }))
        .unwrap()
    }

    #[test]
    fn allow_unmodified() {
        let response = encode(&review(), &PolicyDecision::AllowUnmodified, None).unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap(),
            json!({
                "apiVersion": "admission.k8s.io/v1",
                "kind": "AdmissionReview",
                "response": {
                    "uid": "0df28fbd-5f5f-11e8-bc74-36e6bb280816",
                    "allowed": true,
                }
            })
        );
    }

    #[test]
    fn allow_mutated() {
        let patch = br#"[{"op":"add","path":"/metadata/annotations","value":{}}]"#.to_vec();
        let decision = PolicyDecision::AllowMutated(Box::new(Pod::default()));

        let response = encode(&review(), &decision, Some(patch.clone()))
            .unwrap()
            .response;

        assert_eq!(response.uid, "0df28fbd-5f5f-11e8-bc74-36e6bb280816");
        assert!(response.allowed);
        assert_eq!(response.patch_type, Some(PatchType::JSONPatch));
        assert_eq!(
            general_purpose::STANDARD
                .decode(response.patch.unwrap())
                .unwrap(),
            patch
        );
        assert!(response.status.is_none());
    }

    #[test]
    fn allow_mutated_without_patch_is_an_error() {
        let decision = PolicyDecision::AllowMutated(Box::new(Pod::default()));

        let error = encode(&review(), &decision, None).unwrap_err();

        assert!(matches!(error, AdmissionError::MissingPatch));
        assert_eq!(error.status_code(), axum::http::StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn deny() {
        let decision = PolicyDecision::Deny {
            message: "pods are not welcome here".to_owned(),
            code: Some(403),
        };

        let response = encode(&review(), &decision, None).unwrap();

        assert_eq!(
            serde_json::to_value(&response).unwrap()["response"],
            json!({
                "uid": "0df28fbd-5f5f-11e8-bc74-36e6bb280816",
                "allowed": false,
                "status": {"message": "pods are not welcome here", "code": 403},
            })
        );
    }

    #[test]
    fn deny_never_carries_a_patch() {
        let response = encode(
            &review(),
            &PolicyDecision::deny("no"),
            Some(b"[]".to_vec()),
        )
        .unwrap()
        .response;

        assert!(!response.allowed);
        assert!(response.patch.is_none());
        assert_eq!(
            response.status.unwrap().message.as_deref(),
            Some("no")
        );
    }

    #[test]
    fn body_is_json() {
        let response = encode(&review(), &PolicyDecision::AllowUnmodified, None).unwrap();
        let body = to_body(&response).unwrap();

        let value: serde_json::Value = serde_json::from_slice(&body).unwrap();
        assert_eq!(value["response"]["allowed"], json!(true));
    }
}
