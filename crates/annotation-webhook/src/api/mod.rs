use tracing::Span;

use crate::admission::review::{AdmissionRequest, AdmissionResponse};

pub mod api_error;
pub mod handlers;
pub mod state;

pub(crate) fn populate_span_with_admission_request_data(adm_req: &AdmissionRequest) {
    Span::current().record("kind", adm_req.kind.kind.as_str());
    Span::current().record("kind_group", adm_req.kind.group.as_str());
    Span::current().record("kind_version", adm_req.kind.version.as_str());
    Span::current().record("name", adm_req.name.as_deref().unwrap_or_default());
    Span::current().record(
        "namespace",
        adm_req.namespace.as_deref().unwrap_or_default(),
    );
    Span::current().record("operation", adm_req.operation.as_str());
    Span::current().record("request_uid", adm_req.uid.as_str());
    if let Some(resource) = &adm_req.resource {
        Span::current().record("resource", resource.resource.as_str());
    }
    Span::current().record(
        "subresource",
        adm_req.sub_resource.as_deref().unwrap_or_default(),
    );
}

pub(crate) fn populate_span_with_admission_response_data(response: &AdmissionResponse) {
    Span::current().record("allowed", response.allowed);
    Span::current().record("mutated", response.patch.is_some());
    if let Some(status) = &response.status {
        if let Some(code) = &status.code {
            Span::current().record("response_code", code);
        }
        if let Some(message) = &status.message {
            Span::current().record("response_message", message.as_str());
        }
    }
}
