use axum::{
    body::Body,
    extract,
    http::{header, StatusCode},
    response::IntoResponse,
};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::{
    admission::{encoder, errors::AdmissionError},
    api::{
        api_error::ApiError, populate_span_with_admission_request_data,
        populate_span_with_admission_response_data, state::ApiServerState,
    },
};

#[tracing::instrument(
    name = "mutate",
    fields(
        request_uid=tracing::field::Empty,
        host=crate::config::HOSTNAME.as_str(),
        name=tracing::field::Empty,
        namespace=tracing::field::Empty,
        operation=tracing::field::Empty,
        subresource=tracing::field::Empty,
        kind_group=tracing::field::Empty,
        kind_version=tracing::field::Empty,
        kind=tracing::field::Empty,
        resource=tracing::field::Empty,
        allowed=tracing::field::Empty,
        mutated=tracing::field::Empty,
        response_code=tracing::field::Empty,
        response_message=tracing::field::Empty,
    ),
    skip_all)]
/// Annotate the object carried by an admission review.
///
/// The body is read by hand, instead of going through the `Json`
/// extractor, so that every failure is reported with the same plain text
/// format and the size limit is under our control.
pub(crate) async fn mutate_handler(
    extract::State(state): extract::State<Arc<ApiServerState>>,
    body: Body,
) -> Result<impl IntoResponse, ApiError> {
    let body = axum::body::to_bytes(body, state.max_body_size)
        .await
        .map_err(|e| AdmissionError::MalformedBody(e.to_string()))
        .inspect_err(log_rejection)?;

    let (review, pod) = state.pipeline.decode(&body).inspect_err(log_rejection)?;
    populate_span_with_admission_request_data(&review.request);

    let response = state
        .pipeline
        .decide(&review, &pod)
        .inspect_err(log_rejection)?;
    populate_span_with_admission_response_data(&response.response);

    let body = encoder::to_body(&response).inspect_err(log_rejection)?;
    debug!(response_size = body.len(), "admission review evaluated");

    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, mime::APPLICATION_JSON.as_ref())],
        body,
    ))
}

pub(crate) async fn readiness_handler() -> StatusCode {
    StatusCode::OK
}

fn log_rejection(error: &AdmissionError) {
    warn!(status = error.status_code().as_u16(), error = %error, "cannot process admission review");
}
