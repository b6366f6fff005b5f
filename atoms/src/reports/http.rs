use lambda_http::{http::StatusCode, Body, Error, Request, Response};

use super::model::{ResolvePayload, SubmittedByPayload, UpdateImagePayload, UploadReportPayload};
use super::service::{
    create_report, list_reports, mark_resolved, update_report_image, ReportError,
};
use crate::http_utils::{
    decode_payload, error_response, json_response, malformed_body, server_error,
};
use crate::store::{DocumentStore, ReportFilter};

/// HTTP Handler: POST /uploadImage
pub async fn upload_image_handler(
    store: &dyn DocumentStore,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let payload: UploadReportPayload = match decode_payload(event) {
        Ok(payload) => payload,
        Err(e) => return malformed_body(&e),
    };

    let new_report = match payload.into_new_report() {
        Ok(new_report) => new_report,
        Err(message) => return error_response(StatusCode::BAD_REQUEST, message),
    };

    match create_report(store, new_report).await {
        Ok(report) => json_response(
            StatusCode::CREATED,
            &serde_json::json!({"id": report.report_id}),
        ),
        Err(e) => {
            tracing::error!("Error uploading image: {}", e);
            server_error()
        }
    }
}

/// HTTP Handler: PUT /updateImage
pub async fn update_image_handler(
    store: &dyn DocumentStore,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let payload: UpdateImagePayload = match decode_payload(event) {
        Ok(payload) => payload,
        Err(e) => return malformed_body(&e),
    };

    let (Some(report_id), Some(image)) = (
        payload.id.filter(|s| !s.is_empty()),
        payload.image.filter(|s| !s.is_empty()),
    ) else {
        return error_response(
            StatusCode::BAD_REQUEST,
            "ID and Base64 encoded image are required",
        );
    };

    match update_report_image(store, &report_id, &image).await {
        Ok(report) => json_response(
            StatusCode::OK,
            &serde_json::json!({"message": "Image updated successfully", "id": report.report_id}),
        ),
        Err(ReportError::NotFound) => error_response(StatusCode::NOT_FOUND, "Pothole not found"),
        Err(e) => {
            tracing::error!("Error updating image: {}", e);
            server_error()
        }
    }
}

/// HTTP Handler: PUT /markAsResolved/{id}
///
/// With `require_owner` the body must name the original submitter.
pub async fn mark_as_resolved_handler(
    store: &dyn DocumentStore,
    report_id: &str,
    event: &Request,
    require_owner: bool,
) -> Result<Response<Body>, Error> {
    let payload: ResolvePayload = match decode_payload(event) {
        Ok(payload) => payload,
        Err(e) => return malformed_body(&e),
    };

    let acting_user = if require_owner {
        match payload.submitted_by.as_deref() {
            Some(user) if !user.is_empty() => Some(user),
            _ => return error_response(StatusCode::BAD_REQUEST, "submittedBy is required"),
        }
    } else {
        None
    };

    match mark_resolved(store, report_id, acting_user).await {
        Ok(_) => json_response(
            StatusCode::OK,
            &serde_json::json!({"message": "Pothole marked as resolved"}),
        ),
        Err(ReportError::NotFound) => error_response(StatusCode::NOT_FOUND, "Pothole not found"),
        Err(ReportError::NotOwner) => error_response(
            StatusCode::FORBIDDEN,
            "Only the original submitter can resolve this pothole",
        ),
        Err(e) => {
            tracing::error!("Error marking pothole as resolved: {}", e);
            server_error()
        }
    }
}

/// HTTP Handler: GET /getAllCases, /getAllPending, /getAllResolved
///
/// `label` names the listing in the error log.
pub async fn list_reports_handler(
    store: &dyn DocumentStore,
    filter: ReportFilter,
    label: &str,
) -> Result<Response<Body>, Error> {
    match list_reports(store, &filter).await {
        Ok(reports) => json_response(StatusCode::OK, &reports),
        Err(e) => {
            tracing::error!("Error retrieving {}: {}", label, e);
            server_error()
        }
    }
}

/// HTTP Handler: POST /getAllSentByUser
pub async fn sent_by_user_handler(
    store: &dyn DocumentStore,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let payload: SubmittedByPayload = match decode_payload(event) {
        Ok(payload) => payload,
        Err(e) => return malformed_body(&e),
    };

    let Some(submitted_by) = payload.submitted_by else {
        return error_response(StatusCode::BAD_REQUEST, "submittedBy is required");
    };

    list_reports_handler(store, ReportFilter::SubmittedBy(submitted_by), "user cases").await
}
