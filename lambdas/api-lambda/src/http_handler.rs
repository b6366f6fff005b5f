use lambda_http::{
    http::{
        header::{
            HeaderValue, ACCESS_CONTROL_ALLOW_HEADERS, ACCESS_CONTROL_ALLOW_METHODS,
            ACCESS_CONTROL_ALLOW_ORIGIN,
        },
        Method, StatusCode,
    },
    Body, Error, Request, Response,
};
use pothole_atoms::http_utils::{error_response, percent_decode};
use pothole_atoms::{reports, users, ReportFilter};
use pothole_shared::AppState;
use std::sync::Arc;

/// Single-segment routes, for telling a wrong method from an unknown path.
const ROUTES: [&str; 8] = [
    "addUser",
    "validateLogin",
    "uploadImage",
    "updateImage",
    "getAllCases",
    "getAllPending",
    "getAllResolved",
    "getAllSentByUser",
];

/// Any origin, on every response.
fn with_cors_headers(mut resp: Response<Body>) -> Response<Body> {
    let headers = resp.headers_mut();
    headers.insert(ACCESS_CONTROL_ALLOW_ORIGIN, HeaderValue::from_static("*"));
    resp
}

fn finalize_response(resp: Result<Response<Body>, Error>) -> Result<Response<Body>, Error> {
    resp.map(with_cors_headers)
}

fn preflight() -> Result<Response<Body>, Error> {
    let resp = Response::builder()
        .status(StatusCode::NO_CONTENT)
        .header(
            ACCESS_CONTROL_ALLOW_METHODS,
            "GET,HEAD,PUT,PATCH,POST,DELETE",
        )
        .header(ACCESS_CONTROL_ALLOW_HEADERS, "Content-Type")
        .body(Body::Empty)
        .map_err(Box::new)?;
    finalize_response(Ok(resp))
}

/// Main Lambda handler - routes each request to exactly one endpoint
pub(crate) async fn function_handler(
    event: Request,
    state: Arc<AppState>,
) -> Result<Response<Body>, Error> {
    let method = event.method();
    let path = event.uri().path();
    tracing::info!("Method: {} Path: {}", method, path);

    // Handle CORS preflight
    if *method == Method::OPTIONS {
        return preflight();
    }

    if event.body().len() > state.config.max_body_bytes {
        tracing::warn!(
            "Rejecting {} byte body on {} (limit {})",
            event.body().len(),
            path,
            state.config.max_body_bytes
        );
        return finalize_response(error_response(
            StatusCode::PAYLOAD_TOO_LARGE,
            "Request body too large",
        ));
    }

    let store = state.store.as_ref();
    let parts: Vec<&str> = path.split('/').filter(|s| !s.is_empty()).collect();

    let resp = match (method, parts.as_slice()) {
        // --- USERS ---
        (&Method::POST, ["addUser"]) => users::add_user_handler(store, &event).await,
        (&Method::POST, ["validateLogin"]) => users::validate_login_handler(store, &event).await,

        // --- REPORTS ---
        (&Method::POST, ["uploadImage"]) => reports::upload_image_handler(store, &event).await,
        (&Method::PUT, ["updateImage"]) => reports::update_image_handler(store, &event).await,
        (&Method::PUT, ["markAsResolved", report_id]) => {
            reports::mark_as_resolved_handler(
                store,
                &percent_decode(report_id),
                &event,
                state.config.require_owner_on_resolve,
            )
            .await
        }
        (&Method::GET, ["getAllCases"]) => {
            reports::list_reports_handler(store, ReportFilter::All, "cases").await
        }
        (&Method::GET, ["getAllPending"]) => {
            reports::list_reports_handler(store, ReportFilter::Resolved(false), "pending cases")
                .await
        }
        (&Method::GET, ["getAllResolved"]) => {
            reports::list_reports_handler(store, ReportFilter::Resolved(true), "resolved cases")
                .await
        }
        (&Method::POST, ["getAllSentByUser"]) => {
            reports::sent_by_user_handler(store, &event).await
        }

        (_, [route]) if ROUTES.contains(route) => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        (_, ["markAsResolved", _]) => {
            error_response(StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
        }
        _ => error_response(StatusCode::NOT_FOUND, "Not found"),
    };

    finalize_response(resp)
}
