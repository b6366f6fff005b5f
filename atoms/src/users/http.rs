use lambda_http::{http::StatusCode, Body, Error, Request, Response};

use super::model::{CreateUserPayload, LoginPayload};
use super::service::{create_user, validate_login};
use crate::http_utils::{decode_payload, json_response, malformed_body, server_error};
use crate::store::DocumentStore;

/// HTTP Handler: POST /addUser
pub async fn add_user_handler(
    store: &dyn DocumentStore,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let payload: CreateUserPayload = match decode_payload(event) {
        Ok(payload) => payload,
        Err(e) => return malformed_body(&e),
    };

    match create_user(store, payload).await {
        Ok(user) => json_response(
            StatusCode::CREATED,
            &serde_json::json!({"message": "User added successfully", "id": user.user_id}),
        ),
        Err(e) => {
            tracing::error!("Error adding user: {}", e);
            server_error()
        }
    }
}

/// HTTP Handler: POST /validateLogin
pub async fn validate_login_handler(
    store: &dyn DocumentStore,
    event: &Request,
) -> Result<Response<Body>, Error> {
    let payload: LoginPayload = match decode_payload(event) {
        Ok(payload) => payload,
        Err(e) => return malformed_body(&e),
    };

    match validate_login(store, payload.name.as_deref(), payload.password.as_deref()).await {
        Ok(true) => json_response(
            StatusCode::OK,
            &serde_json::json!({"message": "Login successful"}),
        ),
        Ok(false) => json_response(
            StatusCode::UNAUTHORIZED,
            &serde_json::json!({"message": "Invalid credentials"}),
        ),
        Err(e) => {
            tracing::error!("Error validating login: {}", e);
            server_error()
        }
    }
}
