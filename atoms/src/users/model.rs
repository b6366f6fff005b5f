use serde::Deserialize;

/// Account in the `User` collection. Passwords are stored and compared as
/// plain text.
#[derive(Debug, Clone, PartialEq)]
pub struct User {
    pub user_id: String,
    pub name: Option<String>,
    pub password: Option<String>,
    pub access: Option<String>, // free-text role marker, never checked
}

#[derive(Debug, Default, Deserialize)]
pub struct CreateUserPayload {
    pub name: Option<String>,
    pub password: Option<String>,
    pub access: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
pub struct LoginPayload {
    pub name: Option<String>,
    pub password: Option<String>,
}
