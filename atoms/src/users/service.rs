use super::model::{CreateUserPayload, User};
use crate::store::{DocumentStore, StoreError};

/// Insert a new user. Names are not checked for uniqueness.
pub async fn create_user(
    store: &dyn DocumentStore,
    payload: CreateUserPayload,
) -> Result<User, StoreError> {
    let user = User {
        user_id: uuid::Uuid::new_v4().to_string(),
        name: payload.name,
        password: payload.password,
        access: payload.access,
    };

    store.insert_user(&user).await?;
    Ok(user)
}

/// True when some user has exactly this name and password. Missing
/// credentials never match.
pub async fn validate_login(
    store: &dyn DocumentStore,
    name: Option<&str>,
    password: Option<&str>,
) -> Result<bool, StoreError> {
    let (Some(name), Some(password)) = (name, password) else {
        return Ok(false);
    };

    Ok(store.find_user(name, password).await?.is_some())
}
