pub mod model;
pub mod service;
pub mod http;

pub use model::{User, CreateUserPayload, LoginPayload};
pub use service::*;
pub use http::*;
