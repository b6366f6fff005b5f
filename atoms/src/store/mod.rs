//! Persistence seam for the two collections.
//!
//! Handlers only ever talk to a [`DocumentStore`]; the concrete backend is
//! picked once at startup and shared through `AppState`.

use async_trait::async_trait;
use thiserror::Error;

use crate::reports::Report;
use crate::users::User;

mod dynamo;
mod memory;

pub use dynamo::DynamoStore;
pub use memory::MemoryStore;

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("{backend} {operation} error: {message}")]
    Backend {
        backend: &'static str,
        operation: &'static str,
        message: String,
    },

    #[error("Malformed {collection} document: {reason}")]
    Malformed {
        collection: &'static str,
        reason: String,
    },
}

/// Single-field equality filter over the `Pothole` collection.
#[derive(Debug, Clone, PartialEq)]
pub enum ReportFilter {
    All,
    Resolved(bool),
    SubmittedBy(String),
}

impl ReportFilter {
    pub fn matches(&self, report: &Report) -> bool {
        match self {
            ReportFilter::All => true,
            ReportFilter::Resolved(resolved) => report.resolved == *resolved,
            ReportFilter::SubmittedBy(user) => report.submitted_by.as_deref() == Some(user.as_str()),
        }
    }
}

/// One call per handler intent. Saves overwrite the whole document and the
/// last write wins.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    fn backend_tag(&self) -> &'static str;

    /// Prepare the backing collections. Called once at startup.
    async fn connect(&self) -> Result<(), StoreError>;

    async fn insert_report(&self, report: &Report) -> Result<(), StoreError>;

    async fn find_report(&self, report_id: &str) -> Result<Option<Report>, StoreError>;

    async fn save_report(&self, report: &Report) -> Result<(), StoreError>;

    async fn find_reports(&self, filter: &ReportFilter) -> Result<Vec<Report>, StoreError>;

    async fn insert_user(&self, user: &User) -> Result<(), StoreError>;

    /// First user whose name and password both match exactly.
    async fn find_user(&self, name: &str, password: &str) -> Result<Option<User>, StoreError>;
}
