pub mod http_utils;
pub mod reports;
pub mod store;
pub mod users;

pub use store::{DocumentStore, DynamoStore, MemoryStore, ReportFilter, StoreError};
