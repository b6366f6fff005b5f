pub mod config;

use aws_sdk_dynamodb::Client as DynamoClient;
use pothole_atoms::{DocumentStore, DynamoStore, MemoryStore};
use std::sync::Arc;

pub use config::{Config, ConfigError, StoreBackend};

/// Shared application state
pub struct AppState {
    pub store: Arc<dyn DocumentStore>,
    pub config: Config,
}

impl AppState {
    pub fn new(store: Arc<dyn DocumentStore>, config: Config) -> Arc<Self> {
        Arc::new(Self { store, config })
    }
}

/// Build the store selected by `config`. AWS clients are created once here at
/// startup.
pub async fn store_from_config(config: &Config) -> Arc<dyn DocumentStore> {
    match config.store_backend {
        StoreBackend::Memory => Arc::new(MemoryStore::new()),
        StoreBackend::DynamoDb => {
            let sdk_config = aws_config::load_from_env().await;
            let mut builder = aws_sdk_dynamodb::config::Builder::from(&sdk_config);
            if let Some(endpoint) = &config.dynamodb_endpoint {
                builder = builder.endpoint_url(endpoint);
            }
            Arc::new(DynamoStore::new(
                DynamoClient::from_conf(builder.build()),
                &config.database_name,
            ))
        }
    }
}
