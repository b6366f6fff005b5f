use lambda_http::{run, service_fn, tracing, Error, Request};
use pothole_shared::{store_from_config, AppState, Config};
use std::sync::Arc;

mod http_handler;

#[tokio::main]
async fn main() -> Result<(), Error> {
    tracing::init_default_subscriber();

    let config = Config::load()?;

    // Initialize the store once at startup
    let store = store_from_config(&config).await;
    match store.connect().await {
        Ok(()) => tracing::info!("Connected to {}", store.backend_tag()),
        Err(e) => tracing::error!("Error connecting to {}: {}", store.backend_tag(), e),
    }

    let state = AppState::new(store, config);

    run(service_fn(move |event: Request| {
        let state = Arc::clone(&state);
        async move { http_handler::function_handler(event, state).await }
    }))
    .await
}
