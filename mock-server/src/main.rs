use std::sync::Arc;

use mock_server::{Device, MockJPush};
use tokio::net::TcpListener;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt().with_env_filter(filter).init();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let app_key = std::env::var("JPUSH_APP_KEY").unwrap_or_else(|_| "test-key".to_string());
    let secret = std::env::var("JPUSH_MASTER_SECRET").unwrap_or_else(|_| "test-secret".to_string());

    // one device so GET /v3/devices/demo works out of the box
    let state = MockJPush::new(&app_key, &secret).with_device("demo", Device::default());

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!(%addr, %app_key, "mock push service listening");
    mock_server::run(listener, Arc::new(state)).await
}
