use tokio::net::TcpListener;
use tracing_subscriber::{filter::LevelFilter, EnvFilter};

const DEFAULT_ROOT_TOKEN: &str = "root-token";

#[tokio::main]
async fn main() -> Result<(), std::io::Error> {
    init_logging();

    let port = std::env::var("PORT").unwrap_or_else(|_| "3000".to_string());
    let root_token = std::env::var("ROOT_TOKEN").unwrap_or_else(|_| {
        tracing::warn!("ROOT_TOKEN not set, using {DEFAULT_ROOT_TOKEN}");
        DEFAULT_ROOT_TOKEN.to_string()
    });

    let addr = format!("127.0.0.1:{port}");
    let listener = TcpListener::bind(&addr).await?;
    tracing::info!("listening on {addr}");
    mock_server::run(listener, &root_token).await
}

fn init_logging() {
    let env_filter = EnvFilter::builder()
        .with_default_directive(LevelFilter::INFO.into())
        .from_env_lossy();

    tracing_subscriber::fmt()
        .with_target(false)
        .with_env_filter(env_filter)
        .init();
}
