use anyhow::Result;
use clap::Parser;
use slowdown::config::Config;
use slowdown::server::Server;
use std::net::SocketAddr;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Serve a single rate-limited endpoint.
#[derive(Debug, Parser)]
#[command(name = "slowdown", version, about)]
struct Args {
    /// Address to bind, overrides SLOWDOWN_BIND_ADDR
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Requests admitted per window, overrides SLOWDOWN_REQUESTS
    #[arg(long)]
    requests: Option<usize>,

    /// Window length in seconds, overrides SLOWDOWN_WINDOW_SECONDS
    #[arg(long)]
    window_seconds: Option<u64>,
}

impl Args {
    fn apply(self, config: &mut Config) {
        if let Some(bind) = self.bind {
            config.bind_addr = bind;
        }
        if let Some(requests) = self.requests {
            config.requests = requests;
        }
        if let Some(window_seconds) = self.window_seconds {
            config.window_seconds = window_seconds;
        }
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenv::dotenv().ok();

    let args = Args::parse();
    let mut config = Config::from_env()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))?;
    args.apply(&mut config);

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
                format!("slowdown={},tower_http=debug", config.log_level).into()
            }),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    tracing::info!("Starting slowdown service");
    tracing::info!(
        "Configuration: bind_addr={}, requests={}, window_seconds={}",
        config.bind_addr,
        config.requests,
        config.window_seconds
    );

    let server = Server::new(config)
        .map_err(|e| anyhow::anyhow!("Failed to create server: {}", e))?;

    server
        .run()
        .await
        .map_err(|e| anyhow::anyhow!("Server error: {}", e))?;

    Ok(())
}
