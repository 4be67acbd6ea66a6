//! Topology gateway entry point.
//!
//! ```bash
//! CGX_AUTH_TOKEN=... topology-gateway --port 8080
//! topology-gateway -I 127.0.0.1 -P 9000 -M redis://localhost:6379/0 -D
//! ```

use anyhow::Result;
use clap::Parser;
use topology_gateway::{config, server};
use tracing_subscriber::EnvFilter;

/// Read-through caching gateway for controller topology queries.
#[derive(Parser)]
#[command(name = "topology-gateway")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Address to bind (overrides the host part of LISTEN)
    #[arg(short = 'I', long)]
    ip: Option<String>,

    /// Port to bind (overrides the port part of LISTEN)
    #[arg(short = 'P', long)]
    port: Option<u16>,

    /// Comma-separated Redis URLs for the shared cache (overrides REDIS_URL)
    #[arg(short = 'M', long)]
    redis: Option<String>,

    /// Enable debug logging
    #[arg(short = 'D', long)]
    debug: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    // Load environment variables from .env file
    dotenvy::dotenv().ok();

    let cli = Cli::parse();

    let mut config = config::Config::from_env()?;
    apply_cli(&mut config, cli);
    config.validate()?;

    init_tracing(&config)?;
    config.print_summary();

    server::run(config).await
}

fn apply_cli(config: &mut config::Config, cli: Cli) {
    if cli.ip.is_some() || cli.port.is_some() {
        let (host, port) = config
            .listen_addr
            .rsplit_once(':')
            .unwrap_or(("0.0.0.0", "8080"));

        let host = cli.ip.unwrap_or_else(|| host.to_string());
        let port = cli.port.map(|p| p.to_string()).unwrap_or_else(|| port.to_string());
        config.listen_addr = format!("{}:{}", host, port);
    }

    if let Some(redis) = cli.redis {
        config.set_redis_servers(&redis);
    }

    if cli.debug {
        config.log_level = "debug".to_string();
    }
}

fn init_tracing(config: &config::Config) -> Result<()> {
    let filter = EnvFilter::try_new(&config.log_level)?;

    if config.log_format == "json" {
        tracing_subscriber::fmt()
            .json()
            .with_env_filter(filter)
            .init();
    } else {
        tracing_subscriber::fmt().with_env_filter(filter).init();
    }

    Ok(())
}
