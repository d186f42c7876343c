//! kraftlog Server Binary
//!
//! Replays the metadata log and starts the TCP server.

use std::sync::Arc;

use clap::Parser;
use kraftlog::network::Server;
use kraftlog::{Broker, Config};
use tracing_subscriber::{fmt, EnvFilter};

/// kraftlog Server
#[derive(Parser, Debug)]
#[command(name = "kraftlog-server")]
#[command(about = "Read-only Kafka broker backed by a KRaft log directory")]
#[command(version)]
struct Args {
    /// KRaft log directory
    #[arg(short, long, default_value = "/tmp/kraft-combined-logs")]
    log_dir: String,

    /// Listen address (host:port)
    #[arg(short = 'a', long, default_value = "127.0.0.1:9092")]
    listen: String,

    /// Maximum concurrent connections
    #[arg(short, long, default_value = "10")]
    max_connections: usize,

    /// Read timeout in milliseconds (0 = none)
    #[arg(long, default_value = "0")]
    read_timeout_ms: u64,
}

fn main() {
    // Initialize tracing/logging
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new("info,kraftlog=debug"));

    fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_thread_ids(true)
        .init();

    let args = Args::parse();

    tracing::info!("kraftlog Server v{}", kraftlog::VERSION);
    tracing::info!("Log directory: {}", args.log_dir);
    tracing::info!("Listen address: {}", args.listen);

    let config = Config::builder()
        .log_dir(&args.log_dir)
        .listen_addr(&args.listen)
        .max_connections(args.max_connections)
        .read_timeout_ms(args.read_timeout_ms)
        .build();

    let broker = match Broker::open(&config) {
        Ok(b) => Arc::new(b),
        Err(e) => {
            tracing::error!("Failed to load log directory: {}", e);
            std::process::exit(1);
        }
    };

    let metadata = broker.metadata();
    tracing::info!(
        "Broker ready: {} topics, {} partitions",
        metadata.index().topic_count(),
        metadata.index().partition_count()
    );

    let server = match Server::new(config, broker) {
        Ok(s) => s,
        Err(e) => {
            tracing::error!("Failed to bind: {}", e);
            std::process::exit(1);
        }
    };

    if let Err(e) = server.run() {
        tracing::error!("Server error: {}", e);
        std::process::exit(1);
    }
}
