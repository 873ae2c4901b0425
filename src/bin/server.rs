//! aetharia-server binary
//!
//! Starts the world core and serves WebSocket sessions until SIGINT.
//!
//! ## Configuration (flags / environment)
//!
//! | Key                   | Default | Description              |
//! |-----------------------|---------|--------------------------|
//! | `PORT`                | `8080`  | WebSocket listening port |
//! | `AETHARIA_WORLD_SEED` | `12345` | Terrain seed             |
//! | `AETHARIA_HEARTBEAT`  | `30000` | Heartbeat period (ms)    |
//! | `AETHARIA_DEBUG`      | unset   | Verbose logging          |

use aetharia::server::Server;
use aetharia::session;
use aetharia::types::ServerConfig;
use anyhow::Result;
use clap::Parser;
use std::sync::Arc;

// ---------------------------------------------------------------------------
// CLI
// ---------------------------------------------------------------------------

#[derive(Parser, Debug)]
#[command(name = "aetharia-server", about = "Aetharia World Server", version)]
struct Args {
    /// WebSocket listening port
    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Deterministic terrain seed
    #[arg(long, env = "AETHARIA_WORLD_SEED", default_value_t = 12345)]
    seed: u64,

    /// Heartbeat period in milliseconds
    #[arg(long, env = "AETHARIA_HEARTBEAT", default_value_t = 30_000)]
    heartbeat_ms: u64,

    /// Verbose logging
    #[arg(long, env = "AETHARIA_DEBUG")]
    debug: bool,
}

// ---------------------------------------------------------------------------
// Entry point
// ---------------------------------------------------------------------------

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();

    let directive = if args.debug {
        "aetharia=debug"
    } else {
        "aetharia=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env().add_directive(directive.parse()?),
        )
        .init();

    log::info!(
        "Starting aetharia-server (port={}, seed={}, heartbeat={}ms)",
        args.port,
        args.seed,
        args.heartbeat_ms,
    );

    let config = ServerConfig {
        port: args.port,
        world_seed: args.seed,
        heartbeat_ms: args.heartbeat_ms,
        debug: args.debug,
    };

    let server = Arc::new(Server::new(config));
    session::run(server).await
}
