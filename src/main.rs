use clap::Parser;
use flownlp_gateway::config::{DEFAULT_ENV_FILE, load_env_file};
use flownlp_gateway::proxy_state::DEFAULT_MAX_PAYLOAD_SIZE;
use flownlp_gateway::server::{init_logging, startup};
use flownlp_gateway::{ProxyConfig, ProxyState};
use log::{info, warn};
use std::path::Path;
use tokio::signal;

#[derive(Parser, Debug)]
#[command(name = "flownlp-gateway", about = "Authenticated gateway in front of a local Ollama chat API")]
struct Args {
    /// Shared secret callers present as `Authorization: Bearer <key>`
    #[arg(long, env = "API_KEY", hide_env_values = true)]
    api_key: String,

    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    host: String,

    #[arg(long, env = "PORT", default_value_t = 8080)]
    port: u16,

    /// Largest accepted request body in bytes
    #[arg(long, default_value_t = DEFAULT_MAX_PAYLOAD_SIZE)]
    max_payload_size: usize,

    #[arg(long, default_value = "info")]
    log_level: log::LevelFilter,
}

fn main() -> anyhow::Result<()> {
    // Settings from .env must be in place before clap reads the environment.
    let env_file_loaded = load_env_file(Path::new(DEFAULT_ENV_FILE))?;
    let args = Args::parse();
    init_logging(args.log_level);
    if !env_file_loaded {
        warn!("No {} file found, using process environment", DEFAULT_ENV_FILE);
    }

    let mut config = ProxyConfig::new(args.host, args.port, args.api_key);
    config.max_payload_size = args.max_payload_size;
    let state = ProxyState::new(config.clone())?;

    actix_web::rt::System::new().block_on(async move {
        tokio::select! {
            res = startup(config, state) => res?,
            _ = signal::ctrl_c() => {
                info!("Received Ctrl+C, shutting down");
            }
        }
        Ok(())
    })
}
