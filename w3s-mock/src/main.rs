/// W3S Mock Server
///
/// Serves the seven W3S endpoints the sample wallet uses from in-memory
/// state, plus helper routes to complete challenges and fund wallets.

use anyhow::{Context, Result};
use std::env;
use std::sync::Arc;

use w3s_mock::{run_server, MockBackend};

#[derive(Debug)]
struct Config {
    // Accept only this bearer key when set
    api_key: Option<String>,

    // Server
    server_host: String,
    server_port: u16,
}

impl Config {
    fn from_env() -> Result<Self> {
        dotenv::dotenv().ok();

        let api_key = env::var("MOCK_API_KEY").ok().filter(|k| !k.is_empty());

        let server_host = env::var("MOCK_HOST").unwrap_or_else(|_| "127.0.0.1".to_string());

        let server_port = env::var("MOCK_PORT")
            .unwrap_or_else(|_| "3100".to_string())
            .parse()
            .context("Invalid MOCK_PORT")?;

        Ok(Self {
            api_key,
            server_host,
            server_port,
        })
    }
}

#[tokio::main]
async fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    log::info!("Starting W3S Mock Server...");

    let config = Config::from_env().context("Failed to load configuration")?;

    log::info!(
        "Server will listen on {}:{} (api key {})",
        config.server_host,
        config.server_port,
        if config.api_key.is_some() { "required" } else { "open" }
    );

    let backend = Arc::new(MockBackend::new(config.api_key));

    run_server(backend, config.server_host, config.server_port)
        .await
        .context("Server error")?;

    Ok(())
}
