use std::sync::Arc;

use campaign_core::{AgentClient, HubConfig};
use clap::Parser;
use tokio::sync::broadcast;
use tracing_subscriber::fmt;

use campaign_server::http::{start_http_server, HttpState};
use campaign_server::logging;

#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    #[arg(short, long, default_value = "campaign-hub.toml")]
    config: String,

    #[arg(long)]
    health: bool,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load .env file if present (FOUNDRY_API_KEY in development)
    dotenvy::dotenv().ok();

    let args = Args::parse();

    let config = match HubConfig::load(&args.config) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Failed to load config from {}: {}", args.config, e);
            std::process::exit(1);
        }
    };

    fmt().with_env_filter(logging::env_filter(&config.service)).init();

    let api_key = HubConfig::foundry_api_key();

    if args.health {
        let mode = if config.foundry.use_proxy { "proxy" } else { "direct" };
        println!("✅ Config loaded from {} (Foundry mode: {})", args.config, mode);

        match &api_key {
            Some(_) => println!("✅ FOUNDRY_API_KEY configured"),
            None => println!("❌ FOUNDRY_API_KEY not set; /api/run and direct mode will fail"),
        }

        let agent = match AgentClient::new(&config.agent.backend_url) {
            Ok(a) => a,
            Err(e) => {
                println!("❌ Agent client could not be built: {}", e);
                std::process::exit(1);
            }
        };
        match agent.health_check().await {
            Ok(h) => println!(
                "✅ Agent backend {} is {} (azure connected: {})",
                config.agent.backend_url, h.status, h.azure_connected
            ),
            Err(e) => println!("❌ Agent backend {} unreachable: {}", config.agent.backend_url, e),
        }

        if api_key.is_none() {
            std::process::exit(1);
        }
        println!("✅ Campaign Hub health check passed");
        return Ok(());
    }

    let state = match HttpState::from_config(config, api_key).await {
        Ok(s) => Arc::new(s),
        Err(e) => {
            eprintln!("Failed to initialise Campaign Hub: {}", e);
            std::process::exit(1);
        }
    };

    if !state.config.http.enabled {
        tracing::warn!("HTTP server disabled in config; nothing to run");
        return Ok(());
    }

    let (tx, _rx) = broadcast::channel(1);
    let shutdown_tx = tx.clone();

    tokio::spawn(async move {
        if let Err(e) = tokio::signal::ctrl_c().await {
            tracing::error!("Failed to listen for Ctrl+C: {}", e);
            return;
        }
        tracing::info!("Shutdown signal received");
        let _ = shutdown_tx.send(());
    });

    start_http_server(state, tx.subscribe()).await?;

    Ok(())
}
