//! x402 Facilitator HTTP server.
//!
//! # Usage
//!
//! ```bash
//! # Run with default config (config.toml in current directory)
//! cargo run -p f402-facilitator --release
//!
//! # Run with custom config path
//! CONFIG=/path/to/config.toml cargo run -p f402-facilitator
//!
//! # Configure logging level
//! RUST_LOG=info cargo run -p f402-facilitator
//! ```
//!
//! # Environment Variables
//!
//! - `CONFIG` — Path to TOML configuration file (default: `config.toml`)
//! - `HOST` — Override bind address (default: `0.0.0.0`)
//! - `PORT` — Override port (default: `4000`)
//! - `RUST_LOG` — Log level filter (default: `info`)

use std::net::SocketAddr;
use std::sync::Arc;

use axum::http::Method;
use solana_keypair::Keypair;
use solana_pubkey::Pubkey;
use solana_signer::Signer;
use tower_http::cors;
use tracing_subscriber::EnvFilter;

use f402::handler::PaymentHandler;
use f402_svm::chain::RpcSettlementProvider;
use f402_svm::networks::KnownCluster;
use f402_svm::settlement::SolanaSettlementHandler;

use f402_facilitator::config::{FacilitatorConfig, NetworkConfig};
use f402_facilitator::dispatcher::Dispatcher;
use f402_facilitator::handlers::facilitator_router;

#[tokio::main]
async fn main() {
    // .env is optional; ignore a missing file.
    let _ = dotenvy::dotenv();

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    if let Err(e) = run().await {
        tracing::error!("Facilitator failed: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<(), Box<dyn std::error::Error>> {
    let config = FacilitatorConfig::load()?;
    tracing::info!(
        host = %config.host,
        port = config.port,
        networks = config.networks.len(),
        "Loaded configuration"
    );

    let mut handlers: Vec<Arc<dyn PaymentHandler>> = Vec::new();
    for (network_name, network_cfg) in &config.networks {
        handlers.extend(build_network_handlers(network_name, network_cfg)?);
    }

    if handlers.is_empty() {
        return Err("no payment handlers configured — add [networks.\"<cluster>\"] sections with admin_keypair_path".into());
    }

    let dispatcher = Dispatcher::new(handlers, config.timeouts.into());
    tracing::info!(handlers = dispatcher.handler_count(), "Active payment handlers");

    let app = facilitator_router(Arc::new(dispatcher)).layer(
        cors::CorsLayer::new()
            .allow_origin(cors::Any)
            .allow_methods([Method::GET, Method::POST])
            .allow_headers(cors::Any),
    );

    let addr = SocketAddr::new(config.host, config.port);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Facilitator listening on http://{addr}");

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("Facilitator shut down gracefully");
    Ok(())
}

/// Builds the handler pair (SOL, and USDC when a mint is known) for one
/// configured network.
///
/// Any network name is accepted as long as an `rpc_url` is configured;
/// [`KnownCluster`] only supplies defaults for the clusters it knows.
fn build_network_handlers(
    network_name: &str,
    network_cfg: &NetworkConfig,
) -> Result<Vec<Arc<dyn PaymentHandler>>, Box<dyn std::error::Error>> {
    let cluster: Option<KnownCluster> = network_name.parse().ok();

    let keypair_path = network_cfg.admin_keypair_path.trim();
    if keypair_path.is_empty() || keypair_path.starts_with('$') {
        return Err(format!(
            "admin_keypair_path for '{network_name}' not resolved (missing env var?)"
        )
        .into());
    }
    let admin = Arc::new(load_admin_keypair(keypair_path)?);

    let rpc_url = match (network_cfg.rpc_url.clone(), cluster) {
        (Some(url), _) => url,
        (None, Some(cluster)) => cluster.default_rpc_url().to_string(),
        (None, None) => {
            return Err(
                format!("network '{network_name}' is not a known cluster; set rpc_url").into(),
            );
        }
    };
    let provider = Arc::new(RpcSettlementProvider::new(rpc_url));

    let mint: Option<Pubkey> = match &network_cfg.usdc_mint {
        Some(mint) => Some(
            mint.parse()
                .map_err(|_| format!("invalid usdc_mint for '{network_name}'"))?,
        ),
        None => cluster.and_then(KnownCluster::usdc_mint),
    };

    tracing::info!(
        network = network_name,
        admin = %admin.pubkey(),
        rpc = %provider.url(),
        usdc = ?mint,
        "Registered x-solana-settlement handlers"
    );

    let mut handlers: Vec<Arc<dyn PaymentHandler>> = vec![Arc::new(SolanaSettlementHandler::new(
        network_name,
        Arc::clone(&provider),
        Arc::clone(&admin),
        None,
    ))];
    if let Some(mint) = mint {
        handlers.push(Arc::new(SolanaSettlementHandler::new(
            network_name,
            provider,
            admin,
            Some(mint),
        )));
    }
    Ok(handlers)
}

/// Loads a keypair from the Solana CLI JSON format (a 64-byte array of
/// secret seed followed by public key).
fn load_admin_keypair(path: &str) -> Result<Keypair, Box<dyn std::error::Error>> {
    let content = std::fs::read_to_string(path)?;
    let bytes: Vec<u8> = serde_json::from_str(&content)?;
    let seed: [u8; 32] = bytes
        .get(..32)
        .and_then(|s| s.try_into().ok())
        .ok_or_else(|| format!("keypair file '{path}' is not a 64-byte Solana CLI keypair"))?;
    Ok(Keypair::new_from_array(seed))
}

/// Waits for Ctrl-C or SIGTERM (Unix) to initiate graceful shutdown.
async fn shutdown_signal() {
    let ctrl_c = tokio::signal::ctrl_c();

    #[cfg(unix)]
    {
        let mut sigterm = tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate())
            .expect("failed to install SIGTERM handler");
        tokio::select! {
            _ = ctrl_c => tracing::info!("Received Ctrl-C, shutting down..."),
            _ = sigterm.recv() => tracing::info!("Received SIGTERM, shutting down..."),
        }
    }

    #[cfg(not(unix))]
    {
        ctrl_c.await.expect("failed to listen for Ctrl-C");
        tracing::info!("Received Ctrl-C, shutting down...");
    }
}
