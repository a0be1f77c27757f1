//! # Dockyard Admission Gateway
//!
//! Single-node entry point wiring the in-memory adapters to the gateway.
//!
//! ## Startup Sequence
//!
//! 1. Initialize logging (`DY_LOG_LEVEL`, `DY_JSON_LOGS`)
//! 2. Load configuration (`DY_CONFIG` file, `DY_HTTP_PORT` override)
//! 3. Register the bootstrap namespace and its token
//! 4. Serve until Ctrl+C

use std::env;
use std::sync::Arc;

use anyhow::{Context, Result};
use tracing::{info, warn};

use dy_admission_gateway::adapters::{
    BuildTracker, InMemoryAuthenticatorProvider, SignedWebhookResolver, TokenSessionResolver,
};
use dy_admission_gateway::ports::WebhookResolver;
use dy_admission_gateway::telemetry::{init_logging, TelemetryConfig};
use dy_admission_gateway::{
    Collaborators, DownstreamRouters, GatewayConfig, GatewayServer, UserSession,
};

const DEFAULT_NAMESPACE: &str = "captain";

fn load_config() -> Result<GatewayConfig> {
    let mut config = match env::var("DY_CONFIG") {
        Ok(path) => GatewayConfig::from_file(&path)
            .with_context(|| format!("Failed to load configuration from {}", path))?,
        Err(_) => GatewayConfig::default(),
    };

    if let Ok(port) = env::var("DY_HTTP_PORT") {
        config.http.port = port
            .parse()
            .with_context(|| format!("Invalid DY_HTTP_PORT: {}", port))?;
    }

    Ok(config)
}

/// Wire the in-memory adapters for one bootstrap namespace
fn bootstrap(config: &GatewayConfig) -> Result<Collaborators> {
    let namespace = env::var("DY_DEV_NAMESPACE").unwrap_or_else(|_| DEFAULT_NAMESPACE.to_string());
    let builds = Arc::new(BuildTracker::new());

    let authenticators = Arc::new(InMemoryAuthenticatorProvider::new());
    match env::var("DY_DEV_PASSWORD") {
        Ok(password) => {
            authenticators.register(&namespace, &password);
        }
        Err(_) => warn!(namespace = %namespace, "DY_DEV_PASSWORD not set, password changes will fail"),
    }

    let sessions = Arc::new(TokenSessionResolver::new());
    match env::var("DY_DEV_TOKEN") {
        Ok(token) => sessions.insert(token, UserSession::new(namespace.clone(), builds.clone())),
        Err(_) => warn!("DY_DEV_TOKEN not set, every user API request will be rejected"),
    }

    let webhooks = config.webhooks.secret.as_ref().map(|secret| {
        let resolver = SignedWebhookResolver::new(secret.as_bytes());
        resolver.register_namespace(&namespace, builds.clone());
        Arc::new(resolver) as Arc<dyn WebhookResolver>
    });

    info!(namespace = %namespace, webhooks = webhooks.is_some(), "Bootstrap namespace registered");

    Ok(Collaborators {
        sessions,
        webhooks,
        authenticators,
    })
}

#[tokio::main]
async fn main() -> Result<()> {
    let telemetry = TelemetryConfig::from_env();
    init_logging(&telemetry).context("Failed to initialize logging")?;

    info!("===========================================");
    info!("  Dockyard Admission Gateway v{}", dy_admission_gateway::VERSION);
    info!("===========================================");

    let config = load_config()?;
    let collaborators = bootstrap(&config)?;

    let mut server = GatewayServer::new(config, collaborators, DownstreamRouters::new())
        .context("Invalid gateway configuration")?;

    server
        .start(async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!(error = %e, "Failed to listen for Ctrl+C");
                std::future::pending::<()>().await;
            }
        })
        .await
        .context("Gateway server failed")?;

    info!("Shutdown complete");
    Ok(())
}
