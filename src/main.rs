use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use std::sync::Arc;

use donation_relay::config::Config;
use donation_relay::crypto::hash_secret;
use donation_relay::licensing::Licensing;
use donation_relay::middleware::AdminCredential;
use donation_relay::models::IssueLicense;
use donation_relay::store::{AppState, JsonFileStore};
use donation_relay::tenants::TenantDirectory;

#[derive(Parser, Debug)]
#[command(name = "donation-relay")]
#[command(about = "License verification and activation binding for the donation relay")]
struct Cli {
    /// Issue a dev license on startup and print its key (dev mode only)
    #[arg(long)]
    seed: bool,

    /// Delete the license store on exit (dev mode only, useful for fresh starts)
    #[arg(long)]
    ephemeral: bool,

    /// Print the digest to store as a tenant passwordHash, then exit
    #[arg(long, value_name = "SECRET")]
    hash_secret: Option<String>,
}

/// Issues a license for local testing and prints it.
fn seed_dev_license(state: &AppState) {
    let input = IssueLicense {
        owner: Some("Dev Owner".to_string()),
        expiry_days: Some(30),
        notes: Some("Seeded dev license".to_string()),
    };

    match state.licensing.issue(&input) {
        Ok(key) => {
            tracing::info!("============================================");
            tracing::info!("DEV LICENSE ISSUED");
            tracing::info!("============================================");
            println!();
            println!("--- COPY FROM HERE ---");
            println!("  license_key: {}", key);
            println!("--- END COPY ---");
            println!();
        }
        Err(e) => tracing::warn!("Failed to seed dev license: {}", e),
    }
}

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    if let Some(secret) = cli.hash_secret.as_deref() {
        println!("{}", hash_secret(secret));
        return;
    }

    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "donation_relay=debug,tower_http=debug".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = Config::from_env();

    if config.dev_mode {
        tracing::info!("Running in DEVELOPMENT mode");
    }

    let store = Arc::new(JsonFileStore::new(
        &config.license_store_path,
        &config.default_script_version,
    ));
    let licensing = Licensing::new(store, &config.license_key_prefix);

    if let Err(e) = licensing.initialize() {
        tracing::warn!("Failed to initialize license store: {}", e);
    }
    let licenses = licensing.list();
    tracing::info!(
        "License store {} holds {} license(s)",
        config.license_store_path,
        licenses.len()
    );

    let tenants = TenantDirectory::load(&config.tenants_path);

    let admin = AdminCredential::new(config.admin_token.as_deref());
    if !admin.is_configured() {
        tracing::warn!("ADMIN_TOKEN is not set: admin endpoints will reject every request");
    }

    let state = AppState {
        licensing: Arc::new(licensing),
        tenants: Arc::new(tenants),
        admin,
    };

    if cli.seed {
        if !config.dev_mode {
            tracing::warn!("--seed flag ignored: not in dev mode (set RELAY_ENV=dev)");
        } else {
            seed_dev_license(&state);
        }
    }

    let app = donation_relay::app(state).layer(TraceLayer::new_for_http());

    let addr = config.addr();
    let listener = tokio::net::TcpListener::bind(&addr)
        .await
        .expect("Failed to bind to address");

    let cleanup_on_exit = cli.ephemeral && config.dev_mode;
    if cli.ephemeral && !config.dev_mode {
        tracing::warn!("--ephemeral flag ignored: not in dev mode (set RELAY_ENV=dev)");
    }
    if cleanup_on_exit {
        tracing::info!("EPHEMERAL MODE: license store will be deleted on exit");
    }

    tracing::info!("Donation relay listening on {}", addr);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await
        .expect("Failed to start server");

    if cleanup_on_exit {
        let path = &config.license_store_path;
        match std::fs::remove_file(path) {
            Ok(()) => tracing::info!("Removed {}", path),
            Err(e) => tracing::warn!("Failed to remove {}: {}", path, e),
        }
    }
}

async fn shutdown_signal() {
    tokio::signal::ctrl_c()
        .await
        .expect("Failed to install Ctrl+C handler");
    tracing::info!("Shutdown signal received, stopping server...");
}
