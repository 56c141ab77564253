//! Meet space service entry point.

use std::net::SocketAddr;

use clap::{Parser, Subcommand};
use tokio::net::TcpListener;
use tracing::{info, warn};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use meet_space_service::api::{create_router, docs, AppState};
use meet_space_service::auth::AuthVariant;
use meet_space_service::config::Config;
use meet_space_service::metrics;
use meet_space_service::utils::{mask_secret, shutdown_signal};
use meet_space_service::ServiceError;

/// HTTP service that creates Google Meet spaces.
#[derive(Parser, Debug)]
#[command(name = "meet-space-service")]
#[command(about = "Health check, demo pass-through and Google Meet space creation")]
#[command(version)]
struct Args {
    /// Enable verbose logging.
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Emit logs as JSON lines.
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Option<Command>,

    /// HTTP server port (overrides PORT).
    #[arg(short, long)]
    port: Option<u16>,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the HTTP server (default).
    Serve {
        /// HTTP server port (overrides PORT).
        #[arg(short, long)]
        port: Option<u16>,
    },

    /// Check configuration validity.
    CheckConfig,

    /// Print the OpenAPI document.
    Openapi,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Parse CLI arguments
    let args = Args::parse();

    // Initialize logging
    let filter = if args.verbose {
        EnvFilter::new("meet_space_service=debug,info")
    } else {
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"))
    };

    if args.json_logs {
        tracing_subscriber::registry()
            .with(fmt::layer().json())
            .with(filter)
            .init();
    } else {
        tracing_subscriber::registry()
            .with(fmt::layer())
            .with(filter)
            .init();
    }

    // Handle subcommands
    match args.command {
        Some(Command::CheckConfig) => cmd_check_config(),
        Some(Command::Openapi) => cmd_openapi(),
        Some(Command::Serve { port }) => cmd_serve(port.or(args.port)).await,
        None => cmd_serve(args.port).await,
    }
}

/// Check configuration validity.
fn cmd_check_config() -> anyhow::Result<()> {
    println!("======================================================================");
    println!("MEET SPACE SERVICE - CONFIGURATION CHECK");
    println!("======================================================================");

    // Load configuration
    print!("Loading configuration... ");
    let config = match Config::load() {
        Ok(c) => {
            println!("OK");
            c
        }
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration load failed"));
        }
    };

    // Validate configuration
    print!("Validating configuration... ");
    match config.validate() {
        Ok(()) => println!("OK"),
        Err(e) => {
            println!("FAILED");
            println!("  Error: {}", e);
            return Err(anyhow::anyhow!("Configuration validation failed"));
        }
    }

    // Show configuration summary
    println!("----------------------------------------------------------------------");
    println!("Configuration Summary:");
    println!("  Auth Variant: {}", config.auth_variant);
    match config.auth_variant {
        AuthVariant::OAuth => {
            println!("  Client ID: {}", config.google_client_id);
            println!("  Client Secret: {}", mask_secret(&config.google_client_secret));
            println!("  Redirect URI: {}", config.google_redirect_uri);
        }
        AuthVariant::ServiceAccount => {
            println!("  Service Account: {}", config.google_client_email);
            println!(
                "  Impersonating: {}",
                config.google_impersonate_user.as_deref().unwrap_or("(nobody)")
            );
        }
    }
    println!("  Scopes: {}", config.scope_string());
    println!("  Meet API: {}", config.meet_api_url);
    println!("  Demo API: {}", config.demo_api_url);
    println!("  Port: {}", config.port);
    println!("======================================================================");
    println!("CONFIGURATION CHECK PASSED");
    println!("======================================================================");

    Ok(())
}

/// Print the OpenAPI document to stdout.
fn cmd_openapi() -> anyhow::Result<()> {
    println!("{}", docs::openapi_json()?);
    Ok(())
}

/// Run the HTTP server until a shutdown signal arrives.
async fn cmd_serve(port_override: Option<u16>) -> anyhow::Result<()> {
    let config = Config::load().map_err(ServiceError::Config)?;
    if let Err(e) = config.validate() {
        warn!("Configuration validation failed: {}", e);
        return Err(ServiceError::InvalidConfig(e).into());
    }

    let port = port_override.unwrap_or(config.port);
    info!("Configuration loaded successfully");
    info!("Auth variant: {}", config.auth_variant);

    // Initialize metrics
    let prometheus = metrics::install_recorder()?;
    metrics::init_metrics();

    // Create app state
    let app_state = AppState::new(config)?.with_prometheus(prometheus);
    let router = create_router(app_state);

    // Start HTTP server
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = TcpListener::bind(addr).await?;
    info!("HTTP server listening on {}", addr);
    info!("API docs at http://{}{}", addr, docs::DOCS_PATH);

    axum::serve(listener, router)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("Server stopped");
    Ok(())
}
