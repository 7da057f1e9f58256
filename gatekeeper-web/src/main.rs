//! Gatekeeper Web Server
//!
//! Serves a static directory behind tiered session and CSRF checks.

use clap::Parser;
use gatekeeper_web::{init_logging, AppState, GatekeeperServer, WebConfig};

/// Gatekeeper Web Server - tiered access control for static resources
#[derive(Parser)]
#[command(name = "gatekeeper-web")]
#[command(about = "Session, CSRF and access-level gate in front of a static site")]
#[command(version)]
struct Args {
    /// Server host to bind to [default: GATEKEEPER_HOST or 127.0.0.1]
    #[arg(long)]
    host: Option<String>,

    /// Server port to listen on [default: GATEKEEPER_PORT or 8080]
    #[arg(short, long)]
    port: Option<u16>,

    /// Static files directory
    #[arg(long)]
    static_dir: Option<String>,

    /// Database URL for session storage
    #[arg(long)]
    database_url: Option<String>,

    /// Gatekeeper TOML configuration file
    #[arg(short, long)]
    config: Option<String>,

    /// Log level (error, warn, info, debug, trace)
    #[arg(long)]
    log_level: Option<String>,
}

impl Args {
    /// Flags given on the command line win over the environment
    fn apply(self, config: &mut WebConfig) -> Option<String> {
        if let Some(host) = self.host {
            config.host = host;
        }
        if let Some(port) = self.port {
            config.port = port;
        }
        if let Some(static_dir) = self.static_dir {
            config.static_dir = static_dir;
        }
        if let Some(database_url) = self.database_url {
            config.database_url = Some(database_url);
        }
        if let Some(path) = self.config {
            config.config_path = Some(path);
        }
        self.log_level
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    // Load environment variables
    dotenvy::dotenv().ok();

    let mut config = WebConfig::from_env();
    let log_level = args.apply(&mut config);

    let gatekeeper_config = config.load_gatekeeper_config()?;

    let mut logging = gatekeeper_config.logging.clone();
    if let Some(level) = log_level {
        logging.level = level;
    }
    if gatekeeper_core::init_logging(&logging).is_err() {
        init_logging();
    }

    println!("🚀 Starting Gatekeeper Web Server");
    println!("📍 Server: http://{}", config.address());
    println!("📁 Static files: {}", config.static_dir);
    match &config.database_url {
        Some(db_url) => println!("🗄️  Sessions: {}", db_url),
        None => println!("🗄️  Sessions: in memory"),
    }
    if let Some(path) = &config.config_path {
        println!("⚙️  Config: {}", path);
    }

    println!("🏗️  Building server...");
    let state = AppState::with_gatekeeper_config(config, gatekeeper_config).await?;
    println!(
        "✅ {} static resources, {} users",
        state.resources.len(),
        state.credentials.len()
    );

    GatekeeperServer::new(state).start().await?;

    println!("✅ Server shut down gracefully");
    Ok(())
}
