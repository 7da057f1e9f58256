//! Application state shared by the middleware and handlers

use crate::{auth::CredentialStore, WebConfig, WebResult};
use gatekeeper_applications::{Gatekeeper, GatekeeperApplication, MemorySessionStore};
use gatekeeper_core::{Clock, GatekeeperConfig, MatcherConfig, SessionStore};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};
use walkdir::WalkDir;

#[cfg(feature = "sqlite")]
use gatekeeper_applications::SqliteSessionStore;

#[derive(Clone)]
pub struct AppState {
    /// Configuration
    pub config: WebConfig,
    /// Wired gate services
    pub application: Arc<GatekeeperApplication>,
    /// Gate run by the middleware on every request
    pub gatekeeper: Arc<Gatekeeper>,
    /// Identity provider behind `/access`
    pub credentials: Arc<CredentialStore>,
    /// Request paths of every file under the static root
    pub resources: Arc<Vec<String>>,
}

impl AppState {
    /// Create state from the web configuration and its gatekeeper file
    pub async fn new(config: WebConfig) -> WebResult<Self> {
        let gatekeeper_config = config.load_gatekeeper_config()?;
        Self::with_gatekeeper_config(config, gatekeeper_config).await
    }

    pub async fn with_gatekeeper_config(
        config: WebConfig,
        gatekeeper_config: GatekeeperConfig,
    ) -> WebResult<Self> {
        let store = open_store(&config).await?;
        Self::assemble(config, gatekeeper_config, store, None)
    }

    /// Wire state from explicit parts; `clock` defaults to the system clock
    pub fn assemble(
        config: WebConfig,
        gatekeeper_config: GatekeeperConfig,
        store: Arc<dyn SessionStore>,
        clock: Option<Arc<dyn Clock>>,
    ) -> WebResult<Self> {
        let static_root = Path::new(&config.static_dir);
        let resources = discover_static_resources(static_root);
        if resources.is_empty() {
            warn!("No static files found under {}", static_root.display());
        }

        let mut builder = GatekeeperApplication::builder(gatekeeper_config.clone()).with_store(store);
        if let Some(clock) = clock {
            builder = builder.with_clock(clock);
        }
        for policy in &gatekeeper_config.policies {
            if let MatcherConfig::StaticDir { dir } = &policy.matcher {
                builder = builder.with_static_paths(dir.clone(), paths_under(&resources, dir));
            }
        }
        let application = builder.build()?;

        let credentials = CredentialStore::from_config(&gatekeeper_config.users)?;

        info!(
            resources = resources.len(),
            users = credentials.len(),
            "Application state ready"
        );

        Ok(Self {
            gatekeeper: application.gatekeeper(),
            application: Arc::new(application),
            credentials: Arc::new(credentials),
            resources: Arc::new(resources),
            config,
        })
    }
}

/// SQLite when a database URL is configured, memory otherwise
async fn open_store(config: &WebConfig) -> WebResult<Arc<dyn SessionStore>> {
    #[cfg(feature = "sqlite")]
    {
        if let Some(database_url) = &config.database_url {
            let store = SqliteSessionStore::from_url(database_url).await?;
            info!("Session store: sqlite");
            return Ok(Arc::new(store));
        }
    }

    #[cfg(not(feature = "sqlite"))]
    {
        if config.database_url.is_some() {
            warn!("Database URL ignored; built without the sqlite feature");
        }
    }

    info!("Session store: memory");
    Ok(Arc::new(MemorySessionStore::new()))
}

/// Every file under `root` as a sorted list of `/relative/path` strings
pub fn discover_static_resources(root: &Path) -> Vec<String> {
    let mut paths: Vec<String> = WalkDir::new(root)
        .into_iter()
        .filter_map(Result::ok)
        .filter(|entry| entry.file_type().is_file())
        .filter_map(|entry| {
            let relative = entry.path().strip_prefix(root).ok()?;
            let parts: Vec<String> = relative
                .components()
                .map(|c| c.as_os_str().to_string_lossy().into_owned())
                .collect();
            Some(format!("/{}", parts.join("/")))
        })
        .collect();
    paths.sort();
    paths
}

fn paths_under(resources: &[String], dir: &str) -> Vec<String> {
    let prefix = format!("/{}/", dir.trim_matches('/'));
    resources
        .iter()
        .filter(|path| path.starts_with(&prefix))
        .cloned()
        .collect()
}
