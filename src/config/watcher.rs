//! Route table hot reload.
//!
//! # Responsibilities
//! - Watch the configuration file's directory and react to writes of the file
//! - Publish the route table only when it actually changed
//! - Keep the live table when the new file does not load
//!
//! # Design Decisions
//! - The directory is watched, not the file, so editors that replace the file
//!   through a rename keep triggering reloads
//! - Only `[[routes]]` are reloaded; other sections need a restart

use std::ffi::OsString;
use std::path::{Path, PathBuf};
use std::time::Duration;

use notify::{Config, Event, RecommendedWatcher, RecursiveMode, Watcher};
use tokio::sync::mpsc;

use crate::config::loader::load_config;
use crate::config::schema::{AppConfig, RouteConfig};

/// Watches the configuration file and emits each new route table.
pub struct RouteWatcher {
    path: PathBuf,
    current: AppConfig,
    update_tx: mpsc::UnboundedSender<Vec<RouteConfig>>,
}

impl RouteWatcher {
    /// Create a watcher for `path`, starting from the configuration already
    /// in use.
    ///
    /// Returns the watcher and a receiver for route table updates.
    pub fn new(
        path: &Path,
        current: AppConfig,
    ) -> (Self, mpsc::UnboundedReceiver<Vec<RouteConfig>>) {
        let (update_tx, update_rx) = mpsc::unbounded_channel();

        (
            Self {
                path: path.to_path_buf(),
                current,
                update_tx,
            },
            update_rx,
        )
    }

    /// Start watching in a background thread.
    ///
    /// The returned watcher must be kept alive for events to keep flowing.
    pub fn run(self) -> Result<RecommendedWatcher, notify::Error> {
        let Self {
            path,
            mut current,
            update_tx,
        } = self;

        let dir = match path.parent() {
            Some(parent) if !parent.as_os_str().is_empty() => parent.to_path_buf(),
            _ => PathBuf::from("."),
        };
        let file_name: Option<OsString> = path.file_name().map(ToOwned::to_owned);
        let watched = path.clone();

        let mut watcher = RecommendedWatcher::new(
            move |res: notify::Result<Event>| match res {
                Ok(event) if event.kind.is_modify() || event.kind.is_create() => {
                    let touches_file = event
                        .paths
                        .iter()
                        .any(|p| p.file_name() == file_name.as_deref());
                    if !touches_file {
                        return;
                    }
                    if let Some(routes) = reload(&watched, &mut current) {
                        let _ = update_tx.send(routes);
                    }
                }
                Ok(_) => {}
                Err(e) => tracing::error!(error = ?e, "Watch error"),
            },
            Config::default().with_poll_interval(Duration::from_secs(2)),
        )?;

        watcher.watch(&dir, RecursiveMode::NonRecursive)?;

        tracing::info!(path = %path.display(), "Route watcher started");
        Ok(watcher)
    }
}

/// Load `path` and return its route table if it differs from `current`.
///
/// `current` is updated on every successful load.
fn reload(path: &Path, current: &mut AppConfig) -> Option<Vec<RouteConfig>> {
    let config = match load_config(path) {
        Ok(config) => config,
        Err(e) => {
            tracing::error!(error = %e, "Failed to reload config, keeping current routes");
            return None;
        }
    };

    let routes_changed = config.routes != current.routes;
    let other_changed = AppConfig {
        routes: current.routes.clone(),
        ..config.clone()
    } != *current;

    if other_changed {
        tracing::warn!("Configuration changed outside [[routes]]; restart to apply it");
    }

    *current = config;
    if routes_changed {
        tracing::info!(routes = current.routes.len(), "Route table changed");
        Some(current.routes.clone())
    } else {
        tracing::debug!("Route table unchanged");
        None
    }
}
