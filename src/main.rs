//! pathchain: serves config-declared routes backed by the built-in handlers.

use std::path::PathBuf;

use clap::Parser;

use pathchain::config::{load_or_create, RouteWatcher};
use pathchain::handlers::builtin_registry;
use pathchain::http::HttpServer;
use pathchain::lifecycle::{signals, Shutdown};
use pathchain::observability::{logging, metrics};
use pathchain::routing::Router;

#[derive(Parser, Debug)]
#[command(name = "pathchain", version, about = "Path-pattern HTTP router")]
struct Cli {
    /// Configuration file, created with defaults if missing.
    #[arg(short, long, default_value = "pathchain.toml")]
    config: PathBuf,

    /// Validate the configuration, print the route table and exit.
    #[arg(long)]
    check: bool,

    /// Reload routes when the configuration file changes.
    #[arg(long)]
    watch: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let cli = Cli::parse();
    let config = load_or_create(&cli.config)?;

    if !cli.check {
        logging::init_logging(&config.observability)?;
        tracing::info!(version = env!("CARGO_PKG_VERSION"), "pathchain starting");
    }

    let registry = builtin_registry();
    let router = Router::from_config(&config.routes, &registry)?;

    if cli.check {
        let routes: Vec<_> = router.routes().collect();
        println!("{}", serde_json::to_string_pretty(&routes)?);
        return Ok(());
    }

    tracing::info!(
        http = ?config.listener.http,
        https = ?config.listener.https,
        routes = router.len(),
        request_timeout_secs = config.timeouts.request_secs,
        idle_timeout_secs = config.timeouts.idle_secs,
        "Configuration loaded"
    );

    if config.observability.metrics_enabled {
        match config.observability.metrics_address.parse() {
            Ok(addr) => {
                if let Err(e) = metrics::init_metrics(addr) {
                    tracing::error!(error = %e, "Failed to start metrics exporter");
                }
            }
            Err(_) => tracing::error!(
                metrics_address = %config.observability.metrics_address,
                "Failed to parse metrics address"
            ),
        }
    }

    let server = HttpServer::new(config, router);

    let _watcher = if cli.watch {
        let (watcher, mut updates) = RouteWatcher::new(&cli.config, server.config().clone());
        let watcher = watcher.run()?;
        let reloader = server.reloader();

        tokio::spawn(async move {
            while let Some(routes) = updates.recv().await {
                match Router::from_config(&routes, &registry) {
                    Ok(router) => reloader.swap(router),
                    Err(e) => tracing::error!(
                        error = %e,
                        "Reloaded routes rejected, keeping current table"
                    ),
                }
            }
        });

        tracing::info!(path = %cli.config.display(), "Watching configuration");
        Some(watcher)
    } else {
        None
    };

    let shutdown = Shutdown::new();
    signals::forward_signals(shutdown.clone());

    server.run(shutdown.subscribe()).await?;

    tracing::info!("Shutdown complete");
    Ok(())
}
