//! Kiosk configuration service.
//!
//! Loads `config.toml`, keeps it live while the file changes on disk, and
//! serves the current snapshot over HTTP.
//!
//! # Architecture Overview
//!
//! ```text
//!  config.toml ──stat/hash──▶ ChangeDetector ──▶ ReloadCoordinator ──load──▶ FileLoader
//!        │                                              │
//!        └──notify events / SIGHUP / POST reload ──────▶│
//!                                                       ▼
//!                                              ConfigStore (ArcSwap)
//!                                                       │
//!                              HTTP handlers, log level ◀┘ (readers, lock-free)
//! ```

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;
use tokio::net::TcpListener;

use kiosk_config::config::FileLoader;
use kiosk_config::http::{AppState, HttpServer};
use kiosk_config::lifecycle::{signals, startup, Shutdown};
use kiosk_config::observability::{logging, metrics};
use kiosk_config::reload::coordinator::DEFAULT_POLL_INTERVAL;
use kiosk_config::reload::detector::DEFAULT_HASH_CHECK_INTERVAL;
use kiosk_config::reload::ReloadOptions;

#[derive(Parser)]
#[command(name = "kiosk-config")]
#[command(about = "Serve a hot-reloaded kiosk configuration", long_about = None)]
struct Args {
    /// Config file to use instead of searching ., ./config/ and ../
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Watch the config file even if kiosk.watch_config is false
    #[arg(long)]
    watch: bool,

    /// Seconds between change checks
    #[arg(long, default_value_t = DEFAULT_POLL_INTERVAL.as_secs())]
    poll_interval_secs: u64,

    /// Quiet ticks between content hash checks
    #[arg(long, default_value_t = DEFAULT_HASH_CHECK_INTERVAL)]
    hash_check_every: u32,

    /// Also react to native filesystem events between ticks
    #[arg(long)]
    fs_events: bool,

    /// Address to serve on (defaults to 0.0.0.0:<kiosk.port>)
    #[arg(long)]
    bind: Option<SocketAddr>,

    /// Prometheus exporter address
    #[arg(long)]
    metrics_address: Option<SocketAddr>,

    /// Emit logs as JSON
    #[arg(long)]
    log_json: bool,
}

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let args = Args::parse();
    let log_level = logging::init(args.log_json);

    tracing::info!("kiosk-config v{} starting", env!("CARGO_PKG_VERSION"));

    let loader = match &args.config {
        Some(path) => FileLoader::new(Some(path.canonicalize()?)),
        None => FileLoader::discover()?,
    };

    // Fatal: without an initial config there is nothing to serve.
    let store = startup::load_initial(&loader, loader.path())?;
    let initial = store.get();
    log_level.apply(&initial);
    tracing::debug!(config = %initial.config(), "Configuration loaded");

    if let Some(addr) = args.metrics_address {
        metrics::init_metrics(addr);
    }
    metrics::set_generation(initial.generation());

    let shutdown = Shutdown::new();
    tokio::spawn(signals::shutdown_on_signal(shutdown.clone()));

    let options = ReloadOptions {
        poll_interval: Duration::from_secs(args.poll_interval_secs.max(1)),
        hash_check_interval: args.hash_check_every,
    };

    let watching = match loader.path().map(PathBuf::from) {
        Some(path) if args.watch || initial.kiosk.watch_config => {
            match startup::spawn_watcher(
                loader,
                store.clone(),
                &path,
                options,
                args.fs_events,
                &shutdown,
            ) {
                Ok(watching) => Some(watching),
                Err(e) => {
                    tracing::error!(error = %e, "Failed to start config watcher");
                    None
                }
            }
        }
        Some(_) => {
            tracing::info!("Config watching disabled");
            None
        }
        None => {
            tracing::info!("No config file, nothing to watch");
            None
        }
    };

    let reload = watching.as_ref().map(|w| w.handle());
    if let Some(handle) = &reload {
        tokio::spawn(signals::reload_on_hangup(handle.clone(), shutdown.clone()));
    }

    // Keep the log level in step with the live config.
    {
        let store = store.clone();
        let mut generations = store.subscribe();
        let mut stop = shutdown.subscribe();
        tokio::spawn(async move {
            loop {
                tokio::select! {
                    changed = generations.changed() => {
                        if changed.is_err() {
                            break;
                        }
                        log_level.apply(&store.get());
                    }
                    _ = stop.recv() => break,
                }
            }
        });
    }

    let bind = args
        .bind
        .unwrap_or_else(|| SocketAddr::from(([0, 0, 0, 0], initial.kiosk.port)));
    drop(initial);

    let listener = TcpListener::bind(bind).await?;
    let server = HttpServer::new(AppState { store, reload });
    server.run(listener, &shutdown).await?;

    // The server only returns early on error; make sure the watcher stops too.
    shutdown.trigger();
    if let Some(watching) = watching {
        watching.join().await;
    }

    tracing::info!("Shutdown complete");
    Ok(())
}
