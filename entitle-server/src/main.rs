//! Entitle license server
//!
//! Serves the license upload, removal and client view endpoints and keeps
//! the background worker pool in step with the active license.
//!
//! Usage:
//!   entitle-server --public-key license-signing.pub --database license.db

use std::{fs, path::PathBuf, sync::Arc};
use anyhow::{Context, Result};
use clap::Parser;
use entitle_license::SignedLicenseValidator;
use entitle_server::{AppState, StaticSessionResolver, build_router};
use entitle_service::{
    Actor, EntitlementService, HeartbeatWorker, JobController, LicenseStore, MemoryLicenseStore,
    ServiceConfig, SqliteLicenseStore, TracingAuditRecorder, WorkerKind, WorkerPool,
};
use tracing::{Level, info, warn};
use tracing_subscriber::FmtSubscriber;

#[derive(Parser, Debug)]
#[command(name = "entitle-server")]
#[command(about = "License entitlement server")]
struct Args {
    /// HTTP port to listen on
    #[arg(short, long, default_value = "8065")]
    port: u16,

    /// Path to the base64 Ed25519 public key that signs licenses
    #[arg(long)]
    public_key: PathBuf,

    /// SQLite database for the active license (in-memory when omitted)
    #[arg(short, long)]
    database: Option<PathBuf>,

    /// JSON service configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Bearer token granted system-admin rights
    #[arg(long, env = "ENTITLE_ADMIN_TOKEN")]
    admin_token: Option<String>,

    /// Enable verbose debug logging
    #[arg(short, long)]
    verbose: bool,
}

fn load_config(path: Option<&PathBuf>) -> Result<ServiceConfig> {
    let Some(path) = path else {
        return Ok(ServiceConfig::default());
    };
    let json = fs::read_to_string(path)
        .with_context(|| format!("failed to read config {}", path.display()))?;
    ServiceConfig::from_json(&json).with_context(|| format!("invalid config {}", path.display()))
}

fn worker_pool() -> WorkerPool {
    let heartbeat = Arc::new(HeartbeatWorker::default());
    [
        WorkerKind::Migrations,
        WorkerKind::Plugins,
        WorkerKind::DataRetention,
        WorkerKind::MessageExport,
        WorkerKind::ElasticsearchIndexing,
        WorkerKind::LdapSync,
    ]
    .into_iter()
    .fold(WorkerPool::new(), |pool, kind| pool.register(kind, heartbeat.clone()))
}

#[tokio::main]
async fn main() -> Result<()> {
    let args = Args::parse();
    let log_level = if args.verbose { Level::DEBUG } else { Level::INFO };
    FmtSubscriber::builder()
        .with_max_level(log_level)
        .with_target(false)
        .compact()
        .init();

    info!("Entitle server starting...");
    let config = load_config(args.config.as_ref())?;

    let public_key = fs::read_to_string(&args.public_key)
        .with_context(|| format!("failed to read public key {}", args.public_key.display()))?;
    let validator = SignedLicenseValidator::from_public_key_base64(&public_key)
        .context("invalid license public key")?;

    let store: Arc<dyn LicenseStore> = match &args.database {
        Some(path) => Arc::new(
            SqliteLicenseStore::open(path)
                .with_context(|| format!("failed to open {}", path.display()))?,
        ),
        None => {
            warn!("no database configured, the license will not survive a restart");
            Arc::new(MemoryLicenseStore::new())
        }
    };

    let pool = Arc::new(worker_pool());
    let service = EntitlementService::new(
        config,
        Arc::new(validator),
        store,
        Arc::new(TracingAuditRecorder),
    )
    .with_job_controller(pool.clone());

    let state = service
        .revalidate_stored_license()
        .await
        .context("failed to load stored license")?;
    if service.config().run_jobs {
        if let Some(license) = state.license() {
            pool.reinitialize(license).await?;
            pool.start().await?;
        }
    }

    let mut sessions = StaticSessionResolver::new();
    if let Some(token) = args.admin_token {
        sessions = sessions.with_token(token, Actor::system_admin("admin"));
    } else {
        warn!("no admin token configured, license changes are disabled");
    }

    let app = build_router(AppState::new(Arc::new(service), Arc::new(sessions)));
    let listener = tokio::net::TcpListener::bind(format!("0.0.0.0:{}", args.port))
        .await
        .with_context(|| format!("failed to bind HTTP port {}", args.port))?;
    info!("HTTP license endpoints listening on port {}", args.port);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
        })
        .await
        .context("HTTP server failed")?;

    info!("shutting down workers");
    pool.stop().await?;
    Ok(())
}
