//! BIBLIO application library
//!
//! Wires the book catalogue module into the kernel, database and HTTP
//! crates. Binaries call [`Application::bootstrap`] then [`Application::run`].

pub mod modules;

use anyhow::Context;
use axum::Router;
use biblio_kernel::{settings::Settings, InitCtx, ModuleRegistry};
use sqlx::SqlitePool;

/// A booted service: open pool, registered and initialized modules.
pub struct Application {
    settings: Settings,
    db: SqlitePool,
    registry: ModuleRegistry,
}

impl Application {
    /// Connect to the database, ensure the schema and initialize modules.
    pub async fn bootstrap(settings: Settings) -> anyhow::Result<Self> {
        let db = biblio_db::connect(&settings.database)
            .await
            .context("failed to open database")?;

        let mut registry = ModuleRegistry::new();
        modules::register_all(&mut registry, &db)?;

        biblio_db::apply_migrations(&db, &registry.collect_migrations())
            .await
            .context("failed to prepare database schema")?;

        let ctx = InitCtx {
            settings: &settings,
            db: &db,
        };
        registry.init_modules(&ctx).await?;

        tracing::info!(
            modules = registry.module_count(),
            "biblio bootstrap complete"
        );

        Ok(Self {
            settings,
            db,
            registry,
        })
    }

    pub fn settings(&self) -> &Settings {
        &self.settings
    }

    pub fn db(&self) -> &SqlitePool {
        &self.db
    }

    /// Router with every module mounted and the global middleware applied.
    pub fn router(&self) -> Router {
        biblio_http::build_router(&self.registry, &self.settings.server)
    }

    /// Serve until `shutdown` resolves, then stop modules and close the pool.
    pub async fn run<F>(self, shutdown: F) -> anyhow::Result<()>
    where
        F: std::future::Future<Output = ()> + Send + 'static,
    {
        let ctx = InitCtx {
            settings: &self.settings,
            db: &self.db,
        };
        self.registry.start_modules(&ctx).await?;

        let served = biblio_http::start_server(&self.registry, &self.settings.server, shutdown).await;

        self.registry.stop_modules().await?;
        self.db.close().await;
        tracing::info!("database pool closed");

        served
    }
}

/// Resolves on Ctrl-C, or SIGTERM on Unix.
pub async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            tracing::error!(error = %err, "failed to listen for ctrl-c");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match tokio::signal::unix::signal(tokio::signal::unix::SignalKind::terminate()) {
            Ok(mut signal) => {
                signal.recv().await;
            }
            Err(err) => {
                tracing::error!(error = %err, "failed to listen for SIGTERM");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }

    tracing::info!("shutdown signal received");
}
