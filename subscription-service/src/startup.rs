//! Application startup and lifecycle management.

use crate::config::SubscriptionConfig;
use crate::handlers;
use crate::services::{init_metrics, seed_demo_data, Database, MemoryStore, Store};
use axum::{
    middleware::from_fn,
    routing::{get, post},
    Router,
};
use chrono::Utc;
use service_core::error::AppError;
use service_core::middleware::metrics::metrics_middleware;
use service_core::middleware::tracing::request_id_middleware;
use std::net::SocketAddr;
use std::sync::Arc;
use tokio::net::TcpListener;
use tower_http::trace::TraceLayer;

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub config: SubscriptionConfig,
    pub store: Arc<dyn Store>,
}

/// Build the HTTP router for the given state.
pub fn build_router(state: AppState) -> Router {
    let api = Router::new()
        .route(
            "/subscriptions",
            get(handlers::subscriptions::list_subscriptions)
                .post(handlers::subscriptions::create_subscription),
        )
        .route(
            "/subscriptions/:id",
            get(handlers::subscriptions::get_subscription)
                .put(handlers::subscriptions::update_subscription)
                .delete(handlers::subscriptions::delete_subscription),
        )
        .route(
            "/subscriptions/:id/usage",
            post(handlers::usage::log_usage).get(handlers::usage::list_usage),
        )
        .route("/stats/dashboard", get(handlers::stats::dashboard_stats))
        .route(
            "/groups",
            get(handlers::groups::list_groups).post(handlers::groups::create_group),
        )
        .route(
            "/groups/:id/members",
            post(handlers::groups::add_member).get(handlers::groups::list_members),
        );

    Router::new()
        .route("/health", get(handlers::health_check))
        .route("/ready", get(handlers::readiness_check))
        .route("/metrics", get(handlers::metrics))
        .nest("/api", api)
        .layer(from_fn(metrics_middleware))
        .layer(from_fn(request_id_middleware))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Application container for managing server lifecycle.
pub struct Application {
    http_port: u16,
    http_listener: TcpListener,
    state: AppState,
}

impl Application {
    /// Build the application: connect the store, optionally seed, bind the listener.
    pub async fn build(config: SubscriptionConfig) -> Result<Self, AppError> {
        init_metrics();

        let store: Arc<dyn Store> = match &config.database {
            Some(database) => {
                let db = Database::new(
                    &database.url,
                    database.max_connections,
                    database.min_connections,
                )
                .await
                .map_err(|e| {
                    tracing::error!(error = %e, "Failed to connect to PostgreSQL");
                    e
                })?;

                db.run_migrations().await.map_err(|e| {
                    tracing::error!(error = %e, "Failed to run migrations");
                    e
                })?;

                Arc::new(db)
            }
            None => {
                tracing::warn!("DATABASE_URL not set, using in-memory store");
                Arc::new(MemoryStore::new())
            }
        };

        if config.seed_demo_data {
            let (user, seeded) = seed_demo_data(&*store, Utc::now()).await?;
            tracing::info!(
                demo_user_id = %user.user_id,
                seeded = seeded,
                "Demo data ready"
            );
        }

        let http_addr = SocketAddr::from(([0, 0, 0, 0], config.common.port));
        let http_listener = TcpListener::bind(http_addr).await.map_err(|e| {
            tracing::error!(error = %e, addr = %http_addr, "Failed to bind HTTP listener");
            AppError::from(e)
        })?;
        let http_port = http_listener.local_addr()?.port();

        tracing::info!(
            http_port = http_port,
            store = store.backend_name(),
            "Subscription service listener bound"
        );

        Ok(Self {
            http_port,
            http_listener,
            state: AppState { config, store },
        })
    }

    /// Get the HTTP port the server is listening on.
    pub fn http_port(&self) -> u16 {
        self.http_port
    }

    /// Handle to the backing store.
    pub fn store(&self) -> Arc<dyn Store> {
        self.state.store.clone()
    }

    /// Run the application until stopped.
    pub async fn run_until_stopped(self) -> std::io::Result<()> {
        let router = build_router(self.state.clone());

        tracing::info!(
            service = %self.state.config.service_name,
            version = %self.state.config.service_version,
            http_port = self.http_port,
            "Service ready to accept connections"
        );

        axum::serve(self.http_listener, router).await.map_err(|e| {
            tracing::error!(error = %e, "HTTP server error");
            std::io::Error::other(format!("HTTP server error: {}", e))
        })
    }
}
