//! HTTP server setup and configuration.
//!
//! # Responsibilities
//! - Create Axum Router with all admin routes
//! - Method gating: a known path with the wrong method answers 404
//! - Wire up middleware (auth, body limit, timeout, request ID, tracing)
//! - Serve until the shutdown signal fires

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::DefaultBodyLimit,
    middleware,
    routing::{get, post, put},
    Router,
};
use tokio::net::TcpListener;
use tokio::sync::broadcast;
use tower_http::{
    request_id::{MakeRequestUuid, PropagateRequestIdLayer, SetRequestIdLayer},
    timeout::TimeoutLayer,
    trace::TraceLayer,
};

use crate::config::ManagedConfig;
use crate::http::auth::admin_auth_middleware;
use crate::http::handlers::*;
use crate::orchestrator::ControlPlane;

/// Application state injected into handlers.
#[derive(Clone)]
pub struct AppState {
    pub control_plane: ControlPlane,
    pub api_key: Option<Arc<str>>,
}

/// HTTP front of the control plane.
pub struct HttpServer {
    router: Router,
}

impl HttpServer {
    pub fn new(control_plane: ControlPlane) -> Self {
        let config = control_plane.config().clone();
        let state = AppState {
            api_key: config.admin.api_key.as_deref().map(Arc::from),
            control_plane,
        };
        let router = Self::build_router(&config, state);
        Self { router }
    }

    /// Build the Axum router with all middleware layers.
    #[allow(deprecated)]
    fn build_router(config: &ManagedConfig, state: AppState) -> Router {
        Router::new()
            .route("/restart-services", put(restart_services).fallback(not_found))
            .route("/enrichments", post(upload_enrichments).fallback(not_found))
            .route("/iglu-config", post(upload_iglu_config).fallback(not_found))
            .route("/external-iglu", post(add_external_iglu).fallback(not_found))
            .route("/local-iglu-apikey", post(add_local_iglu_apikey).fallback(not_found))
            .route("/credentials", post(change_credentials).fallback(not_found))
            .route("/domain-name", post(add_domain_name).fallback(not_found))
            .route("/version", get(get_version).fallback(not_found))
            .route_layer(middleware::from_fn_with_state(state.clone(), admin_auth_middleware))
            .layer(DefaultBodyLimit::max(config.limits.max_body_bytes))
            .with_state(state)
            .layer(TimeoutLayer::new(Duration::from_secs(config.timeouts.request_secs)))
            .layer(PropagateRequestIdLayer::x_request_id())
            .layer(TraceLayer::new_for_http())
            .layer(SetRequestIdLayer::x_request_id(MakeRequestUuid))
    }

    /// Consume the server and return its router, for embedding or tests.
    pub fn into_router(self) -> Router {
        self.router
    }

    /// Run the server, accepting connections on the given listener.
    pub async fn run(
        self,
        listener: TcpListener,
        mut shutdown: broadcast::Receiver<()>,
    ) -> Result<(), std::io::Error> {
        let addr = listener.local_addr()?;
        tracing::info!(address = %addr, "HTTP server starting");

        axum::serve(listener, self.router)
            .with_graceful_shutdown(async move {
                let _ = shutdown.recv().await;
                tracing::info!("Shutdown signal received");
            })
            .await?;

        tracing::info!("HTTP server stopped");
        Ok(())
    }
}
