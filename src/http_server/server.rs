//! # HTTP Server
//!
//! Combines the author and health routers behind CORS and request tracing.

use std::io;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;

use super::author_routes::{author_routes, AuthorsState};
use super::config::HttpServerConfig;
use super::health_routes::health_routes;
use crate::observability::{log_event, log_event_with_fields, Event};

/// HTTP server for the authors API
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    /// Server over a fresh in-memory store with default configuration
    pub fn new() -> Self {
        Self::with_state(HttpServerConfig::default(), Arc::new(AuthorsState::new()))
    }

    pub fn with_state(config: HttpServerConfig, state: Arc<AuthorsState>) -> Self {
        let router = Self::build_router(&config, state);
        Self { config, router }
    }

    /// Build the combined router
    pub fn build_router(config: &HttpServerConfig, state: Arc<AuthorsState>) -> Router {
        let cors = CorsLayer::new().allow_methods(Any).allow_headers(Any);
        let cors = if config.cors_origins.is_empty() {
            cors.allow_origin(Any)
        } else {
            cors.allow_origin(AllowOrigin::list(config.allowed_origins()))
        };

        Router::new()
            .merge(health_routes(state.clone()))
            .merge(author_routes(state))
            .layer(TraceLayer::new_for_http())
            .layer(cors)
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serve until Ctrl-C, then drain in-flight requests.
    pub async fn start(self) -> io::Result<()> {
        let addr = self.config.resolve_addr()?;
        let listener = TcpListener::bind(addr).await?;
        let local = listener.local_addr()?;
        log_event_with_fields(Event::ServerListening, &[("addr", local.to_string().as_str())]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown_signal())
            .await?;

        log_event(Event::ShutdownComplete);
        Ok(())
    }
}

impl Default for HttpServer {
    fn default() -> Self {
        Self::new()
    }
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    log_event(Event::ShutdownStart);
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_server_creation() {
        let server = HttpServer::new();
        assert_eq!(server.socket_addr(), "0.0.0.0:5001");
    }

    #[test]
    fn test_server_with_custom_port() {
        let server = HttpServer::with_state(
            HttpServerConfig::with_port(8080),
            Arc::new(AuthorsState::new()),
        );
        assert_eq!(server.socket_addr(), "0.0.0.0:8080");
    }

    #[test]
    fn test_router_builds_with_cors_origins() {
        let config = HttpServerConfig {
            cors_origins: vec!["http://localhost:5173".to_string()],
            ..Default::default()
        };
        let _router = HttpServer::with_state(config, Arc::new(AuthorsState::new())).router();
    }

    #[tokio::test]
    async fn test_start_rejects_bad_host() {
        let config = HttpServerConfig {
            host: "not a host".to_string(),
            ..Default::default()
        };
        let server = HttpServer::with_state(config, Arc::new(AuthorsState::new()));
        let err = server.start().await.unwrap_err();
        assert_eq!(err.kind(), io::ErrorKind::InvalidInput);
    }
}
