//! # HTTP Server
//!
//! Combines the queue and observability routers behind one listener.

use std::future::Future;
use std::io;
use std::net::SocketAddr;
use std::sync::Arc;

use axum::Router;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

use crate::observability::{log_event, Event};
use crate::registry::TopicRegistry;

use super::config::HttpServerConfig;
use super::observability_routes::{health_routes, observability_routes};
use super::queue_routes::queue_routes;

/// HTTP front end for a topic registry
pub struct HttpServer {
    config: HttpServerConfig,
    router: Router,
}

impl HttpServer {
    pub fn new(registry: Arc<TopicRegistry>) -> Self {
        Self::with_config(HttpServerConfig::default(), registry)
    }

    pub fn with_config(config: HttpServerConfig, registry: Arc<TopicRegistry>) -> Self {
        let router = build_router(&config, registry);
        Self { config, router }
    }

    pub fn socket_addr(&self) -> String {
        self.config.socket_addr()
    }

    /// Get the router (for testing)
    pub fn router(self) -> Router {
        self.router
    }

    /// Serves until `shutdown` resolves, then finishes in-flight requests.
    pub async fn start_with_shutdown<F>(self, shutdown: F) -> io::Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let addr: SocketAddr = self.config.socket_addr().parse().map_err(|e| {
            io::Error::new(
                io::ErrorKind::InvalidInput,
                format!("Invalid socket address {}: {}", self.config.socket_addr(), e),
            )
        })?;

        let listener = TcpListener::bind(addr).await?;
        let bound = listener.local_addr()?.to_string();
        log_event(Event::Serving, &[("addr", &bound)]);

        axum::serve(listener, self.router)
            .with_graceful_shutdown(shutdown)
            .await
    }

    /// Serves until Ctrl-C.
    pub async fn start(self) -> io::Result<()> {
        self.start_with_shutdown(ctrl_c()).await
    }
}

async fn ctrl_c() {
    if tokio::signal::ctrl_c().await.is_err() {
        // No signal handler: serve until the process is killed
        std::future::pending::<()>().await;
    }
    log_event(Event::ShutdownBegin, &[("signal", "ctrl_c")]);
}

/// Builds the full router for `registry`.
pub fn build_router(config: &HttpServerConfig, registry: Arc<TopicRegistry>) -> Router {
    let cors = if config.cors_origins.is_empty() {
        CorsLayer::new()
            .allow_origin(Any)
            .allow_methods(Any)
            .allow_headers(Any)
    } else {
        let origins: Vec<_> = config
            .cors_origins
            .iter()
            .filter_map(|s| s.parse().ok())
            .collect();

        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods(Any)
            .allow_headers(Any)
    };

    Router::new()
        .merge(health_routes())
        .merge(queue_routes(Arc::clone(&registry)))
        .nest("/observability", observability_routes(registry))
        .layer(cors)
}
