//! Server assembly and lifecycle.
//!
//! # Responsibility
//! - Wrap the expense router with CORS and request logging.
//! - Bind, serve, and shut down gracefully on Ctrl+C or SIGTERM.
//!
//! # Invariants
//! - Exactly one configured origin is allowed cross-origin access.

use crate::routes::{expense_router, SharedRepository};
use axum::extract::Request;
use axum::http::{HeaderValue, Method};
use axum::middleware::{self, Next};
use axum::response::Response;
use axum::Router;
use expense_core::ExpenseService;
use log::{error, info, warn};
use std::error::Error;
use std::fmt::{Display, Formatter};
use std::net::SocketAddr;
use std::sync::Arc;
use std::time::Instant;
use tokio::net::TcpListener;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};

pub const DEFAULT_ALLOWED_ORIGIN: &str = "http://localhost:3000";

/// Resolved server settings.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServerConfig {
    pub bind_addr: SocketAddr,
    /// The single origin allowed to call the API from a browser.
    pub allowed_origin: String,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            bind_addr: SocketAddr::from(([127, 0, 0, 1], 8080)),
            allowed_origin: DEFAULT_ALLOWED_ORIGIN.to_string(),
        }
    }
}

#[derive(Debug)]
pub enum ServerError {
    Io(std::io::Error),
    InvalidOrigin(String),
}

impl Display for ServerError {
    fn fmt(&self, f: &mut Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Io(err) => write!(f, "{err}"),
            Self::InvalidOrigin(origin) => write!(f, "invalid allowed origin `{origin}`"),
        }
    }
}

impl Error for ServerError {
    fn source(&self) -> Option<&(dyn Error + 'static)> {
        match self {
            Self::Io(err) => Some(err),
            Self::InvalidOrigin(_) => None,
        }
    }
}

impl From<std::io::Error> for ServerError {
    fn from(value: std::io::Error) -> Self {
        Self::Io(value)
    }
}

/// Builds the full application: routes, CORS and request logging.
pub fn build_app<R: SharedRepository>(
    service: Arc<ExpenseService<R>>,
    config: &ServerConfig,
) -> Result<Router, ServerError> {
    let cors = cors_layer(&config.allowed_origin)?;

    Ok(expense_router(service)
        .layer(cors)
        .layer(middleware::from_fn(log_request)))
}

/// Serves the ledger API until a shutdown signal arrives.
pub async fn run_server<R: SharedRepository>(
    service: Arc<ExpenseService<R>>,
    config: ServerConfig,
) -> Result<(), ServerError> {
    let app = build_app(service, &config)?;
    let listener = TcpListener::bind(config.bind_addr).await?;
    info!(
        "event=server_start module=api status=ok bind_addr={} allowed_origin={}",
        config.bind_addr, config.allowed_origin
    );

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    info!("event=server_stop module=api status=ok");
    Ok(())
}

fn cors_layer(allowed_origin: &str) -> Result<CorsLayer, ServerError> {
    let origin = HeaderValue::from_str(allowed_origin.trim())
        .map_err(|_| ServerError::InvalidOrigin(allowed_origin.to_string()))?;

    Ok(CorsLayer::new()
        .allow_origin(AllowOrigin::exact(origin))
        .allow_methods([Method::GET, Method::POST, Method::PUT, Method::DELETE])
        .allow_headers(Any))
}

async fn log_request(request: Request, next: Next) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_owned();
    let started_at = Instant::now();

    let response = next.run(request).await;

    let status = response.status();
    let duration_ms = started_at.elapsed().as_millis();
    if status.is_server_error() {
        warn!(
            "event=http_request module=api status=error method={method} path={path} http_status={} duration_ms={duration_ms}",
            status.as_u16()
        );
    } else {
        info!(
            "event=http_request module=api status=ok method={method} path={path} http_status={} duration_ms={duration_ms}",
            status.as_u16()
        );
    }

    response
}

async fn shutdown_signal() {
    let ctrl_c = async {
        if let Err(err) = tokio::signal::ctrl_c().await {
            error!("event=shutdown_signal module=api status=error signal=ctrl_c error={err}");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        use tokio::signal::unix::{signal, SignalKind};

        match signal(SignalKind::terminate()) {
            Ok(mut stream) => {
                stream.recv().await;
            }
            Err(err) => {
                error!("event=shutdown_signal module=api status=error signal=sigterm error={err}");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => info!("event=shutdown_signal module=api status=ok signal=ctrl_c"),
        _ = terminate => info!("event=shutdown_signal module=api status=ok signal=sigterm"),
    }
}

#[cfg(test)]
mod tests {
    use super::{cors_layer, ServerConfig, ServerError};

    #[test]
    fn default_config_targets_local_dev_frontend() {
        let config = ServerConfig::default();
        assert_eq!(config.bind_addr.port(), 8080);
        assert_eq!(config.allowed_origin, "http://localhost:3000");
    }

    #[test]
    fn origin_with_control_characters_is_rejected() {
        let err = cors_layer("http://bad\norigin").unwrap_err();
        assert!(matches!(err, ServerError::InvalidOrigin(_)));
    }
}
