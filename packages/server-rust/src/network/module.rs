//! Network module with deferred startup lifecycle.
//!
//! `new()` allocates shared state, `start()` binds the TCP listener, and
//! `serve()` accepts connections until the shutdown future resolves.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tracing::{info, warn};

use super::config::{NetworkConfig, TlsConfig};
use super::handlers::{
    health_handler, liveness_handler, readiness_handler, save_stats_handler,
    set_workflow_in_attempt_handler, AppState,
};
use super::middleware::with_http_layers;
use super::shutdown::ShutdownController;
use crate::service::{OperationPipeline, ServerConfig};

/// Manages the HTTP server lifecycle.
///
/// 1. `new()` -- allocates shared state (pipeline, shutdown controller)
/// 2. `start()` -- binds the TCP listener
/// 3. `serve()` -- serves until the shutdown signal, then drains
pub struct NetworkModule {
    config: NetworkConfig,
    listener: Option<TcpListener>,
    shutdown: Arc<ShutdownController>,
    state: AppState,
}

impl NetworkModule {
    /// Creates a new network module without binding any port.
    #[must_use]
    pub fn new(
        config: NetworkConfig,
        server_config: ServerConfig,
        pipeline: OperationPipeline,
    ) -> Self {
        let shutdown = Arc::new(ShutdownController::new());
        let state = AppState::new(pipeline, Arc::new(server_config), Arc::clone(&shutdown));
        Self {
            config,
            listener: None,
            shutdown,
            state,
        }
    }

    /// Returns a shared reference to the shutdown controller.
    #[must_use]
    pub fn shutdown_controller(&self) -> Arc<ShutdownController> {
        Arc::clone(&self.shutdown)
    }

    /// Assembles the axum router with all routes and middleware.
    ///
    /// Routes:
    /// - `GET /health`, `GET /health/live`, `GET /health/ready`
    /// - `POST /api/v1/attempt/save_stats`
    /// - `POST /api/v1/attempt/set_workflow_in_attempt`
    pub fn build_router(&self) -> Router {
        build_router(self.state.clone(), &self.config)
    }

    /// Binds the TCP listener to the configured host and port.
    ///
    /// Returns the bound port, which differs from the configured one when
    /// port 0 (OS-assigned) is used.
    ///
    /// # Errors
    ///
    /// Returns an error if the address cannot be bound.
    pub async fn start(&mut self) -> anyhow::Result<u16> {
        let listener = TcpListener::bind(self.config.bind_addr()).await?;
        let port = listener.local_addr()?.port();

        info!("TCP listener bound to {}:{}", self.config.host, port);

        self.listener = Some(listener);
        Ok(port)
    }

    /// Serves requests until `shutdown` resolves, then drains in-flight
    /// operations for up to `NetworkConfig::drain_timeout`.
    ///
    /// # Errors
    ///
    /// Returns an error if `start()` was not called first, if the TLS
    /// material cannot be loaded, or on a fatal I/O error.
    pub async fn serve(
        self,
        shutdown: impl Future<Output = ()> + Send + 'static,
    ) -> anyhow::Result<()> {
        let Some(listener) = self.listener else {
            anyhow::bail!("start() must be called before serve()");
        };
        let router = build_router(self.state, &self.config);

        self.shutdown.set_ready();

        if let Some(ref tls_config) = self.config.tls {
            serve_tls(listener, router, tls_config, shutdown).await?;
        } else {
            info!("Serving plain HTTP connections");
            axum::serve(listener, router)
                .with_graceful_shutdown(shutdown)
                .await?;
        }

        drain_in_flight(&self.shutdown, self.config.drain_timeout).await;
        Ok(())
    }
}

fn build_router(state: AppState, config: &NetworkConfig) -> Router {
    let routes = Router::new()
        .route("/health", get(health_handler))
        .route("/health/live", get(liveness_handler))
        .route("/health/ready", get(readiness_handler))
        .route("/api/v1/attempt/save_stats", post(save_stats_handler))
        .route(
            "/api/v1/attempt/set_workflow_in_attempt",
            post(set_workflow_in_attempt_handler),
        );
    with_http_layers(routes, config).with_state(state)
}

/// Serves TLS connections using `axum-server` with rustls, reusing the
/// pre-bound listener.
async fn serve_tls(
    listener: TcpListener,
    router: Router,
    tls_config: &TlsConfig,
    shutdown: impl Future<Output = ()> + Send + 'static,
) -> anyhow::Result<()> {
    use axum_server::tls_rustls::RustlsConfig;

    let rustls_config = RustlsConfig::from_pem_file(&tls_config.cert_path, &tls_config.key_path)
        .await
        .map_err(|e| anyhow::anyhow!("Failed to load TLS certificates: {e}"))?;

    let addr = listener.local_addr()?;
    let std_listener = listener.into_std()?;
    let handle = axum_server::Handle::new();
    let shutdown_handle = handle.clone();

    tokio::spawn(async move {
        shutdown.await;
        shutdown_handle.graceful_shutdown(None);
    });

    info!("Serving TLS connections on {}", addr);

    axum_server::from_tcp_rustls(std_listener, rustls_config)
        .handle(handle)
        .serve(router.into_make_service())
        .await?;
    Ok(())
}

async fn drain_in_flight(shutdown_ctrl: &ShutdownController, timeout: Duration) {
    shutdown_ctrl.trigger_shutdown();

    let pending = shutdown_ctrl.in_flight_count();
    if pending > 0 {
        info!("Waiting for {} in-flight operations", pending);
    }

    if shutdown_ctrl.wait_for_drain(timeout).await {
        info!("All in-flight operations drained");
    } else {
        warn!("Drain timeout expired with in-flight operations remaining");
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::network::HealthState;
    use crate::service::{build_operation_pipeline, OperationRouter};

    fn module() -> NetworkModule {
        let config = NetworkConfig {
            host: "127.0.0.1".to_string(),
            ..NetworkConfig::default()
        };
        NetworkModule::new(
            config,
            ServerConfig::default(),
            build_operation_pipeline(OperationRouter::new()),
        )
    }

    #[test]
    fn new_creates_module_without_binding() {
        let module = module();
        assert!(module.listener.is_none());
        assert_eq!(module.shutdown_controller().health_state(), HealthState::Starting);
    }

    #[test]
    fn shutdown_controller_returns_shared_arc() {
        let module = module();
        assert!(Arc::ptr_eq(
            &module.shutdown_controller(),
            &module.shutdown_controller()
        ));
    }

    #[tokio::test]
    async fn start_binds_to_os_assigned_port() {
        let mut module = module();
        let port = module.start().await.unwrap();
        assert!(port > 0);
        assert!(module.listener.is_some());
    }

    #[tokio::test]
    async fn serve_without_start_is_an_error() {
        let err = module()
            .serve(std::future::pending::<()>())
            .await
            .unwrap_err();
        assert!(err.to_string().contains("start() must be called"));
    }

    #[tokio::test]
    async fn serve_stops_and_drains_on_shutdown_signal() {
        let mut module = module();
        module.start().await.unwrap();
        let shutdown = module.shutdown_controller();

        module.serve(async {}).await.unwrap();
        assert_eq!(shutdown.health_state(), HealthState::Stopped);
    }
}
