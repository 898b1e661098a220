use std::sync::Arc;

use axum::routing::{get, post};
use axum::Router;
use tokio::net::TcpListener;
use tokio_util::sync::CancellationToken;
use tower_http::cors::CorsLayer;
use tracing::info;

use graphmind_core::config::GatewayConfig;
use graphmind_workflow::{BackgroundExecutor, FlowManager, TaskManager};

use crate::routes;
use crate::state::AppState;

/// HTTP API server built on axum.
pub struct GatewayServer {
    config: GatewayConfig,
    flow: Arc<FlowManager>,
    tasks: Arc<TaskManager>,
    executor: Arc<BackgroundExecutor>,
}

impl GatewayServer {
    pub fn new(
        config: GatewayConfig,
        flow: Arc<FlowManager>,
        tasks: Arc<TaskManager>,
        executor: Arc<BackgroundExecutor>,
    ) -> Self {
        Self {
            config,
            flow,
            tasks,
            executor,
        }
    }

    /// Run the gateway server until the cancellation token is triggered.
    pub async fn run(&self, shutdown: CancellationToken) -> anyhow::Result<()> {
        let state = Arc::new(AppState {
            flow: self.flow.clone(),
            tasks: self.tasks.clone(),
            executor: self.executor.clone(),
        });

        let app = Router::new()
            .route("/api/health", get(routes::health))
            .route("/api/query", post(routes::run_query))
            .route("/api/documents/process", post(routes::process_document))
            .route("/api/tasks", get(routes::list_tasks))
            .route("/api/tasks/{id}", get(routes::get_task))
            .route("/api/tasks/cleanup", post(routes::cleanup_tasks))
            .layer(CorsLayer::permissive())
            .with_state(state);

        let listener = TcpListener::bind(&self.config.bind).await?;
        info!(bind = %self.config.bind, "Gateway listening");

        axum::serve(listener, app)
            .with_graceful_shutdown(async move { shutdown.cancelled().await })
            .await?;

        info!("Gateway shut down");
        Ok(())
    }
}
