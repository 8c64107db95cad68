use crate::store::StoreSnapshot;
use crate::types::Repository;
use axum::{
    extract::State,
    http::StatusCode,
    response::{IntoResponse, Json},
    routing::get,
    Router,
};
use serde::{Deserialize, Serialize};
use tokio::sync::watch;
use tower_http::trace::TraceLayer;
use tracing::info;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: HealthStatus,
    pub version: String,
    pub uptime_seconds: u64,
    pub page: u32,
    pub repositories: usize,
    pub loading: bool,
    pub failed_fetches: u64,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LivenessResponse {
    pub status: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RepositoriesResponse {
    pub page: u32,
    pub loading: bool,
    pub repositories: Vec<Repository>,
}

/// Shared state for the status endpoints
#[derive(Clone)]
pub struct StatusState {
    pub store: watch::Receiver<StoreSnapshot>,
    pub start_time: std::time::Instant,
}

impl StatusState {
    pub fn new(store: watch::Receiver<StoreSnapshot>) -> Self {
        Self {
            store,
            start_time: std::time::Instant::now(),
        }
    }
}

pub fn router(state: StatusState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/livez", get(liveness_check))
        .route("/repositories", get(list_repositories))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Serve the status endpoints until the process exits
pub async fn start_status_server(
    state: StatusState,
    port: u16,
) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    let app = router(state);

    let addr = format!("0.0.0.0:{}", port);
    let listener = tokio::net::TcpListener::bind(&addr).await?;

    info!("Status server listening on http://{}", addr);

    axum::serve(listener, app).await?;

    Ok(())
}

async fn health_check(State(state): State<StatusState>) -> impl IntoResponse {
    let snapshot = state.store.borrow();

    // Failures with nothing loaded mean the list is stuck on its first page
    let status = if snapshot.failed_fetches > 0 && snapshot.repositories.is_empty() {
        HealthStatus::Degraded
    } else {
        HealthStatus::Healthy
    };

    let response = HealthResponse {
        status,
        version: env!("CARGO_PKG_VERSION").to_string(),
        uptime_seconds: state.start_time.elapsed().as_secs(),
        page: snapshot.page,
        repositories: snapshot.repositories.len(),
        loading: snapshot.loading,
        failed_fetches: snapshot.failed_fetches,
    };

    (StatusCode::OK, Json(response))
}

async fn liveness_check() -> impl IntoResponse {
    (
        StatusCode::OK,
        Json(LivenessResponse {
            status: "alive".to_string(),
        }),
    )
}

async fn list_repositories(State(state): State<StatusState>) -> impl IntoResponse {
    let response = {
        let snapshot = state.store.borrow();
        RepositoriesResponse {
            page: snapshot.page,
            loading: snapshot.loading,
            repositories: snapshot.repositories.clone(),
        }
    };

    Json(response)
}
