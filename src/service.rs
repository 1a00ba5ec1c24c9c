//! HTTP front end for the sync and async optimization paths.

use std::future::Future;
use std::sync::Arc;
use std::time::Instant;

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use tokio::net::TcpListener;
use tracing::{error, info, warn};
use uuid::Uuid;

use crate::adapter;
use crate::api::{
    ErrorResponse, HealthResponse, OptimizationRequest, OptimizationResponse, TaskResultResponse,
    TaskStatus, TaskSubmitted,
};
use crate::audit::{AuditEntry, JsonLinesAudit, NullAudit};
use crate::config::ServiceConfig;
use crate::error::{Error, Result};
use crate::solver::{self, SolveOptions};
use crate::tasks::{
    MemoryTaskStore, Orchestrator, WorkerContext, WorkerPool, channel_queue,
};
use crate::traits::{AuditSink, TaskStore};

pub struct AppState {
    pub orchestrator: Orchestrator,
    pub options: SolveOptions,
    pub speed_kmh: f64,
    pub audit: Arc<dyn AuditSink>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/v1/optimize", post(optimize))
        .route("/api/v1/tasks", post(submit_task))
        .route("/api/v1/tasks/:task_id", get(task_status))
        .with_state(state)
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = match &self {
            err if err.is_validation() => StatusCode::UNPROCESSABLE_ENTITY,
            Error::TaskNotFound(_) => StatusCode::NOT_FOUND,
            Error::Queue(_) => StatusCode::SERVICE_UNAVAILABLE,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };

        if status.is_server_error() {
            error!(error = %self, "request failed");
        } else {
            warn!(error = %self, "request rejected");
        }

        (
            status,
            Json(ErrorResponse {
                error: self.to_string(),
            }),
        )
            .into_response()
    }
}

async fn health() -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
    })
}

/// Solve on the blocking pool and answer with addresses.
async fn optimize(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizationRequest>,
) -> Result<Json<OptimizationResponse>> {
    let started = Instant::now();
    info!(stops = request.stops.len(), "starting optimize");

    let point_set = request.to_point_set()?;
    let points = point_set.effective_points();
    let locations = point_set.locations();
    let options = state.options.clone();

    let result = tokio::task::spawn_blocking(move || solver::solve(&locations, 0, &options))
        .await
        .map_err(|err| Error::WorkerFault(err.to_string()))??;

    let route_id = Uuid::new_v4();
    let response =
        adapter::sync_response(route_id, &points, &result, state.speed_kmh, started.elapsed())?;

    info!(
        route_id = %route_id,
        distance_km = response.total_distance_km,
        "finished optimize in {:.4} seconds",
        response.execution_time_seconds
    );

    let entry = AuditEntry {
        route_id: response.route_id.clone(),
        input_stops_count: request.stops.len(),
        total_distance_km: response.total_distance_km,
        optimized_order: response.optimized_order.clone(),
        status: result.status,
    };
    let audit = Arc::clone(&state.audit);
    match tokio::task::spawn_blocking(move || audit.record(&entry)).await {
        Ok(Ok(())) => {}
        Ok(Err(err)) => error!(route_id = %route_id, error = %err, "audit log write failed"),
        Err(err) => error!(route_id = %route_id, error = %err, "audit task aborted"),
    }

    Ok(Json(response))
}

async fn submit_task(
    State(state): State<Arc<AppState>>,
    Json(request): Json<OptimizationRequest>,
) -> Result<(StatusCode, Json<TaskSubmitted>)> {
    let point_set = request.to_point_set()?;
    let handle = state
        .orchestrator
        .submit_stops(point_set.locations(), 0, request.stops.len())?;

    Ok((
        StatusCode::ACCEPTED,
        Json(TaskSubmitted {
            task_id: handle.id,
            status: TaskStatus::Processing,
        }),
    ))
}

async fn task_status(
    State(state): State<Arc<AppState>>,
    Path(task_id): Path<Uuid>,
) -> Response {
    match state.orchestrator.poll(task_id) {
        Ok(task) => Json(adapter::task_response(task_id, &task, state.speed_kmh)).into_response(),
        Err(Error::TaskNotFound(_)) => (
            StatusCode::NOT_FOUND,
            Json(TaskResultResponse {
                task_id,
                status: TaskStatus::NotFound,
                result: None,
                error: Some(format!("task {task_id} not found")),
            }),
        )
            .into_response(),
        Err(err) => err.into_response(),
    }
}

/// Resolve once `signal` fires. If the signal cannot be installed the error
/// is logged and the future never resolves, so the server keeps running.
pub async fn shutdown_signal<F>(signal: F)
where
    F: Future<Output = std::io::Result<()>>,
{
    if let Err(err) = signal.await {
        error!(error = %err, "failed to listen for shutdown signal");
        std::future::pending::<()>().await;
    }
    info!("shutdown requested");
}

/// Shared state plus the worker pool consuming the task queue.
pub struct Service {
    pub state: Arc<AppState>,
    workers: WorkerPool,
}

impl Service {
    /// Wire the in-process queue, store, audit sink and workers together.
    pub fn start(config: &ServiceConfig) -> Result<Self> {
        config.validate()?;

        let audit: Arc<dyn AuditSink> = match &config.audit_log {
            Some(path) => Arc::new(JsonLinesAudit::new(path)),
            None => Arc::new(NullAudit),
        };
        let store: Arc<dyn TaskStore> = Arc::new(MemoryTaskStore::with_ttl(config.result_ttl()));
        let (queue, receiver) = channel_queue();
        let options = config.solve_options();

        let workers = WorkerPool::spawn(
            config.workers,
            receiver,
            WorkerContext {
                store: Arc::clone(&store),
                audit: Arc::clone(&audit),
                options: options.clone(),
            },
        )?;
        info!(workers = workers.len(), "worker pool started");

        let state = Arc::new(AppState {
            orchestrator: Orchestrator::new(Arc::new(queue), store),
            options,
            speed_kmh: config.average_speed_kmh,
            audit,
        });

        Ok(Self { state, workers })
    }

    /// Serve until `shutdown` resolves, then let workers drain the queue.
    pub async fn run<F>(self, listener: TcpListener, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()> + Send + 'static,
    {
        let Self { state, workers } = self;
        info!(addr = %listener.local_addr()?, "listening");

        axum::serve(listener, router(state))
            .with_graceful_shutdown(shutdown)
            .await?;

        info!("server stopped, draining workers");
        tokio::task::spawn_blocking(move || workers.join())
            .await
            .map_err(|err| Error::WorkerFault(err.to_string()))?;
        Ok(())
    }
}
