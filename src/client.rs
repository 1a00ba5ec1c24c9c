//! Blocking HTTP client for the routing service.
//!
//! Includes the caller-side polling loop for async tasks: the service never
//! times a task out, so waiting is bounded here.

use std::thread;
use std::time::{Duration, Instant};

use reqwest::StatusCode;
use reqwest::blocking::Response;
use serde::de::DeserializeOwned;
use tracing::debug;
use uuid::Uuid;

use crate::adapter::remap_order;
use crate::api::{
    HealthResponse, OptimizationRequest, OptimizationResponse, OptimizedRoute, TaskResultResponse,
    TaskStatus, TaskSubmitted,
};
use crate::config::ClientConfig;
use crate::error::{Error, Result};

#[derive(Debug, Clone)]
pub struct RouteClient {
    config: ClientConfig,
    client: reqwest::blocking::Client,
}

impl RouteClient {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let client = reqwest::blocking::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.config.base_url.trim_end_matches('/'), path)
    }

    pub fn health(&self) -> Result<HealthResponse> {
        decode(self.client.get(self.url("/health")).send()?)
    }

    /// Synchronous optimization; blocks until the route is solved.
    pub fn optimize(&self, request: &OptimizationRequest) -> Result<OptimizationResponse> {
        decode(
            self.client
                .post(self.url("/api/v1/optimize"))
                .json(request)
                .send()?,
        )
    }

    pub fn submit(&self, request: &OptimizationRequest) -> Result<TaskSubmitted> {
        decode(
            self.client
                .post(self.url("/api/v1/tasks"))
                .json(request)
                .send()?,
        )
    }

    /// Single non-blocking status check. Unknown ids are `TaskNotFound`.
    pub fn poll(&self, task_id: Uuid) -> Result<TaskResultResponse> {
        let response = self
            .client
            .get(self.url(&format!("/api/v1/tasks/{task_id}")))
            .send()?;
        if response.status() == StatusCode::NOT_FOUND {
            return Err(Error::TaskNotFound(task_id));
        }
        decode(response)
    }

    /// Poll until the task is terminal or `timeout` elapses.
    pub fn wait_for(&self, task_id: Uuid, timeout: Duration) -> Result<TaskResultResponse> {
        let started = Instant::now();
        loop {
            let response = self.poll(task_id)?;
            if response.status.is_terminal() {
                return Ok(response);
            }
            if started.elapsed() >= timeout {
                return Err(Error::PollTimeout(task_id));
            }
            debug!(task_id = %task_id, status = ?response.status, "task not finished yet");
            thread::sleep(self.config.poll_interval);
        }
    }

    /// Submit, wait and map the returned indices back to the addresses of
    /// `request`, whose point order is the one the service solved.
    ///
    /// A route over the distance bound comes back with
    /// [`NoSolution`](crate::api::RouteStatus::NoSolution); only a failed task is an error.
    pub fn optimize_async(
        &self,
        request: &OptimizationRequest,
        timeout: Duration,
    ) -> Result<OptimizedRoute> {
        let points = request.to_point_set()?.effective_points();
        let submitted = self.submit(request)?;
        let finished = self.wait_for(submitted.task_id, timeout)?;

        match (finished.status, finished.result) {
            (TaskStatus::Success, Some(payload)) => Ok(OptimizedRoute {
                task_id: submitted.task_id,
                optimized_order: remap_order(&points, &payload.optimized_order)?,
                total_distance_km: payload.total_distance_km,
                estimated_travel_time_minutes: payload.estimated_travel_time_minutes,
                status: payload.outcome.into(),
            }),
            (_, _) => Err(Error::WorkerFault(
                finished
                    .error
                    .unwrap_or_else(|| format!("task {} failed", submitted.task_id)),
            )),
        }
    }
}

fn decode<T: DeserializeOwned>(response: Response) -> Result<T> {
    let status = response.status();
    if !status.is_success() {
        let body = response.text().unwrap_or_default();
        return Err(Error::UnexpectedResponse {
            status: status.as_u16(),
            body,
        });
    }
    Ok(response.json()?)
}
