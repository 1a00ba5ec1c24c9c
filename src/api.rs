//! JSON wire types shared by the HTTP service and client.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::model::SolveStatus;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeliveryPoint {
    pub lat: f64,
    pub lng: f64,
    pub address: String,
}

impl DeliveryPoint {
    pub fn new(lat: f64, lng: f64, address: impl Into<String>) -> Self {
        Self {
            lat,
            lng,
            address: address.into(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct OptimizationRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub depot: Option<DeliveryPoint>,
    pub stops: Vec<DeliveryPoint>,
}

/// Outcome label of a synchronous optimization.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum RouteStatus {
    Success,
    NoSolution,
    Empty,
}

impl From<SolveStatus> for RouteStatus {
    fn from(status: SolveStatus) -> Self {
        match status {
            SolveStatus::Optimized => Self::Success,
            SolveStatus::NoSolution => Self::NoSolution,
            SolveStatus::Empty => Self::Empty,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizationResponse {
    pub route_id: String,
    /// Addresses in visiting order, closing depot included.
    pub optimized_order: Vec<String>,
    pub total_distance_km: f64,
    pub estimated_travel_time_minutes: f64,
    pub execution_time_seconds: f64,
    pub status: RouteStatus,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum TaskStatus {
    Pending,
    Processing,
    Success,
    Failure,
    NotFound,
}

impl TaskStatus {
    pub fn is_terminal(self) -> bool {
        matches!(self, Self::Success | Self::Failure)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskSubmitted {
    pub task_id: Uuid,
    pub status: TaskStatus,
}

/// Result of a finished task. `optimized_order` holds indices into the
/// submitted effective point list, as strings.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskPayload {
    pub optimized_order: Vec<String>,
    pub total_distance_km: f64,
    pub estimated_travel_time_minutes: f64,
    pub outcome: SolveStatus,
}

/// A finished async task with its indices mapped back to addresses.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OptimizedRoute {
    pub task_id: Uuid,
    pub optimized_order: Vec<String>,
    pub total_distance_km: f64,
    pub estimated_travel_time_minutes: f64,
    pub status: RouteStatus,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TaskResultResponse {
    pub task_id: Uuid,
    pub status: TaskStatus,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub result: Option<TaskPayload>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponse {
    pub error: String,
}
