//! Request validation, depot placement and index-to-address mapping.
//!
//! Everything here is pure. The async path relies on [`remap`] being
//! reproducible on the caller's side from nothing but the submitted point
//! order and the returned indices.

use std::time::Duration;

use uuid::Uuid;

use crate::api::{
    DeliveryPoint, OptimizationRequest, OptimizationResponse, TaskPayload, TaskResultResponse,
    TaskStatus,
};
use crate::error::{Error, Result};
use crate::model::{Point, PointSet, SolveResult};
use crate::tasks::TaskState;

/// Default average travel speed used for time estimates.
pub const DEFAULT_SPEED_KMH: f64 = 25.0;

fn to_point(index: usize, point: &DeliveryPoint) -> Result<Point> {
    Point::at(index, point.lat, point.lng, point.address.clone())
}

impl OptimizationRequest {
    /// Validate every point and resolve depot placement.
    ///
    /// Indices in validation errors refer to the effective point list.
    pub fn to_point_set(&self) -> Result<PointSet> {
        let depot = self
            .depot
            .as_ref()
            .map(|depot| to_point(0, depot))
            .transpose()?;
        let offset = usize::from(depot.is_some());
        let stops = self
            .stops
            .iter()
            .enumerate()
            .map(|(index, stop)| to_point(index + offset, stop))
            .collect::<Result<Vec<_>>>()?;

        PointSet::new(depot, stops)
    }
}

/// Map tour indices back to point labels.
pub fn remap(points: &[Point], tour: &[usize]) -> Result<Vec<String>> {
    tour.iter()
        .map(|&index| {
            points
                .get(index)
                .map(|point| point.label().to_string())
                .ok_or(Error::IndexOutOfRange {
                    index,
                    len: points.len(),
                })
        })
        .collect()
}

/// [`remap`] for the string indices carried by async task results.
pub fn remap_order(points: &[Point], order: &[String]) -> Result<Vec<String>> {
    let indices = order
        .iter()
        .map(|value| {
            value
                .parse::<usize>()
                .map_err(|_| Error::invalid_input(format!("not a tour index: {value:?}")))
        })
        .collect::<Result<Vec<_>>>()?;
    remap(points, &indices)
}

fn round2(value: f64) -> f64 {
    (value * 100.0).round() / 100.0
}

/// Round a distance to two decimals for presentation.
pub fn round_km(km: f64) -> f64 {
    round2(km)
}

/// Round a duration in minutes to two decimals for presentation.
pub fn round_minutes(minutes: f64) -> f64 {
    round2(minutes)
}

pub fn estimated_travel_minutes(total_distance_km: f64, speed_kmh: f64) -> f64 {
    total_distance_km / speed_kmh * 60.0
}

pub fn sync_response(
    route_id: Uuid,
    points: &[Point],
    result: &SolveResult,
    speed_kmh: f64,
    elapsed: Duration,
) -> Result<OptimizationResponse> {
    Ok(OptimizationResponse {
        route_id: route_id.to_string(),
        optimized_order: remap(points, result.tour.indices())?,
        total_distance_km: round_km(result.total_distance_km),
        estimated_travel_time_minutes: round_minutes(estimated_travel_minutes(
            result.total_distance_km,
            speed_kmh,
        )),
        execution_time_seconds: elapsed.as_secs_f64(),
        status: result.status.into(),
    })
}

pub fn task_payload(result: &SolveResult, speed_kmh: f64) -> TaskPayload {
    TaskPayload {
        optimized_order: result.tour.indices().iter().map(ToString::to_string).collect(),
        total_distance_km: round_km(result.total_distance_km),
        estimated_travel_time_minutes: round_minutes(estimated_travel_minutes(
            result.total_distance_km,
            speed_kmh,
        )),
        outcome: result.status,
    }
}

pub fn task_response(task_id: Uuid, state: &TaskState, speed_kmh: f64) -> TaskResultResponse {
    let (status, result, error) = match state {
        TaskState::Pending => (TaskStatus::Pending, None, None),
        TaskState::Running => (TaskStatus::Processing, None, None),
        TaskState::Succeeded(result) => (
            TaskStatus::Success,
            Some(task_payload(result, speed_kmh)),
            None,
        ),
        TaskState::Failed(reason) => (TaskStatus::Failure, None, Some(reason.clone())),
    };

    TaskResultResponse {
        task_id,
        status,
        result,
        error,
    }
}
