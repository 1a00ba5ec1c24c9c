//! End-to-end tests: the HTTP service on a local port driven by the
//! blocking client.

mod fixtures;

use std::path::PathBuf;
use std::time::Duration;

use tokio::runtime::Runtime;
use tokio::sync::oneshot;
use uuid::Uuid;

use route_engine::api::{
    DeliveryPoint, OptimizationRequest, RouteStatus, TaskResultResponse, TaskStatus,
};
use route_engine::audit::StampedEntry;
use route_engine::client::RouteClient;
use route_engine::config::{ClientConfig, ServiceConfig};
use route_engine::error::Error;
use route_engine::model::SolveStatus;
use route_engine::service::Service;

use fixtures::{BUENOS_AIRES, LOS_ANGELES, NEW_YORK, request, request_with_depot};

const WAIT: Duration = Duration::from_secs(10);

struct TestServer {
    runtime: Option<Runtime>,
    shutdown: Option<oneshot::Sender<()>>,
    base_url: String,
}

impl TestServer {
    fn start(config: ServiceConfig) -> Self {
        let runtime = Runtime::new().unwrap();
        let service = Service::start(&config).unwrap();
        let listener = runtime
            .block_on(tokio::net::TcpListener::bind("127.0.0.1:0"))
            .unwrap();
        let base_url = format!("http://{}", listener.local_addr().unwrap());

        let (shutdown, signal) = oneshot::channel::<()>();
        runtime.spawn(service.run(listener, async move {
            let _ = signal.await;
        }));

        Self {
            runtime: Some(runtime),
            shutdown: Some(shutdown),
            base_url,
        }
    }

    fn long_haul() -> Self {
        Self::start(ServiceConfig {
            max_tour_km: 20_000.0,
            ..ServiceConfig::default()
        })
    }

    fn client(&self) -> RouteClient {
        RouteClient::new(ClientConfig {
            poll_interval: Duration::from_millis(20),
            ..ClientConfig::new(self.base_url.clone())
        })
        .unwrap()
    }
}

impl Drop for TestServer {
    fn drop(&mut self) {
        if let Some(shutdown) = self.shutdown.take() {
            let _ = shutdown.send(());
        }
        if let Some(runtime) = self.runtime.take() {
            runtime.shutdown_background();
        }
    }
}

fn coast_to_coast() -> OptimizationRequest {
    request(&[NEW_YORK, LOS_ANGELES])
}

#[test]
fn health_reports_ok() {
    let server = TestServer::long_haul();
    assert_eq!(server.client().health().unwrap().status, "ok");
}

#[test]
fn sync_optimize_returns_addresses() {
    let server = TestServer::long_haul();
    let response = server.client().optimize(&coast_to_coast()).unwrap();

    assert_eq!(response.status, RouteStatus::Success);
    assert_eq!(
        response.optimized_order,
        vec!["New York", "Los Angeles", "New York"]
    );
    assert!((response.total_distance_km - 7872.0).abs() < 10.0);
    assert!(response.estimated_travel_time_minutes > 0.0);
    assert!(response.execution_time_seconds >= 0.0);
    assert!(Uuid::parse_str(&response.route_id).is_ok());
}

#[test]
fn explicit_depot_starts_and_ends_the_route() {
    let server = TestServer::long_haul();
    let response = server
        .client()
        .optimize(&request_with_depot(&LOS_ANGELES, &[NEW_YORK]))
        .unwrap();

    assert_eq!(
        response.optimized_order,
        vec!["Los Angeles", "New York", "Los Angeles"]
    );
}

#[test]
fn city_route_visits_every_stop() {
    let server = TestServer::start(ServiceConfig::default());
    let response = server.client().optimize(&request(BUENOS_AIRES)).unwrap();

    assert_eq!(response.status, RouteStatus::Success);
    assert_eq!(response.optimized_order.len(), BUENOS_AIRES.len() + 1);
    assert_eq!(response.optimized_order.first(), response.optimized_order.last());
    for location in BUENOS_AIRES {
        assert!(response.optimized_order.iter().any(|name| name == location.name));
    }
}

#[test]
fn empty_request_is_empty_route() {
    let server = TestServer::long_haul();
    let response = server
        .client()
        .optimize(&OptimizationRequest::default())
        .unwrap();

    assert_eq!(response.status, RouteStatus::Empty);
    assert!(response.optimized_order.is_empty());
    assert_eq!(response.total_distance_km, 0.0);
}

#[test]
fn distance_bound_reports_no_solution() {
    let server = TestServer::start(ServiceConfig::default());
    let response = server.client().optimize(&coast_to_coast()).unwrap();

    assert_eq!(response.status, RouteStatus::NoSolution);
    assert!(response.optimized_order.is_empty());
}

#[test]
fn invalid_coordinate_is_unprocessable() {
    let server = TestServer::long_haul();
    let mut bad = coast_to_coast();
    bad.stops.push(DeliveryPoint::new(95.0, 0.0, "Nowhere"));

    match server.client().optimize(&bad) {
        Err(Error::UnexpectedResponse { status, body }) => {
            assert_eq!(status, 422);
            assert!(body.contains("index 2"), "{body}");
        }
        other => panic!("expected 422, got {other:?}"),
    }

    match server.client().submit(&bad) {
        Err(Error::UnexpectedResponse { status, .. }) => assert_eq!(status, 422),
        other => panic!("expected 422, got {other:?}"),
    }
}

#[test]
fn async_task_round_trip() {
    let server = TestServer::long_haul();
    let client = server.client();

    let submitted = client.submit(&coast_to_coast()).unwrap();
    assert_eq!(submitted.status, TaskStatus::Processing);

    let finished = client.wait_for(submitted.task_id, WAIT).unwrap();
    assert_eq!(finished.task_id, submitted.task_id);
    assert_eq!(finished.status, TaskStatus::Success);
    assert!(finished.error.is_none());

    let payload = finished.result.unwrap();
    assert_eq!(payload.optimized_order, vec!["0", "1", "0"]);
    assert_eq!(payload.outcome, SolveStatus::Optimized);
    assert!((payload.total_distance_km - 7872.0).abs() < 10.0);
}

#[test]
fn async_result_maps_back_to_addresses() {
    let server = TestServer::long_haul();
    let route = server
        .client()
        .optimize_async(&request_with_depot(&LOS_ANGELES, &[NEW_YORK]), WAIT)
        .unwrap();

    assert_eq!(route.status, RouteStatus::Success);
    assert_eq!(
        route.optimized_order,
        vec!["Los Angeles", "New York", "Los Angeles"]
    );
    assert!((route.total_distance_km - 7872.0).abs() < 10.0);
    assert!(route.estimated_travel_time_minutes > 0.0);
}

#[test]
fn async_no_solution_is_not_an_empty_route() {
    let server = TestServer::start(ServiceConfig::default());
    let client = server.client();

    let bounded = client.optimize_async(&coast_to_coast(), WAIT).unwrap();
    assert_eq!(bounded.status, RouteStatus::NoSolution);
    assert!(bounded.optimized_order.is_empty());

    let empty = client
        .optimize_async(&OptimizationRequest::default(), WAIT)
        .unwrap();
    assert_eq!(empty.status, RouteStatus::Empty);
    assert!(empty.optimized_order.is_empty());
}

#[test]
fn unknown_task_is_not_found() {
    let server = TestServer::long_haul();
    let id = Uuid::new_v4();

    assert!(matches!(
        server.client().poll(id),
        Err(Error::TaskNotFound(found)) if found == id
    ));

    let response = reqwest::blocking::get(format!("{}/api/v1/tasks/{id}", server.base_url)).unwrap();
    assert_eq!(response.status(), reqwest::StatusCode::NOT_FOUND);
    let body: TaskResultResponse = response.json().unwrap();
    assert_eq!(body.status, TaskStatus::NotFound);
    assert!(body.result.is_none());
}

#[test]
fn sync_routes_are_audited() {
    let dir = tempfile::tempdir().unwrap();
    let path: PathBuf = dir.path().join("routes.jsonl");
    let server = TestServer::start(ServiceConfig {
        max_tour_km: 20_000.0,
        audit_log: Some(path.clone()),
        ..ServiceConfig::default()
    });
    let client = server.client();

    let first = client.optimize(&coast_to_coast()).unwrap();
    let second = client.optimize(&request(&BUENOS_AIRES[..3])).unwrap();

    let log = std::fs::read_to_string(&path).unwrap();
    let entries: Vec<StampedEntry> = log
        .lines()
        .map(|line| serde_json::from_str(line).unwrap())
        .collect();

    assert_eq!(entries.len(), 2);
    assert_eq!(entries[0].entry.route_id, first.route_id);
    assert_eq!(entries[0].entry.input_stops_count, 2);
    assert_eq!(entries[0].entry.optimized_order, first.optimized_order);
    assert_eq!(entries[1].entry.route_id, second.route_id);
    assert!(!entries[1].timestamp.is_empty());
}

#[test]
fn failed_audit_write_keeps_sync_result() {
    let dir = tempfile::tempdir().unwrap();
    let server = TestServer::start(ServiceConfig {
        max_tour_km: 20_000.0,
        audit_log: Some(dir.path().join("missing").join("routes.jsonl")),
        ..ServiceConfig::default()
    });

    let response = server.client().optimize(&coast_to_coast()).unwrap();
    assert_eq!(response.status, RouteStatus::Success);
    assert_eq!(
        response.optimized_order,
        vec!["New York", "Los Angeles", "New York"]
    );
    assert!(!dir.path().join("missing").exists());
}
