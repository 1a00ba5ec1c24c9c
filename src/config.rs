//! Service and client configuration.
//!
//! Every service option can be given as a flag or through a
//! `ROUTE_ENGINE_*` environment variable.

use std::net::SocketAddr;
use std::path::PathBuf;
use std::time::Duration;

use clap::Parser;

use crate::adapter::DEFAULT_SPEED_KMH;
use crate::error::{Error, Result};
use crate::solver::{DEFAULT_MAX_TOUR_KM, SolveOptions};
use crate::tasks::DEFAULT_RESULT_TTL;

#[derive(Debug, Clone, Parser)]
#[command(name = "route-engine", about = "Single-vehicle route optimization service")]
pub struct ServiceConfig {
    /// Address the HTTP server listens on.
    #[arg(long, env = "ROUTE_ENGINE_BIND", default_value = "127.0.0.1:8000")]
    pub bind: SocketAddr,

    /// Number of background workers for async tasks.
    #[arg(long, env = "ROUTE_ENGINE_WORKERS", default_value_t = 2)]
    pub workers: usize,

    /// Tours longer than this are reported as no solution.
    #[arg(long, env = "ROUTE_ENGINE_MAX_TOUR_KM", default_value_t = DEFAULT_MAX_TOUR_KM)]
    pub max_tour_km: f64,

    /// Average speed used to estimate travel time.
    #[arg(long, env = "ROUTE_ENGINE_SPEED_KMH", default_value_t = DEFAULT_SPEED_KMH)]
    pub average_speed_kmh: f64,

    /// Maximum 2-opt passes per solve.
    #[arg(long, env = "ROUTE_ENGINE_MAX_PASSES", default_value_t = 100)]
    pub max_passes: usize,

    /// Optional wall-clock cap on local search, in milliseconds.
    #[arg(long, env = "ROUTE_ENGINE_TIME_LIMIT_MS")]
    pub time_limit_ms: Option<u64>,

    /// How long finished task results stay pollable, in seconds.
    #[arg(long, env = "ROUTE_ENGINE_RESULT_TTL_SECS", default_value_t = DEFAULT_RESULT_TTL.as_secs())]
    pub result_ttl_secs: u64,

    /// Append-only JSON lines audit log. Disabled when unset.
    #[arg(long, env = "ROUTE_ENGINE_AUDIT_LOG")]
    pub audit_log: Option<PathBuf>,

    /// Tracing filter directive, e.g. `info` or `route_engine=debug`.
    #[arg(long, env = "ROUTE_ENGINE_LOG", default_value = "info")]
    pub log_filter: String,
}

impl Default for ServiceConfig {
    fn default() -> Self {
        Self {
            bind: SocketAddr::from(([127, 0, 0, 1], 8000)),
            workers: 2,
            max_tour_km: DEFAULT_MAX_TOUR_KM,
            average_speed_kmh: DEFAULT_SPEED_KMH,
            max_passes: 100,
            time_limit_ms: None,
            result_ttl_secs: DEFAULT_RESULT_TTL.as_secs(),
            audit_log: None,
            log_filter: "info".to_string(),
        }
    }
}

impl ServiceConfig {
    pub fn validate(&self) -> Result<()> {
        if self.workers == 0 {
            return Err(Error::invalid_input("workers must be at least 1"));
        }
        if !(self.max_tour_km.is_finite() && self.max_tour_km > 0.0) {
            return Err(Error::invalid_input("max tour distance must be positive"));
        }
        if !(self.average_speed_kmh.is_finite() && self.average_speed_kmh > 0.0) {
            return Err(Error::invalid_input("average speed must be positive"));
        }
        if self.result_ttl_secs == 0 {
            return Err(Error::invalid_input("result ttl must be at least one second"));
        }
        Ok(())
    }

    pub fn result_ttl(&self) -> Duration {
        Duration::from_secs(self.result_ttl_secs)
    }

    pub fn solve_options(&self) -> SolveOptions {
        SolveOptions {
            max_tour_km: self.max_tour_km,
            max_passes: self.max_passes,
            time_limit: self.time_limit_ms.map(Duration::from_millis),
            ..SolveOptions::default()
        }
    }
}

#[derive(Debug, Clone)]
pub struct ClientConfig {
    pub base_url: String,
    pub timeout_secs: u64,
    /// Delay between polls while waiting for a task.
    pub poll_interval: Duration,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            base_url: "http://localhost:8000".to_string(),
            timeout_secs: 30,
            poll_interval: Duration::from_millis(500),
        }
    }
}

impl ClientConfig {
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Default::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flags_override_defaults() {
        let config = ServiceConfig::try_parse_from([
            "route-engine",
            "--bind",
            "0.0.0.0:9000",
            "--workers",
            "4",
            "--max-tour-km",
            "10000",
            "--time-limit-ms",
            "250",
            "--result-ttl-secs",
            "60",
        ])
        .unwrap();

        assert_eq!(config.bind.port(), 9000);
        assert_eq!(config.workers, 4);
        let options = config.solve_options();
        assert_eq!(options.max_tour_km, 10000.0);
        assert_eq!(options.time_limit, Some(Duration::from_millis(250)));
        assert_eq!(config.result_ttl(), Duration::from_secs(60));
    }

    #[test]
    fn test_default_matches_solver_defaults() {
        let config = ServiceConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.solve_options().max_tour_km, SolveOptions::default().max_tour_km);
        assert_eq!(config.average_speed_kmh, 25.0);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let zero_workers = ServiceConfig {
            workers: 0,
            ..ServiceConfig::default()
        };
        assert!(zero_workers.validate().is_err());

        let stalled = ServiceConfig {
            average_speed_kmh: 0.0,
            ..ServiceConfig::default()
        };
        assert!(stalled.validate().is_err());

        let forgetful = ServiceConfig {
            result_ttl_secs: 0,
            ..ServiceConfig::default()
        };
        assert!(forgetful.validate().is_err());
    }
}
