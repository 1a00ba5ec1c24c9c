//! route-engine
//!
//! Single-vehicle route optimization: haversine distance matrix, cheapest
//! insertion, 2-opt refinement, and a stateless submit/poll task layer
//! served over HTTP.

pub mod adapter;
pub mod api;
pub mod audit;
pub mod client;
pub mod config;
pub mod error;
pub mod haversine;
pub mod logging;
pub mod model;
pub mod service;
pub mod solver;
pub mod tasks;
pub mod traits;
