//! Test fixtures for route-engine.
//!
//! Provides real delivery locations (Buenos Aires, Las Vegas, US cities)
//! and request builders.

pub mod delivery_points;

pub use delivery_points::*;
