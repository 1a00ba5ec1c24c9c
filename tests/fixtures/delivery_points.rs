//! Named delivery points for route tests.
//!
//! Coordinates are real places; groups are kept small enough that tours stay
//! under the default 3000 km distance bound unless stated otherwise.

#![allow(dead_code)]

use route_engine::api::{DeliveryPoint, OptimizationRequest};

/// A named location with coordinates.
#[derive(Debug, Clone)]
pub struct Location {
    pub name: &'static str,
    pub lat: f64,
    pub lng: f64,
}

impl Location {
    pub const fn new(name: &'static str, lat: f64, lng: f64) -> Self {
        Self { name, lat, lng }
    }

    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }

    pub fn delivery_point(&self) -> DeliveryPoint {
        DeliveryPoint::new(self.lat, self.lng, self.name)
    }
}

// ============================================================================
// Buenos Aires deliveries
// ============================================================================

pub const BUENOS_AIRES: &[Location] = &[
    Location::new("Obelisco, Buenos Aires", -34.6037, -58.3816),
    Location::new("Plaza Italia, Palermo", -34.5828, -58.4319),
    Location::new("Puerto Madero, CABA", -34.6177, -58.3685),
    Location::new("La Boca, CABA", -34.6358, -58.3654),
    Location::new("Recoleta Cemetery", -34.5875, -58.3930),
    Location::new("San Telmo Market", -34.6206, -58.3714),
    Location::new("Belgrano C", -34.5627, -58.4563),
    Location::new("Caballito Park", -34.6186, -58.4411),
];

// ============================================================================
// Las Vegas deliveries
// ============================================================================

pub const LAS_VEGAS: &[Location] = &[
    Location::new("Wynn Las Vegas", 36.1263781, -115.1658180),
    Location::new("Rivas Mexican Grill North", 36.1450055, -115.0482587),
    Location::new("Bellagio", 36.1126, -115.1767),
    Location::new("MGM Grand", 36.1023654, -115.1688720),
    Location::new("Bootlegger Bistro", 36.0492047, -115.1715744),
    Location::new("Green Valley Ranch Area", 36.0308, -115.0825),
    Location::new("Sunset Station Area", 36.0614, -115.0631),
    Location::new("Longhorn Casino", 36.1070664, -115.0591256),
    Location::new("I Love Sushi Henderson", 35.9916660, -115.1028343),
    Location::new("Islander's Grill", 36.0335058, -114.9856162),
    Location::new("Beers and Bets", 36.1428945, -115.1573836),
    Location::new("Budget Suites South", 36.0366259, -115.1713361),
];

// ============================================================================
// Cities far apart
// ============================================================================

pub const NEW_YORK: Location = Location::new("New York", 40.7128, -74.0060);
pub const LOS_ANGELES: Location = Location::new("Los Angeles", 34.0522, -118.2437);
pub const CHICAGO: Location = Location::new("Chicago", 41.8781, -87.6298);
pub const MIAMI: Location = Location::new("Miami", 25.7617, -80.1918);

pub fn coords(locations: &[Location]) -> Vec<(f64, f64)> {
    locations.iter().map(Location::coords).collect()
}

/// Request with the first location as implicit depot.
pub fn request(locations: &[Location]) -> OptimizationRequest {
    OptimizationRequest {
        depot: None,
        stops: locations.iter().map(Location::delivery_point).collect(),
    }
}

/// Request with an explicit depot.
pub fn request_with_depot(depot: &Location, stops: &[Location]) -> OptimizationRequest {
    OptimizationRequest {
        depot: Some(depot.delivery_point()),
        stops: stops.iter().map(Location::delivery_point).collect(),
    }
}
