//! Haversine (great-circle) distances and matrix provider.
//!
//! Ignores roads; distances are straight-line over a spherical Earth.

use rayon::prelude::*;

use crate::model::{DistanceMatrix, Point};
use crate::traits::DistanceMatrixProvider;

/// Earth radius in kilometers.
pub const EARTH_RADIUS_KM: f64 = 6371.0;

/// Great-circle distance between two (lat, lng) pairs in kilometers.
///
/// `a` is clamped to `[0, 1]` so rounding overshoot on antipodal or identical
/// points never produces NaN.
pub fn haversine_km(from: (f64, f64), to: (f64, f64)) -> f64 {
    let (lat1, lng1) = from;
    let (lat2, lng2) = to;

    let lat1_rad = lat1.to_radians();
    let lat2_rad = lat2.to_radians();
    let delta_lat = (lat2 - lat1).to_radians();
    let delta_lng = (lng2 - lng1).to_radians();

    let a = (delta_lat / 2.0).sin().powi(2)
        + lat1_rad.cos() * lat2_rad.cos() * (delta_lng / 2.0).sin().powi(2);
    let a = a.clamp(0.0, 1.0);
    let c = 2.0 * a.sqrt().atan2((1.0 - a).sqrt());

    EARTH_RADIUS_KM * c
}

/// Distance between two points in kilometers.
pub fn distance_km(a: &Point, b: &Point) -> f64 {
    haversine_km(a.coords(), b.coords())
}

/// Haversine-based distance matrix provider.
#[derive(Debug, Clone, Copy, Default)]
pub struct HaversineMatrix;

impl DistanceMatrixProvider for HaversineMatrix {
    fn matrix_for(&self, locations: &[(f64, f64)]) -> DistanceMatrix {
        let n = locations.len();

        // Upper triangle only, in parallel per row; mirrored below so the
        // matrix is exactly symmetric.
        let upper: Vec<Vec<f64>> = (0..n)
            .into_par_iter()
            .map(|i| {
                locations[i + 1..]
                    .iter()
                    .map(|to| haversine_km(locations[i], *to))
                    .collect()
            })
            .collect();

        let mut km = vec![0.0; n * n];
        for (i, row) in upper.iter().enumerate() {
            for (offset, value) in row.iter().enumerate() {
                let j = i + 1 + offset;
                km[i * n + j] = *value;
                km[j * n + i] = *value;
            }
        }

        DistanceMatrix::square(n, km)
    }
}
