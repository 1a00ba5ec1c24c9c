//! Core value types shared by the engine, the task layer and the adapter.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

fn in_bounds(lat: f64, lng: f64) -> bool {
    lat.is_finite()
        && lng.is_finite()
        && (-90.0..=90.0).contains(&lat)
        && (-180.0..=180.0).contains(&lng)
}

/// Check that a coordinate pair is finite and within WGS84 bounds.
pub fn validate_coordinate(index: usize, (lat, lng): (f64, f64)) -> Result<()> {
    if in_bounds(lat, lng) {
        Ok(())
    } else {
        Err(Error::InvalidCoordinate { index, lat, lng })
    }
}

/// A labelled geographic point.
///
/// Labels carry no uniqueness guarantee; two points may share a label and are
/// still distinct by position.
#[derive(Debug, Clone, PartialEq)]
pub struct Point {
    lat: f64,
    lng: f64,
    label: String,
}

impl Point {
    pub fn new(lat: f64, lng: f64, label: impl Into<String>) -> Result<Self> {
        if !in_bounds(lat, lng) {
            return Err(Error::InvalidPoint { lat, lng });
        }
        Ok(Self {
            lat,
            lng,
            label: label.into(),
        })
    }

    /// Like [`Point::new`], for the `index`-th point of a list; errors carry
    /// that index.
    pub fn at(index: usize, lat: f64, lng: f64, label: impl Into<String>) -> Result<Self> {
        validate_coordinate(index, (lat, lng))?;
        Ok(Self {
            lat,
            lng,
            label: label.into(),
        })
    }

    pub fn lat(&self) -> f64 {
        self.lat
    }

    pub fn lng(&self) -> f64 {
        self.lng
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    /// Location coordinates (lat, lng).
    pub fn coords(&self) -> (f64, f64) {
        (self.lat, self.lng)
    }
}

/// Stops plus an optional explicit depot.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointSet {
    depot: Option<Point>,
    stops: Vec<Point>,
}

impl PointSet {
    /// Build a point set. A depot without any stops is rejected.
    pub fn new(depot: Option<Point>, stops: Vec<Point>) -> Result<Self> {
        if depot.is_some() && stops.is_empty() {
            return Err(Error::invalid_input("a depot requires at least one stop"));
        }
        Ok(Self { depot, stops })
    }

    pub fn depot(&self) -> Option<&Point> {
        self.depot.as_ref()
    }

    pub fn stops(&self) -> &[Point] {
        &self.stops
    }

    pub fn is_empty(&self) -> bool {
        self.depot.is_none() && self.stops.is_empty()
    }

    /// The ordered list the engine sees: `[depot] + stops`, or just `stops`
    /// when the first stop doubles as the depot. Index 0 is always the depot.
    pub fn effective_points(&self) -> Vec<Point> {
        self.depot
            .iter()
            .chain(self.stops.iter())
            .cloned()
            .collect()
    }

    pub fn locations(&self) -> Vec<(f64, f64)> {
        self.depot
            .iter()
            .chain(self.stops.iter())
            .map(Point::coords)
            .collect()
    }
}

/// Depot-anchored visiting order, as indices into the effective point list.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Tour(Vec<usize>);

impl Tour {
    pub fn new(indices: Vec<usize>) -> Self {
        Self(indices)
    }

    pub fn indices(&self) -> &[usize] {
        &self.0
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Consecutive (from, to) pairs.
    pub fn edges(&self) -> impl Iterator<Item = (usize, usize)> + '_ {
        self.0.windows(2).map(|pair| (pair[0], pair[1]))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SolveStatus {
    Optimized,
    NoSolution,
    Empty,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SolveResult {
    pub status: SolveStatus,
    pub tour: Tour,
    /// Full precision; round only when presenting.
    pub total_distance_km: f64,
}

impl SolveResult {
    pub fn empty() -> Self {
        Self {
            status: SolveStatus::Empty,
            tour: Tour::default(),
            total_distance_km: 0.0,
        }
    }

    pub fn no_solution() -> Self {
        Self {
            status: SolveStatus::NoSolution,
            tour: Tour::default(),
            total_distance_km: 0.0,
        }
    }

    pub fn optimized(tour: Tour, total_distance_km: f64) -> Self {
        Self {
            status: SolveStatus::Optimized,
            tour,
            total_distance_km,
        }
    }
}

/// Square symmetric distance matrix, stored row-major.
///
/// Search works on integer metres so repeated additions do not drift; the
/// kilometre values are kept for the final distance sum.
#[derive(Debug, Clone, PartialEq)]
pub struct DistanceMatrix {
    size: usize,
    km: Vec<f64>,
    meters: Vec<i64>,
}

impl DistanceMatrix {
    /// Build from a flattened `size * size` kilometre matrix.
    pub fn from_km(size: usize, km: Vec<f64>) -> Result<Self> {
        if km.len() != size * size {
            return Err(Error::invalid_input(format!(
                "matrix has {} cells, expected {}",
                km.len(),
                size * size
            )));
        }
        Ok(Self::square(size, km))
    }

    /// Caller guarantees `km.len() == size * size`.
    pub(crate) fn square(size: usize, km: Vec<f64>) -> Self {
        debug_assert_eq!(km.len(), size * size);
        let meters = km.iter().map(|value| (value * 1000.0).round() as i64).collect();
        Self { size, km, meters }
    }

    pub fn size(&self) -> usize {
        self.size
    }

    #[inline]
    pub fn km(&self, from: usize, to: usize) -> f64 {
        self.km[from * self.size + to]
    }

    #[inline]
    pub fn cost(&self, from: usize, to: usize) -> i64 {
        self.meters[from * self.size + to]
    }

    /// Full-precision length of a tour in kilometres.
    pub fn tour_km(&self, tour: &Tour) -> f64 {
        tour.edges().map(|(from, to)| self.km(from, to)).sum()
    }
}
