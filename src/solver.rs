//! Single-vehicle route solver.
//!
//! Builds a distance matrix, constructs an initial depot-anchored tour and
//! refines it with 2-opt. The whole pipeline is pure: the same input always
//! yields the same tour unless a wall-clock limit cuts the search short.

use std::time::{Duration, Instant};

use tracing::debug;

use crate::error::{Error, Result};
use crate::haversine::HaversineMatrix;
use crate::model::{DistanceMatrix, SolveResult, Tour, validate_coordinate};
use crate::traits::DistanceMatrixProvider;

/// Default upper bound on total tour length.
pub const DEFAULT_MAX_TOUR_KM: f64 = 3000.0;

/// How the initial tour is built before local search.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Construction {
    /// Insert the point with the smallest marginal cost at its best position.
    #[default]
    CheapestInsertion,
    /// Always travel to the closest unvisited point.
    NearestNeighbor,
}

#[derive(Debug, Clone)]
pub struct SolveOptions {
    /// Tours longer than this are reported as no solution.
    pub max_tour_km: f64,
    pub construction: Construction,
    /// Maximum 2-opt passes over the tour.
    pub max_passes: usize,
    /// Wall-clock cap on local search.
    pub time_limit: Option<Duration>,
}

impl Default for SolveOptions {
    fn default() -> Self {
        Self {
            max_tour_km: DEFAULT_MAX_TOUR_KM,
            construction: Construction::default(),
            max_passes: 100,
            time_limit: None,
        }
    }
}

/// Solve with great-circle distances.
///
/// `locations` are (lat, lng) pairs; the returned tour indexes into them and
/// starts and ends at `depot_index`.
pub fn solve(
    locations: &[(f64, f64)],
    depot_index: usize,
    options: &SolveOptions,
) -> Result<SolveResult> {
    solve_with(&HaversineMatrix, locations, depot_index, options)
}

pub fn solve_with<M>(
    matrix_provider: &M,
    locations: &[(f64, f64)],
    depot_index: usize,
    options: &SolveOptions,
) -> Result<SolveResult>
where
    M: DistanceMatrixProvider,
{
    if locations.is_empty() {
        return Ok(SolveResult::empty());
    }

    if depot_index >= locations.len() {
        return Err(Error::DepotOutOfRange {
            index: depot_index,
            len: locations.len(),
        });
    }

    for (index, location) in locations.iter().enumerate() {
        validate_coordinate(index, *location)?;
    }

    if locations.len() == 1 {
        return Ok(SolveResult::optimized(
            Tour::new(vec![depot_index, depot_index]),
            0.0,
        ));
    }

    let matrix = matrix_provider.matrix_for(locations);
    if matrix.size() != locations.len() {
        return Err(Error::other(format!(
            "distance matrix has size {}, expected {}",
            matrix.size(),
            locations.len()
        )));
    }

    let mut order = match options.construction {
        Construction::CheapestInsertion => cheapest_insertion(&matrix, depot_index),
        Construction::NearestNeighbor => nearest_neighbor(&matrix, depot_index),
    };

    let passes = local_search(&mut order, &matrix, options);

    let tour = Tour::new(order);
    let total_distance_km = matrix.tour_km(&tour);

    debug!(
        points = locations.len(),
        passes,
        distance_km = total_distance_km,
        "route constructed"
    );

    if total_distance_km > options.max_tour_km {
        debug!(
            distance_km = total_distance_km,
            max_tour_km = options.max_tour_km,
            "tour exceeds distance bound"
        );
        return Ok(SolveResult::no_solution());
    }

    Ok(SolveResult::optimized(tour, total_distance_km))
}

// ============================================================================
// Construction
// ============================================================================

/// Best known position for an unrouted point: after `after`, at `delta` cost.
#[derive(Debug, Clone, Copy)]
struct Insertion {
    after: usize,
    delta: i64,
}

#[inline]
fn insertion_delta(matrix: &DistanceMatrix, from: usize, to: usize, node: usize) -> i64 {
    matrix.cost(from, node) + matrix.cost(node, to) - matrix.cost(from, to)
}

/// Scan every edge of the partial tour, first minimum wins.
fn best_insertion(matrix: &DistanceMatrix, next: &[usize], depot: usize, node: usize) -> Insertion {
    let mut best = Insertion {
        after: depot,
        delta: insertion_delta(matrix, depot, next[depot], node),
    };

    let mut from = next[depot];
    while from != depot {
        let delta = insertion_delta(matrix, from, next[from], node);
        if delta < best.delta {
            best = Insertion { after: from, delta };
        }
        from = next[from];
    }

    best
}

/// Cheapest insertion.
///
/// The partial tour is a cycle stored as successor links. Each unrouted
/// point caches its best insertion; after an insertion only points whose
/// cached edge was split need a full rescan.
fn cheapest_insertion(matrix: &DistanceMatrix, depot: usize) -> Vec<usize> {
    let n = matrix.size();
    let mut next = vec![depot; n];
    let mut routed = vec![false; n];
    routed[depot] = true;

    let mut best: Vec<Insertion> = (0..n)
        .map(|node| Insertion {
            after: depot,
            delta: insertion_delta(matrix, depot, depot, node),
        })
        .collect();

    for _ in 1..n {
        let Some(node) = (0..n)
            .filter(|&candidate| !routed[candidate])
            .min_by_key(|&candidate| (best[candidate].delta, candidate))
        else {
            break;
        };

        let after = best[node].after;
        let before = next[after];
        next[after] = node;
        next[node] = before;
        routed[node] = true;

        for other in 0..n {
            if routed[other] {
                continue;
            }

            if best[other].after == after {
                best[other] = best_insertion(matrix, &next, depot, other);
                continue;
            }

            for (from, to) in [(after, node), (node, before)] {
                let delta = insertion_delta(matrix, from, to, other);
                if delta < best[other].delta {
                    best[other] = Insertion { after: from, delta };
                }
            }
        }
    }

    let mut order = Vec::with_capacity(n + 1);
    let mut current = depot;
    loop {
        order.push(current);
        current = next[current];
        if current == depot {
            break;
        }
    }
    order.push(depot);
    order
}

/// Greedy nearest-arc construction.
fn nearest_neighbor(matrix: &DistanceMatrix, depot: usize) -> Vec<usize> {
    let n = matrix.size();
    let mut visited = vec![false; n];
    visited[depot] = true;

    let mut order = Vec::with_capacity(n + 1);
    order.push(depot);

    let mut current = depot;
    for _ in 1..n {
        let Some(nearest) = (0..n)
            .filter(|&candidate| !visited[candidate])
            .min_by_key(|&candidate| (matrix.cost(current, candidate), candidate))
        else {
            break;
        };
        visited[nearest] = true;
        order.push(nearest);
        current = nearest;
    }

    order.push(depot);
    order
}

// ============================================================================
// Local Search Operators
// ============================================================================

/// One 2-opt sweep. Reverses `order[i+1..=j]` whenever that strictly
/// shortens the tour, scanning (i, j) in ascending order.
/// Returns true if an improvement was made.
fn two_opt_improve(order: &mut [usize], matrix: &DistanceMatrix) -> bool {
    // order is closed: first == last == depot
    let edges = order.len().saturating_sub(1);
    if edges < 4 {
        return false;
    }

    let mut improved = false;
    for i in 0..edges - 2 {
        for j in i + 2..edges {
            // The first and last edges meet at the depot.
            if i == 0 && j == edges - 1 {
                continue;
            }

            let (a, b) = (order[i], order[i + 1]);
            let (c, d) = (order[j], order[j + 1]);
            let delta = matrix.cost(a, c) + matrix.cost(b, d) - matrix.cost(a, b) - matrix.cost(c, d);

            if delta < 0 {
                order[i + 1..=j].reverse();
                improved = true;
            }
        }
    }

    improved
}

/// Run 2-opt until no more improvements, the pass budget is spent or the
/// time limit elapses. Returns the number of passes run.
fn local_search(order: &mut [usize], matrix: &DistanceMatrix, options: &SolveOptions) -> usize {
    let started = Instant::now();
    let mut passes = 0;

    while passes < options.max_passes {
        if options
            .time_limit
            .is_some_and(|limit| started.elapsed() >= limit)
        {
            debug!(passes, "local search time limit reached");
            break;
        }

        passes += 1;
        if !two_opt_improve(order, matrix) {
            break;
        }
    }

    passes
}
