//! # Route optimisation module
//!
//! Computes the order in which to visit a set of targets that minimises the total distance
//! driven, starting from the rover's position and optionally finishing back at a given point.
//!
//! The distance between two points is the length of the path provider's path between them, or
//! the straight line distance if there is no path. All leg distances are computed once up front
//! into a matrix, then every visiting order is searched exhaustively by swap based recursive
//! permutation. The first strictly shortest order found is kept, so identical inputs always give
//! the identical order. Partial orders already as long as the best complete one are not extended.
//!
//! The search is O(N!), above [`RouteOptParams::max_exact_targets`] a warning is logged but the
//! search is still run to completion.

// ---------------------------------------------------------------------------
// MODULES
// ---------------------------------------------------------------------------

mod params;

pub use params::RouteOptParams;

// ---------------------------------------------------------------------------
// IMPORTS
// ---------------------------------------------------------------------------

use log::{debug, warn};
use nalgebra::{DMatrix, DVector, Vector3};
use serde::{Deserialize, Serialize};
use std::rc::Rc;

use super::ext::{path_distance, PathProvider};

// ---------------------------------------------------------------------------
// DATA STRUCTURES
// ---------------------------------------------------------------------------

/// An ordered visit of a list of targets.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Route {
    /// Indices into the target list, in visiting order
    pub order: Vec<usize>,

    /// True if the route finishes with a leg back to its start
    pub return_to_start: bool,

    /// Total length of the route including the return leg
    pub length_m: f64,
}

/// Leg distances between the start (node 0) and the targets (nodes 1 to N).
#[derive(Debug, Clone)]
pub struct LegMatrix {
    /// `dists[(i, j)]` is the distance from node `i` to node `j`
    pub dists: DMatrix<f64>,

    /// Distance from each node to the finish point, if the route has one
    pub finish: Option<DVector<f64>>,
}

/// Exhaustive route optimiser.
pub struct RouteOptimizer {
    params: RouteOptParams,

    provider: Rc<dyn PathProvider>,
}

/// Working data for the permutation search.
struct Search<'a> {
    legs: &'a LegMatrix,

    /// Node indices (1 to N) in the current order
    perm: Vec<usize>,

    best_order: Vec<usize>,
    best_length_m: f64,
}

// ---------------------------------------------------------------------------
// IMPLEMENTATIONS
// ---------------------------------------------------------------------------

impl Route {
    /// Number of targets in the route
    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }
}

impl LegMatrix {
    /// Compute every leg distance using the given provider.
    pub fn new(
        provider: &dyn PathProvider,
        start_m: &Vector3<f64>,
        targets_m: &[Vector3<f64>],
        finish_m: Option<&Vector3<f64>>,
    ) -> Self {
        let nodes: Vec<&Vector3<f64>> = std::iter::once(start_m)
            .chain(targets_m.iter())
            .collect();
        let n = nodes.len();

        let dists = DMatrix::from_fn(n, n, |i, j| {
            if i == j {
                0.0
            } else {
                path_distance(provider, nodes[i], nodes[j])
            }
        });

        let finish = finish_m.map(|f| {
            DVector::from_iterator(n, nodes.iter().map(|p| path_distance(provider, p, f)))
        });

        Self { dists, finish }
    }

    /// Number of targets (excluding the start)
    pub fn num_targets(&self) -> usize {
        self.dists.nrows() - 1
    }

    /// Length of a route visiting the targets (0 based target indices) in the given order.
    pub fn order_length(&self, order: &[usize]) -> f64 {
        let mut length_m = 0.0;
        let mut prev = 0;

        for &t in order {
            length_m += self.dists[(prev, t + 1)];
            prev = t + 1;
        }

        if let Some(ref f) = self.finish {
            length_m += f[prev];
        }

        length_m
    }
}

impl<'a> Search<'a> {
    /// Extend the order from position `k`, where the first `k` targets total `partial_m`.
    fn permute(&mut self, k: usize, partial_m: f64) {
        let n = self.perm.len();

        if k == n {
            let last = if n == 0 { 0 } else { self.perm[n - 1] };
            let total_m = partial_m
                + match self.legs.finish {
                    Some(ref f) => f[last],
                    None => 0.0,
                };

            if total_m < self.best_length_m {
                self.best_length_m = total_m;
                self.best_order.clear();
                self.best_order.extend(self.perm.iter().map(|p| p - 1));
            }
            return;
        }

        let prev = if k == 0 { 0 } else { self.perm[k - 1] };

        for i in k..n {
            self.perm.swap(k, i);

            let length_m = partial_m + self.legs.dists[(prev, self.perm[k])];
            if length_m < self.best_length_m {
                self.permute(k + 1, length_m);
            }

            self.perm.swap(k, i);
        }
    }
}

impl RouteOptimizer {
    pub fn new(params: RouteOptParams, provider: Rc<dyn PathProvider>) -> Self {
        Self { params, provider }
    }

    /// Find the shortest order to visit the targets from the start point.
    ///
    /// If `finish_m` is given the route ends with a leg from the last target to that point.
    pub fn optimise(
        &self,
        start_m: &Vector3<f64>,
        targets_m: &[Vector3<f64>],
        finish_m: Option<&Vector3<f64>>,
    ) -> Route {
        if targets_m.len() > self.params.max_exact_targets {
            warn!(
                "Optimising a route over {} targets (more than {}), this may take a long time",
                targets_m.len(),
                self.params.max_exact_targets
            );
        }

        let legs = LegMatrix::new(&*self.provider, start_m, targets_m, finish_m);
        let (order, length_m) = solve(&legs);

        debug!("Optimal order {:?} with length {:.2} m", order, length_m);

        Route {
            order,
            return_to_start: finish_m.is_some(),
            length_m,
        }
    }

    /// Length of a route visiting the targets in the given order, using the same distance metric
    /// as the optimisation.
    pub fn route_length(
        &self,
        start_m: &Vector3<f64>,
        targets_m: &[Vector3<f64>],
        order: &[usize],
        finish_m: Option<&Vector3<f64>>,
    ) -> f64 {
        LegMatrix::new(&*self.provider, start_m, targets_m, finish_m).order_length(order)
    }
}

// ---------------------------------------------------------------------------
// FUNCTIONS
// ---------------------------------------------------------------------------

/// Exhaustively search for the shortest visiting order over a leg matrix.
///
/// Returns the order (0 based target indices) and its length.
pub fn solve(legs: &LegMatrix) -> (Vec<usize>, f64) {
    let n = legs.num_targets();

    let mut search = Search {
        legs,
        perm: (1..=n).collect(),
        best_order: Vec::with_capacity(n),
        best_length_m: std::f64::INFINITY,
    };

    search.permute(0, 0.0);

    (search.best_order, search.best_length_m)
}

// ------------------------------------------------------------------------------------------------
// TESTS
// ------------------------------------------------------------------------------------------------

#[cfg(test)]
mod test {
    use super::*;
    use crate::auto::path::Path;
    use rand::{rngs::StdRng, Rng, SeedableRng};

    struct NoPaths;

    impl PathProvider for NoPaths {
        fn path(&self, _: &Vector3<f64>, _: &Vector3<f64>) -> Option<Path> {
            None
        }
    }

    /// Provider where paths must go around a wall along the x = 5 line, via (5, 0, -10).
    struct WallProvider;

    impl PathProvider for WallProvider {
        fn path(&self, from: &Vector3<f64>, to: &Vector3<f64>) -> Option<Path> {
            if (from[0] < 5.0) != (to[0] < 5.0) {
                Some(Path::new(vec![*from, Vector3::new(5.0, 0.0, -10.0), *to]))
            } else {
                Some(Path::direct(*from, *to))
            }
        }
    }

    fn optimiser() -> RouteOptimizer {
        RouteOptimizer::new(RouteOptParams::default(), Rc::new(NoPaths))
    }

    fn all_orders(n: usize) -> Vec<Vec<usize>> {
        fn rec(rem: &mut Vec<usize>, cur: &mut Vec<usize>, out: &mut Vec<Vec<usize>>) {
            if rem.is_empty() {
                out.push(cur.clone());
                return;
            }
            for i in 0..rem.len() {
                let v = rem.remove(i);
                cur.push(v);
                rec(rem, cur, out);
                cur.pop();
                rem.insert(i, v);
            }
        }

        let mut out = Vec::new();
        rec(&mut (0..n).collect(), &mut Vec::new(), &mut out);
        out
    }

    #[test]
    fn test_square_scenario() {
        let start = Vector3::new(-5.0, 0.0, 5.0);
        let targets = vec![
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 10.0),
            Vector3::new(0.0, 0.0, 10.0),
        ];

        let route = optimiser().optimise(&start, &targets, None);

        // Both this order and its mirror are optimal, the first found is kept
        assert_eq!(route.order, vec![0, 1, 2, 3]);
        assert!(!route.return_to_start);
        assert!((route.length_m - (5.0 * 2f64.sqrt() + 30.0)).abs() < 1e-9);
    }

    #[test]
    fn test_optimal_against_enumeration() {
        let mut rng = StdRng::seed_from_u64(1234);
        let opt = optimiser();

        for n in 1..=8 {
            let start = Vector3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-20.0..20.0));
            let targets: Vec<Vector3<f64>> = (0..n)
                .map(|_| Vector3::new(rng.gen_range(-20.0..20.0), 0.0, rng.gen_range(-20.0..20.0)))
                .collect();

            for finish in [None, Some(&start)].iter() {
                let route = opt.optimise(&start, &targets, *finish);
                assert_eq!(route.len(), n);

                let recomputed = opt.route_length(&start, &targets, &route.order, *finish);
                assert!((recomputed - route.length_m).abs() < 1e-9);

                let legs = LegMatrix::new(&NoPaths, &start, &targets, *finish);
                for order in all_orders(n) {
                    let l = legs.order_length(&order);
                    assert!(route.length_m <= l + 1e-9, "{:?} shorter than {:?}", order, route);
                }
            }
        }
    }

    #[test]
    fn test_above_exact_target_limit() {
        let start = Vector3::new(-5.0, 0.0, 5.0);
        let targets = vec![
            Vector3::new(10.0, 0.0, 10.0),
            Vector3::new(0.0, 0.0, 0.0),
            Vector3::new(10.0, 0.0, 0.0),
        ];

        let limited = RouteOptimizer::new(
            RouteOptParams {
                max_exact_targets: 2,
            },
            Rc::new(NoPaths),
        );

        // Only a warning, the full search still runs
        let route = limited.optimise(&start, &targets, Some(&start));
        assert_eq!(route.len(), 3);
        assert_eq!(route, optimiser().optimise(&start, &targets, Some(&start)));

        for order in all_orders(3) {
            let l = limited.route_length(&start, &targets, &order, Some(&start));
            assert!(route.length_m <= l + 1e-9);
        }
    }

    #[test]
    fn test_idempotent() {
        let mut rng = StdRng::seed_from_u64(99);
        let start = Vector3::zeros();
        let targets: Vec<Vector3<f64>> = (0..8)
            .map(|_| Vector3::new(rng.gen_range(-10.0..10.0), 0.0, rng.gen_range(-10.0..10.0)))
            .collect();
        let opt = optimiser();

        let first = opt.optimise(&start, &targets, Some(&start));
        for _ in 0..3 {
            assert_eq!(opt.optimise(&start, &targets, Some(&start)), first);
        }
    }

    #[test]
    fn test_uses_provider_distance() {
        // Every crossing of the wall is a long detour, so the far side targets are visited
        // together after the near one and the wall is crossed only once.
        let start = Vector3::new(0.0, 0.0, 0.0);
        let targets = vec![
            Vector3::new(6.0, 0.0, 0.0),
            Vector3::new(2.0, 0.0, 0.0),
            Vector3::new(8.0, 0.0, 0.0),
        ];

        let opt = RouteOptimizer::new(RouteOptParams::default(), Rc::new(WallProvider));
        let route = opt.optimise(&start, &targets, None);

        assert_eq!(route.order, vec![1, 0, 2]);

        let crossing = (Vector3::new(5.0, 0.0, -10.0) - targets[1]).norm()
            + (targets[0] - Vector3::new(5.0, 0.0, -10.0)).norm();
        assert!((route.length_m - (2.0 + crossing + 2.0)).abs() < 1e-9);
    }

    #[test]
    fn test_degenerate_inputs() {
        let opt = optimiser();
        let start = Vector3::new(1.0, 0.0, 1.0);

        let route = opt.optimise(&start, &[], Some(&start));
        assert!(route.is_empty());
        assert_eq!(route.length_m, 0.0);

        let target = Vector3::new(4.0, 0.0, 5.0);
        let route = opt.optimise(&start, &[target], Some(&start));
        assert_eq!(route.order, vec![0]);
        assert!((route.length_m - 10.0).abs() < 1e-12);
    }
}
