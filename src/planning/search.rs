//! Generic A* over a 3D lattice with one cyclic axis.
//!
//! The engine knows nothing about vehicles: branching pattern, edge
//! pricing, and the cost-to-go estimate all come from a [`SearchModel`]
//! supplied by the caller, which keeps the search testable with trivial
//! models and lets the kinematic layer evolve independently.

use std::cmp::Ordering;
use std::collections::BinaryHeap;
use std::time::{Duration, Instant};

use tracing::{debug, warn};

use crate::core::GridVec;

/// Expansions between cooperative deadline checks.
const DEFAULT_TIMEOUT_CHECK_INTERVAL: usize = 256;

/// Caller-supplied strategy driving the search.
pub trait SearchModel {
    /// Fill `out` with the candidate offsets for expanding `current`.
    /// The set may depend on where `current` sits relative to the
    /// search's own start (e.g. fine motions near the start, coarse
    /// strides far from it).
    fn neighbors(&mut self, current: GridVec, start: GridVec, goal: GridVec, out: &mut Vec<GridVec>);

    /// Price the edge `from -> to`, or `None` if the motion is
    /// infeasible. The destination is passed mutably so the model can
    /// snap it (e.g. onto the exact goal state, or to the direction of
    /// travel); the engine re-wraps the heading afterwards.
    fn edge_cost(&mut self, from: GridVec, to: &mut GridVec) -> Option<f32>;

    /// Estimated remaining cost. Need not be strictly admissible; the
    /// engine only relies on it for result quality, not correctness.
    fn estimate(&self, state: GridVec, goal: GridVec) -> f32;
}

/// Counters from one search invocation.
#[derive(Clone, Copy, Debug, Default)]
pub struct SearchStats {
    /// States popped and expanded.
    pub expanded: usize,
    /// Pushes refused because the open set hit its size ceiling.
    pub dropped_pushes: usize,
    pub duration: Duration,
}

/// Outcome of one search invocation.
#[derive(Clone, Debug)]
pub enum SearchOutcome {
    /// Goal reached; `path` runs start to goal inclusive.
    Found {
        path: Vec<GridVec>,
        cost: f32,
        stats: SearchStats,
    },
    /// Open set drained without reaching the goal.
    Exhausted { stats: SearchStats },
    /// The timeout callback requested an abort.
    Aborted { stats: SearchStats },
}

/// Open-set entry ordered as a min-heap on f.
struct OpenEntry {
    f: f32,
    g: f32,
    state: GridVec,
}

impl PartialEq for OpenEntry {
    fn eq(&self, other: &Self) -> bool {
        self.f == other.f
    }
}

impl Eq for OpenEntry {}

impl Ord for OpenEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other.f.partial_cmp(&self.f).unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for OpenEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

const NO_PARENT: u32 = u32::MAX;

/// Reusable lattice A* engine.
///
/// The dense g and predecessor arrays are sized once per map via
/// [`GridAstar::reset`] and refilled per search, so repeated invocations
/// on the same map allocate nothing.
#[derive(Debug, Default)]
pub struct GridAstar {
    size: GridVec,
    g: Vec<f32>,
    parent: Vec<u32>,
    queue_size_limit: usize,
    timeout_check_interval: usize,
}

impl GridAstar {
    pub fn new() -> Self {
        Self {
            timeout_check_interval: DEFAULT_TIMEOUT_CHECK_INTERVAL,
            ..Self::default()
        }
    }

    /// Resize the state arrays for a new lattice.
    pub fn reset(&mut self, size: GridVec) {
        let cells = (size.x * size.y * size.t) as usize;
        self.size = size;
        self.g.clear();
        self.g.resize(cells, f32::INFINITY);
        self.parent.clear();
        self.parent.resize(cells, NO_PARENT);
    }

    /// Cap the open set; 0 means unlimited. Pushes beyond the ceiling
    /// are dropped and counted, trading completeness for bounded memory.
    pub fn set_queue_size_limit(&mut self, limit: usize) {
        self.queue_size_limit = limit;
    }

    /// Expansions between deadline checks. Tune down for short planning
    /// periods.
    pub fn set_timeout_check_interval(&mut self, interval: usize) {
        self.timeout_check_interval = interval.max(1);
    }

    #[inline]
    fn addr(&self, s: GridVec) -> usize {
        ((s.t * self.size.y + s.y) * self.size.x + s.x) as usize
    }

    fn backtrace(&self, from: GridVec) -> Vec<GridVec> {
        let cells_per_slice = self.size.x * self.size.y;
        let mut path = vec![from];
        let mut addr = self.addr(from);
        while self.parent[addr] != NO_PARENT {
            addr = self.parent[addr] as usize;
            let t = addr as i32 / cells_per_slice;
            let rem = addr as i32 % cells_per_slice;
            path.push(GridVec::new(rem % self.size.x, rem / self.size.x, t));
        }
        path.reverse();
        path
    }

    /// Run one search from `start` to `goal`.
    ///
    /// `budget` is the cooperative time budget: when it expires,
    /// `on_timeout` receives the best partial backtrace and decides
    /// whether to continue (the deadline is then extended by one budget)
    /// or abort.
    pub fn search<M: SearchModel>(
        &mut self,
        start: GridVec,
        goal: GridVec,
        model: &mut M,
        budget: Duration,
        mut on_timeout: impl FnMut(&[GridVec]) -> bool,
    ) -> SearchOutcome {
        let t_start = Instant::now();
        let mut deadline = t_start + budget;
        let mut stats = SearchStats::default();

        self.g.fill(f32::INFINITY);
        self.parent.fill(NO_PARENT);

        let start = GridVec::new(start.x, start.y, start.t.rem_euclid(self.size.t));
        let goal = GridVec::new(goal.x, goal.y, goal.t.rem_euclid(self.size.t));

        let start_addr = self.addr(start);
        self.g[start_addr] = 0.0;

        let mut open = BinaryHeap::new();
        open.push(OpenEntry {
            f: model.estimate(start, goal),
            g: 0.0,
            state: start,
        });

        let mut offsets = Vec::new();
        while let Some(OpenEntry { g, state, .. }) = open.pop() {
            if g > self.g[self.addr(state)] {
                continue;
            }
            if state == goal {
                stats.duration = t_start.elapsed();
                let path = self.backtrace(goal);
                debug!(
                    "search done: cost {:.3}, {} states expanded, {} pushes dropped, {:?}",
                    g, stats.expanded, stats.dropped_pushes, stats.duration
                );
                return SearchOutcome::Found {
                    path,
                    cost: g,
                    stats,
                };
            }

            stats.expanded += 1;
            if stats.expanded % self.timeout_check_interval == 0 && Instant::now() > deadline {
                let partial = self.backtrace(state);
                if !on_timeout(&partial) {
                    stats.duration = t_start.elapsed();
                    warn!(
                        "search aborted on timeout after {} expansions",
                        stats.expanded
                    );
                    return SearchOutcome::Aborted { stats };
                }
                deadline += budget;
            }

            model.neighbors(state, start, goal, &mut offsets);
            for &d in &offsets {
                let mut next = state + d;
                next.t = next.t.rem_euclid(self.size.t);
                if next.x < 0
                    || next.y < 0
                    || next.x >= self.size.x
                    || next.y >= self.size.y
                {
                    continue;
                }

                let Some(cost) = model.edge_cost(state, &mut next) else {
                    continue;
                };
                next.t = next.t.rem_euclid(self.size.t);

                let next_g = g + cost;
                let next_addr = self.addr(next);
                if next_g < self.g[next_addr] {
                    self.g[next_addr] = next_g;
                    self.parent[next_addr] = self.addr(state) as u32;
                    if self.queue_size_limit > 0 && open.len() >= self.queue_size_limit {
                        stats.dropped_pushes += 1;
                    } else {
                        open.push(OpenEntry {
                            f: next_g + model.estimate(next, goal),
                            g: next_g,
                            state: next,
                        });
                    }
                }
            }
        }

        stats.duration = t_start.elapsed();
        debug!(
            "search exhausted: {} states expanded, {} pushes dropped, {:?}",
            stats.expanded, stats.dropped_pushes, stats.duration
        );
        SearchOutcome::Exhausted { stats }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    /// 4-connected planar moves, unit cost, heading ignored.
    struct PlanarModel {
        blocked: Vec<GridVec>,
    }

    impl SearchModel for PlanarModel {
        fn neighbors(
            &mut self,
            _current: GridVec,
            _start: GridVec,
            _goal: GridVec,
            out: &mut Vec<GridVec>,
        ) {
            out.clear();
            out.extend_from_slice(&[
                GridVec::new(1, 0, 0),
                GridVec::new(-1, 0, 0),
                GridVec::new(0, 1, 0),
                GridVec::new(0, -1, 0),
            ]);
        }

        fn edge_cost(&mut self, _from: GridVec, to: &mut GridVec) -> Option<f32> {
            if self.blocked.contains(to) {
                None
            } else {
                Some(1.0)
            }
        }

        fn estimate(&self, state: GridVec, goal: GridVec) -> f32 {
            ((goal.x - state.x).abs() + (goal.y - state.y).abs()) as f32
        }
    }

    fn engine(width: i32, height: i32) -> GridAstar {
        let mut astar = GridAstar::new();
        astar.reset(GridVec::new(width, height, 1));
        astar
    }

    #[test]
    fn test_finds_shortest_manhattan_path() {
        let mut astar = engine(10, 10);
        let mut model = PlanarModel { blocked: vec![] };
        let outcome = astar.search(
            GridVec::new(0, 0, 0),
            GridVec::new(4, 3, 0),
            &mut model,
            Duration::from_secs(1),
            |_| true,
        );
        match outcome {
            SearchOutcome::Found { path, cost, .. } => {
                assert_eq!(path.first(), Some(&GridVec::new(0, 0, 0)));
                assert_eq!(path.last(), Some(&GridVec::new(4, 3, 0)));
                assert_eq!(cost, 7.0);
                assert_eq!(path.len(), 8);
            }
            other => panic!("expected a path, got {:?}", outcome_name(&other)),
        }
    }

    #[test]
    fn test_start_equals_goal() {
        let mut astar = engine(4, 4);
        let mut model = PlanarModel { blocked: vec![] };
        let outcome = astar.search(
            GridVec::new(2, 2, 0),
            GridVec::new(2, 2, 0),
            &mut model,
            Duration::from_secs(1),
            |_| true,
        );
        match outcome {
            SearchOutcome::Found { path, cost, .. } => {
                assert_eq!(path, vec![GridVec::new(2, 2, 0)]);
                assert_eq!(cost, 0.0);
            }
            other => panic!("expected a path, got {:?}", outcome_name(&other)),
        }
    }

    #[test]
    fn test_exhausts_when_goal_walled_off() {
        let mut astar = engine(5, 5);
        // Wall off the right column.
        let blocked: Vec<GridVec> = (0..5).map(|y| GridVec::new(3, y, 0)).collect();
        let mut model = PlanarModel { blocked };
        let outcome = astar.search(
            GridVec::new(0, 0, 0),
            GridVec::new(4, 4, 0),
            &mut model,
            Duration::from_secs(1),
            |_| true,
        );
        assert!(matches!(outcome, SearchOutcome::Exhausted { .. }));
    }

    #[test]
    fn test_timeout_abort() {
        let mut astar = engine(50, 50);
        astar.set_timeout_check_interval(1);
        let mut model = PlanarModel { blocked: vec![] };
        let mut calls = 0;
        let outcome = astar.search(
            GridVec::new(0, 0, 0),
            GridVec::new(49, 49, 0),
            &mut model,
            Duration::ZERO,
            |partial| {
                calls += 1;
                assert!(!partial.is_empty());
                false
            },
        );
        assert!(matches!(outcome, SearchOutcome::Aborted { .. }));
        assert_eq!(calls, 1);
    }

    #[test]
    fn test_queue_ceiling_terminates() {
        let mut astar = engine(20, 20);
        astar.set_queue_size_limit(1);
        let mut model = PlanarModel { blocked: vec![] };
        let outcome = astar.search(
            GridVec::new(0, 0, 0),
            GridVec::new(19, 19, 0),
            &mut model,
            Duration::from_secs(5),
            |_| true,
        );
        // Either outcome is acceptable; the point is bounded memory and
        // termination.
        match outcome {
            SearchOutcome::Found { stats, .. } | SearchOutcome::Exhausted { stats } => {
                assert!(stats.dropped_pushes > 0 || stats.expanded > 0);
            }
            SearchOutcome::Aborted { .. } => panic!("ceiling must not trigger timeout abort"),
        }
    }

    fn outcome_name(o: &SearchOutcome) -> &'static str {
        match o {
            SearchOutcome::Found { .. } => "Found",
            SearchOutcome::Exhausted { .. } => "Exhausted",
            SearchOutcome::Aborted { .. } => "Aborted",
        }
    }
}
