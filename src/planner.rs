//! Planner state: map/goal intake, snapshot rebuilds, and the per-cycle
//! search invocation.
//!
//! The planner exclusively owns the cost map, heuristic field, and
//! rotation cache, and only ever replaces them between searches, so a
//! running search always reads one consistent snapshot.

use std::time::Instant;

use tracing::{info, warn};

use crate::config::PlannerConfig;
use crate::core::{GridVec, Pose2D};
use crate::error::{Result, SarathiError};
use crate::io::{CostGrid, FieldPoint};
use crate::planning::{
    CostMap, GridAstar, GridFrame, HeuristicField, MotionModel, RotationCache, SearchLists,
    SearchOutcome,
};

/// A finished plan: lattice states start to goal, their metric poses,
/// and the total edge cost.
#[derive(Clone, Debug)]
pub struct Plan {
    pub states: Vec<GridVec>,
    pub poses: Vec<Pose2D>,
    pub cost: f32,
}

/// Map-derived state, rebuilt wholesale on every map update.
struct MapState {
    frame: GridFrame,
    cost_map: CostMap,
    rotation: RotationCache,
    lists: SearchLists,
    range: i32,
}

/// The planning core, one instance per vehicle.
pub struct Planner {
    config: PlannerConfig,
    engine: GridAstar,
    map: Option<MapState>,
    goal: Option<Pose2D>,
    heuristic: Option<HeuristicField>,
    goal_state: GridVec,
}

impl Planner {
    pub fn new(config: PlannerConfig) -> Self {
        let mut engine = GridAstar::new();
        engine.set_queue_size_limit(config.queue_size_limit);
        Self {
            config,
            engine,
            map: None,
            goal: None,
            heuristic: None,
            goal_state: GridVec::default(),
        }
    }

    /// Whether both a map and a goal have been received.
    pub fn ready(&self) -> bool {
        self.map.is_some() && self.goal.is_some() && self.heuristic.is_some()
    }

    /// Ingest a new cost grid, replacing the previous map wholesale.
    ///
    /// The rotation cache and neighbor offset lists are only rebuilt when
    /// a resolution changed; the cost map always is. Any known goal's
    /// heuristic field is re-flooded against the new map.
    pub fn handle_map(&mut self, msg: &CostGrid) {
        if msg.data.len() != msg.expected_len() {
            warn!(
                "discarding malformed cost grid: {} cells, expected {}",
                msg.data.len(),
                msg.expected_len()
            );
            return;
        }

        let frame = GridFrame::from_grid(msg);
        info!(
            "map received: {}x{}x{} px at {:.2} m, {:.2} rad",
            frame.width, frame.height, frame.angle, frame.linear_resolution,
            frame.angular_resolution
        );

        let same_resolution = self.map.as_ref().is_some_and(|m| {
            m.frame.linear_resolution == frame.linear_resolution
                && m.frame.angular_resolution == frame.angular_resolution
        });

        let (rotation, lists, range) = match self.map.take() {
            Some(prev) if same_resolution => (prev.rotation, prev.lists, prev.range),
            _ => {
                let range = (self.config.search_range / frame.linear_resolution) as i32;
                let rotation = RotationCache::build(&frame, range);
                let lists = SearchLists::generate(range, frame.angle as i32);
                info!(
                    "rotation cache and offset lists rebuilt (range {} cells, {} fine / {} coarse offsets)",
                    range,
                    lists.fine.len(),
                    lists.coarse.len()
                );
                (rotation, lists, range)
            }
        };

        let mut cost_map = CostMap::default();
        cost_map.copy_from(msg, self.config.unknown_cost);
        self.engine.reset(frame.size());

        self.map = Some(MapState {
            frame,
            cost_map,
            rotation,
            lists,
            range,
        });

        if self.goal.is_some() {
            self.rebuild_heuristic();
        }
    }

    /// Ingest a new goal pose.
    pub fn handle_goal(&mut self, goal: Pose2D) {
        info!(
            "new goal received: ({:.2}, {:.2}, {:.2})",
            goal.x, goal.y, goal.theta
        );
        self.goal = Some(goal);
        if self.map.is_some() {
            self.rebuild_heuristic();
        }
    }

    fn rebuild_heuristic(&mut self) {
        let (map, goal) = match (&self.map, self.goal) {
            (Some(m), Some(g)) => (m, g),
            _ => return,
        };
        let goal_state = map.frame.metric_to_grid(goal);
        if !map.frame.contains(goal_state) {
            warn!(
                "goal ({}, {}) is outside the map; keeping previous cost-to-go field",
                goal_state.x, goal_state.y
            );
            return;
        }

        let coef = [
            1.0 / self.config.max_vel,
            1.0 / self.config.max_vel,
            0.0,
        ];
        let t_start = Instant::now();
        let field = HeuristicField::build(&map.cost_map, &map.frame, goal_state, map.range, coef);
        info!("cost-to-go field generated in {:?}", t_start.elapsed());

        self.heuristic = Some(field);
        self.goal_state = goal_state;
    }

    /// Heuristic field as a point cloud for the diagnostic sink.
    pub fn heuristic_cloud(&self) -> Option<Vec<FieldPoint>> {
        let map = self.map.as_ref()?;
        Some(self.heuristic.as_ref()?.diagnostic_cloud(&map.frame))
    }

    /// Run one search from the given start pose to the current goal.
    pub fn plan(&mut self, start: Pose2D) -> Result<Plan> {
        let map = self.map.as_ref().ok_or(SarathiError::NotReady)?;
        let heuristic = self.heuristic.as_ref().ok_or(SarathiError::NotReady)?;

        let start_state = map.frame.metric_to_grid(start);
        if !map.frame.contains(start_state) {
            return Err(SarathiError::OutOfMap(start_state.x, start_state.y));
        }
        let goal_state = self.goal_state;

        info!(
            "planning from ({}, {}, {}) to ({}, {}, {})",
            start_state.x, start_state.y, start_state.t, goal_state.x, goal_state.y, goal_state.t
        );

        let mut model = MotionModel::new(
            &self.config,
            &map.frame,
            &map.cost_map,
            heuristic,
            &map.rotation,
            &map.lists,
            map.range,
        );

        let t_start = Instant::now();
        let outcome = self.engine.search(
            start_state,
            goal_state,
            &mut model,
            self.config.period(),
            |_partial| {
                warn!("search timed out; continuing");
                true
            },
        );

        match outcome {
            SearchOutcome::Found { path, cost, stats } => {
                info!(
                    "path found: {} states, cost {:.3}, {:?} ({} expanded)",
                    path.len(),
                    cost,
                    t_start.elapsed(),
                    stats.expanded
                );
                let poses = path.iter().map(|&s| map.frame.grid_to_metric(s)).collect();
                Ok(Plan {
                    states: path,
                    poses,
                    cost,
                })
            }
            SearchOutcome::Exhausted { stats } => {
                info!(
                    "search failed after {} expansions ({} pushes dropped)",
                    stats.expanded, stats.dropped_pushes
                );
                Err(SarathiError::NoPath)
            }
            SearchOutcome::Aborted { .. } => Err(SarathiError::Aborted),
        }
    }
}
