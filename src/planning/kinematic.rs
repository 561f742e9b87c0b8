//! Kinematic cost model for a non-holonomic vehicle.
//!
//! Supplies the search engine with its branching pattern, edge pricing,
//! and cost-to-go estimate. Two expansion modes share one interface:
//!
//! - **fine**: near the search start, the full disc of offsets at every
//!   destination heading, priced as in-place turns, straight runs, or
//!   constant-curvature arcs, with infeasible motions rejected so the
//!   first path segment is immediately drivable;
//! - **coarse**: far from the start, an annulus of heading-agnostic
//!   strides treated as straight glides, with the destination heading
//!   snapped to the direction of travel.

use std::f32::consts::{FRAC_PI_2, SQRT_2};

use crate::config::PlannerConfig;
use crate::core::GridVec;

use super::cost_map::{CostMap, GridFrame};
use super::heuristic::HeuristicField;
use super::rotation::RotationCache;
use super::search::SearchModel;

/// Squared-distance threshold (in cells) below which fine expansion is
/// used.
pub const FINE_SEARCH_RADIUS: i32 = 16;

/// Weighted Euclidean cost of a lattice offset: planar axes combined
/// quadratically, the cyclic heading axis wrapped and added linearly.
#[inline]
pub fn euclid_cost(d: GridVec, coef: [f32; 3], angle: i32) -> f32 {
    let c = d.cycled(angle);
    let planar = ((coef[0] * c.x as f32).powi(2) + (coef[1] * c.y as f32).powi(2)).sqrt();
    planar + (coef[2] * c.t as f32).abs()
}

/// Precomputed neighbor offset sets, rebuilt with the rotation cache
/// whenever the map resolution changes.
#[derive(Clone, Debug)]
pub struct SearchLists {
    /// Disc of radius `range` at every destination heading.
    pub fine: Vec<GridVec>,
    /// Annulus between `range/2` and `range`, heading offset zero.
    pub coarse: Vec<GridVec>,
}

impl SearchLists {
    pub fn generate(range: i32, angle: i32) -> Self {
        let mut fine = Vec::new();
        let mut coarse = Vec::new();
        for dx in -range..=range {
            for dy in -range..=range {
                let r = (dx as f32).hypot(dy as f32);
                if r > range as f32 {
                    continue;
                }
                for dt in 0..angle {
                    fine.push(GridVec::new(dx, dy, dt));
                }
                if r >= (range / 2) as f32 {
                    coarse.push(GridVec::new(dx, dy, 0));
                }
            }
        }
        Self { fine, coarse }
    }
}

/// The [`SearchModel`] the planner hands to the engine, borrowing one
/// consistent snapshot for the duration of a single search.
pub struct MotionModel<'a> {
    config: &'a PlannerConfig,
    frame: &'a GridFrame,
    cost_map: &'a CostMap,
    heuristic: &'a HeuristicField,
    rotation: &'a RotationCache,
    lists: &'a SearchLists,
    range: i32,
    ec: [f32; 3],
    ec_rough: [f32; 3],
    rough: bool,
    goal: GridVec,
}

impl<'a> MotionModel<'a> {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        config: &'a PlannerConfig,
        frame: &'a GridFrame,
        cost_map: &'a CostMap,
        heuristic: &'a HeuristicField,
        rotation: &'a RotationCache,
        lists: &'a SearchLists,
        range: i32,
    ) -> Self {
        let ec = [
            1.0 / config.max_vel,
            1.0 / config.max_vel,
            config.weight_ang_vel / config.max_ang_vel,
        ];
        Self {
            config,
            frame,
            cost_map,
            heuristic,
            rotation,
            lists,
            range,
            ec,
            ec_rough: [ec[0], ec[1], 0.0],
            rough: false,
            goal: GridVec::default(),
        }
    }

    #[inline]
    fn coef(&self) -> [f32; 3] {
        if self.rough {
            self.ec_rough
        } else {
            self.ec
        }
    }

    /// Price a long-range straight glide. The destination snaps to the
    /// exact goal state when close enough; otherwise its heading follows
    /// the direction of travel.
    fn glide_cost(&self, from: GridVec, d: GridVec, to: &mut GridVec, mut cost: f32) -> Option<f32> {
        if (*to - self.goal).len() < (self.range / 2) as f32 {
            *to = self.goal;
        }
        let (sum, step) = self.cost_map.line_cost(from, d)?;
        if to.x == self.goal.x && to.y == self.goal.y {
            to.t = self.goal.t;
        } else {
            let t = ((d.y as f32).atan2(d.x as f32) / self.frame.angular_resolution).round() as i32;
            to.t = t.rem_euclid(self.frame.angle as i32);
        }
        cost += sum * self.frame.linear_resolution * step;
        Some(cost)
    }

    /// Price a short-range motion under the full kinematic constraints.
    fn arc_cost(&self, from: GridVec, d: GridVec, to: &GridVec, mut cost: f32) -> Option<f32> {
        if d.x == 0 && d.y == 0 {
            // In-place turn
            return Some(self.config.cost_in_place_turn);
        }

        let motion = self
            .rotation
            .motion(from.t, GridVec::new(d.x, d.y, to.t));
        let grid_x = (motion.x / self.frame.linear_resolution).round();
        let grid_y = (motion.y / self.frame.linear_resolution).round();
        let grid_t = (motion.t / self.frame.angular_resolution).round();

        if grid_x == 0.0 && grid_y != 0.0 {
            // Sideways translation without rolling
            return None;
        }
        if grid_t == 0.0 && grid_y != 0.0 {
            // Lateral drift at constant heading
            return None;
        }
        if motion.t.abs() >= FRAC_PI_2 {
            // More than a quarter turn needs two arcs
            return None;
        }

        let dist = motion.len();
        let forward = motion.x >= 0.0;
        if !forward {
            cost += self.config.weight_backward * dist;
        }

        if grid_t == 0.0 {
            // Straight run
            let (sum, step) = self.cost_map.line_cost(from, d)?;
            return Some(cost + sum * self.frame.linear_resolution * step);
        }

        // Constant-curvature arc
        if motion.x * motion.y * motion.t < 0.0 {
            return None;
        }
        let (sin_v, cos_v) = motion.t.sin_cos();
        let r1 = motion.y + motion.x * cos_v / sin_v;
        let mut r2 = (motion.x.powi(2) + (motion.x * cos_v / sin_v).powi(2)).sqrt();
        if (sin_v < 0.0) != !forward {
            r2 = -r2;
        }
        // Curvature at the start and end poses must agree
        if (r1 - r2).abs() > self.frame.linear_resolution * SQRT_2 {
            return None;
        }

        let ang_vel = cos_v * self.config.max_vel / (cos_v * motion.x + sin_v * motion.y);
        if ang_vel.abs() > self.config.max_ang_vel {
            // The arc cannot be driven at full speed; slow down together
            // with the angular rate and charge for it.
            let vel = r1.abs() * self.config.max_ang_vel;
            cost += dist * (vel / self.config.max_vel).abs() * self.config.weight_decel;
        }

        let (sum, step) = self.cost_map.line_cost(from, d)?;
        Some(cost + sum * self.frame.linear_resolution * step)
    }
}

impl SearchModel for MotionModel<'_> {
    fn neighbors(
        &mut self,
        current: GridVec,
        start: GridVec,
        goal: GridVec,
        out: &mut Vec<GridVec>,
    ) {
        self.goal = goal;
        let ds = (start - current).cycled(self.frame.angle as i32);
        out.clear();
        if ds.sqlen() < FINE_SEARCH_RADIUS * FINE_SEARCH_RADIUS {
            self.rough = false;
            out.extend_from_slice(&self.lists.fine);
        } else {
            self.rough = true;
            out.extend_from_slice(&self.lists.coarse);
        }
    }

    fn edge_cost(&mut self, from: GridVec, to: &mut GridVec) -> Option<f32> {
        let d = *to - from;
        let cost = euclid_cost(d, self.coef(), self.frame.angle as i32);
        if self.rough {
            self.glide_cost(from, d, to, cost)
        } else {
            self.arc_cost(from, d, to, cost)
        }
    }

    fn estimate(&self, state: GridVec, _goal: GridVec) -> f32 {
        self.heuristic.at(state.x, state.y)
    }
}
