//! Cost-to-go field over the 2D projection of the map.
//!
//! A Dijkstra flood seeded at the goal cell, ignoring heading. The field
//! is an estimate for the full kinematic cost, not a strict lower bound:
//! it prices moves with the rough coefficient vector and no turning
//! terms, which is close enough to keep the lattice search goal-directed.

use std::cmp::Ordering;
use std::collections::BinaryHeap;

use tracing::debug;

use crate::core::GridVec;
use crate::io::FieldPoint;

use super::cost_map::{CostMap, GridFrame};
use super::kinematic::euclid_cost;

/// Divisor applied to field values when exported for visualization.
const DIAG_SCALE: f32 = 500.0;

/// Dense per-(x, y) cost-to-go estimates. Cells the flood never reached
/// hold `f32::INFINITY`.
#[derive(Clone, Debug)]
pub struct HeuristicField {
    width: i32,
    height: i32,
    values: Vec<f32>,
}

/// Queue entry ordered as a min-heap on tentative cost.
struct FloodEntry {
    cost: f32,
    cell: GridVec,
}

impl PartialEq for FloodEntry {
    fn eq(&self, other: &Self) -> bool {
        self.cost == other.cost
    }
}

impl Eq for FloodEntry {}

impl Ord for FloodEntry {
    fn cmp(&self, other: &Self) -> Ordering {
        other
            .cost
            .partial_cmp(&self.cost)
            .unwrap_or(Ordering::Equal)
    }
}

impl PartialOrd for FloodEntry {
    fn partial_cmp(&self, other: &Self) -> Option<Ordering> {
        Some(self.cmp(other))
    }
}

impl HeuristicField {
    /// Flood the whole map from the goal's planar cell.
    ///
    /// Expansion uses the disc of offsets with `hypot(dx, dy) <= range`
    /// (zero excluded). An edge is admitted only if the straight line to
    /// the destination crosses no lethal cell; its cost is the weighted
    /// planar length. Runs until the queue empties, so every reachable
    /// cell ends up with its relaxation fixed point.
    pub fn build(
        cost_map: &CostMap,
        frame: &GridFrame,
        goal: GridVec,
        range: i32,
        coef: [f32; 3],
    ) -> Self {
        let width = frame.width as i32;
        let height = frame.height as i32;
        let mut field = Self {
            width,
            height,
            values: vec![f32::INFINITY; (width * height) as usize],
        };

        let mut offsets = Vec::new();
        for dx in -range..=range {
            for dy in -range..=range {
                if dx == 0 && dy == 0 {
                    continue;
                }
                if (dx as f32).hypot(dy as f32) > range as f32 {
                    continue;
                }
                offsets.push(GridVec::new(dx, dy, 0));
            }
        }

        let goal = GridVec::new(goal.x, goal.y, 0);
        let mut open = BinaryHeap::new();
        *field.at_mut(goal.x, goal.y) = 0.0;
        open.push(FloodEntry {
            cost: 0.0,
            cell: goal,
        });

        let mut reached = 1usize;
        while let Some(FloodEntry { cost, cell }) = open.pop() {
            if cost > field.at(cell.x, cell.y) {
                continue;
            }
            for &d in &offsets {
                let next = cell + d;
                if next.x < 0 || next.y < 0 || next.x >= width || next.y >= height {
                    continue;
                }
                if cost_map.line_cost(cell, d).is_none() {
                    continue;
                }
                let next_cost = cost + euclid_cost(d, coef, frame.angle as i32);
                if next_cost < field.at(next.x, next.y) {
                    if field.at(next.x, next.y) == f32::INFINITY {
                        reached += 1;
                    }
                    *field.at_mut(next.x, next.y) = next_cost;
                    open.push(FloodEntry {
                        cost: next_cost,
                        cell: next,
                    });
                }
            }
        }

        debug!(
            "cost-to-go field: {}/{} cells reached",
            reached,
            width * height
        );
        field
    }

    /// Cost-to-go at a planar cell. Callers bound-check.
    #[inline]
    pub fn at(&self, x: i32, y: i32) -> f32 {
        self.values[(y * self.width + x) as usize]
    }

    #[inline]
    fn at_mut(&mut self, x: i32, y: i32) -> &mut f32 {
        &mut self.values[(y * self.width + x) as usize]
    }

    /// Export reached cells as a point cloud for visualization.
    pub fn diagnostic_cloud(&self, frame: &GridFrame) -> Vec<FieldPoint> {
        let mut points = Vec::new();
        for y in 0..self.height {
            for x in 0..self.width {
                let v = self.at(x, y);
                if v == f32::INFINITY {
                    continue;
                }
                let pose = frame.grid_to_metric(GridVec::new(x, y, 0));
                points.push(FieldPoint {
                    x: pose.x,
                    y: pose.y,
                    z: v / DIAG_SCALE,
                });
            }
        }
        points
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::Pose2D;
    use crate::io::CostGrid;
    use approx::assert_relative_eq;
    use std::f32::consts::PI;

    fn flood(data_fn: impl Fn(i32, i32) -> i8) -> (HeuristicField, CostMap, GridFrame) {
        let width = 12u32;
        let height = 12u32;
        let mut data = vec![0i8; (width * height) as usize];
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                data[(y * width as i32 + x) as usize] = data_fn(x, y);
            }
        }
        let msg = CostGrid {
            width,
            height,
            angle: 1,
            linear_resolution: 0.1,
            angular_resolution: 2.0 * PI,
            origin: Pose2D::default(),
            data,
        };
        let frame = GridFrame::from_grid(&msg);
        let mut cm = CostMap::default();
        cm.copy_from(&msg, 100);
        let coef = [1.0, 1.0, 0.0];
        let field = HeuristicField::build(&cm, &frame, GridVec::new(6, 6, 0), 3, coef);
        (field, cm, frame)
    }

    #[test]
    fn test_goal_cell_is_zero() {
        let (field, _, _) = flood(|_, _| 0);
        assert_relative_eq!(field.at(6, 6), 0.0);
    }

    #[test]
    fn test_relaxation_fixed_point() {
        // On an empty map every reached cell must equal the minimum over
        // its in-range neighbors of neighbor value + edge cost.
        let (field, cm, frame) = flood(|_, _| 0);
        let coef = [1.0, 1.0, 0.0];
        for y in 0..12 {
            for x in 0..12 {
                if x == 6 && y == 6 {
                    continue;
                }
                let mut best = f32::INFINITY;
                for dx in -3i32..=3 {
                    for dy in -3i32..=3 {
                        if dx == 0 && dy == 0 {
                            continue;
                        }
                        if (dx as f32).hypot(dy as f32) > 3.0 {
                            continue;
                        }
                        let nx = x + dx;
                        let ny = y + dy;
                        if nx < 0 || ny < 0 || nx >= 12 || ny >= 12 {
                            continue;
                        }
                        if cm
                            .line_cost(GridVec::new(nx, ny, 0), GridVec::new(-dx, -dy, 0))
                            .is_none()
                        {
                            continue;
                        }
                        let via = field.at(nx, ny)
                            + euclid_cost(GridVec::new(dx, dy, 0), coef, frame.angle as i32);
                        best = best.min(via);
                    }
                }
                assert_relative_eq!(field.at(x, y), best, epsilon = 1e-3);
            }
        }
    }

    #[test]
    fn test_walled_region_stays_unreached() {
        // Vertical lethal wall at x = 3 spanning the full height.
        let (field, _, _) = flood(|x, _| if x == 3 { 100 } else { 0 });
        assert!(field.at(0, 6).is_infinite(), "cell behind the wall reached");
        assert!(field.at(9, 6).is_finite());
    }
}
