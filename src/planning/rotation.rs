//! Precomputed motion vectors per start heading.
//!
//! Edge evaluation needs the metric motion of every candidate offset
//! expressed in the source pose's local frame. Computing that inline
//! would cost a sine/cosine pair per expansion; instead one table per
//! discrete start heading is built whenever the map resolution changes,
//! and lookups are O(1) from then on.

use crate::core::{GridVec, MotionVec};

use super::cost_map::GridFrame;

/// Motion vectors for a single start heading, indexed by
/// (dx + range, dy + range, destination heading).
#[derive(Clone, Debug)]
pub struct RotationTable {
    size: GridVec,
    vectors: Vec<MotionVec>,
}

impl RotationTable {
    #[inline]
    fn addr(&self, d: GridVec) -> usize {
        ((d.t * self.size.y + d.y) * self.size.x + d.x) as usize
    }

    #[inline]
    pub fn motion(&self, d: GridVec) -> MotionVec {
        self.vectors[self.addr(d)]
    }
}

/// One [`RotationTable`] per discrete start heading.
#[derive(Clone, Debug)]
pub struct RotationCache {
    range: i32,
    tables: Vec<RotationTable>,
}

impl RotationCache {
    /// Precompute every table for the given frame and search radius.
    pub fn build(frame: &GridFrame, range: i32) -> Self {
        let side = range * 2 + 1;
        let angle = frame.angle as i32;
        let size = GridVec::new(side, side, angle);

        let tables = (0..angle)
            .map(|heading| {
                let rot = -(heading as f32) * frame.angular_resolution;
                let mut vectors = Vec::with_capacity((side * side * angle) as usize);
                for t in 0..angle {
                    for y in 0..side {
                        for x in 0..side {
                            let v = MotionVec::new(
                                (x - range) as f32 * frame.linear_resolution,
                                (y - range) as f32 * frame.linear_resolution,
                                t as f32 * frame.angular_resolution,
                            );
                            vectors.push(v.rotated(rot));
                        }
                    }
                }
                RotationTable { size, vectors }
            })
            .collect();

        Self { range, tables }
    }

    /// Motion vector for moving by planar offset `(d.x, d.y)` to
    /// destination heading `d.t`, as seen from `start_heading`.
    #[inline]
    pub fn motion(&self, start_heading: i32, d: GridVec) -> MotionVec {
        self.tables[start_heading as usize].motion(GridVec::new(
            d.x + self.range,
            d.y + self.range,
            d.t,
        ))
    }
}
