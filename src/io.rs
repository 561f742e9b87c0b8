//! Interfaces to the planner's external collaborators.
//!
//! The actual transport (message bus, transform service, visualization
//! topic) lives outside this crate; the planner only sees these types
//! and traits.

use crate::core::Pose2D;
use crate::error::Result;

/// A configuration-space cost grid delivered by the map source.
///
/// `data` is laid out as (angle, height, width), row-major within each
/// heading slice. Values are `0..=100`; negative values mean "unknown"
/// and are mapped to the configured unknown cost on copy.
#[derive(Clone, Debug)]
pub struct CostGrid {
    pub width: u32,
    pub height: u32,
    /// Number of discrete headings.
    pub angle: u32,
    /// Meters per cell.
    pub linear_resolution: f32,
    /// Radians per heading step.
    pub angular_resolution: f32,
    /// Pose of cell (0, 0, 0) in the map frame.
    pub origin: Pose2D,
    pub data: Vec<i8>,
}

impl CostGrid {
    /// Number of cells a well-formed `data` array must carry.
    #[inline]
    pub fn expected_len(&self) -> usize {
        self.width as usize * self.height as usize * self.angle as usize
    }
}

/// Supplies the vehicle's current pose in the map frame.
///
/// A lookup may fail (transform unavailable or stale); the planning cycle
/// is skipped and retried on the next period.
pub trait PoseSource {
    fn lookup(&mut self) -> Result<Pose2D>;
}

/// Receives the planned path, republished wholesale each cycle.
pub trait PathSink {
    fn publish(&mut self, path: &[Pose2D]);
}

/// A single sample of the cost-to-go field, for visualization.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FieldPoint {
    pub x: f32,
    pub y: f32,
    /// Cost-to-go value, scaled for display.
    pub z: f32,
}

/// Receives the heuristic field as a point cloud. Visualization only;
/// planning never depends on it.
pub trait DiagnosticSink {
    fn publish_field(&mut self, points: &[FieldPoint]);
}
