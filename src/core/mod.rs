//! Foundation types and math shared by every planning layer.

pub mod grid;
pub mod math;
pub mod types;

pub use grid::{GridVec, MotionVec};
pub use types::Pose2D;
