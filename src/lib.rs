//! sarathi-nav - Hybrid-state lattice motion planner
//!
//! Plans drivable paths for a wheeled, non-holonomic vehicle through a
//! discretized (x, y, heading) configuration space, given a
//! configuration-space cost grid and a goal pose, inside a bounded
//! per-cycle time budget so it can sit in a closed control loop.
//!
//! # Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────┐
//! │                    node                             │  ← Cycle orchestration
//! │      (periodic loop, update buffering, sinks)       │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                   planner                           │  ← Snapshot rebuilds
//! │       (map/goal intake, search invocation)          │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                  planning/                          │  ← Core algorithms
//! │   (cost map, heuristic field, rotation cache,       │
//! │    generic lattice A*, kinematic cost model)        │
//! └─────────────────────────────────────────────────────┘
//!                          │
//! ┌─────────────────────────────────────────────────────┐
//! │                    core/                            │  ← Foundation
//! │            (grid vectors, poses, math)              │
//! └─────────────────────────────────────────────────────┘
//! ```
//!
//! The transport that delivers maps and goals, the pose-transform
//! service, and the path/diagnostic publishers are external
//! collaborators behind the interfaces in [`io`].

pub mod config;
pub mod core;
pub mod error;
pub mod io;
pub mod node;
pub mod planner;
pub mod planning;

pub use config::PlannerConfig;
pub use core::{GridVec, MotionVec, Pose2D};
pub use error::{Result, SarathiError};
pub use node::PlannerNode;
pub use planner::{Plan, Planner};
