//! Periodic planning cycle.
//!
//! One cycle per planning period: apply any buffered map/goal updates,
//! look up the vehicle pose, search, publish. Updates arriving mid-cycle
//! stay queued in their channels until the next cycle starts, so a
//! running search never observes a half-rebuilt snapshot.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant};

use crossbeam_channel::Receiver;
use tracing::{debug, info, warn};

use crate::config::PlannerConfig;
use crate::core::Pose2D;
use crate::error::SarathiError;
use crate::io::{CostGrid, DiagnosticSink, PathSink, PoseSource};
use crate::planner::Planner;

/// Owns the planner and drives it on a fixed period.
pub struct PlannerNode {
    planner: Planner,
    map_rx: Receiver<CostGrid>,
    goal_rx: Receiver<Pose2D>,
    pose_source: Box<dyn PoseSource>,
    path_sink: Box<dyn PathSink>,
    diag_sink: Option<Box<dyn DiagnosticSink>>,
    shutdown: Arc<AtomicBool>,
    period: Duration,
}

impl PlannerNode {
    pub fn new(
        config: PlannerConfig,
        map_rx: Receiver<CostGrid>,
        goal_rx: Receiver<Pose2D>,
        pose_source: Box<dyn PoseSource>,
        path_sink: Box<dyn PathSink>,
    ) -> Self {
        let period = config.period();
        Self {
            planner: Planner::new(config),
            map_rx,
            goal_rx,
            pose_source,
            path_sink,
            diag_sink: None,
            shutdown: Arc::new(AtomicBool::new(false)),
            period,
        }
    }

    /// Attach a sink for the heuristic-field point cloud.
    pub fn with_diagnostics(mut self, sink: Box<dyn DiagnosticSink>) -> Self {
        self.diag_sink = Some(sink);
        self
    }

    /// Flag that stops [`PlannerNode::run`] at the next cycle boundary.
    pub fn shutdown_handle(&self) -> Arc<AtomicBool> {
        Arc::clone(&self.shutdown)
    }

    /// Run planning cycles until shutdown.
    pub fn run(&mut self) {
        info!("planner node started ({:?} period)", self.period);
        while !self.shutdown.load(Ordering::Acquire) {
            let cycle_start = Instant::now();
            self.cycle();
            let elapsed = cycle_start.elapsed();
            if elapsed < self.period {
                std::thread::sleep(self.period - elapsed);
            }
        }
        info!("planner node shutting down");
    }

    /// One planning cycle. Exposed for deterministic tests.
    pub fn cycle(&mut self) {
        // Apply buffered updates atomically before the search; only the
        // latest of each kind matters.
        let mut rebuilt = false;
        if let Some(map) = self.map_rx.try_iter().last() {
            self.planner.handle_map(&map);
            rebuilt = true;
        }
        if let Some(goal) = self.goal_rx.try_iter().last() {
            self.planner.handle_goal(goal);
            rebuilt = true;
        }
        if rebuilt {
            if let (Some(sink), Some(cloud)) =
                (self.diag_sink.as_mut(), self.planner.heuristic_cloud())
            {
                sink.publish_field(&cloud);
            }
        }

        if !self.planner.ready() {
            debug!("skipping cycle: waiting for map and goal");
            return;
        }

        let start = match self.pose_source.lookup() {
            Ok(pose) => pose,
            Err(e) => {
                warn!("skipping cycle: {}", e);
                return;
            }
        };

        match self.planner.plan(start) {
            Ok(plan) => self.path_sink.publish(&plan.poses),
            Err(SarathiError::NoPath | SarathiError::Aborted) => {
                // Reported by the planner; nothing is published and the
                // previous path is not reissued.
            }
            Err(e) => warn!("skipping cycle: {}", e),
        }
    }
}
