//! Benchmark full planning queries on synthetic maps.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use std::f32::consts::PI;

use sarathi_nav::io::CostGrid;
use sarathi_nav::{Planner, PlannerConfig, Pose2D};

/// Map with a few lethal pillars the planner must route around.
fn pillar_grid(width: u32, height: u32, angle: u32) -> CostGrid {
    let mut data = vec![0i8; (width * height * angle) as usize];
    for t in 0..angle as i32 {
        for y in 0..height as i32 {
            for x in 0..width as i32 {
                let pillar = (x % 12 == 6) && (y % 12 == 6);
                if pillar {
                    data[((t * height as i32 + y) * width as i32 + x) as usize] = 100;
                }
            }
        }
    }
    CostGrid {
        width,
        height,
        angle,
        linear_resolution: 0.1,
        angular_resolution: 2.0 * PI / angle as f32,
        origin: Pose2D::default(),
        data,
    }
}

fn bench_plan(c: &mut Criterion) {
    let msg = pillar_grid(48, 48, 8);
    let mut planner = Planner::new(PlannerConfig::default());
    planner.handle_map(&msg);
    planner.handle_goal(Pose2D::new(4.5, 4.5, 0.0));

    c.bench_function("plan_48x48x8_pillars", |b| {
        b.iter(|| {
            let plan = planner
                .plan(black_box(Pose2D::new(0.1, 0.1, 0.0)))
                .expect("benchmark map must be solvable");
            black_box(plan.cost)
        })
    });
}

fn bench_map_ingest(c: &mut Criterion) {
    let msg = pillar_grid(48, 48, 8);

    c.bench_function("handle_map_48x48x8", |b| {
        b.iter(|| {
            let mut planner = Planner::new(PlannerConfig::default());
            planner.handle_map(black_box(&msg));
            planner.handle_goal(Pose2D::new(4.5, 4.5, 0.0));
        })
    });
}

criterion_group!(benches, bench_plan, bench_map_ingest);
criterion_main!(benches);
