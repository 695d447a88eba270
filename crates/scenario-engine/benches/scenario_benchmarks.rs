//! Benchmarks for rasterization, scenario application and statistics.
//!
//! Run with: cargo bench --package scenario-engine --bench scenario_benchmarks

use std::sync::Arc;

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion, Throughput};
use projection::{CoordinateTransformer, CrsRegistry, ProjectionParams};
use rand::Rng;
use raster_common::{AffineTransform, RasterGrid};
use scenario_engine::{
    Edit, EngineConfig, Geometry, GeometryRasterizer, Scenario, ScenarioEditor, StatisticsEngine, ValueRule,
};

fn transformer() -> CoordinateTransformer {
    let mut registry = CrsRegistry::with_defaults();
    registry
        .register_params("LOCAL:GRID", &ProjectionParams::Geographic)
        .expect("register LOCAL:GRID");
    CoordinateTransformer::new(Arc::new(registry))
}

/// Grid of random elevations with roughly 5% no-data.
fn generate_grid(size: usize) -> RasterGrid {
    let mut rng = rand::thread_rng();
    let cells = (0..size * size)
        .map(|_| {
            if rng.gen_bool(0.05) {
                -9999.0
            } else {
                rng.gen_range(0.0..500.0)
            }
        })
        .collect();
    RasterGrid::new(size, size, cells, AffineTransform::identity(), Some(-9999.0), "LOCAL:GRID")
        .expect("valid grid")
}

/// Irregular polygon with `vertices` points spread around the grid center.
fn generate_polygon(size: usize, vertices: usize) -> Geometry {
    let mut rng = rand::thread_rng();
    let center = size as f64 / 2.0;
    let ring = (0..vertices)
        .map(|i| {
            let angle = i as f64 / vertices as f64 * std::f64::consts::TAU;
            let radius = center * rng.gen_range(0.5..0.95);
            (center + radius * angle.cos(), center + radius * angle.sin())
        })
        .collect();
    Geometry::polygon(ring)
}

// =============================================================================
// RASTERIZATION
// =============================================================================

fn bench_rasterize(c: &mut Criterion) {
    let mut group = c.benchmark_group("rasterize");

    for size in [256, 1024] {
        let grid = generate_grid(size);
        let geometry = generate_polygon(size, 64);
        group.throughput(Throughput::Elements((size * size) as u64));

        for (label, threshold) in [("sequential", usize::MAX), ("parallel", 1)] {
            let rasterizer = GeometryRasterizer::new(
                transformer(),
                EngineConfig {
                    parallel_threshold_cells: threshold,
                    ..Default::default()
                },
            );
            group.bench_with_input(BenchmarkId::new(label, size), &size, |b, _| {
                b.iter(|| black_box(rasterizer.rasterize(&geometry, "LOCAL:GRID", &grid)))
            });
        }
    }

    group.finish();
}

// =============================================================================
// SCENARIO APPLICATION
// =============================================================================

fn bench_apply(c: &mut Criterion) {
    let mut group = c.benchmark_group("apply_scenario");
    let size = 512;
    let grid = generate_grid(size);
    let editor = ScenarioEditor::new(transformer(), EngineConfig::default());

    for edits in [1, 4, 16] {
        let scenario = Scenario::new(
            "bench",
            (0..edits)
                .map(|i| {
                    let rule = match i % 3 {
                        0 => ValueRule::AddDelta { delta: 1.5 },
                        1 => ValueRule::ClampToRange { min: 10.0, max: 400.0 },
                        _ => ValueRule::SetConstant { value: 42.0 },
                    };
                    Edit::new(generate_polygon(size, 24), "LOCAL:GRID", rule)
                })
                .collect(),
        );
        group.bench_with_input(BenchmarkId::from_parameter(edits), &scenario, |b, scenario| {
            b.iter(|| black_box(editor.apply(scenario, &grid)))
        });
    }

    group.finish();
}

// =============================================================================
// STATISTICS
// =============================================================================

fn bench_summarize(c: &mut Criterion) {
    let mut group = c.benchmark_group("summarize");
    let stats = StatisticsEngine::default();

    for size in [256, 1024] {
        let grid = generate_grid(size);
        group.throughput(Throughput::Elements((size * size) as u64));
        group.bench_with_input(BenchmarkId::from_parameter(size), &grid, |b, grid| {
            b.iter(|| black_box(stats.summarize(grid, None)))
        });
    }

    group.finish();
}

criterion_group!(benches, bench_rasterize, bench_apply, bench_summarize);
criterion_main!(benches);
