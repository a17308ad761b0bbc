use circuit_links::{Config, Diagram, EdgeSpec, ObstacleSpec, route_diagram};
use criterion::{BenchmarkId, Criterion, criterion_group, criterion_main};
use std::hint::black_box;

/// `cols` x `rows` grid of nodes, each wired to its right neighbour plus
/// `extra_edges` long links that have to cross intermediate columns.
fn node_grid(cols: usize, rows: usize, extra_edges: usize) -> Diagram {
    let mut obstacles = Vec::with_capacity(cols * rows);
    for row in 0..rows {
        for col in 0..cols {
            obstacles.push(ObstacleSpec::new(
                format!("N{row}_{col}"),
                col as f32 * 260.0,
                row as f32 * 160.0,
                180.0,
                100.0,
            ));
        }
    }
    let mut edges = Vec::new();
    for row in 0..rows {
        for col in 0..cols.saturating_sub(1) {
            edges.push(EdgeSpec::new(
                format!("e{row}_{col}"),
                format!("N{row}_{col}"),
                0,
                format!("N{row}_{}", col + 1),
                0,
            ));
        }
    }
    let mut count = 0usize;
    'outer: for row in 0..rows {
        for col in 0..cols {
            for far in (col + 2)..cols {
                if count >= extra_edges {
                    break 'outer;
                }
                let target_row = (row + far) % rows.max(1);
                edges.push(EdgeSpec::new(
                    format!("x{count}"),
                    format!("N{row}_{col}"),
                    1,
                    format!("N{target_row}_{far}"),
                    1,
                ));
                count += 1;
            }
        }
    }
    Diagram { obstacles, edges }
}

fn bench_route(c: &mut Criterion) {
    let mut group = c.benchmark_group("route");
    let config = Config::default();
    for (name, cols, rows, extra) in [
        ("grid_small", 4, 3, 6),
        ("grid_medium", 8, 6, 40),
        ("grid_large", 16, 12, 200),
    ] {
        let diagram = node_grid(cols, rows, extra);
        group.bench_with_input(BenchmarkId::from_parameter(name), &diagram, |b, diagram| {
            b.iter(|| {
                let output = route_diagram(black_box(diagram), &config);
                black_box(output.links.len());
            });
        });
    }
    group.finish();
}

fn bench_index(c: &mut Criterion) {
    let mut group = c.benchmark_group("index");
    let diagram = node_grid(16, 12, 200);
    for (name, grid_cell) in [("scan", 0.0), ("grid_100", 100.0), ("grid_400", 400.0)] {
        let mut config = Config::default();
        config.router.grid_cell = grid_cell;
        group.bench_with_input(BenchmarkId::from_parameter(name), &config, |b, config| {
            b.iter(|| {
                let output = route_diagram(black_box(&diagram), config);
                black_box(output.stats.detours);
            });
        });
    }
    group.finish();
}

criterion_group!(benches, bench_route, bench_index);
criterion_main!(benches);
