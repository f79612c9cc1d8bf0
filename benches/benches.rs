use criterion::{criterion_group, criterion_main, Criterion};

use tactical_grid::prelude::*;

/// A 64x4x64 map with a ring of pillars, a raised block and a ladder.
fn samples() -> SampleMap {
    let mut samples = SampleMap::new();
    for i in (8..56).step_by(6) {
        for y in 0..2 {
            samples = samples
                .block(Coord::new(i, y, 8))
                .block(Coord::new(i, y, 55))
                .block(Coord::new(8, y, i))
                .block(Coord::new(55, y, i));
        }
    }

    for x in 24..40 {
        for z in 24..40 {
            samples = samples.block(Coord::new(x, 0, z));
        }
    }

    samples
        .climbable(Coord::new(23, 0, 30))
        .cover(Coord::new(20, 0, 20), Dir::NORTH)
        .cover(Coord::new(21, 0, 20), Dir::NORTH)
}

fn built() -> Grid {
    let mut grid = Grid::new(&GridSettingsBuilder::new(64, 4, 64).build()).unwrap();
    ConnectivityBuilder::build(&mut grid, &samples());
    grid
}

fn benchmarks(c: &mut Criterion) {
    let mut group = c.benchmark_group("tactical_grid");
    group.sample_size(10);

    let samples = samples();
    let mut grid = Grid::new(&GridSettingsBuilder::new(64, 4, 64).build()).unwrap();
    group.bench_function("build_64x4x64", |b| {
        b.iter(|| ConnectivityBuilder::build(&mut grid, &samples))
    });

    let grid = built();
    let settings = PathSettings::default();
    group.bench_function("path_64x4x64", |b| {
        b.iter(|| grid.find_path(Coord::new(0, 0, 0), Coord::new(63, 0, 63), &settings))
    });

    let moves = MoveSettings::default();
    group.bench_function("range_8_64x4x64", |b| {
        b.iter(|| grid.range_field(Coord::new(20, 0, 30), 8, &moves, false))
    });

    let cone = ViewCone::around(12);
    group.bench_function("shadowcast_12_64x4x64", |b| {
        b.iter(|| grid.visibility(Coord::new(16, 0, 16), &cone))
    });

    let cone = ViewCone::around(12).with_method(VisionMethod::Sightlines);
    group.bench_function("sightlines_12_64x4x64", |b| {
        b.iter(|| grid.visibility(Coord::new(16, 0, 16), &cone))
    });

    group.finish();
}

criterion_group!(benches, benchmarks);
criterion_main!(benches);
