use criterion::{Criterion, criterion_group, criterion_main};
use glam::Vec3;
use std::hint::black_box;
use surfrecon::{
    BoundingBox, Contour3D, MeshContour, ReconstructionParams, SpatialGrid, StreamContour,
    estimate_tangent_planes, orient_tangent_planes, reconstruct, sphere_points,
};

const CENTER: Vec3 = Vec3::splat(0.5);
const RADIUS: f32 = 0.3;

fn sphere_grid(points: &[Vec3], size: usize) -> SpatialGrid {
    let mut grid = SpatialGrid::new(size, BoundingBox::unit()).unwrap();
    for (i, p) in points.iter().enumerate() {
        grid.enter(i, *p);
    }
    grid
}

fn sphere_field(p: Vec3) -> Option<f32> {
    Some(p.distance(CENTER) - RADIUS)
}

// Nearest neighbour searches
fn bench_search(c: &mut Criterion) {
    let mut group = c.benchmark_group("search");
    let points = sphere_points(10000, CENTER, RADIUS);
    let grid = sphere_grid(&points, 36);

    group.bench_function("nearest", |b| {
        b.iter(|| {
            for p in points.iter().step_by(10) {
                black_box(grid.nearest(black_box(*p + Vec3::splat(0.01))));
            }
        });
    });

    group.bench_function("twenty_nearest", |b| {
        b.iter(|| {
            for p in points.iter().step_by(10) {
                let count = grid.search(black_box(*p)).take(20).count();
                black_box(count);
            }
        });
    });

    group.finish();
}

// Tangent plane estimation and orientation
fn bench_tangent_planes(c: &mut Criterion) {
    let mut group = c.benchmark_group("tangent_planes");
    let points = sphere_points(5000, CENTER, RADIUS);
    let grid = sphere_grid(&points, 20);

    group.bench_function("estimate", |b| {
        b.iter(|| {
            let (planes, graph) = estimate_tangent_planes(&points, &grid, 4, 20, f32::INFINITY);
            black_box((planes, graph));
        });
    });

    group.bench_function("orient", |b| {
        let (planes, graph) = estimate_tangent_planes(&points, &grid, 4, 20, f32::INFINITY);
        b.iter(|| {
            let mut planes = planes.clone();
            let mut graph = graph.clone();
            black_box(orient_tangent_planes(&mut planes, &mut graph));
        });
    });

    group.finish();
}

// Contouring an analytic sphere
fn bench_contour(c: &mut Criterion) {
    let mut group = c.benchmark_group("contour");
    let seed = CENTER + Vec3::X * RADIUS;

    group.bench_function("mesh_sphere_40", |b| {
        b.iter(|| {
            let mut contour = Contour3D::new(40, sphere_field, MeshContour::new()).unwrap();
            contour.march_from(seed);
            let (contour, _) = contour.finish();
            black_box(contour.into_mesh());
        });
    });

    group.bench_function("stream_sphere_40", |b| {
        b.iter(|| {
            let mut count = 0usize;
            let mut contour = Contour3D::new(
                40,
                sphere_field,
                StreamContour::new(|tri: [Vec3; 3]| {
                    black_box(tri);
                    count += 1;
                }),
            )
            .unwrap();
            contour.march_from(seed);
            drop(contour);
            black_box(count);
        });
    });

    group.finish();
}

// The whole pipeline
fn bench_reconstruct(c: &mut Criterion) {
    let mut group = c.benchmark_group("reconstruct");
    group.sample_size(10);
    let points = sphere_points(4000, Vec3::ZERO, 2.);

    group.bench_function("sphere_4000", |b| {
        let params = ReconstructionParams::default();
        b.iter(|| {
            let result = reconstruct(black_box(&points), &params).unwrap();
            black_box(result.mesh.num_faces());
        });
    });

    group.finish();
}

criterion_group!(
    benches,
    bench_search,
    bench_tangent_planes,
    bench_contour,
    bench_reconstruct
);
criterion_main!(benches);
