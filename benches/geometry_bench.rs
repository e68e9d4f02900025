//! Icosahedron generation cost at the detail levels the scene uses.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use earthglass::scene::Geometry;

fn icosahedron_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("icosahedron");
    for detail in [16, 400] {
        group.bench_function(format!("detail_{detail}"), |b| {
            b.iter(|| black_box(Geometry::icosahedron(1.0, black_box(detail))));
        });
    }
    group.finish();
}

criterion_group!(benches, icosahedron_benchmark);
criterion_main!(benches);
