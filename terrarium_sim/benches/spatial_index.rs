// Throughput of the bucketed spatial hash: bulk insertion, per-tick moves,
// collision probes and prey/predator sightings on a 512×512 torus.
//
// Run with: cargo bench --package terrarium_sim --bench spatial_index

use criterion::{Criterion, Throughput, criterion_group, criterion_main};
use std::hint::black_box;
use terrarium_sim::prng::GameRng;
use terrarium_sim::spatial::{Body, SpatialHashTable};
use terrarium_sim::types::{EntityId, Kind, Point};

const WORLD: f64 = 512.0;
const POPULATION: u64 = 10_000;

fn body(rng: &mut GameRng, kind: Kind) -> Body {
    Body {
        x: rng.range_f64(0.0, WORLD),
        y: rng.range_f64(0.0, WORLD),
        size: rng.range_f64(0.5, 3.0),
        kind,
        collides: true,
    }
}

fn populated_table() -> SpatialHashTable {
    let mut rng = GameRng::new(42);
    let mut table = SpatialHashTable::new(WORLD, WORLD, 5.0);
    for i in 0..POPULATION {
        let kind = if i % 10 == 0 { Kind::Rat } else { Kind::SmallFruitTree };
        table.add(EntityId(i), body(&mut rng, kind));
    }
    table
}

fn bench_insert(c: &mut Criterion) {
    let mut group = c.benchmark_group("spatial_insert");
    group.throughput(Throughput::Elements(POPULATION));
    group.bench_function("10k_bodies", |b| {
        b.iter(|| black_box(populated_table()));
    });
    group.finish();
}

fn bench_moves(c: &mut Criterion) {
    let mut table = populated_table();
    let mut rng = GameRng::new(7);
    c.bench_function("spatial_move_animal", |b| {
        b.iter(|| {
            let id = EntityId(rng.range_u64(0, POPULATION / 10) * 10);
            let to = Point::new(rng.range_f64(0.0, WORLD), rng.range_f64(0.0, WORLD));
            black_box(table.move_to(id, to))
        });
    });
}

fn bench_queries(c: &mut Criterion) {
    let table = populated_table();
    let mut rng = GameRng::new(9);

    c.bench_function("spatial_is_colliding", |b| {
        b.iter(|| {
            let id = EntityId(rng.range_u64(0, POPULATION));
            black_box(table.is_colliding(id))
        });
    });

    let prey = [Kind::SmallFruitTree];
    let predators = [Kind::Rat];
    c.bench_function("spatial_sighting_radius_20", |b| {
        b.iter(|| {
            let id = EntityId(rng.range_u64(0, POPULATION / 10) * 10);
            black_box(table.nearest_prey_and_predator(id, 20.0, &prey, &predators))
        });
    });
}

criterion_group!(benches, bench_insert, bench_moves, bench_queries);
criterion_main!(benches);
