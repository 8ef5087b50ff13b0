//! # ECS Storage Benchmark
//!
//! Entity lifecycle and single-store operations:
//! - create / delete with LIFO recycling
//! - sparse lookup by entity id
//! - swap-remove
//!
//! Run with: `cargo bench --package sparrow_core --bench ecs_benchmark`

// Benchmarks don't need docs
#![allow(missing_docs)]

use criterion::{black_box, criterion_group, criterion_main, BenchmarkId, Criterion};
use sparrow_core::{Component, ComponentStore, EntityId, World};

const ENTITY_COUNT: usize = 100_000;

#[derive(Clone, Copy)]
struct Position {
    x: f32,
    y: f32,
}

impl Component for Position {
    const ID: u16 = 0;
}

#[derive(Clone, Copy)]
struct Health(u32);

impl Component for Health {
    const ID: u16 = 1;
}

/// Benchmark: create entities with a two-component bundle.
fn bench_create_entities(c: &mut Criterion) {
    let mut group = c.benchmark_group("create_entities");

    for count in [1_000, 10_000, ENTITY_COUNT] {
        group.bench_with_input(BenchmarkId::from_parameter(count), &count, |b, &count| {
            b.iter(|| {
                let mut world = World::new(count);
                for i in 0..count {
                    let f = i as f32;
                    black_box(
                        world
                            .create_entity((Position { x: f, y: f }, Health(100)))
                            .unwrap(),
                    );
                }
                world.entity_count()
            });
        });
    }

    group.finish();
}

/// Benchmark: delete then recreate every entity.
fn bench_recycle_entities(c: &mut Criterion) {
    let mut world = World::new(ENTITY_COUNT);
    let mut entities: Vec<_> = (0..ENTITY_COUNT)
        .map(|_| world.create_entity(Health(1)).unwrap())
        .collect();

    c.bench_function("recycle_100k", |b| {
        b.iter(|| {
            for entity in entities.drain(..) {
                world.delete_entity(entity);
            }
            for _ in 0..ENTITY_COUNT {
                entities.push(world.create_entity(Health(1)).unwrap());
            }
            black_box(world.entity_count())
        });
    });
}

/// Benchmark: sparse lookup of every entity.
fn bench_store_lookup(c: &mut Criterion) {
    let mut store = ComponentStore::<Position>::new(ENTITY_COUNT);
    for i in (0..ENTITY_COUNT as u32).rev() {
        store
            .add(EntityId::new(i), Position { x: i as f32, y: 0.0 })
            .unwrap();
    }

    c.bench_function("store_lookup_100k", |b| {
        b.iter(|| {
            let mut sum = 0.0f32;
            for i in 0..ENTITY_COUNT as u32 {
                if let Some(p) = store.get(EntityId::new(i)) {
                    sum += p.x + p.y;
                }
            }
            black_box(sum)
        });
    });
}

/// Benchmark: swap-remove half the store, then refill it.
fn bench_store_swap_remove(c: &mut Criterion) {
    let mut store = ComponentStore::<Health>::new(ENTITY_COUNT);
    for i in 0..ENTITY_COUNT as u32 {
        store.add(EntityId::new(i), Health(i)).unwrap();
    }

    c.bench_function("store_swap_remove_50k", |b| {
        b.iter(|| {
            for i in (0..ENTITY_COUNT as u32).step_by(2) {
                black_box(store.remove(EntityId::new(i)));
            }
            for i in (0..ENTITY_COUNT as u32).step_by(2) {
                store.add(EntityId::new(i), Health(i)).unwrap();
            }
            store.len()
        });
    });
}

/// Benchmark: dense iteration of a full store.
fn bench_store_iteration(c: &mut Criterion) {
    let mut store = ComponentStore::<Health>::new(ENTITY_COUNT);
    for i in 0..ENTITY_COUNT as u32 {
        store.add(EntityId::new(i), Health(i)).unwrap();
    }

    c.bench_function("store_iter_mut_100k", |b| {
        b.iter(|| {
            for (_, health) in store.iter_mut() {
                health.0 = health.0.wrapping_add(1);
            }
            black_box(store.as_slice().first().map(|h| h.0))
        });
    });
}

criterion_group!(
    benches,
    bench_create_entities,
    bench_recycle_entities,
    bench_store_lookup,
    bench_store_swap_remove,
    bench_store_iteration,
);
criterion_main!(benches);
