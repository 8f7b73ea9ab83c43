use criterion::{criterion_group, criterion_main, BatchSize, Criterion};
use submission_ecs::prelude::*;

#[derive(Debug, Default, Clone, Copy)]
#[allow(dead_code)]
struct Counter {
    counter: i32,
}

#[derive(Debug, Default, Clone, Copy)]
#[allow(dead_code)]
struct Position(f32, f32, f32);

struct Moving;

impl EntityDescriptor for Moving {
    type Components = (Position, Counter);
}

const COUNT: u32 = 10_000;
const GROUP: GroupId = GroupId(0);

fn setup() -> (FrameSubmissionScheduler, EnginesRoot) {
    let mut scheduler = FrameSubmissionScheduler::new();
    let root = EnginesRoot::with_config(&mut scheduler, RootConfig::default().with_group(GROUP));
    (scheduler, root)
}

fn build_struct_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_struct");

    for preallocate in [false, true] {
        let name = if preallocate {
            "build_10k_preallocated"
        } else {
            "build_10k"
        };
        group.bench_function(name, |b| {
            b.iter_batched(
                setup,
                |(mut scheduler, root)| {
                    let factory = root.entity_factory();
                    if preallocate {
                        factory
                            .preallocate_in_group::<StructDescriptor<Counter>>(
                                GROUP,
                                COUNT as usize,
                            )
                            .unwrap();
                    }
                    for id in 0..COUNT {
                        factory
                            .build_in_group::<StructDescriptor<Counter>>(
                                EntityId(id),
                                GROUP,
                                Implementors::new(),
                            )
                            .unwrap();
                    }
                    scheduler.submit_frame().unwrap();
                    (scheduler, root)
                },
                BatchSize::LargeInput,
            )
        });
    }

    group.finish();
}

fn build_bundle_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("build_bundle");

    group.bench_function("build_10k_2_components", |b| {
        b.iter_batched(
            setup,
            |(mut scheduler, root)| {
                let factory = root.entity_factory();
                for id in 0..COUNT {
                    let implementors = Implementors::new()
                        .with(Position(1.0, 2.0, 3.0))
                        .with(Counter { counter: 0 });
                    factory
                        .build::<Moving>(EntityId(id), implementors)
                        .unwrap();
                }
                scheduler.submit_frame().unwrap();
                (scheduler, root)
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

fn commit_remove_benchmark(c: &mut Criterion) {
    let mut group = c.benchmark_group("commit_remove");

    group.bench_function("remove_5k_of_10k", |b| {
        b.iter_batched(
            || {
                let (mut scheduler, root) = setup();
                let factory = root.entity_factory();
                for id in 0..COUNT {
                    factory
                        .build_in_group::<StructDescriptor<Counter>>(
                            EntityId(id),
                            GROUP,
                            Implementors::new(),
                        )
                        .unwrap();
                }
                scheduler.submit_frame().unwrap();
                (scheduler, root)
            },
            |(mut scheduler, root)| {
                let functions = root.entity_functions();
                for id in (0..COUNT).step_by(2) {
                    functions
                        .remove_from_group::<StructDescriptor<Counter>>(EntityId(id), GROUP)
                        .unwrap();
                }
                scheduler.submit_frame().unwrap();
                (scheduler, root)
            },
            BatchSize::LargeInput,
        )
    });

    group.finish();
}

criterion_group!(
    benches,
    build_struct_benchmark,
    build_bundle_benchmark,
    commit_remove_benchmark
);
criterion_main!(benches);
