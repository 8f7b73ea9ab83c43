use std::thread;
use std::time::{Duration, Instant};

use submission_ecs::prelude::*;
use submission_ecs::SchedulerExit;

#[derive(Debug, Default, Clone, Copy, PartialEq)]
struct Health(u32);

fn wait_for(mut condition: impl FnMut() -> bool) -> bool {
    let deadline = Instant::now() + Duration::from_secs(5);
    while Instant::now() < deadline {
        if condition() {
            return true;
        }
        thread::sleep(Duration::from_millis(1));
    }
    false
}

#[test]
fn test_scheduler_thread_commits_and_drains() {
    let mut scheduler = SimpleSubmissionScheduler::new(
        SchedulerConfig::default()
            .with_tick_interval(Duration::from_millis(1))
            .with_max_ticks(20_000),
    );
    let root = EnginesRoot::new(&mut scheduler);
    let factory = root.entity_factory();

    let worker = thread::spawn(move || scheduler.run());

    for _ in 0..10 {
        let id = factory.next_id().unwrap();
        factory
            .build::<StructDescriptor<Health>>(id, Implementors::new().with(Health(100)))
            .unwrap();
    }
    assert!(
        wait_for(|| root.entities(|db| db.count::<Health>(GroupId::STANDARD)) == 10),
        "scheduler never committed the builds"
    );

    drop(root);
    let exit = worker.join().unwrap().unwrap();
    assert!(matches!(exit, SchedulerExit::Drained { .. }));

    // Handles outlive the root but can no longer buffer
    assert_eq!(
        factory
            .build::<StructDescriptor<Health>>(EntityId(99), Implementors::new())
            .unwrap_err(),
        EcsError::RootDisposed
    );
}

#[test]
fn test_scheduler_stops_on_failed_commit() {
    let mut scheduler = SimpleSubmissionScheduler::new(SchedulerConfig {
        tick_interval_ms: 0,
        max_ticks: Some(50),
    });
    let root = EnginesRoot::new(&mut scheduler);

    // Group 7 was never declared
    root.entity_factory()
        .build_in_group::<StructDescriptor<Health>>(EntityId(0), GroupId(7), Implementors::new())
        .unwrap();

    assert_eq!(scheduler.run().unwrap_err(), EcsError::InvalidGroup(GroupId(7)));
    assert_eq!(scheduler.ticks(), 1);
    assert!(scheduler.is_empty());
    assert_eq!(root.entity_count(), 0);
}

#[test]
fn test_one_scheduler_drives_two_roots() {
    let mut scheduler = FrameSubmissionScheduler::new();
    let first = EnginesRoot::new(&mut scheduler);
    let second = EnginesRoot::new(&mut scheduler);

    first
        .entity_factory()
        .build::<StructDescriptor<Health>>(EntityId(0), Implementors::new())
        .unwrap();
    second
        .entity_factory()
        .build::<StructDescriptor<Health>>(EntityId(0), Implementors::new())
        .unwrap();

    let summary = scheduler.submit_frame().unwrap();
    assert_eq!(summary.invoked, 2);
    assert_eq!(summary.changes, 2);

    drop(second);
    let summary = scheduler.submit_frame().unwrap();
    assert_eq!(summary.invoked, 1);
    assert_eq!(summary.dropped, 1);
    assert_eq!(first.entity_count(), 1);
}
