// Copyright 2024 Saptak Santra
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

//! Smallest complete program: one class-like entity removed as soon as it is
//! added, and one struct-like entity whose counter is incremented once.

use std::sync::Arc;
use std::time::Instant;

use submission_ecs::prelude::*;

trait SimpleComponent: Send + Sync {
    fn name(&self) -> &str;
}

struct SimpleImplementor {
    name: String,
}

impl SimpleComponent for SimpleImplementor {
    fn name(&self) -> &str {
        &self.name
    }
}

struct SimpleEntityDescriptor;

impl EntityDescriptor for SimpleEntityDescriptor {
    type Components = (Arc<dyn SimpleComponent>,);
}

#[derive(Debug, Default, Clone, Copy)]
struct SimpleEntityStruct {
    counter: i32,
}

type SimpleStructEntityDescriptor = StructDescriptor<SimpleEntityStruct>;

const STRUCT_GROUP: GroupId = GroupId(0);

/// Removes every simple entity as soon as it shows up
struct SimpleEngine {
    functions: EntityFunctions,
}

impl ReactiveEngine<Arc<dyn SimpleComponent>> for SimpleEngine {
    fn added(&mut self, egid: Egid, _component: &mut Arc<dyn SimpleComponent>) -> Result<()> {
        println!("entity {egid} added");
        self.functions.remove::<SimpleEntityDescriptor>(egid.id)
    }

    fn removed(&mut self, egid: Egid, component: &Arc<dyn SimpleComponent>) -> Result<()> {
        println!("{} entity {egid} removed", component.name());
        Ok(())
    }
}

/// Adds one to every counter in the struct group, once
struct SimpleStructEngine;

impl QueryingEngine for SimpleStructEngine {
    fn ready(&mut self) -> Result<()> {
        println!("task waiting");
        Ok(())
    }

    fn step(&mut self, entities: &mut EntitiesDb<'_>) -> Result<TaskStatus> {
        let (structs, count) = entities.query_group_mut::<SimpleEntityStruct>(STRUCT_GROUP);
        if count == 0 {
            return Ok(TaskStatus::Waiting);
        }
        for entity in structs.iter_mut() {
            entity.counter += 1;
        }
        println!("task done, {count} counter(s) incremented");
        Ok(TaskStatus::Done)
    }
}

fn run(config: EcsConfig) -> Result<()> {
    let mut scheduler = SimpleSubmissionScheduler::new(config.scheduler);
    let root = EnginesRoot::with_config(&mut scheduler, config.root.with_group(STRUCT_GROUP));

    let factory = root.entity_factory();
    let functions = root.entity_functions();

    root.add_reactive_engine::<Arc<dyn SimpleComponent>, _>(SimpleEngine { functions });
    root.add_querying_engine(SimpleStructEngine)?;

    let implementor: Arc<dyn SimpleComponent> = Arc::new(SimpleImplementor {
        name: "simpleEntity".to_string(),
    });
    factory.build::<SimpleEntityDescriptor>(EntityId(0), Implementors::new().with(implementor))?;
    factory.build_in_group::<SimpleStructEntityDescriptor>(
        EntityId(0),
        STRUCT_GROUP,
        Implementors::new(),
    )?;
    println!("built");

    let start = Instant::now();
    let exit = scheduler.run()?;
    println!("scheduler stopped: {exit:?} after {:?}", start.elapsed());

    let counters: Vec<i32> = root.entities(|db| {
        db.query_group::<SimpleEntityStruct>(STRUCT_GROUP)
            .0
            .iter()
            .map(|entity| entity.counter)
            .collect()
    });
    println!("counters: {counters:?}");
    Ok(())
}

#[cfg(feature = "profiling")]
fn init_tracing() {
    if let Err(err) = submission_ecs::profiling::init_stdout(tracing::Level::DEBUG) {
        eprintln!("tracing disabled: {err}");
    }
}

#[cfg(not(feature = "profiling"))]
fn init_tracing() {}

fn main() {
    init_tracing();

    let config = EcsConfig {
        scheduler: SchedulerConfig::default().with_max_ticks(5),
        ..EcsConfig::default()
    };
    if let Err(err) = run(config) {
        eprintln!("simple_context failed: {err}");
        std::process::exit(1);
    }
}
