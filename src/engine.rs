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

//! Engines: units of logic over entity data
//!
//! - [`ReactiveEngine`] is pushed `added`/`removed` notifications for one
//!   component type at every commit.
//! - [`QueryingEngine`] is pulled once per tick and polls the entity database
//!   until it reports [`TaskStatus::Done`].

use std::any::{Any, TypeId};
use std::marker::PhantomData;

use tracing::{trace, warn};

use crate::component::Component;
use crate::descriptor::DescriptorInfo;
use crate::entity::Egid;
use crate::error::{EcsError, Result};
use crate::group::{GroupStorage, RemovedComponents};
use crate::query::EntitiesDb;
use crate::storage::{Column, ErasedColumn};

/// Push-style engine reacting to entities carrying component `C`
pub trait ReactiveEngine<C: Component>: Send + 'static {
    /// Name used in logs and errors
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// The entity became visible. The component may be mutated in place.
    fn added(&mut self, egid: Egid, component: &mut C) -> Result<()>;

    /// The entity is gone. `component` is its last value.
    fn removed(&mut self, egid: Egid, component: &C) -> Result<()>;
}

/// Result of one polling step
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum TaskStatus {
    /// Keep polling on the next tick
    Waiting,
    /// Finished; the engine is retired
    Done,
}

/// Pull-style engine stepped once per tick, after the commit
pub trait QueryingEngine: Send + 'static {
    fn name(&self) -> &str {
        std::any::type_name::<Self>()
    }

    /// Called once when the engine is added to a root
    fn ready(&mut self) -> Result<()> {
        Ok(())
    }

    /// Poll the database. Must not block; return `Waiting` to yield.
    fn step(&mut self, entities: &mut EntitiesDb<'_>) -> Result<TaskStatus>;
}

/// Type-erased reactive engine
trait Reactor: Send {
    fn name(&self) -> &str;

    fn added(&mut self, egid: Egid, column: &mut dyn ErasedColumn) -> Result<()>;

    fn removed(&mut self, egid: Egid, value: &dyn Any) -> Result<()>;
}

struct TypedReactor<C, E> {
    engine: E,
    _component: PhantomData<fn() -> C>,
}

impl<C: Component, E: ReactiveEngine<C>> Reactor for TypedReactor<C, E> {
    fn name(&self) -> &str {
        self.engine.name()
    }

    fn added(&mut self, egid: Egid, column: &mut dyn ErasedColumn) -> Result<()> {
        let Some(component) = column
            .as_any_mut()
            .downcast_mut::<Column<C>>()
            .and_then(|column| column.get_mut(egid.id))
        else {
            return Ok(());
        };
        self.engine.added(egid, component)
    }

    fn removed(&mut self, egid: Egid, value: &dyn Any) -> Result<()> {
        match value.downcast_ref::<C>() {
            Some(component) => self.engine.removed(egid, component),
            None => Ok(()),
        }
    }
}

/// Reactive engines, each tagged with the component type it watches.
///
/// Dispatch follows registration order across all component types. A failing
/// engine does not keep later engines from being notified; the first error is
/// returned once every engine has run.
#[derive(Default)]
pub struct ReactorRegistry {
    reactors: Vec<(TypeId, Box<dyn Reactor>)>,
}

impl ReactorRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn register<C: Component, E: ReactiveEngine<C>>(&mut self, engine: E) {
        self.reactors.push((
            TypeId::of::<C>(),
            Box::new(TypedReactor {
                engine,
                _component: PhantomData::<fn() -> C>,
            }),
        ));
    }

    /// Get number of registered engines
    pub fn len(&self) -> usize {
        self.reactors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.reactors.is_empty()
    }

    /// Notify every engine watching one of the entity's components
    pub(crate) fn added(
        &mut self,
        egid: Egid,
        descriptor: &DescriptorInfo,
        group: &mut GroupStorage,
    ) -> Result<()> {
        let mut failure = None;
        for (component, reactor) in &mut self.reactors {
            if !descriptor.components().iter().any(|c| c.id() == *component) {
                continue;
            }
            let Some(column) = group.erased_column_mut(*component) else {
                continue;
            };
            trace!(engine = reactor.name(), %egid, "added");
            keep_first(&mut failure, reactor.added(egid, column));
        }
        failure.map_or(Ok(()), Err)
    }

    /// Notify every engine watching one of the removed values
    pub(crate) fn removed(&mut self, egid: Egid, values: &RemovedComponents) -> Result<()> {
        let mut failure = None;
        for (component, reactor) in &mut self.reactors {
            let Some((_, value)) = values.iter().find(|(type_id, _)| *type_id == *component) else {
                continue;
            };
            trace!(engine = reactor.name(), %egid, "removed");
            keep_first(&mut failure, reactor.removed(egid, &**value));
        }
        failure.map_or(Ok(()), Err)
    }
}

fn keep_first(failure: &mut Option<EcsError>, result: Result<()>) {
    if let Err(err) = result {
        warn!(error = %err, "reactive engine failed");
        failure.get_or_insert(err);
    }
}

/// Querying engines still polling
#[derive(Default)]
pub struct TaskList {
    tasks: Vec<Box<dyn QueryingEngine>>,
}

impl TaskList {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, engine: Box<dyn QueryingEngine>) {
        self.tasks.push(engine);
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }

    /// Step every task once, retiring the finished ones. Returns how many finished.
    ///
    /// On error the failing task is retired too and the error returned.
    pub fn step_all(&mut self, entities: &mut EntitiesDb<'_>) -> Result<usize> {
        let mut finished = 0;
        let mut failure = None;
        self.tasks.retain_mut(|task| {
            if failure.is_some() {
                return true;
            }
            match task.step(entities) {
                Ok(TaskStatus::Waiting) => true,
                Ok(TaskStatus::Done) => {
                    trace!(engine = task.name(), "querying engine done");
                    finished += 1;
                    false
                }
                Err(err) => {
                    failure = Some(err);
                    false
                }
            }
        });
        match failure {
            Some(err) => Err(err),
            None => Ok(finished),
        }
    }
}
