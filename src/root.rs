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

//! Engines root: owns the store and its engines, hands out handles
//!
//! The root registers itself with a scheduler on construction. Each scheduled
//! invocation commits the buffered submissions and then steps every querying
//! engine once. Dropping the root revokes the registration.

use std::sync::atomic::AtomicU64;
use std::sync::Arc;

use parking_lot::Mutex;
use tracing::{debug, info};

use crate::command::{SharedBuffer, SubmissionBuffer, SubmissionState};
use crate::component::Component;
use crate::config::RootConfig;
use crate::engine::{QueryingEngine, ReactiveEngine, ReactorRegistry, TaskList};
use crate::entity::GroupId;
use crate::error::Result;
use crate::event::CommitReport;
use crate::factory::EntityFactory;
use crate::functions::EntityFunctions;
use crate::query::EntitiesDb;
use crate::scheduler::{EntitySubmissionScheduler, Liveness, SubmissionHandle, SubmissionKey};
use crate::store::EntityStore;

struct RootCore {
    store: EntityStore,
    reactors: ReactorRegistry,
    tasks: TaskList,
}

impl RootCore {
    /// Commit the buffer. The buffer lock is released while the batch is
    /// applied, so engines may queue follow-up submissions.
    fn submit(&mut self, buffer: &SharedBuffer) -> Result<CommitReport> {
        let batch = buffer.lock().begin_commit();
        let result = self.store.commit(batch, &mut self.reactors);
        buffer.lock().end_commit();
        result
    }

    fn tick(&mut self, buffer: &SharedBuffer) -> Result<CommitReport> {
        let report = self.submit(buffer)?;
        if !self.tasks.is_empty() {
            let mut entities = EntitiesDb::new(&mut self.store);
            self.tasks.step_all(&mut entities)?;
        }
        Ok(report)
    }
}

/// Composition root of one entity world
pub struct EnginesRoot {
    core: Arc<Mutex<RootCore>>,
    buffer: SharedBuffer,
    liveness: Liveness,
    next_id: Arc<AtomicU64>,
    key: SubmissionKey,
}

impl EnginesRoot {
    pub fn new(scheduler: &mut impl EntitySubmissionScheduler) -> Self {
        Self::with_config(scheduler, RootConfig::default())
    }

    pub fn with_config(scheduler: &mut impl EntitySubmissionScheduler, config: RootConfig) -> Self {
        let mut store = EntityStore::new();
        for &group in &config.groups {
            store.declare_group(group);
        }

        let core = Arc::new(Mutex::new(RootCore {
            store,
            reactors: ReactorRegistry::new(),
            tasks: TaskList::new(),
        }));
        let buffer = SubmissionBuffer::shared(config.submission_capacity);
        let liveness = Liveness::new();

        let handle = {
            let core = Arc::clone(&core);
            let buffer = Arc::clone(&buffer);
            SubmissionHandle::new("engines_root", liveness.clone(), move || {
                core.lock().tick(&buffer)
            })
        };
        let key = scheduler.schedule(handle);
        info!(groups = config.groups.len(), "engines root created");

        Self {
            core,
            buffer,
            liveness,
            next_id: Arc::new(AtomicU64::new(0)),
            key,
        }
    }

    pub fn entity_factory(&self) -> EntityFactory {
        EntityFactory::new(
            Arc::clone(&self.buffer),
            self.liveness.clone(),
            Arc::clone(&self.next_id),
        )
    }

    pub fn entity_functions(&self) -> EntityFunctions {
        EntityFunctions::new(Arc::clone(&self.buffer), self.liveness.clone())
    }

    /// Declare a group after construction. Returns false if it already existed.
    pub fn declare_group(&self, group: GroupId) -> bool {
        self.core.lock().store.declare_group(group)
    }

    /// Register a push-style engine for component `C`.
    ///
    /// Engines are notified in registration order.
    pub fn add_reactive_engine<C, E>(&self, engine: E)
    where
        C: Component,
        E: ReactiveEngine<C>,
    {
        debug!(engine = engine.name(), "reactive engine added");
        self.core.lock().reactors.register::<C, E>(engine);
    }

    /// Register a pull-style engine; `ready` runs before it is first stepped
    pub fn add_querying_engine<E: QueryingEngine>(&self, mut engine: E) -> Result<()> {
        engine.ready()?;
        debug!(engine = engine.name(), "querying engine added");
        self.core.lock().tasks.push(Box::new(engine));
        Ok(())
    }

    /// Commit buffered submissions now, without stepping querying engines
    pub fn submit_entities(&self) -> Result<CommitReport> {
        self.liveness.check()?;
        self.core.lock().submit(&self.buffer)
    }

    /// One scheduler-equivalent step: commit, then step querying engines
    pub fn tick(&self) -> Result<CommitReport> {
        self.liveness.check()?;
        self.core.lock().tick(&self.buffer)
    }

    /// Run `f` against the committed entities
    pub fn entities<R>(&self, f: impl FnOnce(&mut EntitiesDb<'_>) -> R) -> R {
        let mut core = self.core.lock();
        let mut entities = EntitiesDb::new(&mut core.store);
        f(&mut entities)
    }

    pub fn submission_state(&self) -> SubmissionState {
        self.buffer.lock().state()
    }

    pub fn pending_submissions(&self) -> usize {
        self.buffer.lock().len()
    }

    pub fn entity_count(&self) -> usize {
        self.core.lock().store.entity_count()
    }

    pub fn commit_count(&self) -> u64 {
        self.core.lock().store.commit_count()
    }

    /// Querying engines that have not reported `Done` yet
    pub fn running_tasks(&self) -> usize {
        self.core.lock().tasks.len()
    }

    /// Key of this root's registration with its scheduler
    pub fn submission_key(&self) -> SubmissionKey {
        self.key
    }

    pub fn is_alive(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Revoke the scheduler registration and every handle. Buffered
    /// submissions are discarded.
    pub fn dispose(&self) {
        if !self.liveness.is_alive() {
            return;
        }
        self.liveness.revoke();
        self.buffer.lock().clear();
        info!("engines root disposed");
    }
}

impl Drop for EnginesRoot {
    fn drop(&mut self) {
        self.dispose();
    }
}

impl std::fmt::Debug for EnginesRoot {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EnginesRoot")
            .field("alive", &self.is_alive())
            .field("key", &self.key)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::StructDescriptor;
    use crate::entity::{Egid, EntityId};
    use crate::error::EcsError;
    use crate::implementor::Implementors;
    use crate::scheduler::FrameSubmissionScheduler;

    #[test]
    fn test_submit_makes_builds_visible() -> Result<()> {
        let mut scheduler = FrameSubmissionScheduler::new();
        let root = EnginesRoot::new(&mut scheduler);
        let factory = root.entity_factory();

        factory.build::<StructDescriptor<u16>>(EntityId(0), Implementors::new().with(4u16))?;
        assert_eq!(root.entities(|db| db.count::<u16>(GroupId::STANDARD)), 0);
        assert_eq!(root.submission_state(), SubmissionState::Scheduled);

        root.submit_entities()?;
        assert_eq!(root.submission_state(), SubmissionState::Idle);
        let value = root.entities(|db| db.get::<u16>(Egid::standard(EntityId(0))).copied());
        assert_eq!(value, Some(4));
        Ok(())
    }

    #[test]
    fn test_dispose_revokes_handles_and_registration() {
        let mut scheduler = FrameSubmissionScheduler::new();
        let root = EnginesRoot::new(&mut scheduler);
        let factory = root.entity_factory();
        assert_eq!(scheduler.len(), 1);

        root.dispose();
        assert_eq!(
            factory
                .build::<StructDescriptor<u16>>(EntityId(0), Implementors::new())
                .unwrap_err(),
            EcsError::RootDisposed
        );
        assert_eq!(root.tick().unwrap_err(), EcsError::RootDisposed);

        let summary = scheduler.submit_frame().unwrap();
        assert_eq!(summary.dropped, 1);
        assert!(scheduler.is_empty());
    }

    #[test]
    fn test_configured_groups_are_declared() -> Result<()> {
        let mut scheduler = FrameSubmissionScheduler::new();
        let root = EnginesRoot::with_config(
            &mut scheduler,
            RootConfig::default().with_group(GroupId(2)),
        );
        root.entity_factory().build_in_group::<StructDescriptor<u16>>(
            EntityId(1),
            GroupId(2),
            Implementors::new(),
        )?;
        root.submit_entities()?;
        assert_eq!(root.entities(|db| db.entity_count(GroupId(2))), 1);
        assert!(!root.declare_group(GroupId(2)));
        Ok(())
    }
}
