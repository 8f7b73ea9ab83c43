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

//! Entity store: grouped entity storage and the commit of buffered submissions
//!
//! A commit runs in two phases. The batch is first planned against an overlay
//! of the store, which catches every existence error before anything moves;
//! a failing batch leaves the store untouched. The plan is then applied in
//! submission order.

use std::any::TypeId;

use ahash::{AHashMap, AHashSet};
use rustc_hash::{FxHashMap, FxHashSet};
use tracing::{debug, debug_span, trace, warn};

use crate::command::Submission;
use crate::descriptor::DescriptorInfo;
use crate::engine::ReactorRegistry;
use crate::entity::{Egid, GroupId};
use crate::error::{EcsError, Result};
use crate::event::{CommitReport, EntityEvent};
use crate::group::GroupStorage;

/// Owner of all entity memory
pub struct EntityStore {
    groups: AHashMap<GroupId, GroupStorage>,

    /// Descriptors seen by at least one applied build
    descriptors: FxHashMap<TypeId, DescriptorInfo>,

    commits: u64,
}

impl Default for EntityStore {
    fn default() -> Self {
        Self::new()
    }
}

impl EntityStore {
    /// Create a store with only the standard group declared
    pub fn new() -> Self {
        let mut store = Self {
            groups: AHashMap::with_capacity(8),
            descriptors: FxHashMap::default(),
            commits: 0,
        };
        store.declare_group(GroupId::STANDARD);
        store
    }

    /// Declare a group. Returns false if it already existed.
    pub fn declare_group(&mut self, group: GroupId) -> bool {
        if self.groups.contains_key(&group) {
            return false;
        }
        self.groups.insert(group, GroupStorage::new(group));
        true
    }

    pub fn is_declared(&self, group: GroupId) -> bool {
        self.groups.contains_key(&group)
    }

    pub fn group(&self, group: GroupId) -> Option<&GroupStorage> {
        self.groups.get(&group)
    }

    pub fn group_mut(&mut self, group: GroupId) -> Option<&mut GroupStorage> {
        self.groups.get_mut(&group)
    }

    pub fn contains(&self, egid: Egid) -> bool {
        self.group(egid.group)
            .is_some_and(|group| group.contains(egid.id))
    }

    /// Descriptor the entity was built with
    pub fn descriptor_of(&self, egid: Egid) -> Option<TypeId> {
        self.group(egid.group)?.descriptor_of(egid.id)
    }

    /// Whether a build of this descriptor was ever committed
    pub fn is_registered(&self, descriptor: TypeId) -> bool {
        self.descriptors.contains_key(&descriptor)
    }

    /// Total live entities across groups
    pub fn entity_count(&self) -> usize {
        self.groups.values().map(GroupStorage::len).sum()
    }

    pub fn group_count(&self) -> usize {
        self.groups.len()
    }

    /// Number of commits applied so far
    pub fn commit_count(&self) -> u64 {
        self.commits
    }

    /// Validate and apply a drained batch.
    ///
    /// Existence errors reject the whole batch. Engine failures do not stop the
    /// batch from being applied; the first one is returned afterwards.
    pub fn commit(
        &mut self,
        batch: Vec<Submission>,
        reactors: &mut ReactorRegistry,
    ) -> Result<CommitReport> {
        let mut report = CommitReport::default();
        if batch.is_empty() {
            return Ok(report);
        }

        let span = debug_span!("commit", submissions = batch.len(), commit = self.commits);
        let _guard = span.enter();

        let plan = match self.plan(batch, &mut report) {
            Ok(plan) => plan,
            Err(err) => {
                warn!(error = %err, "commit rejected, batch discarded");
                return Err(err);
            }
        };
        self.apply(plan, reactors, &mut report)?;

        debug!(
            built = report.built,
            removed = report.removed,
            swapped = report.swapped,
            ignored = report.ignored,
            "commit applied"
        );
        Ok(report)
    }

    fn check_group(&self, group: GroupId) -> Result<()> {
        if self.is_declared(group) {
            Ok(())
        } else {
            Err(EcsError::InvalidGroup(group))
        }
    }

    fn plan(&self, batch: Vec<Submission>, report: &mut CommitReport) -> Result<Vec<Planned>> {
        let mut overlay = Overlay::new(self);
        let mut plan: Vec<Planned> = Vec::with_capacity(batch.len());

        for submission in batch {
            let (notify_added, notify_removed) = match Shape::of(&submission) {
                Shape::Preallocate(group) => {
                    self.check_group(group)?;
                    (false, false)
                }
                Shape::Build(egid, descriptor) => {
                    self.check_group(egid.group)?;
                    if overlay.is_claimed(egid) {
                        return Err(EcsError::DuplicateId(egid));
                    }
                    overlay.appear(egid, descriptor.type_id, plan.len());
                    overlay.pending_descriptors.insert(descriptor.type_id);
                    (true, false)
                }
                Shape::Remove(egid, descriptor) => {
                    self.check_group(egid.group)?;
                    if overlay.state(egid).is_none() && overlay.removed.contains(&egid) {
                        trace!(%egid, "repeated removal ignored");
                        report.ignored += 1;
                        continue;
                    }
                    overlay.expect_entity(egid, descriptor)?;
                    let cancelled = overlay.disappear(egid, &mut plan);
                    overlay.removed.insert(egid);
                    (false, !cancelled)
                }
                Shape::Swap(source, to, descriptor) => {
                    self.check_group(source.group)?;
                    self.check_group(to)?;
                    overlay.expect_entity(source, descriptor)?;
                    if source.group == to {
                        trace!(egid = %source, "swap into the same group ignored");
                        report.ignored += 1;
                        continue;
                    }
                    let target = Egid::new(source.id, to);
                    if overlay.is_claimed(target) {
                        return Err(EcsError::DuplicateId(target));
                    }
                    let cancelled = overlay.disappear(source, &mut plan);
                    overlay.appear(target, descriptor.type_id, plan.len());
                    (true, !cancelled)
                }
            };
            plan.push(Planned {
                submission,
                notify_added,
                notify_removed,
            });
        }
        Ok(plan)
    }

    fn apply(
        &mut self,
        plan: Vec<Planned>,
        reactors: &mut ReactorRegistry,
        report: &mut CommitReport,
    ) -> Result<()> {
        let mut failure: Option<EcsError> = None;
        let mut added: Vec<(Egid, TypeId)> = Vec::new();

        for planned in plan {
            match planned.submission {
                Submission::Preallocate {
                    group,
                    descriptor,
                    count,
                } => {
                    if let Some(group) = self.groups.get_mut(&group) {
                        group.reserve(&descriptor, count);
                    }
                }
                Submission::Build {
                    egid,
                    descriptor,
                    write,
                } => {
                    let Some(group) = self.groups.get_mut(&egid.group) else {
                        continue;
                    };
                    group.insert_with(egid.id, &descriptor, write);
                    report.built += 1;
                    if planned.notify_added {
                        added.push((egid, descriptor.type_id()));
                    }
                    self.descriptors
                        .entry(descriptor.type_id())
                        .or_insert(descriptor);
                }
                Submission::Remove { egid, descriptor } => {
                    let Some(group) = self.groups.get_mut(&egid.group) else {
                        continue;
                    };
                    let values = group.remove_entity(egid.id, &descriptor);
                    report.removed += 1;
                    if planned.notify_removed {
                        report.events.push(EntityEvent::Removed(egid));
                        record(&mut failure, reactors.removed(egid, &values));
                    }
                }
                Submission::Swap {
                    id,
                    from,
                    to,
                    descriptor,
                } => {
                    let source = Egid::new(id, from);
                    let target = Egid::new(id, to);
                    let Some(group) = self.groups.get_mut(&from) else {
                        continue;
                    };
                    let values = group.remove_entity(id, &descriptor);
                    if planned.notify_removed {
                        report.events.push(EntityEvent::Removed(source));
                        record(&mut failure, reactors.removed(source, &values));
                    }
                    if let Some(group) = self.groups.get_mut(&to) {
                        group.insert_boxed(id, &descriptor, values);
                    }
                    report.swapped += 1;
                    if planned.notify_added {
                        added.push((target, descriptor.type_id()));
                    }
                }
            }
        }
        self.commits += 1;

        // Every structural change is in place before anyone hears about additions
        for (egid, descriptor) in added {
            report.events.push(EntityEvent::Added(egid));
            let (Some(descriptor), Some(group)) = (
                self.descriptors.get(&descriptor),
                self.groups.get_mut(&egid.group),
            ) else {
                continue;
            };
            record(&mut failure, reactors.added(egid, descriptor, group));
        }

        match failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

fn record(failure: &mut Option<EcsError>, result: Result<()>) {
    if let Err(err) = result {
        failure.get_or_insert(err);
    }
}

/// A submission with the notifications it still owes after planning
struct Planned {
    submission: Submission,
    notify_added: bool,
    notify_removed: bool,
}

#[derive(Clone, Copy)]
struct DescriptorKey {
    type_id: TypeId,
    name: &'static str,
}

impl DescriptorKey {
    fn of(descriptor: &DescriptorInfo) -> Self {
        Self {
            type_id: descriptor.type_id(),
            name: descriptor.name(),
        }
    }
}

/// What the planner needs to know about a submission
#[derive(Clone, Copy)]
enum Shape {
    Build(Egid, DescriptorKey),
    Remove(Egid, DescriptorKey),
    Swap(Egid, GroupId, DescriptorKey),
    Preallocate(GroupId),
}

impl Shape {
    fn of(submission: &Submission) -> Self {
        match submission {
            Submission::Build {
                egid, descriptor, ..
            } => Shape::Build(*egid, DescriptorKey::of(descriptor)),
            Submission::Remove { egid, descriptor } => {
                Shape::Remove(*egid, DescriptorKey::of(descriptor))
            }
            Submission::Swap {
                id,
                from,
                to,
                descriptor,
            } => Shape::Swap(Egid::new(*id, *from), *to, DescriptorKey::of(descriptor)),
            Submission::Preallocate { group, .. } => Shape::Preallocate(*group),
        }
    }
}

/// Store state as it will be after the submissions planned so far
struct Overlay<'s> {
    store: &'s EntityStore,
    /// Entities touched by the batch: `Some(descriptor)` alive, `None` gone
    entities: AHashMap<Egid, Option<TypeId>>,
    /// Entities removed by the batch (swaps excluded)
    removed: AHashSet<Egid>,
    /// Plan index of the submission that made an entity appear
    added_at: AHashMap<Egid, usize>,
    /// Every address that appeared in the batch, removed or not
    claimed: AHashSet<Egid>,
    pending_descriptors: FxHashSet<TypeId>,
}

impl<'s> Overlay<'s> {
    fn new(store: &'s EntityStore) -> Self {
        Self {
            store,
            entities: AHashMap::new(),
            removed: AHashSet::new(),
            added_at: AHashMap::new(),
            claimed: AHashSet::new(),
            pending_descriptors: FxHashSet::default(),
        }
    }

    fn state(&self, egid: Egid) -> Option<TypeId> {
        match self.entities.get(&egid) {
            Some(state) => *state,
            None => self.store.descriptor_of(egid),
        }
    }

    fn expect_entity(&self, egid: Egid, descriptor: DescriptorKey) -> Result<()> {
        match self.state(egid) {
            Some(built_with) if built_with == descriptor.type_id => Ok(()),
            Some(_) => Err(EcsError::invalid_descriptor(
                descriptor.name,
                format!("entity {egid} was built with another descriptor"),
            )),
            None if !self.store.is_registered(descriptor.type_id)
                && !self.pending_descriptors.contains(&descriptor.type_id) =>
            {
                Err(EcsError::invalid_descriptor(
                    descriptor.name,
                    "descriptor was never registered by a build",
                ))
            }
            None => Err(EcsError::NotFound(egid)),
        }
    }

    /// An address stays taken for the whole batch once it was live before the
    /// batch or appeared in it. Ids are freed only by a committed removal.
    fn is_claimed(&self, egid: Egid) -> bool {
        self.claimed.contains(&egid) || self.store.contains(egid)
    }

    fn appear(&mut self, egid: Egid, descriptor: TypeId, index: usize) {
        self.claimed.insert(egid);
        self.entities.insert(egid, Some(descriptor));
        self.removed.remove(&egid);
        self.added_at.insert(egid, index);
    }

    /// Mark an entity gone. Returns true when it appeared earlier in the same
    /// batch, in which case neither side of the pair is observable.
    fn disappear(&mut self, egid: Egid, plan: &mut [Planned]) -> bool {
        self.entities.insert(egid, None);
        match self.added_at.remove(&egid) {
            Some(index) => {
                plan[index].notify_added = false;
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Bundle;
    use crate::descriptor::{EntityDescriptor, StructDescriptor};
    use crate::entity::EntityId;

    #[derive(Default, Debug, Clone, Copy, PartialEq)]
    struct Counter(u32);

    type CounterDescriptor = StructDescriptor<Counter>;

    fn build(group: GroupId, id: u32, value: u32) -> Submission {
        Submission::Build {
            egid: Egid::new(EntityId(id), group),
            descriptor: DescriptorInfo::of::<CounterDescriptor>(),
            write: Box::new(move |storage: &mut GroupStorage| {
                (Counter(value),).insert_into(storage, EntityId(id))
            }),
        }
    }

    fn remove(group: GroupId, id: u32) -> Submission {
        Submission::Remove {
            egid: Egid::new(EntityId(id), group),
            descriptor: DescriptorInfo::of::<CounterDescriptor>(),
        }
    }

    fn values(store: &EntityStore, group: GroupId) -> Vec<u32> {
        store
            .group(group)
            .and_then(|group| group.column::<Counter>())
            .map(|column| column.values().iter().map(|c| c.0).collect())
            .unwrap_or_default()
    }

    #[test]
    fn test_commit_builds_and_removes() -> Result<()> {
        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        let group = GroupId(0);
        store.declare_group(group);

        let report = store.commit(
            vec![build(group, 0, 10), build(group, 1, 11), build(group, 2, 12)],
            &mut reactors,
        )?;
        assert_eq!(report.built, 3);
        assert_eq!(values(&store, group), vec![10, 11, 12]);

        let report = store.commit(vec![remove(group, 0)], &mut reactors)?;
        assert_eq!(report.removed, 1);
        assert_eq!(values(&store, group), vec![12, 11]);
        assert!(!store.contains(Egid::new(EntityId(0), group)));
        assert_eq!(store.commit_count(), 2);
        Ok(())
    }

    #[test]
    fn test_failed_batch_leaves_store_untouched() {
        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        let group = GroupId(0);
        store.declare_group(group);

        let err = store
            .commit(vec![build(group, 0, 1), build(group, 0, 2)], &mut reactors)
            .unwrap_err();
        assert_eq!(err, EcsError::DuplicateId(Egid::new(EntityId(0), group)));
        assert_eq!(store.entity_count(), 0);
        assert_eq!(store.commit_count(), 0);
    }

    #[test]
    fn test_undeclared_group_fails_at_commit() {
        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        let err = store
            .commit(vec![build(GroupId(5), 0, 1)], &mut reactors)
            .unwrap_err();
        assert_eq!(err, EcsError::InvalidGroup(GroupId(5)));
    }

    #[test]
    fn test_add_then_remove_in_one_batch_is_invisible() -> Result<()> {
        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        let group = GroupId::STANDARD;

        let report = store.commit(
            vec![build(group, 0, 1), remove(group, 0), remove(group, 0)],
            &mut reactors,
        )?;
        assert_eq!(report.built, 1);
        assert_eq!(report.removed, 1);
        assert_eq!(report.ignored, 1);
        assert!(report.events.is_empty());
        assert_eq!(store.entity_count(), 0);
        Ok(())
    }

    #[test]
    fn test_remove_unknown_descriptor_is_invalid() {
        struct Never;
        impl EntityDescriptor for Never {
            type Components = (u8,);
        }

        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        let submission = Submission::Remove {
            egid: Egid::standard(EntityId(0)),
            descriptor: DescriptorInfo::of::<Never>(),
        };
        let err = store.commit(vec![submission], &mut reactors).unwrap_err();
        assert!(matches!(err, EcsError::InvalidDescriptor { .. }));
    }

    #[test]
    fn test_swap_moves_entity_between_groups() -> Result<()> {
        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        store.declare_group(GroupId(0));
        store.declare_group(GroupId(1));
        store.commit(vec![build(GroupId(0), 3, 30)], &mut reactors)?;

        let swap = Submission::Swap {
            id: EntityId(3),
            from: GroupId(0),
            to: GroupId(1),
            descriptor: DescriptorInfo::of::<CounterDescriptor>(),
        };
        let report = store.commit(vec![swap], &mut reactors)?;
        assert_eq!(report.swapped, 1);
        assert_eq!(
            report.events,
            vec![
                EntityEvent::Removed(Egid::new(EntityId(3), GroupId(0))),
                EntityEvent::Added(Egid::new(EntityId(3), GroupId(1))),
            ]
        );
        assert!(values(&store, GroupId(0)).is_empty());
        assert_eq!(values(&store, GroupId(1)), vec![30]);
        Ok(())
    }

    #[test]
    fn test_pending_removal_does_not_free_id() -> Result<()> {
        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        let group = GroupId::STANDARD;
        store.commit(vec![build(group, 5, 1)], &mut reactors)?;

        let err = store
            .commit(vec![remove(group, 5), build(group, 5, 2)], &mut reactors)
            .unwrap_err();
        assert_eq!(err, EcsError::DuplicateId(Egid::standard(EntityId(5))));
        assert_eq!(values(&store, group), vec![1]);

        // Once the removal is committed the id can be built again
        store.commit(vec![remove(group, 5)], &mut reactors)?;
        store.commit(vec![build(group, 5, 3)], &mut reactors)?;
        assert_eq!(values(&store, group), vec![3]);
        Ok(())
    }

    #[test]
    fn test_id_built_and_removed_in_batch_stays_taken() {
        let mut store = EntityStore::new();
        let mut reactors = ReactorRegistry::new();
        let group = GroupId::STANDARD;

        let err = store
            .commit(
                vec![build(group, 1, 1), remove(group, 1), build(group, 1, 2)],
                &mut reactors,
            )
            .unwrap_err();
        assert_eq!(err, EcsError::DuplicateId(Egid::standard(EntityId(1))));
        assert_eq!(store.entity_count(), 0);
    }
}
