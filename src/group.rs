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

//! Group storage: one column per component type plus the group's entity registry

use std::any::TypeId;

use ahash::AHashMap;
use rustc_hash::FxHashMap;
use smallvec::SmallVec;

use crate::component::{Component, ComponentType, MAX_BUNDLE_COMPONENTS};
use crate::descriptor::DescriptorInfo;
use crate::entity::{EntityId, GroupId};
use crate::storage::{BoxedComponent, Column, ErasedColumn};

/// Component values pulled out of a group, tagged with their type
pub type RemovedComponents = SmallVec<[(TypeId, BoxedComponent); MAX_BUNDLE_COMPONENTS]>;

/// All storage of one group
pub struct GroupStorage {
    id: GroupId,
    columns: FxHashMap<TypeId, Box<dyn ErasedColumn>>,
    /// Live entities and the descriptor each was built with
    entities: AHashMap<EntityId, TypeId>,
}

impl GroupStorage {
    pub fn new(id: GroupId) -> Self {
        Self {
            id,
            columns: FxHashMap::default(),
            entities: AHashMap::new(),
        }
    }

    pub fn id(&self) -> GroupId {
        self.id
    }

    /// Number of live entities
    pub fn len(&self) -> usize {
        self.entities.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entities.is_empty()
    }

    pub fn contains(&self, id: EntityId) -> bool {
        self.entities.contains_key(&id)
    }

    /// Descriptor type the entity was built with
    pub fn descriptor_of(&self, id: EntityId) -> Option<TypeId> {
        self.entities.get(&id).copied()
    }

    /// Typed column, if any entity in this group ever had component `T`
    pub fn column<T: Component>(&self) -> Option<&Column<T>> {
        self.columns
            .get(&TypeId::of::<T>())?
            .as_any()
            .downcast_ref::<Column<T>>()
    }

    pub fn column_mut<T: Component>(&mut self) -> Option<&mut Column<T>> {
        self.columns
            .get_mut(&TypeId::of::<T>())?
            .as_any_mut()
            .downcast_mut::<Column<T>>()
    }

    pub(crate) fn column_or_insert<T: Component>(&mut self) -> &mut Column<T> {
        self.columns
            .entry(TypeId::of::<T>())
            .or_insert_with(|| Box::new(Column::<T>::new()))
            .as_any_mut()
            .downcast_mut::<Column<T>>()
            .expect("column keyed by its own TypeId")
    }

    pub(crate) fn erased_column_mut(
        &mut self,
        type_id: TypeId,
    ) -> Option<&mut (dyn ErasedColumn + 'static)> {
        self.columns.get_mut(&type_id).map(|column| column.as_mut())
    }

    fn ensure_column(&mut self, component: &ComponentType) -> &mut dyn ErasedColumn {
        self.columns
            .entry(component.id())
            .or_insert_with(|| component.new_column())
            .as_mut()
    }

    /// Reserve room for `additional` entities of `descriptor`
    pub fn reserve(&mut self, descriptor: &DescriptorInfo, additional: usize) {
        self.entities.reserve(additional);
        for component in descriptor.components() {
            self.ensure_column(component).reserve(additional);
        }
    }

    /// Register a new entity whose components `write` appends
    pub(crate) fn insert_with(
        &mut self,
        id: EntityId,
        descriptor: &DescriptorInfo,
        write: impl FnOnce(&mut GroupStorage),
    ) {
        write(self);
        self.entities.insert(id, descriptor.type_id());
    }

    /// Register an entity from already boxed values (group swaps)
    pub(crate) fn insert_boxed(
        &mut self,
        id: EntityId,
        descriptor: &DescriptorInfo,
        values: RemovedComponents,
    ) {
        for (type_id, value) in values {
            let Some(component) = descriptor
                .components()
                .iter()
                .find(|component| component.id() == type_id)
            else {
                continue;
            };
            // Values come straight out of a column of the same type
            let _ = self.ensure_column(component).push_boxed(id, value);
        }
        self.entities.insert(id, descriptor.type_id());
    }

    /// Remove an entity and hand back its component values
    pub(crate) fn remove_entity(
        &mut self,
        id: EntityId,
        descriptor: &DescriptorInfo,
    ) -> RemovedComponents {
        let mut removed = RemovedComponents::new();
        if self.entities.remove(&id).is_none() {
            return removed;
        }
        for component in descriptor.components() {
            if let Some(value) = self
                .columns
                .get_mut(&component.id())
                .and_then(|column| column.remove_boxed(id))
            {
                removed.push((component.id(), value));
            }
        }
        removed
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::component::Bundle;
    use crate::descriptor::EntityDescriptor;

    struct Walker;

    impl EntityDescriptor for Walker {
        type Components = (u32, f32);
    }

    fn build(group: &mut GroupStorage, id: u32) {
        let descriptor = DescriptorInfo::of::<Walker>();
        group.insert_with(EntityId(id), &descriptor, |group| {
            (id, id as f32).insert_into(group, EntityId(id))
        });
    }

    #[test]
    fn test_insert_and_remove_keep_columns_dense() {
        let mut group = GroupStorage::new(GroupId(0));
        for id in 0..3 {
            build(&mut group, id);
        }
        assert_eq!(group.len(), 3);

        let removed = group.remove_entity(EntityId(0), &DescriptorInfo::of::<Walker>());
        assert_eq!(removed.len(), 2);
        assert_eq!(group.column::<u32>().unwrap().values(), &[2, 1]);
        assert_eq!(group.column::<f32>().unwrap().values(), &[2.0, 1.0]);
        assert!(!group.contains(EntityId(0)));
    }

    #[test]
    fn test_boxed_values_move_between_groups() {
        let descriptor = DescriptorInfo::of::<Walker>();
        let mut from = GroupStorage::new(GroupId(0));
        let mut to = GroupStorage::new(GroupId(1));
        build(&mut from, 4);

        let values = from.remove_entity(EntityId(4), &descriptor);
        to.insert_boxed(EntityId(4), &descriptor, values);

        assert!(from.is_empty());
        assert_eq!(to.column::<u32>().unwrap().get(EntityId(4)), Some(&4));
        assert_eq!(to.descriptor_of(EntityId(4)), Some(descriptor.type_id()));
    }

    #[test]
    fn test_reserve_creates_columns() {
        let mut group = GroupStorage::new(GroupId(2));
        group.reserve(&DescriptorInfo::of::<Walker>(), 64);
        let column = group.column::<u32>().unwrap();
        assert!(ErasedColumn::capacity(column) >= 64);
        assert_eq!(ErasedColumn::len(column), 0);
    }
}
