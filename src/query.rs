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

//! Grouped component queries
//!
//! Views borrow the store, so no commit can move rows while one is held.
//! An unknown group or an absent component type is an empty view, not an error.

use crate::component::Component;
use crate::entity::{Egid, EntityId, GroupId};
use crate::storage::ErasedColumn;
use crate::store::EntityStore;

/// Query access to committed entities
pub struct EntitiesDb<'w> {
    store: &'w mut EntityStore,
}

impl<'w> EntitiesDb<'w> {
    pub fn new(store: &'w mut EntityStore) -> Self {
        Self { store }
    }

    /// Every `C` in `group`, densely packed, and its count
    pub fn query_group<C: Component>(&self, group: GroupId) -> (&[C], usize) {
        match self
            .store
            .group(group)
            .and_then(|group| group.column::<C>())
        {
            Some(column) => (column.values(), column.values().len()),
            None => (&[], 0),
        }
    }

    /// Writable form of [`EntitiesDb::query_group`]
    pub fn query_group_mut<C: Component>(&mut self, group: GroupId) -> (&mut [C], usize) {
        match self
            .store
            .group_mut(group)
            .and_then(|group| group.column_mut::<C>())
        {
            Some(column) => {
                let values = column.values_mut();
                let count = values.len();
                (values, count)
            }
            None => (Default::default(), 0),
        }
    }

    /// Values of `C` in `group` alongside the id owning each row
    pub fn query_group_with_ids<C: Component>(
        &mut self,
        group: GroupId,
    ) -> (&[EntityId], &mut [C]) {
        match self
            .store
            .group_mut(group)
            .and_then(|group| group.column_mut::<C>())
        {
            Some(column) => column.split_mut(),
            None => (&[], Default::default()),
        }
    }

    pub fn count<C: Component>(&self, group: GroupId) -> usize {
        self.query_group::<C>(group).1
    }

    /// Ids owning the rows of `C` in `group`, in row order
    pub fn ids<C: Component>(&self, group: GroupId) -> &[EntityId] {
        match self
            .store
            .group(group)
            .and_then(|group| group.column::<C>())
        {
            Some(column) => column.ids(),
            None => &[],
        }
    }

    pub fn get<C: Component>(&self, egid: Egid) -> Option<&C> {
        self.store.group(egid.group)?.column::<C>()?.get(egid.id)
    }

    pub fn get_mut<C: Component>(&mut self, egid: Egid) -> Option<&mut C> {
        self.store
            .group_mut(egid.group)?
            .column_mut::<C>()?
            .get_mut(egid.id)
    }

    pub fn exists(&self, egid: Egid) -> bool {
        self.store.contains(egid)
    }

    /// Number of live entities in `group`, whatever their descriptor
    pub fn entity_count(&self, group: GroupId) -> usize {
        self.store.group(group).map_or(0, |group| group.len())
    }
}
