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

//! Dense per-(group, type) component columns
//!
//! A column keeps its values packed without holes. Rows move on removal
//! (swap-with-last), so lookups always go through the id -> row map.

use std::any::Any;

use ahash::AHashMap;

use crate::component::Component;
use crate::entity::EntityId;

/// Boxed component value travelling between columns
pub type BoxedComponent = Box<dyn Any + Send>;

/// Type-erased view of a [`Column`]
pub trait ErasedColumn: Send + Sync {
    /// Number of live rows
    fn len(&self) -> usize;

    fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Allocated row capacity
    fn capacity(&self) -> usize;

    /// Reserve space for additional rows
    fn reserve(&mut self, additional: usize);

    /// Entity ids in row order
    fn ids(&self) -> &[EntityId];

    fn contains(&self, id: EntityId) -> bool;

    /// Remove the row of `id` and hand its value out boxed
    fn remove_boxed(&mut self, id: EntityId) -> Option<BoxedComponent>;

    /// Append a boxed value. Gives the value back if its type does not match.
    fn push_boxed(
        &mut self,
        id: EntityId,
        value: BoxedComponent,
    ) -> std::result::Result<(), BoxedComponent>;

    fn as_any(&self) -> &dyn Any;

    fn as_any_mut(&mut self) -> &mut dyn Any;
}

/// Structure-of-arrays column: values, their owners and the owner -> row map
pub struct Column<T> {
    values: Vec<T>,
    ids: Vec<EntityId>,
    rows: AHashMap<EntityId, usize>,
}

impl<T: Component> Column<T> {
    pub fn new() -> Self {
        Self {
            values: Vec::new(),
            ids: Vec::new(),
            rows: AHashMap::new(),
        }
    }

    /// Append a value for `id`
    ///
    /// Uniqueness of `id` is checked by the commit planner before this runs.
    pub fn push(&mut self, id: EntityId, value: T) {
        debug_assert!(!self.rows.contains_key(&id), "duplicate row for {id}");
        self.rows.insert(id, self.values.len());
        self.values.push(value);
        self.ids.push(id);
    }

    /// Remove the row of `id`, moving the last row into the hole
    pub fn remove(&mut self, id: EntityId) -> Option<T> {
        let row = self.rows.remove(&id)?;
        let value = self.values.swap_remove(row);
        self.ids.swap_remove(row);

        // Someone was swapped into this row
        if let Some(&moved) = self.ids.get(row) {
            self.rows.insert(moved, row);
        }
        Some(value)
    }

    pub fn row_of(&self, id: EntityId) -> Option<usize> {
        self.rows.get(&id).copied()
    }

    pub fn get(&self, id: EntityId) -> Option<&T> {
        let row = self.row_of(id)?;
        self.values.get(row)
    }

    pub fn get_mut(&mut self, id: EntityId) -> Option<&mut T> {
        let row = self.row_of(id)?;
        self.values.get_mut(row)
    }

    pub fn values(&self) -> &[T] {
        &self.values
    }

    pub fn values_mut(&mut self) -> &mut [T] {
        &mut self.values
    }

    /// Ids and values side by side, values writable
    pub fn split_mut(&mut self) -> (&[EntityId], &mut [T]) {
        (&self.ids, &mut self.values)
    }
}

impl<T: Component> Default for Column<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T: Component> ErasedColumn for Column<T> {
    fn len(&self) -> usize {
        self.values.len()
    }

    fn capacity(&self) -> usize {
        self.values.capacity()
    }

    fn reserve(&mut self, additional: usize) {
        self.values.reserve(additional);
        self.ids.reserve(additional);
        self.rows.reserve(additional);
    }

    fn ids(&self) -> &[EntityId] {
        &self.ids
    }

    fn contains(&self, id: EntityId) -> bool {
        self.rows.contains_key(&id)
    }

    fn remove_boxed(&mut self, id: EntityId) -> Option<BoxedComponent> {
        self.remove(id).map(|value| Box::new(value) as BoxedComponent)
    }

    fn push_boxed(
        &mut self,
        id: EntityId,
        value: BoxedComponent,
    ) -> std::result::Result<(), BoxedComponent> {
        let value = value.downcast::<T>()?;
        self.push(id, *value);
        Ok(())
    }

    fn as_any(&self) -> &dyn Any {
        self
    }

    fn as_any_mut(&mut self) -> &mut dyn Any {
        self
    }
}
