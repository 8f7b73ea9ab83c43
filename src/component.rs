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

//! Component and Bundle traits
//!
//! Components are data attached to entities.
//! Bundles are the component sets a descriptor co-allocates per entity.

use std::any::TypeId;

use smallvec::{smallvec, SmallVec};

use crate::entity::EntityId;
use crate::group::GroupStorage;
use crate::implementor::Implementors;
use crate::storage::{Column, ErasedColumn};

/// Maximum number of components supported by Bundle implementations
pub const MAX_BUNDLE_COMPONENTS: usize = 8;

/// Component type list of a bundle
pub type ComponentTypes = SmallVec<[ComponentType; MAX_BUNDLE_COMPONENTS]>;

/// Marker trait for components
///
/// Components must be 'static (no borrowed data)
pub trait Component: 'static + Send + Sync {}

/// Automatically implement Component for all valid types
impl<T: 'static + Send + Sync> Component for T {}

/// Runtime description of one component type
#[derive(Clone, Copy)]
pub struct ComponentType {
    id: TypeId,
    name: &'static str,
    new_column: fn() -> Box<dyn ErasedColumn>,
}

impl ComponentType {
    pub fn of<T: Component>() -> Self {
        Self {
            id: TypeId::of::<T>(),
            name: std::any::type_name::<T>(),
            new_column: || Box::new(Column::<T>::new()),
        }
    }

    pub fn id(&self) -> TypeId {
        self.id
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    /// Empty column able to hold this component type
    pub(crate) fn new_column(&self) -> Box<dyn ErasedColumn> {
        (self.new_column)()
    }
}

impl PartialEq for ComponentType {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for ComponentType {}

impl std::fmt::Debug for ComponentType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name)
    }
}

/// Bundle of components
///
/// Implemented for tuples of up to [`MAX_BUNDLE_COMPONENTS`] components.
pub trait Bundle: Send + Sync + 'static {
    /// Component types of the bundle, in tuple order
    fn component_types() -> ComponentTypes
    where
        Self: Sized;

    /// Pull every component out of the implementor table.
    ///
    /// Fails with the type name of the first component nobody supplied.
    fn take_from(implementors: &mut Implementors) -> std::result::Result<Self, &'static str>
    where
        Self: Sized;

    /// Append every component to its column in `group`
    fn insert_into(self, group: &mut GroupStorage, id: EntityId);
}

// Bundle is only implemented for tuples, never for bare T: Component
macro_rules! impl_bundle {
    ($($T:ident),*) => {
        impl<$($T: Component),*> Bundle for ($($T,)*) {
            fn component_types() -> ComponentTypes {
                smallvec![$(ComponentType::of::<$T>()),*]
            }

            #[allow(non_snake_case)]
            fn take_from(
                implementors: &mut Implementors,
            ) -> std::result::Result<Self, &'static str> {
                $(
                    let $T = implementors
                        .take::<$T>()
                        .ok_or(std::any::type_name::<$T>())?;
                )*
                Ok(($($T,)*))
            }

            #[allow(non_snake_case)]
            fn insert_into(self, group: &mut GroupStorage, id: EntityId) {
                let ($($T,)*) = self;
                $(
                    group.column_or_insert::<$T>().push(id, $T);
                )*
            }
        }
    };
}

// Implement for tuples of 1-8 components
impl_bundle!(A);
impl_bundle!(A, B);
impl_bundle!(A, B, C);
impl_bundle!(A, B, C, D);
impl_bundle!(A, B, C, D, E);
impl_bundle!(A, B, C, D, E, F);
impl_bundle!(A, B, C, D, E, F, G);
impl_bundle!(A, B, C, D, E, F, G, H);

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Position {
        x: f32,
        y: f32,
    }

    #[derive(Debug, Clone, Copy, PartialEq)]
    struct Velocity {
        x: f32,
    }

    #[test]
    fn test_component_types_in_tuple_order() {
        let types = <(Position, Velocity)>::component_types();
        assert_eq!(types.len(), 2);
        assert_eq!(types[0].id(), TypeId::of::<Position>());
        assert_eq!(types[1].id(), TypeId::of::<Velocity>());
    }

    #[test]
    fn test_take_from_reports_missing_component() {
        let mut implementors = Implementors::new().with(Position { x: 1.0, y: 2.0 });
        let missing = <(Position, Velocity)>::take_from(&mut implementors).unwrap_err();
        assert!(missing.ends_with("Velocity"));
    }

    #[test]
    fn test_take_from_consumes_table() {
        let mut implementors = Implementors::new()
            .with(Position { x: 1.0, y: 2.0 })
            .with(Velocity { x: 3.0 });
        let (position, velocity) = <(Position, Velocity)>::take_from(&mut implementors).unwrap();
        assert_eq!(position, Position { x: 1.0, y: 2.0 });
        assert_eq!(velocity.x, 3.0);
        assert!(implementors.is_empty());
    }
}
