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

//! Entity descriptors
//!
//! A descriptor names the set of components co-allocated for one kind of
//! entity. Class-like descriptors take every component from the implementor
//! table; [`StructDescriptor`] builds a single plain record that falls back to
//! its `Default` value.

use std::any::TypeId;
use std::marker::PhantomData;
use std::sync::Arc;

use crate::component::{Bundle, Component, ComponentTypes};
use crate::error::{EcsError, Result};
use crate::implementor::Implementors;

/// Schema of an entity kind
pub trait EntityDescriptor: 'static {
    /// Components co-allocated for every entity of this kind
    type Components: Bundle;

    fn name() -> &'static str {
        std::any::type_name::<Self>()
    }

    /// Resolve the component values from the implementor table.
    ///
    /// On failure returns the type name of the missing component.
    fn assemble(
        implementors: &mut Implementors,
    ) -> std::result::Result<Self::Components, &'static str> {
        Self::Components::take_from(implementors)
    }
}

/// Descriptor for a flat struct-like record `C`.
///
/// Uses the supplied value when an implementor provides one, `C::default()` otherwise.
pub struct StructDescriptor<C>(PhantomData<fn() -> C>);

impl<C: Component + Default> EntityDescriptor for StructDescriptor<C> {
    type Components = (C,);

    fn assemble(implementors: &mut Implementors) -> std::result::Result<(C,), &'static str> {
        Ok((implementors.take::<C>().unwrap_or_default(),))
    }
}

/// Type-erased descriptor schema carried by buffered submissions.
///
/// Cheap to clone: the component list lives behind a shared pointer.
#[derive(Clone, Debug)]
pub struct DescriptorInfo(Arc<DescriptorData>);

#[derive(Debug)]
struct DescriptorData {
    type_id: TypeId,
    name: &'static str,
    components: ComponentTypes,
}

impl DescriptorInfo {
    pub fn of<D: EntityDescriptor>() -> Self {
        Self(Arc::new(DescriptorData {
            type_id: TypeId::of::<D>(),
            name: D::name(),
            components: D::Components::component_types(),
        }))
    }

    pub fn type_id(&self) -> TypeId {
        self.0.type_id
    }

    pub fn name(&self) -> &'static str {
        self.0.name
    }

    pub fn components(&self) -> &ComponentTypes {
        &self.0.components
    }

    /// Shape check: at least one component type, each listed exactly once
    pub fn validate(&self) -> Result<()> {
        let components = self.components();
        if components.is_empty() {
            return Err(EcsError::invalid_descriptor(self.name(), "no component types"));
        }
        for (i, component) in components.iter().enumerate() {
            if components[..i].contains(component) {
                return Err(EcsError::invalid_descriptor(
                    self.name(),
                    format!("component `{}` listed twice", component.name()),
                ));
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Default, Debug, PartialEq)]
    struct Counter {
        counter: i32,
    }

    struct Twice;

    impl EntityDescriptor for Twice {
        type Components = (u32, u32);
    }

    struct Pair;

    impl EntityDescriptor for Pair {
        type Components = (u32, String);

        fn name() -> &'static str {
            "Pair"
        }
    }

    #[test]
    fn test_duplicate_component_is_invalid() {
        let err = DescriptorInfo::of::<Twice>().validate().unwrap_err();
        assert!(matches!(err, EcsError::InvalidDescriptor { .. }));
        assert!(DescriptorInfo::of::<Pair>().validate().is_ok());
    }

    #[test]
    fn test_struct_descriptor_defaults() {
        let mut implementors = Implementors::new();
        let (record,) = StructDescriptor::<Counter>::assemble(&mut implementors).unwrap();
        assert_eq!(record, Counter::default());

        let mut implementors = Implementors::new().with(Counter { counter: 9 });
        let (record,) = StructDescriptor::<Counter>::assemble(&mut implementors).unwrap();
        assert_eq!(record.counter, 9);
    }

    #[test]
    fn test_class_descriptor_requires_implementors() {
        let mut implementors = Implementors::new().with(5u32);
        assert!(Pair::assemble(&mut implementors).is_err());
        assert_eq!(DescriptorInfo::of::<Pair>().name(), "Pair");
    }
}
