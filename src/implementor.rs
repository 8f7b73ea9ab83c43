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

//! Implementor capability table
//!
//! An implementor is an application object that supplies the value of one or
//! more components at build time. The table maps each component type to the
//! value supplied for it, so a single object (typically an `Arc`) can back
//! several components:
//!
//! ```
//! use std::sync::Arc;
//! use submission_ecs::Implementors;
//!
//! trait Named: Send + Sync { fn name(&self) -> &str; }
//! trait Scored: Send + Sync { fn score(&self) -> u32; }
//!
//! struct Player;
//! impl Named for Player { fn name(&self) -> &str { "player" } }
//! impl Scored for Player { fn score(&self) -> u32 { 3 } }
//!
//! let player = Arc::new(Player);
//! let implementors = Implementors::new()
//!     .with(player.clone() as Arc<dyn Named>)
//!     .with(player as Arc<dyn Scored>);
//! assert_eq!(implementors.len(), 2);
//! ```

use std::any::{Any, TypeId};

use rustc_hash::FxHashMap;

use crate::component::Component;

/// Component values keyed by component type, consumed once by `build`
#[derive(Default)]
pub struct Implementors {
    table: FxHashMap<TypeId, Box<dyn Any + Send>>,
}

impl Implementors {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builder form of [`Implementors::provide`]
    pub fn with<C: Component>(mut self, value: C) -> Self {
        self.provide(value);
        self
    }

    /// Supply the value of component `C`. A later value for the same type replaces the earlier one.
    pub fn provide<C: Component>(&mut self, value: C) {
        self.table.insert(TypeId::of::<C>(), Box::new(value));
    }

    /// Take the value supplied for component `C`
    pub fn take<C: Component>(&mut self) -> Option<C> {
        let boxed = self.table.remove(&TypeId::of::<C>())?;
        // Keys are derived from the boxed value's own type
        boxed.downcast::<C>().ok().map(|value| *value)
    }

    pub fn contains<C: Component>(&self) -> bool {
        self.table.contains_key(&TypeId::of::<C>())
    }

    pub fn len(&self) -> usize {
        self.table.len()
    }

    pub fn is_empty(&self) -> bool {
        self.table.is_empty()
    }
}

impl std::fmt::Debug for Implementors {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Implementors")
            .field("supplied", &self.table.len())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Arc;

    trait Named: Send + Sync {
        fn name(&self) -> &str;
    }

    trait Counted: Send + Sync {
        fn count(&self) -> u32;
    }

    struct Both;

    impl Named for Both {
        fn name(&self) -> &str {
            "both"
        }
    }

    impl Counted for Both {
        fn count(&self) -> u32 {
            2
        }
    }

    #[test]
    fn test_one_object_backs_two_components() {
        let shared = Arc::new(Both);
        let mut implementors = Implementors::new()
            .with(shared.clone() as Arc<dyn Named>)
            .with(shared.clone() as Arc<dyn Counted>);

        let named = implementors.take::<Arc<dyn Named>>().unwrap();
        let counted = implementors.take::<Arc<dyn Counted>>().unwrap();
        assert_eq!(named.name(), "both");
        assert_eq!(counted.count(), 2);
        assert!(implementors.is_empty());
        // The table held two handles, the test holds the third
        assert_eq!(Arc::strong_count(&shared), 3);
    }

    #[test]
    fn test_take_missing_is_none() {
        let mut implementors = Implementors::new().with(1u8);
        assert!(implementors.take::<u16>().is_none());
        assert!(implementors.contains::<u8>());
    }
}
