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

//! Entity functions: buffered removal and group swaps

use crate::command::{SharedBuffer, Submission};
use crate::descriptor::{DescriptorInfo, EntityDescriptor};
use crate::entity::{Egid, EntityId, GroupId};
use crate::error::Result;
use crate::scheduler::Liveness;

/// Handle buffering changes to existing entities.
///
/// Existence is checked at commit: removing an id that is gone by then is
/// `NotFound`, while a second removal in the same window is ignored.
#[derive(Clone)]
pub struct EntityFunctions {
    buffer: SharedBuffer,
    liveness: Liveness,
}

impl EntityFunctions {
    pub(crate) fn new(buffer: SharedBuffer, liveness: Liveness) -> Self {
        Self { buffer, liveness }
    }

    /// Remove an entity of kind `D` from the standard group
    pub fn remove<D: EntityDescriptor>(&self, id: EntityId) -> Result<()> {
        self.remove_from_group::<D>(id, GroupId::STANDARD)
    }

    pub fn remove_from_group<D: EntityDescriptor>(
        &self,
        id: EntityId,
        group: GroupId,
    ) -> Result<()> {
        self.liveness.check()?;
        self.buffer.lock().push(Submission::Remove {
            egid: Egid::new(id, group),
            descriptor: DescriptorInfo::of::<D>(),
        });
        Ok(())
    }

    /// Move an entity of kind `D` from one group to another, keeping its id
    pub fn swap_group<D: EntityDescriptor>(
        &self,
        id: EntityId,
        from: GroupId,
        to: GroupId,
    ) -> Result<()> {
        self.liveness.check()?;
        self.buffer.lock().push(Submission::Swap {
            id,
            from,
            to,
            descriptor: DescriptorInfo::of::<D>(),
        });
        Ok(())
    }
}

impl std::fmt::Debug for EntityFunctions {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityFunctions")
            .field("alive", &self.liveness.is_alive())
            .finish()
    }
}
