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

//! Entity factory: buffered entity construction

use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use tracing::trace;

use crate::command::{SharedBuffer, Submission};
use crate::component::Bundle;
use crate::descriptor::{DescriptorInfo, EntityDescriptor};
use crate::entity::{Egid, EntityId, GroupId};
use crate::error::{EcsError, Result};
use crate::group::GroupStorage;
use crate::implementor::Implementors;
use crate::scheduler::Liveness;

/// Handle buffering entity builds into its root.
///
/// Builds only check the descriptor's shape. Whether the id is free in its
/// group is decided by the commit that applies the build.
#[derive(Clone)]
pub struct EntityFactory {
    buffer: SharedBuffer,
    liveness: Liveness,
    next_id: Arc<AtomicU64>,
}

impl EntityFactory {
    pub(crate) fn new(buffer: SharedBuffer, liveness: Liveness, next_id: Arc<AtomicU64>) -> Self {
        Self {
            buffer,
            liveness,
            next_id,
        }
    }

    /// Allocate an id above every id this root has handed out or built.
    ///
    /// `IdsExhausted` once `u32::MAX` has been used.
    pub fn next_id(&self) -> Result<EntityId> {
        self.next_id
            .fetch_update(Ordering::Relaxed, Ordering::Relaxed, |next| {
                (next <= u64::from(u32::MAX)).then_some(next + 1)
            })
            .map(|id| EntityId(id as u32))
            .map_err(|_| EcsError::IdsExhausted)
    }

    /// Build an entity of kind `D` in the standard group
    pub fn build<D: EntityDescriptor>(
        &self,
        id: EntityId,
        implementors: Implementors,
    ) -> Result<Egid> {
        self.build_in_group::<D>(id, GroupId::STANDARD, implementors)
    }

    /// Build an entity of kind `D` in `group`.
    ///
    /// Component values are resolved from `implementors` right away; the
    /// entity becomes visible at the next commit.
    pub fn build_in_group<D: EntityDescriptor>(
        &self,
        id: EntityId,
        group: GroupId,
        mut implementors: Implementors,
    ) -> Result<Egid> {
        self.liveness.check()?;
        let descriptor = DescriptorInfo::of::<D>();
        descriptor.validate()?;

        let components = D::assemble(&mut implementors).map_err(|missing| {
            EcsError::invalid_descriptor(D::name(), format!("no implementor for `{missing}`"))
        })?;
        if !implementors.is_empty() {
            trace!(
                descriptor = D::name(),
                unused = implementors.len(),
                "implementors left unused"
            );
        }

        self.next_id
            .fetch_max(u64::from(id.0) + 1, Ordering::Relaxed);

        let egid = Egid::new(id, group);
        self.buffer.lock().push(Submission::Build {
            egid,
            descriptor,
            write: Box::new(move |storage: &mut GroupStorage| {
                components.insert_into(storage, id)
            }),
        });
        Ok(egid)
    }

    /// Reserve room for `count` entities of kind `D` in the standard group
    pub fn preallocate<D: EntityDescriptor>(&self, count: usize) -> Result<()> {
        self.preallocate_in_group::<D>(GroupId::STANDARD, count)
    }

    pub fn preallocate_in_group<D: EntityDescriptor>(
        &self,
        group: GroupId,
        count: usize,
    ) -> Result<()> {
        self.liveness.check()?;
        let descriptor = DescriptorInfo::of::<D>();
        descriptor.validate()?;

        self.buffer.lock().push(Submission::Preallocate {
            group,
            descriptor,
            count,
        });
        Ok(())
    }
}

impl std::fmt::Debug for EntityFactory {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EntityFactory")
            .field("alive", &self.liveness.is_alive())
            .field("next_id", &self.next_id.load(Ordering::Relaxed))
            .finish()
    }
}
