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

//! Convenient re-exports of commonly used types.
//!
//! The prelude can be imported with:
//! ```
//! use submission_ecs::prelude::*;
//! ```

pub use crate::config::{EcsConfig, RootConfig, SchedulerConfig};
pub use crate::descriptor::{EntityDescriptor, StructDescriptor};
pub use crate::engine::{QueryingEngine, ReactiveEngine, TaskStatus};
pub use crate::entity::{Egid, EntityId, GroupId};
pub use crate::error::{EcsError, Result};
pub use crate::event::{CommitReport, EntityEvent};
pub use crate::factory::EntityFactory;
pub use crate::functions::EntityFunctions;
pub use crate::implementor::Implementors;
pub use crate::query::EntitiesDb;
pub use crate::root::EnginesRoot;
pub use crate::scheduler::{
    EntitySubmissionScheduler, FrameSubmissionScheduler, SimpleSubmissionScheduler,
};
