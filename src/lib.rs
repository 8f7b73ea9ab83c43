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

//! Submission ECS - grouped entity storage with buffered submissions
//!
//! Entities are built and removed through buffered [`EntityFactory`] and
//! [`EntityFunctions`] handles and become visible when a scheduler commits
//! them. Push-style [`ReactiveEngine`]s are told about every committed
//! addition and removal; pull-style [`QueryingEngine`]s poll the
//! [`EntitiesDb`] once per tick.
//!
//! ```
//! use submission_ecs::prelude::*;
//!
//! #[derive(Default)]
//! struct Counter(u32);
//!
//! let mut scheduler = FrameSubmissionScheduler::new();
//! let root = EnginesRoot::new(&mut scheduler);
//! let factory = root.entity_factory();
//!
//! let id = factory.next_id().unwrap();
//! factory.build::<StructDescriptor<Counter>>(id, Implementors::new()).unwrap();
//! assert_eq!(root.entities(|db| db.count::<Counter>(GroupId::STANDARD)), 0);
//!
//! scheduler.submit_frame().unwrap();
//! assert_eq!(root.entities(|db| db.count::<Counter>(GroupId::STANDARD)), 1);
//! ```

pub mod command;
pub mod component;
pub mod config;
pub mod descriptor;
pub mod engine;
pub mod entity;
pub mod error;
pub mod event;
pub mod factory;
pub mod functions;
pub mod group;
pub mod implementor;
pub mod prelude;
pub mod query;
pub mod root;
pub mod scheduler;
pub mod storage;
pub mod store;

#[cfg(feature = "profiling")]
pub mod profiling;


pub use command::*;
pub use component::*;
pub use config::*;
pub use descriptor::*;
pub use engine::*;
pub use entity::*;
pub use error::*;
pub use event::*;
pub use factory::*;
pub use functions::*;
pub use group::*;
pub use implementor::*;
pub use query::*;
pub use root::*;
pub use scheduler::*;
pub use storage::*;
pub use store::*;
