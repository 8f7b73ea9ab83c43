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

//! Error types

use thiserror::Error;

use crate::entity::{Egid, GroupId};

/// ECS error type
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EcsError {
    /// Entity id already committed or already pending in the same group
    #[error("entity {0} already exists")]
    DuplicateId(Egid),

    /// Removal or swap of an entity that does not exist at commit time
    #[error("entity {0} not found")]
    NotFound(Egid),

    /// Group used at commit time without being declared
    #[error("group {0} was never declared")]
    InvalidGroup(GroupId),

    /// Malformed descriptor, unknown descriptor or descriptor mismatch
    #[error("invalid descriptor `{descriptor}`: {reason}")]
    InvalidDescriptor {
        descriptor: &'static str,
        reason: String,
    },

    /// An engine callback reported a failure
    #[error("engine `{engine}` failed: {reason}")]
    EngineFailed { engine: String, reason: String },

    /// Every 32-bit id at or above the allocation cursor is taken
    #[error("entity ids exhausted")]
    IdsExhausted,

    /// Handle used after its engines root was torn down
    #[error("engines root has been disposed")]
    RootDisposed,

    /// Configuration could not be parsed
    #[error("configuration error: {0}")]
    Config(String),
}

impl EcsError {
    pub fn invalid_descriptor(descriptor: &'static str, reason: impl Into<String>) -> Self {
        EcsError::InvalidDescriptor {
            descriptor,
            reason: reason.into(),
        }
    }

    /// Failure raised from inside an engine
    pub fn engine(engine: impl Into<String>, reason: impl Into<String>) -> Self {
        EcsError::EngineFailed {
            engine: engine.into(),
            reason: reason.into(),
        }
    }
}

impl From<serde_json::Error> for EcsError {
    fn from(err: serde_json::Error) -> Self {
        EcsError::Config(err.to_string())
    }
}

/// Result type alias
pub type Result<T> = std::result::Result<T, EcsError>;
