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

//! Submission buffer: structural changes waiting for the next commit

use std::sync::Arc;

use parking_lot::Mutex;

use crate::descriptor::DescriptorInfo;
use crate::entity::{Egid, EntityId, GroupId};
use crate::group::GroupStorage;

/// Closure writing one entity's components into its group
pub type BuildClosure = Box<dyn FnOnce(&mut GroupStorage) + Send>;

/// Buffered structural change
pub enum Submission {
    /// Build an entity
    Build {
        egid: Egid,
        descriptor: DescriptorInfo,
        write: BuildClosure,
    },

    /// Remove an entity
    Remove { egid: Egid, descriptor: DescriptorInfo },

    /// Move an entity to another group
    Swap {
        id: EntityId,
        from: GroupId,
        to: GroupId,
        descriptor: DescriptorInfo,
    },

    /// Reserve column capacity
    Preallocate {
        group: GroupId,
        descriptor: DescriptorInfo,
        count: usize,
    },
}

impl std::fmt::Debug for Submission {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Submission::Build {
                egid, descriptor, ..
            } => write!(f, "Build({egid}, {})", descriptor.name()),
            Submission::Remove { egid, descriptor } => {
                write!(f, "Remove({egid}, {})", descriptor.name())
            }
            Submission::Swap {
                id,
                from,
                to,
                descriptor,
            } => write!(f, "Swap({id}: {from} -> {to}, {})", descriptor.name()),
            Submission::Preallocate {
                group,
                descriptor,
                count,
            } => write!(f, "Preallocate({group}, {}, {count})", descriptor.name()),
        }
    }
}

/// Where the buffer is in its commit cycle
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SubmissionState {
    /// Nothing buffered
    Idle,
    /// Changes buffered, waiting for a commit
    Scheduled,
    /// A commit is applying a drained batch
    Committing,
}

/// Submission buffer for deferred operations
pub struct SubmissionBuffer {
    submissions: Vec<Submission>,
    capacity: usize,
    state: SubmissionState,
}

/// Buffer shared by a root and every factory/functions handle it hands out
pub type SharedBuffer = Arc<Mutex<SubmissionBuffer>>;

impl Default for SubmissionBuffer {
    fn default() -> Self {
        Self::new()
    }
}

impl SubmissionBuffer {
    /// Create new submission buffer
    pub fn new() -> Self {
        Self::with_capacity(0)
    }

    /// Create with capacity
    pub fn with_capacity(capacity: usize) -> Self {
        Self {
            submissions: Vec::with_capacity(capacity),
            capacity,
            state: SubmissionState::Idle,
        }
    }

    pub fn shared(capacity: usize) -> SharedBuffer {
        Arc::new(Mutex::new(Self::with_capacity(capacity)))
    }

    /// Queue a submission
    pub fn push(&mut self, submission: Submission) {
        self.submissions.push(submission);
        if self.state == SubmissionState::Idle {
            self.state = SubmissionState::Scheduled;
        }
    }

    /// Drain the buffer for a commit. The next window starts at the
    /// configured capacity again.
    pub fn begin_commit(&mut self) -> Vec<Submission> {
        self.state = SubmissionState::Committing;
        std::mem::replace(&mut self.submissions, Vec::with_capacity(self.capacity))
    }

    /// Leave the committing state; anything queued meanwhile stays scheduled
    pub fn end_commit(&mut self) {
        self.state = if self.submissions.is_empty() {
            SubmissionState::Idle
        } else {
            SubmissionState::Scheduled
        };
    }

    pub fn state(&self) -> SubmissionState {
        self.state
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.submissions.is_empty()
    }

    /// Get length
    pub fn len(&self) -> usize {
        self.submissions.len()
    }

    /// Clear buffer
    pub fn clear(&mut self) {
        self.submissions.clear();
        if self.state == SubmissionState::Scheduled {
            self.state = SubmissionState::Idle;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::descriptor::StructDescriptor;

    fn remove(id: u32) -> Submission {
        Submission::Remove {
            egid: Egid::standard(EntityId(id)),
            descriptor: DescriptorInfo::of::<StructDescriptor<u32>>(),
        }
    }

    #[test]
    fn test_state_machine() {
        let mut buffer = SubmissionBuffer::new();
        assert_eq!(buffer.state(), SubmissionState::Idle);

        buffer.push(remove(0));
        assert_eq!(buffer.state(), SubmissionState::Scheduled);

        let batch = buffer.begin_commit();
        assert_eq!(batch.len(), 1);
        assert_eq!(buffer.state(), SubmissionState::Committing);

        // Queued by an engine while the batch is applied
        buffer.push(remove(1));
        assert_eq!(buffer.state(), SubmissionState::Committing);

        buffer.end_commit();
        assert_eq!(buffer.state(), SubmissionState::Scheduled);

        buffer.begin_commit();
        buffer.end_commit();
        assert_eq!(buffer.state(), SubmissionState::Idle);
    }

    #[test]
    fn test_submissions_stay_small() {
        assert!(std::mem::size_of::<Submission>() <= 48);
    }

    #[test]
    fn test_commit_keeps_configured_capacity() {
        let mut buffer = SubmissionBuffer::with_capacity(16);
        buffer.push(remove(0));
        let batch = buffer.begin_commit();
        buffer.end_commit();

        assert_eq!(batch.len(), 1);
        assert!(buffer.submissions.capacity() >= 16);
    }

    #[test]
    fn test_submission_buffer_clear() {
        let mut buffer = SubmissionBuffer::new();
        buffer.push(remove(3));
        assert!(format!("{:?}", buffer.submissions[0]).starts_with("Remove(3@standard"));
        buffer.clear();
        assert_eq!(buffer.len(), 0);
        assert_eq!(buffer.state(), SubmissionState::Idle);
    }
}
