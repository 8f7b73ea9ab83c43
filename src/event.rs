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

//! Entity lifecycle events and the per-commit report

use crate::entity::Egid;

/// Lifecycle events observable by reactive engines
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum EntityEvent {
    /// Entity became visible at this commit
    Added(Egid),

    /// Entity stopped being visible at this commit
    Removed(Egid),
}

impl EntityEvent {
    /// Get the entity involved in this event
    pub fn egid(&self) -> Egid {
        match self {
            EntityEvent::Added(egid) | EntityEvent::Removed(egid) => *egid,
        }
    }

    /// Get event type name for debugging
    pub fn event_type(&self) -> &'static str {
        match self {
            EntityEvent::Added(_) => "Added",
            EntityEvent::Removed(_) => "Removed",
        }
    }
}

/// Outcome of one commit
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct CommitReport {
    /// Entities built
    pub built: usize,
    /// Entities removed
    pub removed: usize,
    /// Entities moved to another group
    pub swapped: usize,
    /// Repeated removals and same-group swaps dropped as no-ops
    pub ignored: usize,
    /// Net events, removals first, each in submission order
    pub events: Vec<EntityEvent>,
}

impl CommitReport {
    /// Whether the commit changed nothing
    pub fn is_empty(&self) -> bool {
        self.built == 0 && self.removed == 0 && self.swapped == 0
    }

    pub fn added(&self) -> impl Iterator<Item = Egid> + '_ {
        self.events.iter().filter_map(|event| match event {
            EntityEvent::Added(egid) => Some(*egid),
            EntityEvent::Removed(_) => None,
        })
    }

    pub fn removed_entities(&self) -> impl Iterator<Item = Egid> + '_ {
        self.events.iter().filter_map(|event| match event {
            EntityEvent::Removed(egid) => Some(*egid),
            EntityEvent::Added(_) => None,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::entity::{EntityId, GroupId};

    #[test]
    fn test_report_filters() {
        let a = Egid::new(EntityId(0), GroupId(0));
        let b = Egid::new(EntityId(1), GroupId(0));
        let report = CommitReport {
            built: 1,
            removed: 1,
            events: vec![EntityEvent::Removed(b), EntityEvent::Added(a)],
            ..Default::default()
        };
        assert_eq!(report.added().collect::<Vec<_>>(), vec![a]);
        assert_eq!(report.removed_entities().collect::<Vec<_>>(), vec![b]);
        assert!(!report.is_empty());
        assert_eq!(report.events[0].event_type(), "Removed");
        assert_eq!(report.events[1].egid(), a);
    }
}
