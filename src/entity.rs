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

//! Entity identifiers, groups and the (id, group) address of an entity.

use std::fmt;

use serde::{Deserialize, Serialize};

/// Caller-chosen entity identifier, unique within its group.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct EntityId(pub u32);

/// Partition of entity storage.
///
/// Every group owns independent, densely packed component columns.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct GroupId(pub u32);

impl GroupId {
    /// Group used by the group-less build and remove calls. Always declared.
    pub const STANDARD: GroupId = GroupId(u32::MAX);

    /// Whether this is the reserved standard group
    pub fn is_standard(self) -> bool {
        self == Self::STANDARD
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl fmt::Display for GroupId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_standard() {
            write!(f, "standard")
        } else {
            write!(f, "{}", self.0)
        }
    }
}

/// Full address of an entity: its id and the group it currently lives in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Egid {
    pub id: EntityId,
    pub group: GroupId,
}

impl Egid {
    pub fn new(id: EntityId, group: GroupId) -> Self {
        Self { id, group }
    }

    /// Address in the standard group
    pub fn standard(id: EntityId) -> Self {
        Self::new(id, GroupId::STANDARD)
    }
}

impl fmt::Display for Egid {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.id, self.group)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_egid_display() {
        assert_eq!(Egid::new(EntityId(3), GroupId(0)).to_string(), "3@0");
        assert_eq!(Egid::standard(EntityId(7)).to_string(), "7@standard");
    }

    #[test]
    fn test_group_id_serde_is_transparent() {
        let groups: Vec<GroupId> = serde_json::from_str("[0, 4]").unwrap();
        assert_eq!(groups, vec![GroupId(0), GroupId(4)]);
    }
}
