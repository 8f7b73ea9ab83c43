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

//! Runtime configuration, loadable from JSON
//!
//! ```
//! use submission_ecs::config::EcsConfig;
//!
//! let config = EcsConfig::from_json_str(r#"{
//!     "scheduler": { "tick_interval_ms": 16, "max_ticks": 3 },
//!     "root": { "groups": [0, 1] }
//! }"#).unwrap();
//! assert_eq!(config.scheduler.max_ticks, Some(3));
//! assert_eq!(config.root.groups.len(), 2);
//! ```

use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::entity::GroupId;
use crate::error::Result;

/// Cadence of [`SimpleSubmissionScheduler`](crate::scheduler::SimpleSubmissionScheduler)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Sleep between two ticks
    pub tick_interval_ms: u64,
    /// Stop after this many ticks; run until every root is gone when unset
    pub max_ticks: Option<u64>,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_ms: 1,
            max_ticks: None,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_ms)
    }

    #[must_use]
    pub fn with_tick_interval(mut self, interval: Duration) -> Self {
        self.tick_interval_ms = interval.as_millis() as u64;
        self
    }

    #[must_use]
    pub fn with_max_ticks(mut self, max_ticks: u64) -> Self {
        self.max_ticks = Some(max_ticks);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Setup of an [`EnginesRoot`](crate::root::EnginesRoot)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct RootConfig {
    /// Groups declared up front, in addition to the standard group
    pub groups: Vec<GroupId>,
    /// Initial capacity of the submission buffer
    pub submission_capacity: usize,
}

impl Default for RootConfig {
    fn default() -> Self {
        Self {
            groups: Vec::new(),
            submission_capacity: 64,
        }
    }
}

impl RootConfig {
    #[must_use]
    pub fn with_group(mut self, group: GroupId) -> Self {
        self.groups.push(group);
        self
    }

    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }
}

/// Complete configuration file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EcsConfig {
    pub scheduler: SchedulerConfig,
    pub root: RootConfig,
}

impl EcsConfig {
    pub fn from_json_str(json: &str) -> Result<Self> {
        Ok(serde_json::from_str(json)?)
    }

    pub fn to_json_string(&self) -> Result<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }
}
