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

//! Submission schedulers
//!
//! A scheduler decides when a root's buffered changes are committed. Roots
//! register a [`SubmissionHandle`]; the scheduler checks the handle's
//! [`Liveness`] before every invocation and drops it once the root is gone.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use slotmap::{new_key_type, SlotMap};
use tracing::{debug, error, trace_span};

use crate::config::SchedulerConfig;
use crate::error::{EcsError, Result};
use crate::event::CommitReport;

new_key_type! {
    /// Key of a registration inside a scheduler
    pub struct SubmissionKey;
}

/// Explicit liveness flag shared by a root and its registration
#[derive(Clone, Debug)]
pub struct Liveness(Arc<AtomicBool>);

impl Liveness {
    pub fn new() -> Self {
        Self(Arc::new(AtomicBool::new(true)))
    }

    pub fn is_alive(&self) -> bool {
        self.0.load(Ordering::Acquire)
    }

    /// `RootDisposed` once revoked
    pub fn check(&self) -> Result<()> {
        if self.is_alive() {
            Ok(())
        } else {
            Err(EcsError::RootDisposed)
        }
    }

    /// Permanently invalidate every clone of this flag
    pub fn revoke(&self) {
        self.0.store(false, Ordering::Release);
    }
}

impl Default for Liveness {
    fn default() -> Self {
        Self::new()
    }
}

/// Commit callback of one root
pub type SubmitFn = Box<dyn FnMut() -> Result<CommitReport> + Send>;

/// Liveness-checked registration handed to a scheduler
pub struct SubmissionHandle {
    label: String,
    liveness: Liveness,
    submit: SubmitFn,
}

impl SubmissionHandle {
    pub fn new(
        label: impl Into<String>,
        liveness: Liveness,
        submit: impl FnMut() -> Result<CommitReport> + Send + 'static,
    ) -> Self {
        Self {
            label: label.into(),
            liveness,
            submit: Box::new(submit),
        }
    }

    pub fn label(&self) -> &str {
        &self.label
    }

    pub fn is_valid(&self) -> bool {
        self.liveness.is_alive()
    }

    /// Run the callback. `None` if the owner is gone; the callback is not called then.
    pub fn invoke(&mut self) -> Option<Result<CommitReport>> {
        if !self.is_valid() {
            return None;
        }
        Some((self.submit)())
    }
}

impl std::fmt::Debug for SubmissionHandle {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SubmissionHandle")
            .field("label", &self.label)
            .field("valid", &self.is_valid())
            .finish()
    }
}

/// Anything that can drive root submissions
pub trait EntitySubmissionScheduler {
    /// Register a callback; the scheduler owns the invocation cadence
    fn schedule(&mut self, submission: SubmissionHandle) -> SubmissionKey;
}

/// What one tick did
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct TickSummary {
    /// Callbacks invoked
    pub invoked: usize,
    /// Dead registrations dropped
    pub dropped: usize,
    /// Entities built, removed or swapped across every invoked root
    pub changes: usize,
}

#[derive(Default)]
struct Registrations {
    handles: SlotMap<SubmissionKey, SubmissionHandle>,
}

impl Registrations {
    fn insert(&mut self, handle: SubmissionHandle) -> SubmissionKey {
        debug!(label = handle.label(), "submission scheduled");
        self.handles.insert(handle)
    }

    fn remove(&mut self, key: SubmissionKey) -> bool {
        self.handles.remove(key).is_some()
    }

    fn len(&self) -> usize {
        self.handles.len()
    }

    /// Invoke every live registration once.
    ///
    /// Dead registrations are dropped uninvoked. A failing registration is
    /// dropped as well and its error ends the tick.
    fn invoke_all(&mut self) -> Result<TickSummary> {
        let mut summary = TickSummary::default();
        let keys: Vec<SubmissionKey> = self.handles.keys().collect();

        for key in keys {
            let Some(handle) = self.handles.get_mut(key) else {
                continue;
            };
            match handle.invoke() {
                None => {
                    debug!(label = handle.label(), "owner disposed, dropping submission");
                    self.handles.remove(key);
                    summary.dropped += 1;
                }
                Some(Ok(report)) => {
                    summary.invoked += 1;
                    summary.changes += report.built + report.removed + report.swapped;
                }
                Some(Err(err)) => {
                    error!(label = handle.label(), error = %err, "submission failed, dropping it");
                    self.handles.remove(key);
                    return Err(err);
                }
            }
        }
        Ok(summary)
    }
}

/// Why [`SimpleSubmissionScheduler::run`] returned
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum SchedulerExit {
    /// Every registered root was torn down
    Drained { ticks: u64 },
    /// `max_ticks` was reached
    TickLimit { ticks: u64 },
}

/// Cooperative polling loop committing every root once per tick, with a
/// fixed sleep between ticks.
pub struct SimpleSubmissionScheduler {
    config: SchedulerConfig,
    registrations: Registrations,
    ticks: u64,
}

impl Default for SimpleSubmissionScheduler {
    fn default() -> Self {
        Self::new(SchedulerConfig::default())
    }
}

impl SimpleSubmissionScheduler {
    pub fn new(config: SchedulerConfig) -> Self {
        Self {
            config,
            registrations: Registrations::default(),
            ticks: 0,
        }
    }

    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Ticks run so far
    pub fn ticks(&self) -> u64 {
        self.ticks
    }

    /// Live registrations, as of the last tick
    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.len() == 0
    }

    pub fn deregister(&mut self, key: SubmissionKey) -> bool {
        self.registrations.remove(key)
    }

    /// Run a single tick without sleeping
    pub fn tick(&mut self) -> Result<TickSummary> {
        self.ticks += 1;
        let _span = trace_span!("scheduler_tick", tick = self.ticks).entered();
        self.registrations.invoke_all()
    }

    /// Tick until every root is gone, the tick limit is hit, or a commit fails
    pub fn run(&mut self) -> Result<SchedulerExit> {
        let interval = self.config.tick_interval();
        loop {
            if self.is_empty() {
                return Ok(SchedulerExit::Drained { ticks: self.ticks });
            }
            if self
                .config
                .max_ticks
                .is_some_and(|max_ticks| self.ticks >= max_ticks)
            {
                return Ok(SchedulerExit::TickLimit { ticks: self.ticks });
            }

            self.tick()?;

            if !interval.is_zero() {
                std::thread::sleep(interval);
            }
        }
    }
}

impl EntitySubmissionScheduler for SimpleSubmissionScheduler {
    fn schedule(&mut self, submission: SubmissionHandle) -> SubmissionKey {
        self.registrations.insert(submission)
    }
}

/// Host-driven scheduler: commits once per [`FrameSubmissionScheduler::submit_frame`]
#[derive(Default)]
pub struct FrameSubmissionScheduler {
    registrations: Registrations,
    frames: u64,
}

impl FrameSubmissionScheduler {
    pub fn new() -> Self {
        Self::default()
    }

    /// Commit every live root once
    pub fn submit_frame(&mut self) -> Result<TickSummary> {
        self.frames += 1;
        let _span = trace_span!("submit_frame", frame = self.frames).entered();
        self.registrations.invoke_all()
    }

    pub fn frames(&self) -> u64 {
        self.frames
    }

    pub fn len(&self) -> usize {
        self.registrations.len()
    }

    pub fn is_empty(&self) -> bool {
        self.registrations.len() == 0
    }

    pub fn deregister(&mut self, key: SubmissionKey) -> bool {
        self.registrations.remove(key)
    }
}

impl EntitySubmissionScheduler for FrameSubmissionScheduler {
    fn schedule(&mut self, submission: SubmissionHandle) -> SubmissionKey {
        self.registrations.insert(submission)
    }
}
