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

//! Tracing subscriber setup for the `profiling` feature
//!
//! Commits run inside a `commit` span and scheduler ticks inside
//! `scheduler_tick`/`submit_frame` spans, so a JSON trace shows where each
//! tick spends its time.
//!
//! ```ignore
//! let _guard = submission_ecs::profiling::init_json_file("trace.json", tracing::Level::TRACE)?;
//! ```

use std::fs::File;
use std::path::Path;

use tracing::Level;
use tracing_appender::non_blocking::WorkerGuard;

use crate::error::{EcsError, Result};

/// Plain text output on stdout
pub fn init_stdout(level: Level) -> Result<()> {
    tracing_subscriber::fmt()
        .with_max_level(level)
        .with_target(false)
        .try_init()
        .map_err(|err| EcsError::Config(err.to_string()))
}

/// JSON output written to `path` by a background worker.
///
/// Events are flushed until the returned guard is dropped.
pub fn init_json_file(path: impl AsRef<Path>, level: Level) -> Result<WorkerGuard> {
    let path = path.as_ref();
    let file = File::create(path)
        .map_err(|err| EcsError::Config(format!("{}: {err}", path.display())))?;
    let (writer, guard) = tracing_appender::non_blocking(file);

    tracing_subscriber::fmt()
        .with_writer(writer)
        .with_ansi(false)
        .with_max_level(level)
        .with_thread_ids(true)
        .with_thread_names(true)
        .json()
        .try_init()
        .map_err(|err| EcsError::Config(err.to_string()))?;
    Ok(guard)
}
