/*
 * Copyright 2025 Security Union LLC
 *
 * Licensed under the Apache License, Version 2.0 (the "License");
 * you may not use this file except in compliance with the License.
 * You may obtain a copy of the License at
 *
 *     http://www.apache.org/licenses/LICENSE-2.0
 *
 * Unless required by applicable law or agreed to in writing, software
 * distributed under the License is distributed on an "AS IS" BASIS,
 * WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
 * See the License for the specific language governing permissions and
 * limitations under the License.
 */

//! Command messages for the media worker.
//!
//! All cross-context hand-off goes through these; the caller side never
//! touches the pipeline controller directly.

use std::sync::mpsc::SyncSender;
use std::time::Duration;

use crate::adapter::{RestorePlaybackMode, SuspendReason};

/// Messages posted to the media worker's command channel.
#[derive(Debug)]
pub enum MediaCommand {
    /// Drain the shared frame queue into the pipeline.
    Drain,
    /// A decode session finished asynchronous initialization. Stale
    /// generations are ignored.
    PipelineReady { generation: u64 },
    /// The platform pipeline died; drop the session if it still matches.
    TeardownSession { generation: u64 },
    /// Synchronization barrier: ack once every prior command has executed.
    Flush(SyncSender<()>),
    /// Forward a suspend request to the active session.
    Suspend(SuspendReason),
    /// Forward a resume request to the active session.
    Resume {
        position: Duration,
        mode: RestorePlaybackMode,
    },
    /// Final command; the worker finalizes any session and exits.
    Shutdown,
}
