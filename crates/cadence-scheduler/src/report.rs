// Copyright 2025 eraflo
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

//! Per-step accounting.

use std::fmt;

/// What one call to [`Scheduler::step`](crate::Scheduler::step) did.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct StepReport {
    /// The frame counter after the increment.
    pub frame: u64,
    /// Ownership tokens released by the maintenance pass.
    pub released: usize,
    /// Units moved from the timer queues to the ready queues.
    pub timers_promoted: u32,
    /// Units moved from the next-frame queues to the ready queues.
    pub next_frame_promoted: u32,
    /// Resumptions performed, scripts and tasks combined.
    pub resumed: u32,
    /// Resumptions that ran their body to completion.
    pub completed: u32,
    /// Resumptions that ended in a runtime error.
    pub failed: u32,
    /// Units left at the front of the ready queues when the budget ran out.
    pub deferred: usize,
}

impl StepReport {
    /// Returns `true` if the budget stopped the resume loop early.
    pub fn budget_exhausted(&self) -> bool {
        self.deferred > 0
    }
}

impl fmt::Display for StepReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "frame {}: {} resumed ({} done, {} failed), {} timers, {} next-frame, {} deferred",
            self.frame,
            self.resumed,
            self.completed,
            self.failed,
            self.timers_promoted,
            self.next_frame_promoted,
            self.deferred
        )
    }
}
