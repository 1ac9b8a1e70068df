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

//! Defines the identity types used to address schedulable units.

use serde::{Deserialize, Serialize};
use std::fmt;

/// The stable, externally chosen identity of a persistent script.
///
/// The scheduler never interprets the value; the host (typically the object
/// hierarchy owning the script) picks it and uses it again to stop the script.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ScriptId(pub u64);

impl fmt::Display for ScriptId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "script#{}", self.0)
    }
}

/// A handle to an execution context stored in the context [`Arena`](crate::Arena).
///
/// It combines a slot index with a generation count. When a context is released
/// its slot can be recycled, but the generation is bumped, so stale handles held
/// by queues or waiter lists simply stop resolving instead of aliasing the new
/// occupant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ContextHandle {
    /// The index of the slot in the arena.
    pub index: u32,
    /// A generation counter incremented each time the slot is recycled.
    pub generation: u32,
}

impl fmt::Display for ContextHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "thread#{}v{}", self.index, self.generation)
    }
}

/// The externally observable lifecycle state of a schedulable unit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum UnitStatus {
    /// Eligible to be resumed (queued ready, or about to be).
    Running,
    /// Parked on a timer, the next tick, or an external event.
    Waiting,
    /// Ran to completion.
    Done,
    /// Failed with a runtime error. Terminal.
    Error,
}

impl UnitStatus {
    /// Returns `true` for the two terminal states.
    pub fn is_finished(self) -> bool {
        matches!(self, UnitStatus::Done | UnitStatus::Error)
    }
}

impl fmt::Display for UnitStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitStatus::Running => write!(f, "Running"),
            UnitStatus::Waiting => write!(f, "Waiting"),
            UnitStatus::Done => write!(f, "Done"),
            UnitStatus::Error => write!(f, "Error"),
        }
    }
}
