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

//! # Cadence Scheduler
//!
//! A cooperative scheduler multiplexing many resumable execution contexts over a
//! single logical thread.
//!
//! The host calls [`Scheduler::step`] once per frame. Each step promotes units
//! whose timer expired and units parked for the next frame, then resumes ready
//! units (persistent scripts first, anonymous tasks second) under a shared
//! budget of resumptions and wall-clock time.
//!
//! Units suspend by calling one of the park primitives and then yielding:
//!
//! - timed: [`ResumeCx::wait_until`] / [`Scheduler::set_wait_abs`]
//! - next frame: [`ResumeCx::wait_next_frame`] / [`Scheduler::set_wait_next_frame`]
//! - event: [`ResumeCx::wait_event`] / [`Scheduler::set_wait_event`], until
//!   [`Scheduler::wake_next_frame`] brings the unit back.

#![warn(missing_docs)]

pub mod context;
pub mod loader;
mod queue;
pub mod report;
pub mod scheduler;
pub mod unit;
pub mod value;

pub use context::{Coroutine, Environment, ExecutionContext, Outcome, ResumeCx, MAX_STACK_SLOTS};
pub use loader::{FunctionRegistry, SourceLoader};
pub use report::StepReport;
pub use scheduler::{ReleaseQueue, Scheduler};
pub use unit::UnitKey;
pub use value::{Function, Value};

// Re-export the foundation so hosts need a single dependency.
pub use cadence_core::{
    Clock, ContextHandle, LoadError, ManualClock, MonotonicClock, Retain, SchedulerConfig,
    ScriptError, ScriptId, UnitStatus,
};
