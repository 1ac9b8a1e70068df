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

//! # Cadence Core
//!
//! Foundational crate containing the identity types, the generational arena that
//! owns execution contexts, time sources, configuration and the error contracts
//! shared by every other Cadence crate.

#![warn(missing_docs)]

pub mod arena;
pub mod clock;
pub mod config;
pub mod error;
pub mod ids;

pub use arena::{Arena, Retain};
pub use clock::{Clock, ManualClock, MonotonicClock};
pub use config::SchedulerConfig;
pub use error::{ConfigError, LoadError, ScriptError};
pub use ids::{ContextHandle, ScriptId, UnitStatus};
