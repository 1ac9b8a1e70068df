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

//! # Cadence SDK
//!
//! The public-facing facade over the Cadence crates. A host creates a
//! [`ScriptEngine`], registers scripts written in the Cadence script language,
//! and calls [`ScriptEngine::frame`] once per frame.
//!
//! ```no_run
//! use cadence_sdk::prelude::*;
//!
//! fn main() -> anyhow::Result<()> {
//!     let mut engine = ScriptEngine::new(EngineConfig::default())?;
//!     engine.register_script(ScriptId(1), "greeter", "loop\n  await Heartbeat\n  print \"dt\" $1\nend")?;
//!     for frame in 0..3 {
//!         engine.frame(frame as f64 / 60.0, 1.0 / 60.0);
//!     }
//!     engine.shutdown();
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]

pub mod config;
pub mod engine;
pub mod run_service;

pub use config::EngineConfig;
pub use engine::ScriptEngine;
pub use run_service::RunService;

/// The types most hosts need.
pub mod prelude {
    pub use crate::{EngineConfig, RunService, ScriptEngine};
    pub use cadence_core::{ContextHandle, ScriptId, UnitStatus};
    pub use cadence_scheduler::{Function, StepReport, Value};
    pub use cadence_signal::{Connection, Signal};
}

/// Initializes `env_logger`, using `default_filter` when `RUST_LOG` is unset.
///
/// [`ScriptEngine::new`] calls it with [`EngineConfig::log_filter`]; calling it
/// more than once is harmless.
pub fn init_logging(default_filter: &str) {
    use env_logger::{Builder, Env};

    let _ = Builder::from_env(Env::default().default_filter_or(default_filter)).try_init();
}
