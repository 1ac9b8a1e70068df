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

//! Scheduler tunables.

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};

/// Tunables bounding how much work one `step` may do.
///
/// The budget is advisory: a unit that is already running is never interrupted,
/// the limits only decide whether the next ready unit gets resumed this tick.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Maximum number of resumptions per step, scripts and tasks combined.
    pub max_resumes_per_tick: u32,
    /// Wall-clock time the resume loop may spend per step, in seconds.
    /// Zero or a negative value disables the time limit.
    pub max_time_budget_seconds: f64,
    /// The wall clock is sampled once every this many resumptions.
    pub budget_sample_interval: u32,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            max_resumes_per_tick: 4096,
            max_time_budget_seconds: 0.010,
            budget_sample_interval: 8,
        }
    }
}

impl SchedulerConfig {
    /// Parses a configuration from RON text. Missing fields take their defaults.
    pub fn from_ron_str(text: &str) -> Result<Self, ConfigError> {
        let config: Self = ron::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    /// Checks that every field is usable.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.budget_sample_interval == 0 {
            return Err(ConfigError::Invalid {
                field: "budget_sample_interval",
                reason: "must be at least 1".into(),
            });
        }
        if self.max_time_budget_seconds.is_nan() {
            return Err(ConfigError::Invalid {
                field: "max_time_budget_seconds",
                reason: "must be a number".into(),
            });
        }
        Ok(())
    }
}
