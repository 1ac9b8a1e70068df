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

//! Host-facing configuration.

use anyhow::{Context, Result};
use cadence_core::SchedulerConfig;
use serde::{Deserialize, Serialize};

/// Everything a [`ScriptEngine`](crate::ScriptEngine) is built from.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Step budget tunables.
    pub scheduler: SchedulerConfig,
    /// Default `env_logger` filter installed by
    /// [`ScriptEngine::new`](crate::ScriptEngine::new) when `RUST_LOG` is unset.
    pub log_filter: String,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            scheduler: SchedulerConfig::default(),
            log_filter: "info".to_owned(),
        }
    }
}

impl EngineConfig {
    /// Parses and validates a configuration written in RON.
    pub fn from_ron_str(text: &str) -> Result<Self> {
        let config: Self = ron::from_str(text).context("Failed to parse engine configuration")?;
        config.validate()?;
        Ok(config)
    }

    /// Serializes the configuration back to pretty RON.
    pub fn to_ron_string(&self) -> Result<String> {
        ron::ser::to_string_pretty(self, ron::ser::PrettyConfig::default())
            .context("Failed to serialize engine configuration")
    }

    /// Checks that every field is usable.
    pub fn validate(&self) -> Result<()> {
        self.scheduler
            .validate()
            .context("Invalid scheduler configuration")?;
        Ok(())
    }
}
