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

//! Error contracts shared across the Cadence crates.

use std::fmt;

/// A failure raised while a unit of script logic was running.
///
/// Runtime errors are contained at the unit boundary: the scheduler logs them and
/// moves the failing unit to its terminal error state.
#[derive(Debug, Clone, PartialEq)]
pub enum ScriptError {
    /// The script raised an error with the given message.
    Runtime(String),
    /// A value that is not a function was used where one was required.
    NotCallable {
        /// The type name of the offending value.
        type_name: &'static str,
    },
    /// A function called synchronously tried to suspend.
    YieldAcrossBoundary,
}

impl fmt::Display for ScriptError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ScriptError::Runtime(message) => write!(f, "{message}"),
            ScriptError::NotCallable { type_name } => {
                write!(f, "attempt to call a {type_name} value")
            }
            ScriptError::YieldAcrossBoundary => {
                write!(f, "attempt to yield across a native call boundary")
            }
        }
    }
}

impl std::error::Error for ScriptError {}

impl ScriptError {
    /// Convenience constructor for a runtime error with a message.
    pub fn runtime(message: impl Into<String>) -> Self {
        ScriptError::Runtime(message.into())
    }
}

/// Failure to turn source text into a runnable function.
#[derive(Debug)]
pub enum LoadError {
    /// The source did not compile.
    Compile {
        /// Human-readable label of the chunk (usually the script name).
        label: String,
        /// 1-based line of the offending statement.
        line: usize,
        /// What went wrong.
        message: String,
    },
    /// The chunk compiled but could not be loaded into a context.
    Load(Box<dyn std::error::Error + Send + Sync>),
}

impl fmt::Display for LoadError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            LoadError::Compile {
                label,
                line,
                message,
            } => write!(f, "{label}:{line}: {message}"),
            LoadError::Load(e) => write!(f, "Load failed: {e}"),
        }
    }
}

impl std::error::Error for LoadError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            LoadError::Load(e) => Some(e.as_ref()),
            _ => None,
        }
    }
}

/// Failure to read a configuration document.
#[derive(Debug)]
pub enum ConfigError {
    /// The document is not valid RON for the expected structure.
    Parse(ron::error::SpannedError),
    /// A field holds a value outside its accepted range.
    Invalid {
        /// Name of the field.
        field: &'static str,
        /// Why the value was rejected.
        reason: String,
    },
}

impl fmt::Display for ConfigError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConfigError::Parse(e) => write!(f, "Invalid configuration: {e}"),
            ConfigError::Invalid { field, reason } => {
                write!(f, "Invalid value for `{field}`: {reason}")
            }
        }
    }
}

impl std::error::Error for ConfigError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ConfigError::Parse(e) => Some(e),
            _ => None,
        }
    }
}

impl From<ron::error::SpannedError> for ConfigError {
    fn from(e: ron::error::SpannedError) -> Self {
        ConfigError::Parse(e)
    }
}
