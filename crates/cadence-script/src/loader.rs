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

//! The [`SourceLoader`] for script-language sources.

use crate::compiler;
use crate::error::CompileError;
use crate::interpreter::{Interpreter, Output};
use cadence_core::LoadError;
use cadence_scheduler::{Function, SourceLoader};

/// Compiles script-language source into functions sharing one print [`Output`].
#[derive(Debug, Clone, Default)]
pub struct ScriptLoader {
    output: Output,
}

impl ScriptLoader {
    /// Creates a loader with a fresh output sink.
    pub fn new() -> Self {
        Self::default()
    }

    /// Creates a loader writing `print` lines into `output`.
    pub fn with_output(output: Output) -> Self {
        Self { output }
    }

    /// The sink every compiled function prints into.
    pub fn output(&self) -> Output {
        self.output.clone()
    }

    /// Compiles `source` without going through a scheduler.
    pub fn compile(&self, label: &str, source: &str) -> Result<Function, CompileError> {
        let program = compiler::compile(label, source)?;
        Ok(Interpreter::function(program, self.output.clone()))
    }
}

impl SourceLoader for ScriptLoader {
    fn load(&self, label: &str, source: &str) -> Result<Function, LoadError> {
        self.compile(label, source)
            .map_err(|err| err.into_load_error(label))
    }
}
