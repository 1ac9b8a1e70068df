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

//! Turning source text into runnable functions.

use crate::value::Function;
use cadence_core::LoadError;
use std::collections::HashMap;

/// Compiles or resolves script source into a [`Function`].
pub trait SourceLoader {
    /// Loads `source`, labelled `label` in diagnostics.
    fn load(&self, label: &str, source: &str) -> Result<Function, LoadError>;
}

/// A loader whose "source" is the name of a natively registered function.
///
/// Hosts use it to attach behaviours written in Rust to script identities.
#[derive(Default)]
pub struct FunctionRegistry {
    functions: HashMap<String, Function>,
}

impl FunctionRegistry {
    /// Creates an empty registry.
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `function` under its own name, replacing any previous entry.
    pub fn register(&mut self, function: Function) {
        self.functions.insert(function.name().to_owned(), function);
    }

    /// Builder form of [`register`](Self::register).
    pub fn with(mut self, function: Function) -> Self {
        self.register(function);
        self
    }
}

impl SourceLoader for FunctionRegistry {
    fn load(&self, label: &str, source: &str) -> Result<Function, LoadError> {
        let name = source.trim();
        self.functions
            .get(name)
            .cloned()
            .ok_or_else(|| LoadError::Compile {
                label: label.to_owned(),
                line: 1,
                message: format!("unknown native function `{name}`"),
            })
    }
}
