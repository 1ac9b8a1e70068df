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

//! Compile-time diagnostics.

use cadence_core::LoadError;
use thiserror::Error;

/// A rejected script, with the 1-based line of the offending statement.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum CompileError {
    /// The first word of a line is not a statement.
    #[error("unknown statement `{word}`")]
    UnknownStatement {
        /// Line of the statement.
        line: usize,
        /// The unrecognised word.
        word: String,
    },
    /// A statement is missing a required operand.
    #[error("`{statement}` expects {expected}")]
    MissingOperand {
        /// Line of the statement.
        line: usize,
        /// The statement keyword.
        statement: &'static str,
        /// Description of what was expected.
        expected: &'static str,
    },
    /// A statement got more operands than it accepts.
    #[error("unexpected operand `{text}` after `{statement}`")]
    UnexpectedOperand {
        /// Line of the statement.
        line: usize,
        /// The statement keyword.
        statement: &'static str,
        /// The first extra token.
        text: String,
    },
    /// A token is neither a literal, an argument reference nor a name.
    #[error("malformed literal `{text}`")]
    MalformedLiteral {
        /// Line of the statement.
        line: usize,
        /// The offending token.
        text: String,
    },
    /// A string literal runs to the end of the line.
    #[error("unterminated string")]
    UnterminatedString {
        /// Line of the statement.
        line: usize,
    },
    /// An `end` closes nothing.
    #[error("`end` without a matching `repeat` or `loop`")]
    UnbalancedEnd {
        /// Line of the `end`.
        line: usize,
    },
    /// A block is still open at the end of the source.
    #[error("block opened here is never closed with `end`")]
    UnclosedBlock {
        /// Line of the opening statement.
        line: usize,
    },
    /// A `loop` body contains no `wait`, `yield` or `await`.
    #[error("`loop` body never yields")]
    LoopNeverYields {
        /// Line of the `loop`.
        line: usize,
    },
}

impl CompileError {
    /// The 1-based line the error refers to.
    pub fn line(&self) -> usize {
        match self {
            CompileError::UnknownStatement { line, .. }
            | CompileError::MissingOperand { line, .. }
            | CompileError::UnexpectedOperand { line, .. }
            | CompileError::MalformedLiteral { line, .. }
            | CompileError::UnterminatedString { line }
            | CompileError::UnbalancedEnd { line }
            | CompileError::UnclosedBlock { line }
            | CompileError::LoopNeverYields { line } => *line,
        }
    }

    /// Converts into the loader error reported to the scheduler.
    pub fn into_load_error(self, label: &str) -> LoadError {
        LoadError::Compile {
            label: label.to_owned(),
            line: self.line(),
            message: self.to_string(),
        }
    }
}
