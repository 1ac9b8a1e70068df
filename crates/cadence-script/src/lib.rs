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

//! # Cadence Script
//!
//! A deliberately small, line-oriented script language whose compiled programs
//! run as Cadence coroutines. Each line holds one statement; `--` starts a
//! comment.
//!
//! ```text
//! -- blink every half second, five times, then wait for a signal
//! repeat 5
//!   print "blink" $1
//!   wait 0.5
//! end
//! await Heartbeat
//! print "heartbeat dt" $1
//! ```
//!
//! Operands are numbers, quoted strings, `true`, `false`, `nil`, global names,
//! `$` (every value of the last resumption) and `$n` (the n-th such value).

#![warn(missing_docs)]

mod compiler;
pub mod error;
mod interpreter;
mod lexer;
pub mod loader;

pub use compiler::{compile, Program};
pub use error::CompileError;
pub use interpreter::{Interpreter, Output};
pub use loader::ScriptLoader;
