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

//! Signal errors.

use thiserror::Error;

/// Errors returned when registering a listener.
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SignalError {
    /// The callback is not a function.
    #[error("attempt to connect a {type_name} value, expected a function")]
    NotCallable {
        /// Type name of the rejected value.
        type_name: &'static str,
    },
    /// The signal was closed and accepts no new listeners.
    #[error("signal '{0}' is closed")]
    Closed(String),
}
