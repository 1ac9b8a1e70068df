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

//! # Cadence Signal
//!
//! Publish/subscribe on top of the Cadence scheduler.
//!
//! A [`Signal`] never runs code synchronously. [`Signal::fire`] turns every
//! connected listener into a task scheduled for the next step, and wakes every
//! unit blocked in [`Signal::wait`] on the next step too. Sequential listeners
//! keep one context for all their dispatches; parallel listeners, and sequential
//! ones whose context is still busy, get a fresh context per dispatch.

#![warn(missing_docs)]

pub mod connection;
pub mod error;
pub mod signal;

pub use connection::{Connection, ListenerId};
pub use error::SignalError;
pub use signal::Signal;
