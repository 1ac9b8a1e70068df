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

//! Time sources used by the scheduler.
//!
//! Times are plain `f64` seconds. The scheduler compares wake times against the
//! `now` handed to `step`, and only consults a [`Clock`] to measure how much wall
//! time the resume loop has spent inside one step.

use std::cell::Cell;
use std::rc::Rc;
use std::time::Instant;

/// A source of monotonic time in seconds.
pub trait Clock {
    /// Returns the current time in seconds.
    fn now(&self) -> f64;
}

/// A wall clock measuring seconds since its creation.
#[derive(Debug, Clone, Copy)]
pub struct MonotonicClock {
    epoch: Instant,
}

impl MonotonicClock {
    /// Creates a clock whose zero is the moment of the call.
    pub fn new() -> Self {
        Self {
            epoch: Instant::now(),
        }
    }
}

impl Default for MonotonicClock {
    fn default() -> Self {
        Self::new()
    }
}

impl Clock for MonotonicClock {
    fn now(&self) -> f64 {
        self.epoch.elapsed().as_secs_f64()
    }
}

/// A clock that only moves when told to.
///
/// Clones share the same underlying time, so a host can keep one copy while the
/// scheduler owns another.
#[derive(Debug, Clone, Default)]
pub struct ManualClock {
    time: Rc<Cell<f64>>,
}

impl ManualClock {
    /// Creates a manual clock starting at `start` seconds.
    pub fn new(start: f64) -> Self {
        Self {
            time: Rc::new(Cell::new(start)),
        }
    }

    /// Sets the current time.
    pub fn set(&self, seconds: f64) {
        self.time.set(seconds);
    }

    /// Moves time forward by `seconds`.
    pub fn advance(&self, seconds: f64) {
        self.time.set(self.time.get() + seconds);
    }
}

impl Clock for ManualClock {
    fn now(&self) -> f64 {
        self.time.get()
    }
}
