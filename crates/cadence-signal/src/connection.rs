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

//! Handles returned by `connect`.

use crate::signal::SignalState;
use std::cell::RefCell;
use std::fmt;
use std::rc::Weak;

/// The stable id of a listener within its signal. Ids are never reused.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ListenerId(pub u64);

impl fmt::Display for ListenerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "listener#{}", self.0)
    }
}

/// A weak link to a listener.
///
/// Holding or dropping a connection never affects the listener's lifetime; it
/// only allows querying and disconnecting it. Once the signal is gone every
/// operation is a no-op.
#[derive(Clone)]
pub struct Connection {
    signal: Weak<RefCell<SignalState>>,
    id: ListenerId,
}

impl Connection {
    pub(crate) fn new(signal: Weak<RefCell<SignalState>>, id: ListenerId) -> Self {
        Self { signal, id }
    }

    /// The listener id.
    pub fn id(&self) -> ListenerId {
        self.id
    }

    /// Returns `true` while the listener is registered on a live signal.
    pub fn is_connected(&self) -> bool {
        self.signal
            .upgrade()
            .map(|state| state.borrow().is_connected(self.id))
            .unwrap_or(false)
    }

    /// Disconnects the listener. Idempotent.
    pub fn disconnect(&self) {
        if let Some(state) = self.signal.upgrade() {
            state.borrow_mut().disconnect(self.id);
        }
    }
}

impl fmt::Debug for Connection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Connection")
            .field("id", &self.id)
            .field("connected", &self.is_connected())
            .finish()
    }
}
