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

//! The signal primitive.
//!
//! Listeners live in a vector that only grows; a dense `active` list of their
//! indices drives dispatch, and each listener remembers its position in that list
//! so disconnecting is a swap-remove. Firing never runs anything: it prepares a
//! context per listener and schedules it for the next step, then hands every
//! recorded waiter its arguments and wakes it on the next step too.

use crate::connection::{Connection, ListenerId};
use crate::error::SignalError;
use cadence_core::{ContextHandle, Retain};
use cadence_scheduler::{Function, Outcome, ReleaseQueue, ResumeCx, Scheduler, UnitKey, Value};
use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;
use std::rc::Rc;

struct Listener {
    id: ListenerId,
    callback: Option<Function>,
    once: bool,
    parallel: bool,
    connected: bool,
    active_pos: Option<usize>,
    /// Context reused across dispatches; only for sequential listeners.
    reusable: Option<(ContextHandle, Retain)>,
}

pub(crate) struct SignalState {
    name: String,
    listeners: Vec<Listener>,
    id_to_index: HashMap<ListenerId, usize>,
    active: Vec<usize>,
    snapshot: Vec<usize>,
    waiters: Vec<UnitKey>,
    next_id: u64,
    closed: bool,
    releases: ReleaseQueue,
}

impl SignalState {
    pub(crate) fn is_connected(&self, id: ListenerId) -> bool {
        self.id_to_index
            .get(&id)
            .and_then(|&index| self.listeners.get(index))
            .map(|listener| listener.connected)
            .unwrap_or(false)
    }

    pub(crate) fn disconnect(&mut self, id: ListenerId) {
        let Some(index) = self.id_to_index.remove(&id) else {
            return;
        };
        let Some(listener) = self.listeners.get_mut(index) else {
            return;
        };
        if !listener.connected {
            return;
        }
        listener.connected = false;
        listener.callback = None;
        if let Some((_, retain)) = listener.reusable.take() {
            self.releases.push(retain);
        }

        if let Some(pos) = listener.active_pos.take() {
            self.active.swap_remove(pos);
            if let Some(&moved) = self.active.get(pos) {
                self.listeners[moved].active_pos = Some(pos);
            }
        }
    }

    fn close(&mut self) {
        if self.closed {
            return;
        }
        self.closed = true;
        for listener in &mut self.listeners {
            if let Some((_, retain)) = listener.reusable.take() {
                self.releases.push(retain);
            }
        }
        self.listeners.clear();
        self.id_to_index.clear();
        self.active.clear();
        self.snapshot.clear();
        log::info!(
            "Signal '{}': closed with {} waiters left suspended",
            self.name,
            self.waiters.len()
        );
    }
}

impl Drop for SignalState {
    fn drop(&mut self) {
        for listener in &mut self.listeners {
            if let Some((_, retain)) = listener.reusable.take() {
                self.releases.push(retain);
            }
        }
    }
}

/// A publish/subscribe signal whose effects are always deferred to the next step.
///
/// Cloning a `Signal` yields another handle to the same listeners and waiters.
#[derive(Clone)]
pub struct Signal {
    inner: Rc<RefCell<SignalState>>,
}

impl Signal {
    /// Creates an open signal bound to `scheduler`'s release queue.
    pub fn new(name: &str, scheduler: &Scheduler) -> Self {
        Self {
            inner: Rc::new(RefCell::new(SignalState {
                name: name.to_owned(),
                listeners: Vec::new(),
                id_to_index: HashMap::new(),
                active: Vec::new(),
                snapshot: Vec::new(),
                waiters: Vec::new(),
                next_id: 1,
                closed: false,
                releases: scheduler.release_queue(),
            })),
        }
    }

    /// The diagnostic name of the signal.
    pub fn name(&self) -> String {
        self.inner.borrow().name.clone()
    }

    /// Connects a sequential listener that receives every fire.
    pub fn connect(
        &self,
        scheduler: &mut Scheduler,
        callback: impl Into<Value>,
    ) -> Result<Connection, SignalError> {
        self.connect_with(scheduler, callback.into(), false, false)
    }

    /// Connects a listener that disconnects itself after its first dispatch.
    pub fn once(
        &self,
        scheduler: &mut Scheduler,
        callback: impl Into<Value>,
    ) -> Result<Connection, SignalError> {
        self.connect_with(scheduler, callback.into(), true, false)
    }

    /// Connects a listener that always runs each dispatch in a fresh context.
    pub fn connect_parallel(
        &self,
        scheduler: &mut Scheduler,
        callback: impl Into<Value>,
    ) -> Result<Connection, SignalError> {
        self.connect_with(scheduler, callback.into(), false, true)
    }

    /// Connects `callback` with explicit `once` and `parallel` flags.
    ///
    /// Sequential (`parallel == false`) listeners get a context up front that is
    /// reused by every dispatch finding it idle.
    pub fn connect_with(
        &self,
        scheduler: &mut Scheduler,
        callback: Value,
        once: bool,
        parallel: bool,
    ) -> Result<Connection, SignalError> {
        let Value::Function(function) = callback else {
            return Err(SignalError::NotCallable {
                type_name: callback.type_name(),
            });
        };

        let mut state = self.inner.borrow_mut();
        if state.closed {
            return Err(SignalError::Closed(state.name.clone()));
        }

        let id = ListenerId(state.next_id);
        state.next_id += 1;
        let reusable = (!parallel).then(|| {
            scheduler.create_context(&format!("{}:{}", state.name, function.name()))
        });

        let index = state.listeners.len();
        let active_pos = state.active.len();
        state.listeners.push(Listener {
            id,
            callback: Some(function),
            once,
            parallel,
            connected: true,
            active_pos: Some(active_pos),
            reusable,
        });
        state.id_to_index.insert(id, index);
        state.active.push(index);

        Ok(Connection::new(Rc::downgrade(&self.inner), id))
    }

    /// Disconnects a listener. Unknown or already disconnected ids are ignored.
    pub fn disconnect(&self, id: ListenerId) {
        self.inner.borrow_mut().disconnect(id);
    }

    /// Returns `true` while `id` is connected.
    pub fn is_connected(&self, id: ListenerId) -> bool {
        self.inner.borrow().is_connected(id)
    }

    /// Suspends the running unit until the next fire.
    ///
    /// The body must return the result. On a closed signal the caller is parked
    /// without being recorded, so it is never resumed.
    pub fn wait(&self, cx: &mut ResumeCx<'_>) -> Outcome {
        cx.wait_event();
        let mut state = self.inner.borrow_mut();
        if !state.closed {
            state.waiters.push(cx.caller());
        }
        Outcome::Yield
    }

    /// Delivers `args` to every listener and waiter on the next step.
    ///
    /// Listeners connected from now on, and waits recorded from now on, are not
    /// part of this fire.
    pub fn fire(&self, scheduler: &mut Scheduler, args: &[Value]) {
        let mut guard = self.inner.borrow_mut();
        let state = &mut *guard;
        if state.closed {
            return;
        }

        let mut snapshot = std::mem::take(&mut state.snapshot);
        snapshot.clear();
        snapshot.extend_from_slice(&state.active);
        for &index in &snapshot {
            let Some(listener) = state.listeners.get(index) else {
                continue;
            };
            if !listener.connected {
                continue;
            }
            let Some(callback) = listener.callback.clone() else {
                continue;
            };
            let (id, once) = (listener.id, listener.once);
            let reusable = listener
                .reusable
                .as_ref()
                .map(|(handle, _)| *handle)
                .filter(|handle| !listener.parallel && !scheduler.is_task_active(*handle));

            let dispatched = match reusable {
                Some(handle) if prepare(scheduler, handle, &callback, args) => {
                    scheduler.schedule_task_next_frame(handle, None, args.len());
                    true
                }
                _ => dispatch_ephemeral(scheduler, &state.name, &callback, args),
            };
            if !dispatched {
                log::warn!(
                    "Signal '{}': could not dispatch {id}, {} arguments do not fit",
                    state.name,
                    args.len()
                );
                continue;
            }
            if once {
                state.disconnect(id);
            }
        }
        state.snapshot = snapshot;

        let waiters = std::mem::take(&mut state.waiters);
        for waiter in waiters {
            let handle = match waiter {
                UnitKey::Script(id) => scheduler.script_context(id),
                UnitKey::Task(handle) => Some(handle),
            };
            let Some(handle) = handle else {
                continue;
            };
            let fits = scheduler
                .context(handle)
                .map(|context| context.check_stack(args.len()))
                .unwrap_or(true);
            if !fits {
                log::warn!("Signal '{}': stack of {waiter} is full, not waking it", state.name);
                continue;
            }
            scheduler.wake_next_frame(waiter, args);
        }
    }

    /// Closes the signal, releasing every listener. Idempotent.
    ///
    /// Outstanding waiters are not resumed.
    pub fn close(&self) {
        self.inner.borrow_mut().close();
    }

    /// Returns `true` once closed.
    pub fn is_closed(&self) -> bool {
        self.inner.borrow().closed
    }

    /// Number of connected listeners.
    pub fn listener_count(&self) -> usize {
        self.inner.borrow().active.len()
    }

    /// Number of units waiting for the next fire.
    pub fn waiter_count(&self) -> usize {
        self.inner.borrow().waiters.len()
    }

    /// Wraps the signal in a userdata value so scripts can hold it.
    pub fn to_value(&self) -> Value {
        Value::Userdata(Rc::new(self.clone()))
    }

    /// Extracts a signal from a userdata value.
    pub fn from_value(value: &Value) -> Option<Signal> {
        value.downcast_ref::<Signal>().cloned()
    }

    /// Returns `true` if both handles refer to the same signal.
    pub fn ptr_eq(&self, other: &Signal) -> bool {
        Rc::ptr_eq(&self.inner, &other.inner)
    }
}

impl fmt::Debug for Signal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let state = self.inner.borrow();
        f.debug_struct("Signal")
            .field("name", &state.name)
            .field("listeners", &state.active.len())
            .field("waiters", &state.waiters.len())
            .field("closed", &state.closed)
            .finish()
    }
}

/// Loads `callback(args...)` into an idle context. Returns `false` if it does not fit.
fn prepare(
    scheduler: &mut Scheduler,
    handle: ContextHandle,
    callback: &Function,
    args: &[Value],
) -> bool {
    match scheduler.context_mut(handle) {
        Some(context) if context.check_stack(1 + args.len()) => {
            context.push_function(callback.clone());
            context.push_all(args);
            true
        }
        _ => false,
    }
}

fn dispatch_ephemeral(
    scheduler: &mut Scheduler,
    signal: &str,
    callback: &Function,
    args: &[Value],
) -> bool {
    let (handle, retain) = scheduler.create_context(&format!("{signal}:{}", callback.name()));
    if !prepare(scheduler, handle, callback, args) {
        scheduler.release_context(retain);
        return false;
    }
    scheduler.schedule_task_next_frame(handle, Some(retain), args.len());
    true
}
