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

//! Execution contexts and the coroutine contract.
//!
//! An [`ExecutionContext`] is the resumable unit the scheduler drives. It owns a
//! value stack used to pass arguments in and results out, a global environment,
//! and (once started) the suspended body of the function it runs.
//!
//! Resuming a context with `n` arguments takes the top `n` stack values as the
//! arguments. A context that has not started yet pops the function sitting just
//! beneath them and starts it; that is how tasks, listener dispatches and scripts
//! all enter their code.

use crate::scheduler::Scheduler;
use crate::unit::UnitKey;
use crate::value::{Function, Value};
use cadence_core::{ContextHandle, ScriptError, ScriptId};
use std::cell::RefCell;
use std::collections::HashMap;
use std::rc::Rc;

/// Maximum number of values a context stack may hold.
pub const MAX_STACK_SLOTS: usize = 8000;

/// What a coroutine body reports back after one resumption.
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// The body ran to completion with these results.
    Return(Vec<Value>),
    /// The body suspended. Any park primitive it called decides when it resumes;
    /// without one it resumes on the next tick.
    Yield,
    /// The body failed. The unit is terminal afterwards.
    Error(ScriptError),
}

/// A resumable body of script logic.
///
/// Each call to `resume` runs until the body returns, fails, or yields. State that
/// must survive a yield lives in the implementor.
pub trait Coroutine {
    /// Runs the body until its next suspension point.
    fn resume(&mut self, cx: &mut ResumeCx<'_>, args: Vec<Value>) -> Outcome;
}

impl<F> Coroutine for F
where
    F: FnMut(&mut ResumeCx<'_>, Vec<Value>) -> Outcome,
{
    fn resume(&mut self, cx: &mut ResumeCx<'_>, args: Vec<Value>) -> Outcome {
        self(cx, args)
    }
}

/// A table of global variables with an optional parent for lookups.
///
/// Every script context gets its own child of the scheduler's root environment,
/// so per-script bindings never leak into other scripts while host globals stay
/// visible to all of them.
#[derive(Default)]
pub struct Environment {
    vars: RefCell<HashMap<String, Value>>,
    parent: Option<Rc<Environment>>,
}

impl Environment {
    /// Creates a root environment.
    pub fn root() -> Rc<Self> {
        Rc::new(Self::default())
    }

    /// Creates an environment that falls back to `parent` for unknown names.
    pub fn child(parent: &Rc<Environment>) -> Rc<Self> {
        Rc::new(Self {
            vars: RefCell::new(HashMap::new()),
            parent: Some(Rc::clone(parent)),
        })
    }

    /// Looks a name up here, then in the parents.
    pub fn get(&self, name: &str) -> Option<Value> {
        if let Some(value) = self.vars.borrow().get(name) {
            return Some(value.clone());
        }
        self.parent.as_ref().and_then(|parent| parent.get(name))
    }

    /// Binds a name in this environment. Parents are never written.
    pub fn set(&self, name: impl Into<String>, value: Value) {
        self.vars.borrow_mut().insert(name.into(), value);
    }
}

/// A resumable execution context.
pub struct ExecutionContext {
    label: String,
    owner: Option<ScriptId>,
    stack: Vec<Value>,
    body: Option<Box<dyn Coroutine>>,
    env: Rc<Environment>,
}

impl ExecutionContext {
    /// Creates an idle context running in `env`.
    pub fn new(label: impl Into<String>, env: Rc<Environment>) -> Self {
        Self {
            label: label.into(),
            owner: None,
            stack: Vec::new(),
            body: None,
            env,
        }
    }

    /// Creates the context of a persistent script.
    pub fn for_script(label: impl Into<String>, owner: ScriptId, env: Rc<Environment>) -> Self {
        Self {
            owner: Some(owner),
            ..Self::new(label, env)
        }
    }

    /// The diagnostic label of the context.
    pub fn label(&self) -> &str {
        &self.label
    }

    /// The script owning this context, if it is a script context.
    pub fn owner(&self) -> Option<ScriptId> {
        self.owner
    }

    /// The global environment of the context.
    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    /// Binds a global visible only to code running in this context's environment.
    pub fn set_global(&self, name: impl Into<String>, value: Value) {
        self.env.set(name, value);
    }

    /// Looks up a global.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.get(name)
    }

    /// Returns `true` if `extra` more values fit on the stack.
    pub fn check_stack(&self, extra: usize) -> bool {
        self.stack.len() + extra <= MAX_STACK_SLOTS
    }

    /// Pushes a value on the stack.
    pub fn push(&mut self, value: Value) {
        self.stack.push(value);
    }

    /// Pushes the function this context should start on its next resume.
    pub fn push_function(&mut self, function: Function) {
        self.stack.push(Value::Function(function));
    }

    /// Pushes every value of `values`, in order.
    pub fn push_all(&mut self, values: &[Value]) {
        self.stack.extend_from_slice(values);
    }

    /// Removes the top `count` values.
    pub fn pop_n(&mut self, count: usize) {
        let keep = self.stack.len().saturating_sub(count);
        self.stack.truncate(keep);
    }

    /// The current stack, bottom first.
    pub fn stack(&self) -> &[Value] {
        &self.stack
    }

    /// Empties the stack.
    pub fn clear_stack(&mut self) {
        self.stack.clear();
    }

    /// Returns `true` while a body is suspended inside this context.
    pub fn is_started(&self) -> bool {
        self.body.is_some()
    }

    /// Resumes the context with the top `nargs` stack values as arguments.
    pub(crate) fn resume(
        &mut self,
        scheduler: &mut Scheduler,
        caller: UnitKey,
        handle: ContextHandle,
        nargs: usize,
    ) -> Outcome {
        let split = self.stack.len().saturating_sub(nargs);
        let args = self.stack.split_off(split);

        let mut body = match self.body.take() {
            Some(body) => body,
            None => match self.stack.pop() {
                Some(Value::Function(function)) => function.instantiate(),
                Some(other) => {
                    return Outcome::Error(ScriptError::NotCallable {
                        type_name: other.type_name(),
                    })
                }
                None => return Outcome::Error(ScriptError::runtime("cannot resume dead coroutine")),
            },
        };

        let mut cx = ResumeCx {
            scheduler,
            caller,
            handle,
            env: Rc::clone(&self.env),
        };
        let outcome = body.resume(&mut cx, args);
        match &outcome {
            Outcome::Yield => self.body = Some(body),
            Outcome::Return(values) => self.stack.extend(values.iter().cloned()),
            Outcome::Error(_) => {}
        }
        outcome
    }
}

/// The view a running coroutine body has of the world.
pub struct ResumeCx<'a> {
    scheduler: &'a mut Scheduler,
    caller: UnitKey,
    handle: ContextHandle,
    env: Rc<Environment>,
}

impl<'a> ResumeCx<'a> {
    /// The scheduler driving this resumption.
    pub fn scheduler(&mut self) -> &mut Scheduler {
        &mut *self.scheduler
    }

    /// The unit being resumed.
    pub fn caller(&self) -> UnitKey {
        self.caller
    }

    /// The context being resumed.
    pub fn handle(&self) -> ContextHandle {
        self.handle
    }

    /// The `now` of the step performing this resumption.
    pub fn now(&self) -> f64 {
        self.scheduler.current_time()
    }

    /// The environment of the running context.
    pub fn env(&self) -> &Rc<Environment> {
        &self.env
    }

    /// Looks up a global.
    pub fn global(&self, name: &str) -> Option<Value> {
        self.env.get(name)
    }

    /// Binds a global in the running context's environment.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.env.set(name, value);
    }

    /// Parks the caller for `seconds`, or until the next tick when `seconds <= 0`.
    ///
    /// The body must yield afterwards for the park to take effect.
    pub fn wait(&mut self, seconds: f64) {
        if seconds > 0.0 {
            let wake_time = self.now() + seconds;
            self.wait_until(wake_time);
        } else {
            self.wait_next_frame();
        }
    }

    /// Parks the caller until the absolute time `wake_time`.
    pub fn wait_until(&mut self, wake_time: f64) {
        self.scheduler.wait_until(self.caller, wake_time);
    }

    /// Parks the caller until the next tick.
    pub fn wait_next_frame(&mut self) {
        self.scheduler.wait_next_frame(self.caller);
    }

    /// Parks the caller until something explicitly wakes it.
    pub fn wait_event(&mut self) {
        self.scheduler.wait_event(self.caller);
    }

    /// Starts `function` in a new task on the next tick.
    pub fn spawn(&mut self, function: Function, args: Vec<Value>) -> ContextHandle {
        self.scheduler.spawn_task_next_frame(function, args)
    }

    /// Starts `function` in a new task `seconds` from now (never in the past).
    pub fn delay(&mut self, seconds: f64, function: Function, args: Vec<Value>) -> ContextHandle {
        let wake_time = self.now() + seconds.max(0.0);
        self.scheduler.spawn_task_at(wake_time, function, args)
    }
}
