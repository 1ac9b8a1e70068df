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

//! The cooperative scheduler.
//!
//! Two unit universes are driven side by side: persistent scripts keyed by a
//! host-chosen [`ScriptId`], and anonymous tasks keyed by the [`ContextHandle`]
//! of the context they run in. Nothing is ever resumed outside of
//! [`Scheduler::step`]; every other entry point only parks, wakes or enqueues.

use crate::context::{Environment, ExecutionContext, Outcome};
use crate::loader::SourceLoader;
use crate::report::StepReport;
use crate::unit::{Lane, Unit, UnitKey};
use crate::value::{Function, Value};
use cadence_core::{
    Arena, Clock, ContextHandle, LoadError, MonotonicClock, Retain, SchedulerConfig, ScriptId,
    UnitStatus,
};
use std::cell::RefCell;
use std::fmt;
use std::hash::Hash;
use std::rc::Rc;

/// A shared inbox of ownership tokens waiting to be released.
///
/// Objects that can give a context back without holding the scheduler (a signal
/// being disconnected through a connection handle, or dropped) push their tokens
/// here. The maintenance pass at the start of each step releases them.
#[derive(Clone, Default)]
pub struct ReleaseQueue {
    inner: Rc<RefCell<Vec<Retain>>>,
}

impl ReleaseQueue {
    /// Hands a token over for release on the next step.
    pub fn push(&self, token: Retain) {
        self.inner.borrow_mut().push(token);
    }

    /// Number of tokens waiting.
    pub fn len(&self) -> usize {
        self.inner.borrow().len()
    }

    /// Returns `true` if nothing is waiting.
    pub fn is_empty(&self) -> bool {
        self.inner.borrow().is_empty()
    }

    fn drain(&self) -> Vec<Retain> {
        std::mem::take(&mut *self.inner.borrow_mut())
    }
}

/// Routes generic scheduler code to the script or task lane.
trait LaneAccess: Copy + Eq + Hash + fmt::Display {
    const KIND: &'static str;
    /// Scripts stay in their table after finishing; tasks are erased.
    const PERSISTENT: bool;

    fn lane(scheduler: &mut Scheduler) -> &mut Lane<Self>;
    fn unit_key(self) -> UnitKey;
}

impl LaneAccess for ScriptId {
    const KIND: &'static str = "script";
    const PERSISTENT: bool = true;

    fn lane(scheduler: &mut Scheduler) -> &mut Lane<Self> {
        &mut scheduler.scripts
    }

    fn unit_key(self) -> UnitKey {
        UnitKey::Script(self)
    }
}

impl LaneAccess for ContextHandle {
    const KIND: &'static str = "task";
    const PERSISTENT: bool = false;

    fn lane(scheduler: &mut Scheduler) -> &mut Lane<Self> {
        &mut scheduler.tasks
    }

    fn unit_key(self) -> UnitKey {
        UnitKey::Task(self)
    }
}

/// Per-step resume budget shared by both lanes.
struct Budget {
    resumes: u32,
    max_resumes: u32,
    started: f64,
    elapsed: f64,
    limit: f64,
    sample_interval: u32,
}

impl Budget {
    fn new(config: &SchedulerConfig, started: f64) -> Self {
        Self {
            resumes: 0,
            max_resumes: config.max_resumes_per_tick,
            started,
            elapsed: 0.0,
            limit: if config.max_time_budget_seconds > 0.0 {
                config.max_time_budget_seconds
            } else {
                f64::INFINITY
            },
            sample_interval: config.budget_sample_interval.max(1),
        }
    }

    fn allows(&self) -> bool {
        self.resumes < self.max_resumes && self.elapsed < self.limit
    }

    fn record(&mut self, clock: &dyn Clock) {
        self.resumes += 1;
        if self.resumes % self.sample_interval == 0 {
            self.elapsed = clock.now() - self.started;
        }
    }
}

/// The cooperative scheduler.
pub struct Scheduler {
    config: SchedulerConfig,
    clock: Box<dyn Clock>,
    loader: Box<dyn SourceLoader>,
    contexts: Arena<ExecutionContext>,
    globals: Rc<Environment>,
    scripts: Lane<ScriptId>,
    tasks: Lane<ContextHandle>,
    frame_index: u64,
    current_time: f64,
    releases: ReleaseQueue,
    /// Arguments for contexts that were checked out when they were woken.
    deferred_pushes: Vec<(ContextHandle, Vec<Value>)>,
}

impl Scheduler {
    /// Creates a scheduler loading script sources with `loader`.
    pub fn new(config: SchedulerConfig, loader: Box<dyn SourceLoader>) -> Self {
        log::info!(
            "Scheduler: initializing (max {} resumes, {:.1} ms per tick)",
            config.max_resumes_per_tick,
            config.max_time_budget_seconds * 1000.0
        );
        Self {
            config,
            clock: Box::new(MonotonicClock::new()),
            loader,
            contexts: Arena::new(),
            globals: Environment::root(),
            scripts: Lane::new(),
            tasks: Lane::new(),
            frame_index: 0,
            current_time: 0.0,
            releases: ReleaseQueue::default(),
            deferred_pushes: Vec::new(),
        }
    }

    /// Replaces the wall clock used to measure the time budget.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.set_clock(clock);
        self
    }

    /// In-place form of [`with_clock`](Self::with_clock).
    pub fn set_clock(&mut self, clock: impl Clock + 'static) {
        self.clock = Box::new(clock);
    }

    // --- Configuration ---

    /// The active tunables.
    pub fn config(&self) -> &SchedulerConfig {
        &self.config
    }

    /// Sets the maximum number of resumptions per step.
    pub fn set_max_resumes_per_tick(&mut self, max: u32) {
        self.config.max_resumes_per_tick = max;
    }

    /// The maximum number of resumptions per step.
    pub fn max_resumes_per_tick(&self) -> u32 {
        self.config.max_resumes_per_tick
    }

    /// Sets the wall-clock budget per step. Zero or less disables it.
    pub fn set_max_time_budget_seconds(&mut self, seconds: f64) {
        self.config.max_time_budget_seconds = seconds;
    }

    /// The wall-clock budget per step, in seconds.
    pub fn max_time_budget_seconds(&self) -> f64 {
        self.config.max_time_budget_seconds
    }

    /// Number of steps performed so far.
    pub fn frame_index(&self) -> u64 {
        self.frame_index
    }

    /// The `now` passed to the latest step.
    pub fn current_time(&self) -> f64 {
        self.current_time
    }

    /// The root environment every context falls back to.
    pub fn globals(&self) -> &Rc<Environment> {
        &self.globals
    }

    /// Binds a global visible to every context.
    pub fn set_global(&mut self, name: impl Into<String>, value: Value) {
        self.globals.set(name, value);
    }

    // --- Persistent scripts ---

    /// Loads `source` and registers it as the script `id`.
    ///
    /// `binder` runs once against the fresh context before its first resume. On
    /// a load failure nothing is registered and the error is returned. An `id`
    /// that is already registered is stopped and replaced.
    pub fn register_script<B>(
        &mut self,
        id: ScriptId,
        label: &str,
        source: &str,
        binder: B,
    ) -> Result<(), LoadError>
    where
        B: FnOnce(&mut ExecutionContext),
    {
        let function = match self.loader.load(label, source) {
            Ok(function) => function,
            Err(e) => {
                log::error!("Scheduler: failed to load '{label}': {e}");
                return Err(e);
            }
        };

        if self.scripts.units.contains_key(&id) {
            log::warn!("Scheduler: {id} is already registered, replacing it");
            self.stop_script(id);
        }

        let mut context =
            ExecutionContext::for_script(label, id, Environment::child(&self.globals));
        context.push_function(function);
        binder(&mut context);

        let (handle, retain) = self.contexts.insert(context);
        self.scripts
            .units
            .insert(id, Unit::new(handle, Some(retain), self.current_time));
        self.scripts.enqueue_ready(id);
        log::info!("Scheduler: registered '{label}' as {id} on {handle}");
        Ok(())
    }

    /// Stops a script for good. Returns `false` if `id` was not registered.
    ///
    /// Safe to call from inside the script's own resume.
    pub fn stop_script(&mut self, id: ScriptId) -> bool {
        match self.scripts.remove(id) {
            Some(unit) => {
                if let Some(retain) = unit.retain {
                    self.release_context(retain);
                }
                log::info!("Scheduler: stopped {id}");
                true
            }
            None => false,
        }
    }

    /// The status of a script, if registered.
    pub fn script_status(&self, id: ScriptId) -> Option<UnitStatus> {
        self.scripts.units.get(&id).map(|unit| unit.status)
    }

    /// The context a script runs in.
    pub fn script_context(&self, id: ScriptId) -> Option<ContextHandle> {
        self.scripts.units.get(&id).map(|unit| unit.context)
    }

    /// Number of registered scripts, finished ones included.
    pub fn script_count(&self) -> usize {
        self.scripts.units.len()
    }

    /// Parks a script until explicitly woken.
    ///
    /// Like every park primitive, this only records the wait condition; the unit
    /// is queued accordingly when it yields.
    pub fn set_wait_event(&mut self, id: ScriptId) {
        self.wait_event(UnitKey::Script(id));
    }

    /// Parks a script until the absolute time `wake_time`.
    pub fn set_wait_abs(&mut self, id: ScriptId, wake_time: f64) {
        self.wait_until(UnitKey::Script(id), wake_time);
    }

    /// Parks a script until the next step.
    pub fn set_wait_next_frame(&mut self, id: ScriptId) {
        self.wait_next_frame(UnitKey::Script(id));
    }

    /// Wakes a script on the next step with the top `argc` values of its stack.
    pub fn resume_next_frame(&mut self, id: ScriptId, argc: usize) -> bool {
        self.wake(UnitKey::Script(id), argc)
    }

    // --- Tasks ---

    /// Creates an idle context owned by the caller through the returned token.
    pub fn create_context(&mut self, label: &str) -> (ContextHandle, Retain) {
        self.contexts
            .insert(ExecutionContext::new(label, Rc::clone(&self.globals)))
    }

    /// Gives a context back.
    ///
    /// A context that is still scheduled as a task without its own token is
    /// adopted by that task and released when the task finishes.
    pub fn release_context(&mut self, retain: Retain) {
        let handle = retain.handle();
        if let Some(unit) = self.tasks.units.get_mut(&handle) {
            if unit.retain.is_none() {
                unit.retain = Some(retain);
                return;
            }
        }
        let _ = self.contexts.release(retain);
        self.deferred_pushes.retain(|(h, _)| *h != handle);
    }

    /// Returns a context, unless it is released or currently running.
    pub fn context(&self, handle: ContextHandle) -> Option<&ExecutionContext> {
        self.contexts.get(handle)
    }

    /// Mutable form of [`context`](Self::context).
    pub fn context_mut(&mut self, handle: ContextHandle) -> Option<&mut ExecutionContext> {
        self.contexts.get_mut(handle)
    }

    /// Returns `true` while the context is owned, even if currently running.
    pub fn is_context_live(&self, handle: ContextHandle) -> bool {
        self.contexts.is_live(handle)
    }

    /// Number of live contexts.
    pub fn context_count(&self) -> usize {
        self.contexts.len()
    }

    /// Returns `true` if `handle` is scheduled as a task.
    pub fn is_task_active(&self, handle: ContextHandle) -> bool {
        self.tasks.units.contains_key(&handle)
    }

    /// The status of a task, if active.
    pub fn task_status(&self, handle: ContextHandle) -> Option<UnitStatus> {
        self.tasks.units.get(&handle).map(|unit| unit.status)
    }

    /// Number of active tasks.
    pub fn task_count(&self) -> usize {
        self.tasks.units.len()
    }

    /// Schedules a context prepared by the caller to start on the next step.
    ///
    /// The context must hold a function followed by `argc` arguments. With a
    /// token the task owns the context and releases it when it finishes; without
    /// one the context is reusable and only has its stack cleared.
    pub fn schedule_task_next_frame(
        &mut self,
        handle: ContextHandle,
        retain: Option<Retain>,
        argc: usize,
    ) {
        let mut unit = Unit::new(handle, retain, self.current_time);
        unit.park_next_frame();
        unit.pending_argc = argc;
        if self.insert_task(handle, unit) {
            self.tasks.enqueue_next_frame(handle);
        }
    }

    /// Like [`schedule_task_next_frame`](Self::schedule_task_next_frame), but
    /// starts the task at the absolute time `wake_time`.
    pub fn schedule_task_at(
        &mut self,
        handle: ContextHandle,
        retain: Option<Retain>,
        wake_time: f64,
        argc: usize,
    ) {
        let mut unit = Unit::new(handle, retain, self.current_time);
        unit.park_until(wake_time);
        unit.pending_argc = argc;
        if self.insert_task(handle, unit) {
            self.tasks.enqueue_timer(handle);
        }
    }

    /// Runs `function(args...)` in a new context on the next step.
    pub fn spawn_task_next_frame(&mut self, function: Function, args: Vec<Value>) -> ContextHandle {
        let (handle, retain) = self.prepare_task(function, &args);
        self.schedule_task_next_frame(handle, Some(retain), args.len());
        handle
    }

    /// Runs `function(args...)` in a new context at the absolute time `wake_time`.
    pub fn spawn_task_at(
        &mut self,
        wake_time: f64,
        function: Function,
        args: Vec<Value>,
    ) -> ContextHandle {
        let (handle, retain) = self.prepare_task(function, &args);
        self.schedule_task_at(handle, Some(retain), wake_time, args.len());
        handle
    }

    /// Parks a task until explicitly woken.
    pub fn set_task_wait_event(&mut self, handle: ContextHandle) {
        self.wait_event(UnitKey::Task(handle));
    }

    /// Parks a task until the absolute time `wake_time`.
    pub fn set_task_wait_abs(&mut self, handle: ContextHandle, wake_time: f64) {
        self.wait_until(UnitKey::Task(handle), wake_time);
    }

    /// Parks a task until the next step.
    pub fn set_task_wait_next_frame(&mut self, handle: ContextHandle) {
        self.wait_next_frame(UnitKey::Task(handle));
    }

    /// Wakes a task on the next step with the top `argc` values of its stack.
    pub fn wake_task_next_frame(&mut self, handle: ContextHandle, argc: usize) -> bool {
        self.wake(UnitKey::Task(handle), argc)
    }

    /// Cancels every task, parked or queued. Contexts the scheduler owns are
    /// released; reusable ones are handed back with an empty stack.
    ///
    /// Returns how many tasks were cancelled.
    pub fn cancel_all_tasks(&mut self) -> usize {
        let handles: Vec<ContextHandle> = self.tasks.units.keys().copied().collect();
        for &handle in &handles {
            self.finish::<ContextHandle>(handle, UnitStatus::Done);
        }
        if !handles.is_empty() {
            log::info!("Scheduler: cancelled {} task(s)", handles.len());
        }
        handles.len()
    }

    // --- Unit-generic park and wake ---

    /// Parks a unit until explicitly woken.
    pub fn wait_event(&mut self, key: UnitKey) {
        if let Some(unit) = self.unit_mut(key) {
            unit.park_event();
        }
    }

    /// Parks a unit until the absolute time `wake_time`.
    pub fn wait_until(&mut self, key: UnitKey, wake_time: f64) {
        if let Some(unit) = self.unit_mut(key) {
            unit.park_until(wake_time);
        }
    }

    /// Parks a unit until the next step.
    pub fn wait_next_frame(&mut self, key: UnitKey) {
        if let Some(unit) = self.unit_mut(key) {
            unit.park_next_frame();
        }
    }

    /// Copies `args` into the unit's context and wakes it on the next step.
    ///
    /// Returns `false` if the unit is gone or finished; nothing is pushed then.
    pub fn wake_next_frame(&mut self, key: UnitKey, args: &[Value]) -> bool {
        let Some(unit) = self.unit(key) else {
            return false;
        };
        if unit.status.is_finished() {
            return false;
        }
        let handle = unit.context;
        if let Some(context) = self.contexts.get_mut(handle) {
            context.push_all(args);
        } else if self.contexts.is_live(handle) {
            self.deferred_pushes.push((handle, args.to_vec()));
        } else {
            log::debug!("Scheduler: {key} lost its context, not waking it");
            return false;
        }
        self.wake(key, args.len())
    }

    /// Status of either kind of unit.
    pub fn status(&self, key: UnitKey) -> Option<UnitStatus> {
        self.unit(key).map(|unit| unit.status)
    }

    // --- Maintenance ---

    /// A handle to the deferred-release inbox.
    pub fn release_queue(&self) -> ReleaseQueue {
        self.releases.clone()
    }

    /// Releases every token waiting in the release queue. Returns how many.
    pub fn collect_garbage(&mut self) -> usize {
        let tokens = self.releases.drain();
        let count = tokens.len();
        for token in tokens {
            self.release_context(token);
        }
        count
    }

    // --- Driver ---

    /// Advances the scheduler by one frame.
    ///
    /// Promotes every due timer and next-frame unit first, then resumes ready
    /// scripts followed by ready tasks until the queues drain or the budget runs
    /// out. Leftovers stay at the front of their ready queue for the next step.
    pub fn step(&mut self, now: f64, _dt: f64) -> StepReport {
        self.frame_index += 1;
        self.current_time = now;

        let mut report = StepReport {
            frame: self.frame_index,
            released: self.collect_garbage(),
            ..Default::default()
        };

        report.timers_promoted = self.scripts.promote_timers(now) + self.tasks.promote_timers(now);
        report.next_frame_promoted =
            self.scripts.promote_next_frame(now) + self.tasks.promote_next_frame(now);

        let mut budget = Budget::new(&self.config, self.clock.now());
        self.resume_lane::<ScriptId>(now, &mut budget, &mut report);
        self.resume_lane::<ContextHandle>(now, &mut budget, &mut report);

        report.deferred = self.scripts.ready.len() + self.tasks.ready.len();
        if report.budget_exhausted() {
            log::debug!(
                "Scheduler: budget exhausted on frame {}, {} units deferred",
                report.frame,
                report.deferred
            );
        }
        log::trace!("Scheduler: {report}");
        report
    }

    fn resume_lane<K: LaneAccess>(&mut self, now: f64, budget: &mut Budget, report: &mut StepReport) {
        while budget.allows() {
            let lane = K::lane(self);
            let Some(key) = lane.ready.pop_front() else {
                break;
            };
            let Some(unit) = lane.units.get_mut(&key) else {
                continue;
            };
            unit.queued = false;

            if unit.status != UnitStatus::Running {
                log::warn!(
                    "Scheduler: {} {key} is {} in the ready queue, deferring it",
                    K::KIND,
                    unit.status
                );
                lane.enqueue_next_frame(key);
                continue;
            }

            let mut delta = None;
            let nargs = if unit.has_pending {
                unit.has_pending = false;
                unit.delta_pending = false;
                std::mem::take(&mut unit.pending_argc)
            } else if unit.first_resume {
                unit.delta_pending = false;
                std::mem::take(&mut unit.pending_argc)
            } else if unit.delta_pending {
                unit.delta_pending = false;
                delta = Some(unit.elapsed);
                1
            } else {
                0
            };
            unit.first_resume = false;
            unit.last_resume_time = now;
            let handle = unit.context;

            self.resume_unit::<K>(key, handle, nargs, delta, report);
            budget.record(self.clock.as_ref());
        }
    }

    fn resume_unit<K: LaneAccess>(
        &mut self,
        key: K,
        handle: ContextHandle,
        nargs: usize,
        delta: Option<f64>,
        report: &mut StepReport,
    ) {
        let Some(mut context) = self.contexts.take(handle) else {
            log::debug!("Scheduler: {} {key} has no live context, dropping it", K::KIND);
            self.finish::<K>(key, UnitStatus::Error);
            return;
        };
        if let Some(elapsed) = delta {
            context.push(Value::Number(elapsed));
        }

        report.resumed += 1;
        let outcome = context.resume(self, key.unit_key(), handle, nargs);
        let label = context.label().to_owned();

        if self.contexts.restore(handle, context) {
            self.flush_deferred_pushes(handle);
        }

        match outcome {
            Outcome::Return(_) => {
                report.completed += 1;
                self.finish::<K>(key, UnitStatus::Done);
            }
            Outcome::Yield => self.repark::<K>(key),
            Outcome::Error(e) => {
                report.failed += 1;
                log::error!("Scheduler: runtime error in {} '{label}': {e}", K::KIND);
                self.finish::<K>(key, UnitStatus::Error);
            }
        }
    }

    /// Requeues a unit that yielded, according to how it parked itself.
    fn repark<K: LaneAccess>(&mut self, key: K) {
        let lane = K::lane(self);
        let Some(unit) = lane.units.get_mut(&key) else {
            // Stopped during its own resume.
            return;
        };
        match unit.status {
            UnitStatus::Waiting if unit.next_frame => lane.enqueue_next_frame(key),
            UnitStatus::Waiting if unit.wake_time.is_finite() => lane.enqueue_timer(key),
            UnitStatus::Waiting => {}
            UnitStatus::Running => {
                unit.next_frame = true;
                lane.enqueue_next_frame(key);
            }
            UnitStatus::Done | UnitStatus::Error => {}
        }
    }

    /// Moves a unit to a terminal state; tasks are erased and their context
    /// released or reset.
    fn finish<K: LaneAccess>(&mut self, key: K, status: UnitStatus) {
        if K::PERSISTENT {
            if let Some(unit) = K::lane(self).units.get_mut(&key) {
                unit.status = status;
                unit.timer_order = None;
            }
            return;
        }
        let Some(unit) = K::lane(self).remove(key) else {
            return;
        };
        match unit.retain {
            Some(retain) => {
                let _ = self.contexts.release(retain);
                self.deferred_pushes.retain(|(h, _)| *h != unit.context);
            }
            None => {
                if let Some(context) = self.contexts.get_mut(unit.context) {
                    context.clear_stack();
                }
            }
        }
    }

    fn flush_deferred_pushes(&mut self, handle: ContextHandle) {
        if self.deferred_pushes.is_empty() {
            return;
        }
        let (mine, rest): (Vec<_>, Vec<_>) = std::mem::take(&mut self.deferred_pushes)
            .into_iter()
            .partition(|(h, _)| *h == handle);
        self.deferred_pushes = rest;
        if let Some(context) = self.contexts.get_mut(handle) {
            for (_, args) in mine {
                context.push_all(&args);
            }
        }
    }

    fn prepare_task(&mut self, function: Function, args: &[Value]) -> (ContextHandle, Retain) {
        let label = function.name().to_owned();
        let (handle, retain) = self.create_context(&label);
        if let Some(context) = self.contexts.get_mut(handle) {
            context.push_function(function);
            context.push_all(args);
        }
        (handle, retain)
    }

    /// Inserts a task unit. Returns `false` if the context is gone.
    fn insert_task(&mut self, handle: ContextHandle, mut unit: Unit) -> bool {
        if !self.contexts.is_live(handle) {
            log::warn!("Scheduler: cannot schedule {handle}, its context is released");
            if let Some(retain) = unit.retain {
                let _ = self.contexts.release(retain);
            }
            return false;
        }
        if let Some(previous) = self.tasks.remove(handle) {
            log::warn!("Scheduler: {handle} is already an active task, rescheduling it");
            if unit.retain.is_none() {
                unit.retain = previous.retain;
            } else if let Some(extra) = previous.retain {
                self.releases.push(extra);
            }
        }
        self.tasks.units.insert(handle, unit);
        true
    }

    fn wake(&mut self, key: UnitKey, argc: usize) -> bool {
        let Some(unit) = self.unit_mut(key) else {
            return false;
        };
        if unit.status.is_finished() {
            return false;
        }
        unit.status = UnitStatus::Running;
        unit.next_frame = true;
        unit.timer_order = None;
        unit.pending_argc += argc;
        unit.has_pending = true;
        match key {
            UnitKey::Script(id) => self.scripts.enqueue_next_frame(id),
            UnitKey::Task(handle) => self.tasks.enqueue_next_frame(handle),
        }
        true
    }

    fn unit(&self, key: UnitKey) -> Option<&Unit> {
        match key {
            UnitKey::Script(id) => self.scripts.units.get(&id),
            UnitKey::Task(handle) => self.tasks.units.get(&handle),
        }
    }

    fn unit_mut(&mut self, key: UnitKey) -> Option<&mut Unit> {
        match key {
            UnitKey::Script(id) => self.scripts.units.get_mut(&id),
            UnitKey::Task(handle) => self.tasks.units.get_mut(&handle),
        }
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        log::info!(
            "Scheduler: shutting down after {} frames ({} scripts, {} tasks)",
            self.frame_index,
            self.scripts.units.len(),
            self.tasks.units.len()
        );
    }
}
