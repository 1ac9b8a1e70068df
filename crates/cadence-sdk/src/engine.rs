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

//! The [`ScriptEngine`] facade.

use std::collections::{BTreeSet, HashMap};

use anyhow::{Context, Result};
use cadence_core::{Clock, ContextHandle, ScriptId, UnitStatus};
use cadence_scheduler::{Function, Scheduler, StepReport, Value};
use cadence_script::{Output, ScriptLoader};
use cadence_signal::Signal;

use crate::config::EngineConfig;
use crate::run_service::RunService;

/// Owns a scheduler loading script-language sources, the frame signals and
/// any host-created signals, and drives them once per frame.
pub struct ScriptEngine {
    scheduler: Scheduler,
    loader: ScriptLoader,
    run_service: RunService,
    signals: HashMap<String, Signal>,
    scripts: BTreeSet<ScriptId>,
}

impl ScriptEngine {
    /// Builds an engine from a validated configuration.
    pub fn new(config: EngineConfig) -> Result<Self> {
        config.validate()?;
        crate::init_logging(&config.log_filter);
        let loader = ScriptLoader::new();
        let mut scheduler = Scheduler::new(config.scheduler, Box::new(loader.clone()));
        let run_service = RunService::new(&scheduler);
        run_service.bind(&mut scheduler);
        log::info!("ScriptEngine created.");
        Ok(Self {
            scheduler,
            loader,
            run_service,
            signals: HashMap::new(),
            scripts: BTreeSet::new(),
        })
    }

    /// Replaces the wall clock used for budget sampling.
    pub fn with_clock(mut self, clock: impl Clock + 'static) -> Self {
        self.scheduler.set_clock(clock);
        self
    }

    /// The underlying scheduler.
    pub fn scheduler(&self) -> &Scheduler {
        &self.scheduler
    }

    /// Mutable access to the underlying scheduler.
    pub fn scheduler_mut(&mut self) -> &mut Scheduler {
        &mut self.scheduler
    }

    /// The frame signals.
    pub fn run_service(&self) -> &RunService {
        &self.run_service
    }

    /// Lines printed by every script so far.
    pub fn output(&self) -> Output {
        self.loader.output()
    }

    /// Compiles `source` into a function without binding it anywhere.
    pub fn compile(&self, label: &str, source: &str) -> Result<Function> {
        self.loader
            .compile(label, source)
            .with_context(|| format!("Failed to compile '{label}'"))
    }

    /// Compiles `source` and binds it as the global `name`, visible to every
    /// script, task and listener.
    pub fn define_function(&mut self, name: &str, source: &str) -> Result<Function> {
        let function = self.compile(name, source)?;
        self.scheduler
            .set_global(name, Value::from(function.clone()));
        Ok(function)
    }

    /// Creates a signal bound as the global `name`. An existing signal with the
    /// same name is returned instead.
    pub fn create_signal(&mut self, name: &str) -> Signal {
        if let Some(signal) = self.signals.get(name) {
            return signal.clone();
        }
        let signal = Signal::new(name, &self.scheduler);
        self.scheduler.set_global(name, signal.to_value());
        self.signals.insert(name.to_owned(), signal.clone());
        signal
    }

    /// Looks up a host-created or frame signal by name.
    pub fn signal(&self, name: &str) -> Option<Signal> {
        self.signals
            .get(name)
            .or_else(|| self.run_service.signal(name))
            .cloned()
    }

    /// Compiles and registers a persistent script.
    ///
    /// The script sees its own identity as `script`, on top of the root globals.
    pub fn register_script(&mut self, id: ScriptId, label: &str, source: &str) -> Result<()> {
        self.scheduler
            .register_script(id, label, source, |context| {
                context.set_global("script", Value::Number(id.0 as f64));
            })
            .with_context(|| format!("Failed to register script '{label}' as {id}"))?;
        self.scripts.insert(id);
        Ok(())
    }

    /// Stops a script. Returns `false` if it was not registered.
    pub fn stop_script(&mut self, id: ScriptId) -> bool {
        self.scripts.remove(&id);
        self.scheduler.stop_script(id)
    }

    /// The status of a registered script.
    pub fn script_status(&self, id: ScriptId) -> Option<UnitStatus> {
        self.scheduler.script_status(id)
    }

    /// Starts `function` as a task on the next frame.
    pub fn spawn(&mut self, function: Function, args: Vec<Value>) -> ContextHandle {
        self.scheduler.spawn_task_next_frame(function, args)
    }

    /// Starts `function` as a task `seconds` after the current frame time.
    pub fn delay(&mut self, seconds: f64, function: Function, args: Vec<Value>) -> ContextHandle {
        let wake_time = self.scheduler.current_time() + seconds.max(0.0);
        self.scheduler.spawn_task_at(wake_time, function, args)
    }

    /// Runs one frame: fires the frame signals in order, then steps.
    pub fn frame(&mut self, now: f64, dt: f64) -> StepReport {
        self.run_service.fire_frame(&mut self.scheduler, now, dt);
        let report = self.scheduler.step(now, dt);
        if report.failed > 0 {
            log::warn!(
                "Frame {}: {} unit(s) failed with an error",
                report.frame,
                report.failed
            );
        }
        report
    }

    /// Closes every signal, stops every script and releases their contexts.
    pub fn shutdown(&mut self) {
        log::info!("ScriptEngine shutting down...");
        self.run_service.close_all();
        for signal in self.signals.values() {
            signal.close();
        }
        let scripts = std::mem::take(&mut self.scripts);
        for id in scripts {
            self.scheduler.stop_script(id);
        }
        let cancelled = self.scheduler.cancel_all_tasks();
        let released = self.scheduler.collect_garbage();
        log::info!(
            "ScriptEngine shutdown complete ({cancelled} task(s) cancelled, {released} context(s) released)."
        );
    }
}

impl Drop for ScriptEngine {
    fn drop(&mut self) {
        log::info!(
            "ScriptEngine dropped with {} script(s) and {} task(s) still registered.",
            self.scheduler.script_count(),
            self.scheduler.task_count()
        );
    }
}
