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

//! The per-frame engine signals.

use cadence_scheduler::{Scheduler, Value};
use cadence_signal::Signal;

/// Names of the frame signals, in firing order.
pub const FRAME_SIGNALS: [&str; 5] = [
    "PreRender",
    "PreAnimation",
    "PreSimulation",
    "PostSimulation",
    "Heartbeat",
];

/// The five signals fired once per frame, before the scheduler steps.
///
/// `PreSimulation` receives `(now, dt)`, every other signal receives `(dt)`.
pub struct RunService {
    pre_render: Signal,
    pre_animation: Signal,
    pre_simulation: Signal,
    post_simulation: Signal,
    heartbeat: Signal,
}

impl RunService {
    /// Creates the frame signals.
    pub fn new(scheduler: &Scheduler) -> Self {
        Self {
            pre_render: Signal::new("PreRender", scheduler),
            pre_animation: Signal::new("PreAnimation", scheduler),
            pre_simulation: Signal::new("PreSimulation", scheduler),
            post_simulation: Signal::new("PostSimulation", scheduler),
            heartbeat: Signal::new("Heartbeat", scheduler),
        }
    }

    /// Fired first; `RenderStepped` is an alias.
    pub fn pre_render(&self) -> &Signal {
        &self.pre_render
    }

    /// Fired after `PreRender`.
    pub fn pre_animation(&self) -> &Signal {
        &self.pre_animation
    }

    /// Fired with `(now, dt)`; `Stepped` is an alias.
    pub fn pre_simulation(&self) -> &Signal {
        &self.pre_simulation
    }

    /// Fired after `PreSimulation`.
    pub fn post_simulation(&self) -> &Signal {
        &self.post_simulation
    }

    /// Fired last.
    pub fn heartbeat(&self) -> &Signal {
        &self.heartbeat
    }

    /// Resolves a signal by name, aliases included.
    pub fn signal(&self, name: &str) -> Option<&Signal> {
        match name {
            "PreRender" | "RenderStepped" => Some(&self.pre_render),
            "PreAnimation" => Some(&self.pre_animation),
            "PreSimulation" | "Stepped" => Some(&self.pre_simulation),
            "PostSimulation" => Some(&self.post_simulation),
            "Heartbeat" => Some(&self.heartbeat),
            _ => None,
        }
    }

    fn in_order(&self) -> [&Signal; 5] {
        [
            &self.pre_render,
            &self.pre_animation,
            &self.pre_simulation,
            &self.post_simulation,
            &self.heartbeat,
        ]
    }

    /// Binds every signal, aliases included, as root globals of `scheduler`,
    /// so scripts, tasks and listeners all resolve them.
    pub fn bind(&self, scheduler: &mut Scheduler) {
        for name in FRAME_SIGNALS {
            if let Some(signal) = self.signal(name) {
                scheduler.set_global(name, signal.to_value());
            }
        }
        scheduler.set_global("RenderStepped", self.pre_render.to_value());
        scheduler.set_global("Stepped", self.pre_simulation.to_value());
    }

    /// Fires the frame signals in order. Closed signals are skipped.
    pub fn fire_frame(&self, scheduler: &mut Scheduler, now: f64, dt: f64) {
        for signal in self.in_order() {
            if signal.is_closed() {
                continue;
            }
            if signal.ptr_eq(&self.pre_simulation) {
                signal.fire(scheduler, &[Value::Number(now), Value::Number(dt)]);
            } else {
                signal.fire(scheduler, &[Value::Number(dt)]);
            }
        }
    }

    /// Closes every frame signal.
    pub fn close_all(&self) {
        for signal in self.in_order() {
            signal.close();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use cadence_scheduler::{FunctionRegistry, SchedulerConfig};

    fn scheduler() -> Scheduler {
        Scheduler::new(SchedulerConfig::default(), Box::new(FunctionRegistry::new()))
    }

    #[test]
    fn test_aliases_resolve_to_the_same_signal() {
        let sched = scheduler();
        let run_service = RunService::new(&sched);
        let stepped = run_service.signal("Stepped").unwrap();
        let rendered = run_service.signal("RenderStepped").unwrap();
        assert!(stepped.ptr_eq(run_service.pre_simulation()));
        assert!(rendered.ptr_eq(run_service.pre_render()));
        assert!(run_service.signal("Render").is_none());
    }

    #[test]
    fn test_bind_exposes_signals_and_aliases_as_root_globals() {
        let mut sched = scheduler();
        let run_service = RunService::new(&sched);
        run_service.bind(&mut sched);
        for name in FRAME_SIGNALS.iter().chain(&["RenderStepped", "Stepped"]) {
            let bound = sched.globals().get(name).and_then(|value| Signal::from_value(&value));
            assert!(bound.is_some(), "{name} not bound");
        }
        let stepped = sched.globals().get("Stepped").and_then(|value| Signal::from_value(&value));
        assert!(stepped.is_some_and(|signal| signal.ptr_eq(run_service.pre_simulation())));
    }

    #[test]
    fn test_close_all() {
        let sched = scheduler();
        let run_service = RunService::new(&sched);
        run_service.close_all();
        assert!(FRAME_SIGNALS
            .iter()
            .all(|name| run_service.signal(name).is_some_and(Signal::is_closed)));
    }
}
