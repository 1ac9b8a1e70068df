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

use approx::assert_relative_eq;
use cadence_scheduler::{
    ContextHandle, Function, FunctionRegistry, ManualClock, Outcome, ResumeCx, Scheduler,
    SchedulerConfig, ScriptError, ScriptId, UnitKey, UnitStatus, Value,
};
use std::cell::RefCell;
use std::rc::Rc;

type Trace = Rc<RefCell<Vec<(&'static str, Vec<Value>)>>>;

fn new_trace() -> Trace {
    Rc::new(RefCell::new(Vec::new()))
}

fn names(trace: &Trace) -> Vec<&'static str> {
    trace.borrow().iter().map(|(name, _)| *name).collect()
}

fn scheduler_with(functions: Vec<Function>) -> Scheduler {
    let _ = env_logger::builder().is_test(true).try_init();
    let registry = functions
        .into_iter()
        .fold(FunctionRegistry::new(), FunctionRegistry::with);
    Scheduler::new(SchedulerConfig::default(), Box::new(registry))
}

/// A body that records every resume, then parks with `park` and yields.
fn recorder(name: &'static str, trace: &Trace, park: fn(&mut ResumeCx<'_>)) -> Function {
    let trace = Rc::clone(trace);
    Function::new(name, move || {
        let trace = Rc::clone(&trace);
        move |cx: &mut ResumeCx<'_>, args: Vec<Value>| {
            trace.borrow_mut().push((name, args));
            park(cx);
            Outcome::Yield
        }
    })
}

fn register(scheduler: &mut Scheduler, id: u64, name: &str) {
    scheduler
        .register_script(ScriptId(id), name, name, |_| {})
        .expect("script should load");
}

#[test]
fn test_registered_script_first_resume_has_no_arguments() {
    let trace = new_trace();
    let mut sched = scheduler_with(vec![recorder("a", &trace, |_| {})]);
    register(&mut sched, 1, "a");

    assert_eq!(sched.script_status(ScriptId(1)), Some(UnitStatus::Running));
    let report = sched.step(0.0, 0.0);

    assert_eq!(report.resumed, 1);
    assert_eq!(trace.borrow().len(), 1);
    assert!(trace.borrow()[0].1.is_empty());
}

#[test]
fn test_wait_resumes_exactly_when_due_with_elapsed_time() {
    // --- 1. ARRANGE ---
    let trace = new_trace();
    let mut sched = scheduler_with(vec![recorder("sleeper", &trace, |cx| cx.wait(5.0))]);
    register(&mut sched, 1, "sleeper");
    sched.step(0.0, 0.0);
    assert_eq!(sched.script_status(ScriptId(1)), Some(UnitStatus::Waiting));

    // --- 2. ACT / ASSERT ---
    let early = sched.step(4.9, 4.9);
    assert_eq!(early.resumed, 0, "must not wake before its wake time");

    let due = sched.step(5.0, 0.1);
    assert_eq!(due.resumed, 1);
    assert_eq!(due.timers_promoted, 1);

    let trace = trace.borrow();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[1].1.len(), 1, "timed wake passes one elapsed argument");
    assert_relative_eq!(trace[1].1[0].as_number().unwrap(), 5.0, epsilon = 1e-9);
}

#[test]
fn test_due_timers_resume_in_ascending_wake_order() {
    let trace = new_trace();
    let mut sched = scheduler_with(vec![
        recorder("three", &trace, |cx| cx.wait(3.0)),
        recorder("one", &trace, |cx| cx.wait(1.0)),
        recorder("two", &trace, |cx| cx.wait(2.0)),
    ]);
    register(&mut sched, 1, "three");
    register(&mut sched, 2, "one");
    register(&mut sched, 3, "two");
    sched.step(0.0, 0.0);
    trace.borrow_mut().clear();

    sched.step(2.5, 2.5);
    assert_eq!(names(&trace), vec!["one", "two"]);

    // Re-parked at 3.5 and 4.5, so "three" (due at 3.0) now comes first.
    sched.step(10.0, 7.5);
    assert_eq!(names(&trace), vec!["one", "two", "three", "one", "two"]);
}

#[test]
fn test_event_parked_script_needs_an_explicit_wake() {
    let trace = new_trace();
    let mut sched = scheduler_with(vec![recorder("listener", &trace, |cx| cx.wait_event())]);
    register(&mut sched, 7, "listener");
    sched.step(0.0, 0.0);

    for frame in 1..20 {
        let report = sched.step(frame as f64, 1.0);
        assert_eq!(report.resumed, 0);
    }
    assert_eq!(trace.borrow().len(), 1);

    assert!(sched.wake_next_frame(UnitKey::Script(ScriptId(7)), &[Value::from("ping")]));
    assert_eq!(trace.borrow().len(), 1, "waking never resumes synchronously");

    sched.step(20.0, 1.0);
    let trace = trace.borrow();
    assert_eq!(trace.len(), 2);
    assert_eq!(trace[1].1, vec![Value::from("ping")]);
}

#[test]
fn test_stop_script_is_idempotent_and_final() {
    let trace = new_trace();
    let mut sched = scheduler_with(vec![recorder("doomed", &trace, |cx| cx.wait(1.0))]);
    register(&mut sched, 1, "doomed");
    sched.step(0.0, 0.0);
    let contexts_before = sched.context_count();

    // Pending in the timer queue when stopped.
    assert!(sched.stop_script(ScriptId(1)));
    assert!(!sched.stop_script(ScriptId(1)));
    assert_eq!(sched.context_count(), contexts_before - 1);

    for frame in 1..5 {
        let report = sched.step(frame as f64, 1.0);
        assert_eq!(report.resumed, 0);
    }
    assert_eq!(trace.borrow().len(), 1);
    assert_eq!(sched.script_status(ScriptId(1)), None);
}

#[test]
fn test_stop_script_from_inside_its_own_resume() {
    let counter = Rc::new(RefCell::new(0));
    let seen = Rc::clone(&counter);
    let suicidal = Function::new("suicidal", move || {
        let seen = Rc::clone(&seen);
        move |cx: &mut ResumeCx<'_>, _args: Vec<Value>| {
            *seen.borrow_mut() += 1;
            if let UnitKey::Script(id) = cx.caller() {
                cx.scheduler().stop_script(id);
            }
            Outcome::Yield
        }
    });
    let mut sched = scheduler_with(vec![suicidal]);
    register(&mut sched, 3, "suicidal");

    sched.step(0.0, 0.0);
    sched.step(1.0, 1.0);

    assert_eq!(*counter.borrow(), 1);
    assert_eq!(sched.script_count(), 0);
    assert_eq!(sched.context_count(), 0);
}

#[test]
fn test_task_that_returns_is_erased_in_the_same_step() {
    let mut sched = scheduler_with(vec![]);
    let ran = Rc::new(RefCell::new(false));
    let flag = Rc::clone(&ran);
    let task = Function::from_fn("oneshot", move |_, _| {
        *flag.borrow_mut() = true;
        Ok(vec![Value::from(1.0)])
    });

    let handle = sched.spawn_task_next_frame(task, vec![]);
    assert!(sched.is_task_active(handle));
    assert_eq!(sched.task_status(handle), Some(UnitStatus::Waiting));

    let report = sched.step(0.0, 0.0);
    assert!(*ran.borrow());
    assert_eq!(report.completed, 1);
    assert!(!sched.is_task_active(handle));
    assert_eq!(sched.task_count(), 0);
    assert!(!sched.is_context_live(handle), "ephemeral context is released");
}

#[test]
fn test_spawned_task_receives_initial_arguments() {
    let mut sched = scheduler_with(vec![]);
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    let task = Function::from_fn("sum", move |_, args| {
        sink.borrow_mut().extend(args);
        Ok(Vec::new())
    });

    sched.spawn_task_next_frame(task, vec![Value::from(1.0), Value::from("two")]);
    sched.step(0.0, 0.0);

    assert_eq!(*received.borrow(), vec![Value::from(1.0), Value::from("two")]);
}

#[test]
fn test_spawn_task_at_waits_for_its_time() {
    let mut sched = scheduler_with(vec![]);
    let ran_at = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&ran_at);
    let task = Function::from_fn("later", move |cx, _| {
        *sink.borrow_mut() = Some(cx.now());
        Ok(Vec::new())
    });

    let handle = sched.spawn_task_at(2.0, task, vec![]);
    sched.step(1.0, 1.0);
    assert!(ran_at.borrow().is_none());
    assert!(sched.is_task_active(handle));

    sched.step(2.0, 1.0);
    assert_eq!(*ran_at.borrow(), Some(2.0));
    assert!(!sched.is_task_active(handle));
}

#[test]
fn test_one_resume_per_step_preserves_fifo_order() {
    let trace = new_trace();
    let mut sched = scheduler_with(vec![
        recorder("a", &trace, |_| {}),
        recorder("b", &trace, |_| {}),
    ]);
    sched.set_max_resumes_per_tick(1);
    register(&mut sched, 1, "a");
    register(&mut sched, 2, "b");

    let first = sched.step(0.0, 0.0);
    assert_eq!(first.resumed, 1);
    assert_eq!(first.deferred, 1);
    assert!(first.budget_exhausted());

    sched.step(1.0, 1.0);
    sched.step(2.0, 1.0);
    sched.step(3.0, 1.0);
    assert_eq!(names(&trace), vec!["a", "b", "a", "b"]);
}

#[test]
fn test_time_budget_defers_remaining_units() {
    let clock = ManualClock::new(0.0);
    let trace = new_trace();
    let slow_trace = Rc::clone(&trace);
    let wall = clock.clone();
    let slow = Function::new("slow", move || {
        let trace = Rc::clone(&slow_trace);
        let wall = wall.clone();
        move |_cx: &mut ResumeCx<'_>, args: Vec<Value>| {
            trace.borrow_mut().push(("slow", args));
            wall.advance(0.02);
            Outcome::Yield
        }
    });
    let registry = FunctionRegistry::new()
        .with(slow)
        .with(recorder("fast", &trace, |_| {}));
    let config = SchedulerConfig {
        budget_sample_interval: 1,
        ..SchedulerConfig::default()
    };
    let mut sched = Scheduler::new(config, Box::new(registry)).with_clock(clock);
    register(&mut sched, 1, "slow");
    register(&mut sched, 2, "fast");

    let report = sched.step(0.0, 0.0);
    assert_eq!(report.resumed, 1);
    assert_eq!(report.deferred, 1);

    sched.set_max_time_budget_seconds(0.0);
    let report = sched.step(1.0, 1.0);
    assert_eq!(report.resumed, 2, "a zero budget disables the time limit");
    assert_eq!(names(&trace), vec!["slow", "fast", "slow"]);
}

#[test]
fn test_runtime_error_is_contained_to_its_unit() {
    let trace = new_trace();
    let broken = Function::from_fn("broken", |_, _| Err(ScriptError::runtime("boom")));
    let mut sched = scheduler_with(vec![broken.clone(), recorder("healthy", &trace, |_| {})]);
    register(&mut sched, 1, "broken");
    register(&mut sched, 2, "healthy");
    let task = sched.spawn_task_next_frame(broken, vec![]);

    let report = sched.step(0.0, 0.0);
    assert_eq!(report.failed, 2);
    assert_eq!(sched.script_status(ScriptId(1)), Some(UnitStatus::Error));
    assert!(!sched.is_task_active(task));
    assert!(!sched.is_context_live(task));

    sched.step(1.0, 1.0);
    sched.step(2.0, 1.0);
    assert_eq!(trace.borrow().len(), 3, "sibling keeps running");
    assert_eq!(sched.script_status(ScriptId(1)), Some(UnitStatus::Error));
}

#[test]
fn test_implicit_yield_resumes_next_frame_with_delta() {
    let trace = new_trace();
    let mut sched = scheduler_with(vec![recorder("spinner", &trace, |_| {})]);
    register(&mut sched, 1, "spinner");

    sched.step(0.0, 0.0);
    sched.step(0.25, 0.25);
    sched.step(0.75, 0.5);

    let trace = trace.borrow();
    assert_eq!(trace.len(), 3);
    assert_relative_eq!(trace[1].1[0].as_number().unwrap(), 0.25);
    assert_relative_eq!(trace[2].1[0].as_number().unwrap(), 0.5);
}

#[test]
fn test_completed_script_stays_done() {
    let finisher = Function::from_fn("finisher", |_, _| Ok(Vec::new()));
    let mut sched = scheduler_with(vec![finisher]);
    register(&mut sched, 9, "finisher");

    sched.step(0.0, 0.0);
    assert_eq!(sched.script_status(ScriptId(9)), Some(UnitStatus::Done));
    assert!(!sched.wake_next_frame(UnitKey::Script(ScriptId(9)), &[Value::Nil]));
    assert_eq!(sched.step(1.0, 1.0).resumed, 0);
}

#[test]
fn test_load_failure_registers_nothing() {
    let mut sched = scheduler_with(vec![]);
    let result = sched.register_script(ScriptId(1), "ghost", "missing", |_| {});

    assert!(result.is_err());
    assert_eq!(sched.script_count(), 0);
    assert_eq!(sched.context_count(), 0);
}

#[test]
fn test_binder_globals_are_private_to_the_script() {
    let seen = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&seen);
    let reader = Function::from_fn("reader", move |cx, _| {
        sink.borrow_mut().push(cx.global("name").unwrap_or_default());
        Ok(Vec::new())
    });
    let mut sched = scheduler_with(vec![reader]);
    sched.set_global("name", Value::from("host"));

    sched
        .register_script(ScriptId(1), "first", "reader", |ctx| {
            ctx.set_global("name", Value::from("first"))
        })
        .unwrap();
    sched
        .register_script(ScriptId(2), "second", "reader", |_| {})
        .unwrap();
    sched.step(0.0, 0.0);

    assert_eq!(*seen.borrow(), vec![Value::from("first"), Value::from("host")]);
}

#[test]
fn test_released_reusable_context_is_adopted_by_its_pending_task() {
    let mut sched = scheduler_with(vec![]);
    let ran = Rc::new(RefCell::new(0));
    let counter = Rc::clone(&ran);
    let callback = Function::from_fn("callback", move |_, _| {
        *counter.borrow_mut() += 1;
        Ok(Vec::new())
    });

    let (handle, retain) = sched.create_context("reusable");
    sched.context_mut(handle).unwrap().push_function(callback);
    sched.schedule_task_next_frame(handle, None, 0);
    sched.release_queue().push(retain);

    let report = sched.step(0.0, 0.0);
    assert_eq!(report.released, 1);
    assert_eq!(*ran.borrow(), 1, "the pending dispatch still runs");
    assert!(!sched.is_context_live(handle));
}

#[test]
fn test_reusable_context_survives_completion_with_empty_stack() {
    let mut sched = scheduler_with(vec![]);
    let callback = Function::from_fn("echo", |_, args| Ok(args));

    let (handle, _retain) = sched.create_context("reusable");
    for round in 0..2 {
        let context = sched.context_mut(handle).unwrap();
        context.push_function(callback.clone());
        context.push(Value::from(round));
        sched.schedule_task_next_frame(handle, None, 1);
        sched.step(round as f64, 1.0);

        assert!(!sched.is_task_active(handle));
        assert!(sched.context(handle).unwrap().stack().is_empty());
    }
}

#[test]
fn test_native_call_cannot_yield() {
    let yielding = Function::new("yielding", || {
        |cx: &mut ResumeCx<'_>, _args: Vec<Value>| {
            cx.wait_next_frame();
            Outcome::Yield
        }
    });
    let outcome = Rc::new(RefCell::new(None));
    let sink = Rc::clone(&outcome);
    let caller = Function::from_fn("caller", move |cx, _| {
        *sink.borrow_mut() = Some(yielding.call(cx, Vec::new()));
        Ok(Vec::new())
    });
    let mut sched = scheduler_with(vec![]);
    sched.spawn_task_next_frame(caller, vec![]);
    sched.step(0.0, 0.0);

    assert_eq!(
        *outcome.borrow(),
        Some(Err(ScriptError::YieldAcrossBoundary))
    );
}

#[test]
fn test_woken_task_receives_wake_arguments() {
    let received = Rc::new(RefCell::new(Vec::new()));
    let sink = Rc::clone(&received);
    let waiter = Function::new("waiter", move || {
        let sink = Rc::clone(&sink);
        move |cx: &mut ResumeCx<'_>, args: Vec<Value>| {
            sink.borrow_mut().push(args);
            cx.wait_event();
            Outcome::Yield
        }
    });
    let mut sched = scheduler_with(vec![]);
    let handle: ContextHandle = sched.spawn_task_next_frame(waiter, vec![]);
    sched.step(0.0, 0.0);
    assert_eq!(sched.task_status(handle), Some(UnitStatus::Waiting));

    sched.wake_next_frame(UnitKey::Task(handle), &[Value::from(4.0), Value::from(2.0)]);
    sched.step(1.0, 1.0);
    sched.step(2.0, 1.0);

    let received = received.borrow();
    assert_eq!(received.len(), 2);
    assert_eq!(received[1], vec![Value::from(4.0), Value::from(2.0)]);
}

#[test]
fn test_ready_unit_parked_by_the_host_is_deferred_then_resumed() {
    // --- 1. ARRANGE ---
    let trace = new_trace();
    let mut sched = scheduler_with(vec![
        recorder("a", &trace, |_| {}),
        recorder("b", &trace, |_| {}),
    ]);
    sched.set_max_resumes_per_tick(1);
    register(&mut sched, 1, "a");
    register(&mut sched, 2, "b");
    let first = sched.step(0.0, 0.0);
    assert_eq!(first.deferred, 1, "b is left over in the ready queue");

    // --- 2. ACT ---
    sched.set_wait_abs(ScriptId(2), 100.0);
    sched.step(1.0, 1.0);
    sched.step(2.0, 1.0);

    // --- 3. ASSERT ---
    assert_eq!(names(&trace), vec!["a", "a", "b"]);
    assert_eq!(sched.script_status(ScriptId(2)), Some(UnitStatus::Running));
}

#[test]
fn test_timer_parked_unit_switched_to_next_frame_is_rerouted() {
    // --- 1. ARRANGE ---
    let trace = new_trace();
    let mut sched = scheduler_with(vec![recorder("sleeper", &trace, |cx| cx.wait(5.0))]);
    register(&mut sched, 1, "sleeper");
    sched.step(0.0, 0.0);
    assert_eq!(sched.script_status(ScriptId(1)), Some(UnitStatus::Waiting));

    // --- 2. ACT ---
    sched.set_wait_next_frame(ScriptId(1));
    let report = sched.step(1.0, 1.0);

    // --- 3. ASSERT ---
    assert_eq!(report.resumed, 1);
    assert_eq!(names(&trace), vec!["sleeper", "sleeper"]);
    assert_eq!(sched.script_status(ScriptId(1)), Some(UnitStatus::Waiting));
    assert_eq!(sched.step(2.0, 1.0).resumed, 0, "parked again for 5s");
    assert_eq!(sched.step(6.0, 4.0).resumed, 1);
}

#[test]
fn test_timer_parked_unit_moved_to_event_waits_for_a_wake() {
    let trace = new_trace();
    let mut sched = scheduler_with(vec![recorder("sleeper", &trace, |cx| cx.wait(1.0))]);
    register(&mut sched, 1, "sleeper");
    sched.step(0.0, 0.0);

    sched.set_wait_event(ScriptId(1));
    assert_eq!(sched.step(5.0, 5.0).resumed, 0);

    assert!(sched.wake_next_frame(UnitKey::Script(ScriptId(1)), &[]));
    assert_eq!(sched.step(6.0, 1.0).resumed, 1);
}

#[test]
fn test_cancel_all_tasks_releases_owned_contexts() {
    // --- 1. ARRANGE ---
    let parked = Function::new("parked", || {
        |cx: &mut ResumeCx<'_>, _args: Vec<Value>| {
            cx.wait_event();
            Outcome::Yield
        }
    });
    let mut sched = scheduler_with(vec![]);
    let waiting = sched.spawn_task_next_frame(parked.clone(), vec![]);
    sched.step(0.0, 0.0);
    let timed = sched.spawn_task_at(50.0, parked, vec![]);
    let (reusable, _retain) = sched.create_context("reusable");
    sched
        .context_mut(reusable)
        .unwrap()
        .push_function(Function::from_fn("noop", |_, _| Ok(Vec::new())));
    sched.schedule_task_next_frame(reusable, None, 0);
    assert_eq!(sched.task_count(), 3);

    // --- 2. ACT ---
    let cancelled = sched.cancel_all_tasks();

    // --- 3. ASSERT ---
    assert_eq!(cancelled, 3);
    assert_eq!(sched.task_count(), 0);
    assert!(!sched.is_context_live(waiting));
    assert!(!sched.is_context_live(timed));
    assert!(sched.context(reusable).unwrap().stack().is_empty());
    assert_eq!(sched.context_count(), 1, "the caller still owns the reusable context");
    assert_eq!(sched.step(100.0, 1.0).resumed, 0);
}
