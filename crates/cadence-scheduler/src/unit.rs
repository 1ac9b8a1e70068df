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

//! Per-unit scheduling state and the queues holding units of one kind.

use crate::queue::TimerQueue;
use cadence_core::{ContextHandle, Retain, ScriptId, UnitStatus};
use std::collections::{HashMap, VecDeque};
use std::fmt;
use std::hash::Hash;

/// Identifies a schedulable unit of either kind.
///
/// Signals record it as the waiter tag; the scheduler uses it to route generic
/// park and wake calls to the right unit table.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum UnitKey {
    /// A persistent script, keyed by its external identity.
    Script(ScriptId),
    /// An anonymous task, keyed by its execution context.
    Task(ContextHandle),
}

impl fmt::Display for UnitKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UnitKey::Script(id) => write!(f, "{id}"),
            UnitKey::Task(handle) => write!(f, "task {handle}"),
        }
    }
}

/// Scheduling state of one unit.
#[derive(Debug)]
pub(crate) struct Unit {
    pub context: ContextHandle,
    /// Present when the scheduler owns the context and must release it.
    pub retain: Option<Retain>,
    pub status: UnitStatus,
    /// `f64::INFINITY` when not parked on a timer.
    pub wake_time: f64,
    pub next_frame: bool,
    pub last_resume_time: f64,
    pub elapsed: f64,
    pub delta_pending: bool,
    pub first_resume: bool,
    pub pending_argc: usize,
    pub has_pending: bool,
    /// Stamp of the live timer queue entry, if any.
    pub timer_order: Option<u64>,
    /// Set while the key sits in the ready or next-frame queue.
    pub queued: bool,
}

impl Unit {
    pub fn new(context: ContextHandle, retain: Option<Retain>, now: f64) -> Self {
        Self {
            context,
            retain,
            status: UnitStatus::Running,
            wake_time: 0.0,
            next_frame: false,
            last_resume_time: now,
            elapsed: 0.0,
            delta_pending: false,
            first_resume: true,
            pending_argc: 0,
            has_pending: false,
            timer_order: None,
            queued: false,
        }
    }

    // Parking keeps `timer_order`: a unit re-parked while sitting in the timer
    // queue is rerouted when its entry surfaces.

    pub fn park_event(&mut self) {
        self.status = UnitStatus::Waiting;
        self.next_frame = false;
        self.wake_time = f64::INFINITY;
    }

    pub fn park_until(&mut self, wake_time: f64) {
        self.status = UnitStatus::Waiting;
        self.next_frame = false;
        self.wake_time = wake_time;
    }

    pub fn park_next_frame(&mut self) {
        self.status = UnitStatus::Waiting;
        self.next_frame = true;
    }

    /// Marks the unit due and records the time elapsed since its last resume.
    pub fn promote(&mut self, now: f64) {
        self.status = UnitStatus::Running;
        self.next_frame = false;
        self.timer_order = None;
        self.elapsed = now - self.last_resume_time;
        self.delta_pending = true;
    }
}

/// One unit universe: the table plus its ready, next-frame and timer queues.
pub(crate) struct Lane<K> {
    pub units: HashMap<K, Unit>,
    pub ready: VecDeque<K>,
    pub next_frame: VecDeque<K>,
    pub timers: TimerQueue<K>,
}

impl<K: Copy + Eq + Hash> Lane<K> {
    pub fn new() -> Self {
        Self {
            units: HashMap::new(),
            ready: VecDeque::new(),
            next_frame: VecDeque::new(),
            timers: TimerQueue::new(),
        }
    }

    pub fn enqueue_ready(&mut self, key: K) {
        if let Some(unit) = self.units.get_mut(&key) {
            if !unit.queued {
                unit.queued = true;
                self.ready.push_back(key);
            }
        }
    }

    pub fn enqueue_next_frame(&mut self, key: K) {
        if let Some(unit) = self.units.get_mut(&key) {
            if !unit.queued {
                unit.queued = true;
                self.next_frame.push_back(key);
            }
        }
    }

    pub fn enqueue_timer(&mut self, key: K) {
        if let Some(unit) = self.units.get_mut(&key) {
            unit.timer_order = Some(self.timers.push(key, unit.wake_time));
        }
    }

    /// Removes a unit and every ready or next-frame entry for it.
    ///
    /// Timer entries are left behind and discarded when they surface.
    pub fn remove(&mut self, key: K) -> Option<Unit> {
        let unit = self.units.remove(&key)?;
        if unit.queued {
            self.ready.retain(|k| *k != key);
            self.next_frame.retain(|k| *k != key);
        }
        Some(unit)
    }

    /// Moves due timer entries to the ready queue. Returns how many were promoted.
    pub fn promote_timers(&mut self, now: f64) -> u32 {
        let mut promoted = 0;
        while let Some(entry) = self.timers.peek() {
            let Some(unit) = self.units.get_mut(&entry.key) else {
                self.timers.pop();
                continue;
            };
            if unit.timer_order != Some(entry.order) {
                // Re-parked or woken since this entry was pushed.
                self.timers.pop();
                continue;
            }
            if unit.status != UnitStatus::Waiting || unit.next_frame {
                log::warn!(
                    "Scheduler: timer entry for a unit that is no longer timer-parked ({}), rerouting to ready",
                    unit.status
                );
                self.timers.pop();
                unit.timer_order = None;
                if !unit.status.is_finished() {
                    unit.status = UnitStatus::Running;
                    unit.next_frame = false;
                    self.enqueue_ready(entry.key);
                }
                continue;
            }
            if unit.wake_time.total_cmp(&entry.wake_time).is_ne() {
                // Re-parked on another time, or on an event, from outside its resume.
                self.timers.pop();
                let wake_time = unit.wake_time;
                unit.timer_order = if wake_time.is_finite() {
                    Some(self.timers.push(entry.key, wake_time))
                } else {
                    None
                };
                continue;
            }
            if unit.wake_time > now {
                break;
            }
            self.timers.pop();
            unit.promote(now);
            self.enqueue_ready(entry.key);
            promoted += 1;
        }
        promoted
    }

    /// Moves every next-frame entry to the ready queue. Returns how many moved.
    pub fn promote_next_frame(&mut self, now: f64) -> u32 {
        let mut promoted = 0;
        while let Some(key) = self.next_frame.pop_front() {
            let Some(unit) = self.units.get_mut(&key) else {
                continue;
            };
            if unit.status.is_finished() {
                unit.queued = false;
                continue;
            }
            unit.promote(now);
            self.ready.push_back(key);
            promoted += 1;
        }
        promoted
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn handle(index: u32) -> ContextHandle {
        ContextHandle {
            index,
            generation: 0,
        }
    }

    fn parked_lane(entries: &[(u32, f64)]) -> Lane<u32> {
        let mut lane = Lane::new();
        for &(key, wake_time) in entries {
            let mut unit = Unit::new(handle(key), None, 0.0);
            unit.park_until(wake_time);
            lane.units.insert(key, unit);
            lane.enqueue_timer(key);
        }
        lane
    }

    #[test]
    fn test_promote_timers_stops_at_first_future_entry() {
        let mut lane = parked_lane(&[(1, 3.0), (2, 1.0), (3, 2.0)]);

        assert_eq!(lane.promote_timers(2.0), 2);
        assert_eq!(lane.ready, VecDeque::from(vec![2, 3]));
        assert_eq!(lane.units[&1].status, UnitStatus::Waiting);
        assert_eq!(lane.timers.len(), 1);
    }

    #[test]
    fn test_promote_records_elapsed() {
        let mut lane = parked_lane(&[(1, 5.0)]);
        lane.units.get_mut(&1).unwrap().last_resume_time = 1.0;

        lane.promote_timers(5.5);
        let unit = &lane.units[&1];
        assert_eq!(unit.status, UnitStatus::Running);
        assert!(unit.delta_pending);
        assert!((unit.elapsed - 4.5).abs() < 1e-12);
    }

    #[test]
    fn test_superseded_timer_entry_is_discarded() {
        let mut lane = parked_lane(&[(1, 1.0)]);
        lane.units.get_mut(&1).unwrap().park_until(10.0);
        lane.enqueue_timer(1);

        assert_eq!(lane.promote_timers(2.0), 0);
        assert!(lane.ready.is_empty());
        assert_eq!(lane.timers.len(), 1);
        assert_eq!(lane.promote_timers(10.0), 1);
    }

    #[test]
    fn test_timer_parked_unit_moved_to_next_frame_is_rerouted_to_ready() {
        let mut lane = parked_lane(&[(1, 5.0)]);
        lane.units.get_mut(&1).unwrap().park_next_frame();

        assert_eq!(lane.promote_timers(1.0), 0);
        assert_eq!(lane.ready, VecDeque::from(vec![1]));
        let unit = &lane.units[&1];
        assert_eq!(unit.status, UnitStatus::Running);
        assert!(unit.timer_order.is_none());
        assert!(lane.timers.is_empty());
    }

    #[test]
    fn test_timer_parked_unit_re_timed_in_place_follows_its_new_time() {
        let mut lane = parked_lane(&[(1, 1.0), (2, 2.5)]);
        lane.units.get_mut(&1).unwrap().park_until(3.0);

        assert_eq!(lane.promote_timers(2.0), 0);
        assert_eq!(lane.timers.len(), 2);
        assert_eq!(lane.promote_timers(2.5), 1);
        assert_eq!(lane.promote_timers(3.0), 1);
        assert_eq!(lane.ready, VecDeque::from(vec![2, 1]));
    }

    #[test]
    fn test_timer_parked_unit_moved_to_event_leaves_the_timer_queue() {
        let mut lane = parked_lane(&[(1, 1.0)]);
        lane.units.get_mut(&1).unwrap().park_event();

        assert_eq!(lane.promote_timers(10.0), 0);
        assert!(lane.ready.is_empty());
        assert!(lane.timers.is_empty());
        assert_eq!(lane.units[&1].status, UnitStatus::Waiting);
    }

    #[test]
    fn test_removed_unit_timer_entry_is_discarded() {
        let mut lane = parked_lane(&[(1, 1.0)]);
        assert!(lane.remove(1).is_some());
        assert_eq!(lane.promote_timers(5.0), 0);
        assert_eq!(lane.timers.len(), 0);
    }

    #[test]
    fn test_enqueue_is_deduplicated() {
        let mut lane = Lane::new();
        lane.units.insert(7u32, Unit::new(handle(7), None, 0.0));
        lane.enqueue_ready(7);
        lane.enqueue_ready(7);
        lane.enqueue_next_frame(7);
        assert_eq!(lane.ready.len(), 1);
        assert!(lane.next_frame.is_empty());
    }

    #[test]
    fn test_remove_purges_queues() {
        let mut lane = Lane::new();
        lane.units.insert(1u32, Unit::new(handle(1), None, 0.0));
        lane.units.insert(2u32, Unit::new(handle(2), None, 0.0));
        lane.enqueue_ready(1);
        lane.enqueue_next_frame(2);

        lane.remove(1);
        lane.remove(2);
        assert!(lane.ready.is_empty());
        assert!(lane.next_frame.is_empty());
        assert!(lane.remove(1).is_none());
    }
}
