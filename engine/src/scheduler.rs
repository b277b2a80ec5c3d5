//! Cooperative frame and timer scheduling.
//!
//! The front-end's event loop polls a [`FrameScheduler`] with the current
//! time and dispatches whatever task tags fired. Nothing runs on its own
//! thread. Every registration returns a [`TimerId`] so it can be cancelled,
//! and [`FrameScheduler::active_count`] makes leaks visible in tests.

use std::cell::Cell;
use std::rc::Rc;
use std::time::{Duration, Instant};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TimerId(u64);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Cadence {
    Once,
    Every(Duration),
}

#[derive(Debug, Clone)]
struct Timer<T> {
    id: TimerId,
    task: T,
    due: Instant,
    cadence: Cadence,
}

#[derive(Debug)]
pub struct FrameScheduler<T> {
    timers: Vec<Timer<T>>,
    next_id: u64,
    frame_interval: Duration,
}

impl<T: Clone> FrameScheduler<T> {
    pub fn new(frame_interval: Duration) -> Self {
        Self {
            timers: Vec::new(),
            next_id: 0,
            frame_interval,
        }
    }

    fn push(&mut self, task: T, due: Instant, cadence: Cadence) -> TimerId {
        let id = TimerId(self.next_id);
        self.next_id += 1;
        self.timers.push(Timer {
            id,
            task,
            due,
            cadence,
        });
        id
    }

    /// One-shot callback on the next frame.
    pub fn request_frame(&mut self, task: T, now: Instant) -> TimerId {
        let due = now + self.frame_interval;
        self.push(task, due, Cadence::Once)
    }

    /// Repeating timer. A zero period is bumped to one frame.
    pub fn set_interval(&mut self, task: T, period: Duration, now: Instant) -> TimerId {
        let period = if period.is_zero() {
            self.frame_interval
        } else {
            period
        };
        self.push(task, now + period, Cadence::Every(period))
    }

    /// Cancel a pending timer. Returns false if it already fired or was
    /// cancelled.
    pub fn cancel(&mut self, id: TimerId) -> bool {
        let before = self.timers.len();
        self.timers.retain(|t| t.id != id);
        self.timers.len() != before
    }

    pub fn active_count(&self) -> usize {
        self.timers.len()
    }

    /// Earliest pending deadline.
    pub fn next_deadline(&self) -> Option<Instant> {
        self.timers.iter().map(|t| t.due).min()
    }

    /// Fire everything due at `now`, in deadline order. One-shot timers are
    /// dropped; intervals re-arm one period after `now` if they fell behind.
    pub fn poll(&mut self, now: Instant) -> Vec<(TimerId, T)> {
        let mut due: Vec<(Instant, TimerId, T)> = Vec::new();
        self.timers.retain_mut(|timer| {
            if timer.due > now {
                return true;
            }
            due.push((timer.due, timer.id, timer.task.clone()));
            match timer.cadence {
                Cadence::Once => false,
                Cadence::Every(period) => {
                    let next = timer.due + period;
                    timer.due = if next <= now { now + period } else { next };
                    true
                }
            }
        });
        due.sort_by_key(|(at, id, _)| (*at, *id));
        due.into_iter().map(|(_, id, task)| (id, task)).collect()
    }
}

/// Shared flag for cooperative cancellation: the owner of a loop checks it
/// before acting on each tick.
#[derive(Debug, Clone, Default)]
pub struct CancelFlag(Rc<Cell<bool>>);

impl CancelFlag {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn cancel(&self) {
        self.0.set(true);
    }

    pub fn is_cancelled(&self) -> bool {
        self.0.get()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    enum Task {
        Frame,
        Blink,
        Once,
    }

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    fn tasks(fired: Vec<(TimerId, Task)>) -> Vec<Task> {
        fired.into_iter().map(|(_, t)| t).collect()
    }

    #[test]
    fn frames_fire_once() {
        let t0 = Instant::now();
        let mut sched = FrameScheduler::new(ms(16));
        sched.request_frame(Task::Frame, t0);
        assert!(sched.poll(t0 + ms(10)).is_empty());
        assert_eq!(tasks(sched.poll(t0 + ms(16))), vec![Task::Frame]);
        assert_eq!(sched.active_count(), 0);
    }

    #[test]
    fn intervals_rearm_and_fire_in_order() {
        let t0 = Instant::now();
        let mut sched = FrameScheduler::new(ms(16));
        sched.set_interval(Task::Blink, ms(500), t0);
        sched.request_frame(Task::Once, t0 + ms(384));
        assert_eq!(tasks(sched.poll(t0 + ms(500))), vec![Task::Once, Task::Blink]);
        assert_eq!(sched.active_count(), 1);
        assert_eq!(sched.next_deadline(), Some(t0 + ms(1_000)));

        // Falling far behind re-arms relative to now instead of bursting.
        assert_eq!(tasks(sched.poll(t0 + ms(5_000))), vec![Task::Blink]);
        assert_eq!(sched.next_deadline(), Some(t0 + ms(5_500)));
    }

    #[test]
    fn cancel_removes_timer() {
        let t0 = Instant::now();
        let mut sched = FrameScheduler::new(ms(16));
        let id = sched.set_interval(Task::Blink, ms(100), t0);
        assert_eq!(sched.active_count(), 1);
        assert!(sched.cancel(id));
        assert!(!sched.cancel(id));
        assert!(sched.poll(t0 + ms(1_000)).is_empty());
    }

    #[test]
    fn zero_period_uses_frame_interval() {
        let t0 = Instant::now();
        let mut sched = FrameScheduler::new(ms(16));
        sched.set_interval(Task::Blink, Duration::ZERO, t0);
        assert_eq!(sched.next_deadline(), Some(t0 + ms(16)));
    }

    #[test]
    fn cancel_flag_is_shared() {
        let flag = CancelFlag::new();
        let seen_by_loop = flag.clone();
        assert!(!seen_by_loop.is_cancelled());
        flag.cancel();
        assert!(seen_by_loop.is_cancelled());
    }
}
