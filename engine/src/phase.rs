//! Top-level phase clock: boot → corruption → aftermath.
//!
//! The controller is driven by per-frame [`PhaseController::tick`] calls. Each
//! non-terminal phase has a fixed duration that is *not* adaptively scaled;
//! only the boot log's internal schedule is.

use std::fmt;
use std::time::{Duration, Instant};

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::schedule::BOOT_PHASE_MS;

/// Default corruption phase length.
pub const CORRUPTION_PHASE_MS: u64 = 3_500;

#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, Display, EnumIter,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum Phase {
    Boot,
    Corruption,
    Aftermath,
}

impl Phase {
    /// Total order of phases.
    pub const ORDER: [Phase; 3] = [Phase::Boot, Phase::Corruption, Phase::Aftermath];

    pub fn ordinal(self) -> usize {
        match self {
            Phase::Boot => 0,
            Phase::Corruption => 1,
            Phase::Aftermath => 2,
        }
    }

    pub fn next(self) -> Option<Phase> {
        Self::ORDER.get(self.ordinal() + 1).copied()
    }

    pub fn is_terminal(self) -> bool {
        self.next().is_none()
    }
}

/// Fixed base duration of each phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PhaseDurations {
    pub boot: Duration,
    pub corruption: Duration,
}

impl Default for PhaseDurations {
    fn default() -> Self {
        Self {
            boot: Duration::from_millis(BOOT_PHASE_MS),
            corruption: Duration::from_millis(CORRUPTION_PHASE_MS),
        }
    }
}

impl PhaseDurations {
    pub fn of(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Boot => self.boot,
            Phase::Corruption => self.corruption,
            Phase::Aftermath => Duration::ZERO,
        }
    }
}

/// Snapshot handed to the presentation layer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PhaseState {
    pub current: Phase,
    /// Progress through the current phase in `[0, 1]`.
    pub progress: f64,
    pub elapsed: Duration,
    pub total_elapsed: Duration,
}

impl PhaseState {
    pub fn is_phase(&self, phase: Phase) -> bool {
        self.current == phase
    }

    pub fn is_past_phase(&self, phase: Phase) -> bool {
        self.current.ordinal() > phase.ordinal()
    }
}

/// Whether the frame loop should keep going after a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FrameOutcome {
    Reschedule,
    Finished,
}

type PhaseListener = Box<dyn FnMut(Phase)>;

pub struct PhaseController {
    state: PhaseState,
    durations: PhaseDurations,
    phase_started_at: Instant,
    run_started_at: Instant,
    debug_paused: bool,
    running: bool,
    listener: Option<PhaseListener>,
}

impl fmt::Debug for PhaseController {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PhaseController")
            .field("state", &self.state)
            .field("durations", &self.durations)
            .field("debug_paused", &self.debug_paused)
            .field("running", &self.running)
            .finish_non_exhaustive()
    }
}

impl PhaseController {
    /// Start at `boot` with the frame loop armed.
    pub fn new(durations: PhaseDurations, now: Instant) -> Self {
        Self {
            state: PhaseState {
                current: Phase::Boot,
                progress: 0.0,
                elapsed: Duration::ZERO,
                total_elapsed: Duration::ZERO,
            },
            durations,
            phase_started_at: now,
            run_started_at: now,
            debug_paused: false,
            running: true,
            listener: None,
        }
    }

    /// Reduced-motion entry point: settle on `aftermath` without a clock.
    pub fn skip_to_aftermath(durations: PhaseDurations, now: Instant) -> Self {
        Self {
            state: PhaseState {
                current: Phase::Aftermath,
                progress: 1.0,
                elapsed: Duration::ZERO,
                total_elapsed: Duration::ZERO,
            },
            durations,
            phase_started_at: now,
            run_started_at: now,
            debug_paused: false,
            running: false,
            listener: None,
        }
    }

    /// Pick [`Self::new`] or [`Self::skip_to_aftermath`].
    pub fn start(durations: PhaseDurations, skip_to_aftermath: bool, now: Instant) -> Self {
        if skip_to_aftermath {
            Self::skip_to_aftermath(durations, now)
        } else {
            Self::new(durations, now)
        }
    }

    /// Register the callback fired on every transition.
    pub fn on_phase_change(&mut self, listener: impl FnMut(Phase) + 'static) {
        self.listener = Some(Box::new(listener));
    }

    pub fn state(&self) -> PhaseState {
        self.state
    }

    pub fn current(&self) -> Phase {
        self.state.current
    }

    pub fn progress(&self) -> f64 {
        self.state.progress
    }

    pub fn elapsed(&self) -> Duration {
        self.state.elapsed
    }

    pub fn total_elapsed(&self) -> Duration {
        self.state.total_elapsed
    }

    pub fn durations(&self) -> PhaseDurations {
        self.durations
    }

    pub fn is_phase(&self, phase: Phase) -> bool {
        self.state.is_phase(phase)
    }

    pub fn is_past_phase(&self, phase: Phase) -> bool {
        self.state.is_past_phase(phase)
    }

    /// True while the frame loop wants more ticks.
    pub fn is_running(&self) -> bool {
        self.running
    }

    /// A paused debugger holds the current phase past its duration.
    pub fn set_debug_paused(&mut self, paused: bool) {
        self.debug_paused = paused;
    }

    /// One frame of the clock.
    pub fn tick(&mut self, now: Instant) -> FrameOutcome {
        if !self.running {
            return FrameOutcome::Finished;
        }

        let phase_elapsed = now.saturating_duration_since(self.phase_started_at);
        let duration = self.durations.of(self.state.current);
        self.state.elapsed = phase_elapsed;
        self.state.total_elapsed = now.saturating_duration_since(self.run_started_at);
        self.state.progress = if duration.is_zero() || self.state.current.is_terminal() {
            1.0
        } else {
            (phase_elapsed.as_secs_f64() / duration.as_secs_f64()).min(1.0)
        };

        if self.state.current.is_terminal() {
            self.running = false;
            return FrameOutcome::Finished;
        }

        if phase_elapsed >= duration
            && !self.debug_paused
            && let Some(next) = self.state.current.next()
        {
            self.transition(next, now);
        }

        FrameOutcome::Reschedule
    }

    /// Jump to any phase, forwards or backwards.
    pub fn jump_to_phase(&mut self, phase: Phase, now: Instant) {
        self.transition(phase, now);
    }

    /// Move to the next phase; a no-op at `aftermath`.
    pub fn advance_phase(&mut self, now: Instant) {
        if let Some(next) = self.state.current.next() {
            self.transition(next, now);
        }
    }

    fn transition(&mut self, next: Phase, now: Instant) {
        let from = self.state.current;
        self.state.current = next;
        self.state.progress = 0.0;
        self.state.elapsed = Duration::ZERO;
        self.phase_started_at = now;
        // Entering the terminal phase still takes one frame to settle progress.
        self.running = true;
        tracing::info!(from = %from, phase = %next, "phase transition");
        if let Some(listener) = self.listener.as_mut() {
            listener(next);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::cell::RefCell;
    use std::rc::Rc;

    fn ms(n: u64) -> Duration {
        Duration::from_millis(n)
    }

    #[test]
    fn order_and_queries() {
        assert_eq!(Phase::Boot.next(), Some(Phase::Corruption));
        assert_eq!(Phase::Aftermath.next(), None);
        let t0 = Instant::now();
        let mut pc = PhaseController::new(PhaseDurations::default(), t0);
        pc.jump_to_phase(Phase::Corruption, t0);
        assert!(pc.is_phase(Phase::Corruption));
        assert!(pc.is_past_phase(Phase::Boot));
        assert!(!pc.is_past_phase(Phase::Corruption));
        assert!(!pc.is_past_phase(Phase::Aftermath));
        assert_eq!(Phase::Corruption.to_string(), "corruption");
    }

    #[test]
    fn progress_tracks_elapsed() {
        let t0 = Instant::now();
        let mut pc = PhaseController::new(PhaseDurations::default(), t0);
        assert_eq!(pc.tick(t0 + ms(3_500)), FrameOutcome::Reschedule);
        assert!((pc.progress() - 0.5).abs() < 1e-9);
        assert_eq!(pc.elapsed(), ms(3_500));
        assert_eq!(pc.current(), Phase::Boot);
    }

    #[test]
    fn auto_advances_through_every_phase() {
        let t0 = Instant::now();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let mut pc = PhaseController::new(PhaseDurations::default(), t0);
        let sink = Rc::clone(&seen);
        pc.on_phase_change(move |p| sink.borrow_mut().push(p));

        pc.tick(t0 + ms(7_000));
        assert_eq!(pc.current(), Phase::Corruption);
        assert_eq!(pc.progress(), 0.0);
        assert_eq!(pc.elapsed(), Duration::ZERO);

        pc.tick(t0 + ms(10_500));
        assert_eq!(pc.current(), Phase::Aftermath);
        assert!(pc.is_running());

        assert_eq!(pc.tick(t0 + ms(10_516)), FrameOutcome::Finished);
        assert_eq!(pc.progress(), 1.0);
        assert!(!pc.is_running());
        assert_eq!(pc.total_elapsed(), ms(10_516));
        assert_eq!(*seen.borrow(), vec![Phase::Corruption, Phase::Aftermath]);
    }

    #[test]
    fn debug_pause_holds_phase() {
        let t0 = Instant::now();
        let mut pc = PhaseController::new(PhaseDurations::default(), t0);
        pc.set_debug_paused(true);
        pc.tick(t0 + ms(20_000));
        assert_eq!(pc.current(), Phase::Boot);
        assert_eq!(pc.progress(), 1.0);

        pc.set_debug_paused(false);
        pc.tick(t0 + ms(20_016));
        assert_eq!(pc.current(), Phase::Corruption);
    }

    #[test]
    fn manual_jumps_reset_the_clock() {
        let t0 = Instant::now();
        let mut pc = PhaseController::new(PhaseDurations::default(), t0);
        pc.tick(t0 + ms(1_000));
        pc.jump_to_phase(Phase::Corruption, t0 + ms(1_000));
        assert_eq!(pc.current(), Phase::Corruption);
        assert_eq!(pc.progress(), 0.0);

        pc.tick(t0 + ms(1_700));
        assert!((pc.progress() - 0.2).abs() < 1e-9);

        pc.jump_to_phase(Phase::Boot, t0 + ms(2_000));
        assert_eq!(pc.current(), Phase::Boot);
        assert_eq!(pc.elapsed(), Duration::ZERO);
    }

    #[test]
    fn advance_from_aftermath_is_noop() {
        let t0 = Instant::now();
        let seen = Rc::new(RefCell::new(0));
        let mut pc = PhaseController::skip_to_aftermath(PhaseDurations::default(), t0);
        let sink = Rc::clone(&seen);
        pc.on_phase_change(move |_| *sink.borrow_mut() += 1);
        pc.advance_phase(t0 + ms(10));
        assert_eq!(pc.current(), Phase::Aftermath);
        assert_eq!(*seen.borrow(), 0);
    }

    #[test]
    fn skip_to_aftermath_never_starts_the_clock() {
        let t0 = Instant::now();
        let mut pc = PhaseController::start(PhaseDurations::default(), true, t0);
        assert_eq!(pc.current(), Phase::Aftermath);
        assert_eq!(pc.progress(), 1.0);
        assert!(!pc.is_running());
        assert_eq!(pc.tick(t0 + ms(60_000)), FrameOutcome::Finished);
        assert_eq!(pc.elapsed(), Duration::ZERO);
        assert_eq!(pc.total_elapsed(), Duration::ZERO);
    }

    #[test]
    fn jumping_back_from_aftermath_rearms_the_loop() {
        let t0 = Instant::now();
        let mut pc = PhaseController::skip_to_aftermath(PhaseDurations::default(), t0);
        pc.jump_to_phase(Phase::Boot, t0 + ms(5));
        assert!(pc.is_running());
        assert_eq!(pc.tick(t0 + ms(10)), FrameOutcome::Reschedule);
    }
}
