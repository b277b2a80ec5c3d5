//! Application state: the engine pieces wired to a frame scheduler.
//!
//! `mount` registers every loop and listener, `unmount` tears all of them
//! down. Between the two, the event loop calls [`App::poll`] and forwards
//! key and mouse events.

use std::cell::RefCell;
use std::collections::VecDeque;
use std::rc::Rc;
use std::time::{Duration, Instant};

use crossterm::event::KeyEvent;
use lostpage_engine::aftermath::{ErrorVisualization, choose_visualization};
use lostpage_engine::phase::FrameOutcome;
use lostpage_engine::{
    AppConfig, BootAnimator, BootFrame, CancelFlag, Context, CursorBlink, DebugMode, DepthLimit,
    FlagStore, FrameScheduler, GlitchField, InfluenceParams, MessageKind, MouseInfluence, Phase,
    PhaseController, Playhead, StepDebugger, TimerId, create_messages,
};
use rand::SeedableRng;
use rand::rngs::StdRng;

use crate::keymap::{self, DebugCommand, KeyOutcome};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AppTask {
    PhaseFrame,
    DebugResync,
    CursorBlink,
    Glitch,
}

/// Registrations made at mount time.
#[derive(Debug, Default)]
struct Mounted {
    phase_frame: Option<TimerId>,
    resync: Option<TimerId>,
    blink: Option<TimerId>,
    glitch: Option<(TimerId, CancelFlag)>,
    keys: bool,
    mouse: bool,
}

/// What the debugger panel shows for the cursor line.
#[derive(Debug, Clone, PartialEq)]
pub struct Inspection {
    pub mode: DebugMode,
    pub index: usize,
    pub total: usize,
    pub id: String,
    pub kind: MessageKind,
    pub depth: usize,
    pub text: String,
    pub depth_limit: DepthLimit,
    /// Ancestor ids, outermost first.
    pub call_stack: Vec<String>,
}

impl Inspection {
    /// The cursor line is deeper than the current fold.
    pub fn is_folded(&self) -> bool {
        !self.depth_limit.allows(self.depth)
    }
}

pub struct App<S: FlagStore> {
    animator: BootAnimator,
    phase: PhaseController,
    debugger: StepDebugger<S>,
    scheduler: FrameScheduler<AppTask>,
    influence: MouseInfluence,
    glitch: GlitchField,
    blink: CursorBlink,
    visualization: &'static ErrorVisualization,
    phase_changes: Rc<RefCell<VecDeque<Phase>>>,
    mounted: Mounted,
    blink_interval: Duration,
    glitch_interval: Duration,
    should_quit: bool,
}

impl<S: FlagStore> App<S> {
    pub fn new(config: &AppConfig, context: Context, store: S, seed: u64, now: Instant) -> Self {
        let animator = BootAnimator::new(&create_messages(), context);
        let debugger = StepDebugger::new(animator.depths(), store);
        let mut phase =
            PhaseController::start(config.phase_durations(), config.display.reduced_motion, now);

        let phase_changes = Rc::new(RefCell::new(VecDeque::new()));
        let sink = Rc::clone(&phase_changes);
        phase.on_phase_change(move |next| sink.borrow_mut().push_back(next));

        let mut rng = StdRng::seed_from_u64(seed);
        Self {
            animator,
            phase,
            debugger,
            scheduler: FrameScheduler::new(config.frame_interval()),
            influence: MouseInfluence::new(),
            glitch: GlitchField::new(seed),
            blink: CursorBlink::default(),
            visualization: choose_visualization(&mut rng),
            phase_changes,
            mounted: Mounted::default(),
            blink_interval: config.cursor_blink_interval(),
            glitch_interval: config.glitch_interval(),
            should_quit: false,
        }
    }

    pub fn mount(&mut self, now: Instant) {
        self.mounted.keys = true;
        self.mounted.mouse = true;
        if self.phase.is_running() {
            self.mounted.phase_frame = Some(self.scheduler.request_frame(AppTask::PhaseFrame, now));
        }
        // Attach now if lines are already live; otherwise poll each frame.
        let live = self.live_visible_count();
        if self.debugger.is_enabled() && !self.debugger.attach(live) {
            self.mounted.resync = Some(self.scheduler.request_frame(AppTask::DebugResync, now));
        }
        self.mounted.blink =
            Some(self.scheduler.set_interval(AppTask::CursorBlink, self.blink_interval, now));
        if self.phase.is_phase(Phase::Corruption) {
            self.start_glitch(now);
        }
        tracing::debug!(
            timers = self.scheduler.active_count(),
            phase = %self.phase.current(),
            "mounted"
        );
    }

    pub fn unmount(&mut self) {
        let mounted = std::mem::take(&mut self.mounted);
        let timers = [mounted.phase_frame, mounted.resync, mounted.blink];
        for id in timers.into_iter().flatten() {
            self.scheduler.cancel(id);
        }
        if let Some((id, cancelled)) = mounted.glitch {
            cancelled.cancel();
            self.scheduler.cancel(id);
        }
        tracing::debug!(leftover = self.scheduler.active_count(), "unmounted");
    }

    pub fn is_mounted(&self) -> bool {
        self.mounted.keys || self.mounted.mouse
    }

    pub fn active_timers(&self) -> usize {
        self.scheduler.active_count()
    }

    pub fn next_deadline(&self) -> Option<Instant> {
        self.scheduler.next_deadline()
    }

    pub fn should_quit(&self) -> bool {
        self.should_quit
    }

    /// Run every task due at `now`.
    pub fn poll(&mut self, now: Instant) {
        for (id, task) in self.scheduler.poll(now) {
            self.on_task(id, task, now);
        }
    }

    fn on_task(&mut self, id: TimerId, task: AppTask, now: Instant) {
        match task {
            AppTask::PhaseFrame => {
                self.mounted.phase_frame = None;
                self.phase.set_debug_paused(self.debugger.is_paused());
                if self.phase.tick(now) == FrameOutcome::Reschedule {
                    self.mounted.phase_frame =
                        Some(self.scheduler.request_frame(AppTask::PhaseFrame, now));
                }
                self.drain_phase_changes(now);
            }
            AppTask::DebugResync => {
                self.mounted.resync = None;
                let live = self.live_visible_count();
                if !self.debugger.is_enabled() || self.debugger.attach(live) {
                    return;
                }
                self.mounted.resync = Some(self.scheduler.request_frame(AppTask::DebugResync, now));
            }
            AppTask::CursorBlink => self.blink.toggle(),
            AppTask::Glitch => match &self.mounted.glitch {
                Some((glitch_id, cancelled)) if *glitch_id == id && !cancelled.is_cancelled() => {
                    self.glitch.reshuffle();
                }
                _ => {}
            },
        }
    }

    fn drain_phase_changes(&mut self, now: Instant) {
        let changes: Vec<Phase> = self.phase_changes.borrow_mut().drain(..).collect();
        for phase in changes {
            match phase {
                Phase::Corruption => self.start_glitch(now),
                Phase::Boot | Phase::Aftermath => self.stop_glitch(),
            }
        }
    }

    fn start_glitch(&mut self, now: Instant) {
        if self.mounted.glitch.is_some() {
            return;
        }
        let id = self
            .scheduler
            .set_interval(AppTask::Glitch, self.glitch_interval, now);
        self.mounted.glitch = Some((id, CancelFlag::new()));
    }

    fn cancel_resync(&mut self) {
        if let Some(id) = self.mounted.resync.take() {
            self.scheduler.cancel(id);
        }
    }

    fn stop_glitch(&mut self) {
        if let Some((id, cancelled)) = self.mounted.glitch.take() {
            cancelled.cancel();
            self.scheduler.cancel(id);
        }
    }

    /// Handle a key press. Returns whether the key was consumed.
    pub fn handle_key(&mut self, event: KeyEvent) -> bool {
        if !self.mounted.keys {
            return false;
        }
        match keymap::dispatch(event, self.debugger.mode()) {
            KeyOutcome::Run(command) => {
                self.run_command(command);
                true
            }
            KeyOutcome::Swallow => true,
            KeyOutcome::Ignore => false,
        }
    }

    pub fn run_command(&mut self, command: DebugCommand) {
        let live = self.live_visible_count();
        // Once the user places the cursor, the mount-time resync must not move it.
        if matches!(
            command,
            DebugCommand::Enable
                | DebugCommand::Pause
                | DebugCommand::StepOver
                | DebugCommand::StepInto
                | DebugCommand::StepOut
                | DebugCommand::StepBack
                | DebugCommand::Stop
        ) {
            self.cancel_resync();
        }
        match command {
            DebugCommand::Enable => self.debugger.enable(live),
            DebugCommand::Continue => {
                self.debugger.continue_run();
            }
            DebugCommand::Pause => {
                self.debugger.pause(live);
            }
            DebugCommand::StepOver => {
                self.debugger.step_over();
            }
            DebugCommand::StepInto => {
                self.debugger.step_into();
            }
            DebugCommand::StepOut => {
                self.debugger.step_out();
            }
            DebugCommand::StepBack => {
                self.debugger.step_back();
            }
            DebugCommand::Stop => self.debugger.stop(),
            DebugCommand::Fold => {
                self.debugger.fold();
            }
            DebugCommand::Unfold => {
                self.debugger.unfold();
            }
            DebugCommand::Quit => self.should_quit = true,
        }
        self.phase.set_debug_paused(self.debugger.is_paused());
        tracing::debug!(?command, mode = self.debugger.mode().label(), "debugger command");
    }

    pub fn handle_mouse_move(&mut self, column: u16, row: u16, now: Instant) {
        if self.mounted.mouse {
            self.influence.on_move(column, row, now);
        }
    }

    pub fn phase(&self) -> &PhaseController {
        &self.phase
    }

    pub fn debugger(&self) -> &StepDebugger<S> {
        &self.debugger
    }

    pub fn animator(&self) -> &BootAnimator {
        &self.animator
    }

    pub fn glitch(&self) -> &GlitchField {
        &self.glitch
    }

    pub fn visualization(&self) -> &'static ErrorVisualization {
        self.visualization
    }

    pub fn pointer(&self) -> Option<(u16, u16)> {
        self.influence.position()
    }

    pub fn influence(&self, now: Instant) -> InfluenceParams {
        self.influence.params(self.phase.current(), now)
    }

    pub fn cursor_visible(&self) -> bool {
        self.blink.visible(self.debugger.is_paused())
    }

    /// Boot log clock. Once boot is over every line stays visible.
    pub fn boot_elapsed_ms(&self) -> f64 {
        if self.phase.is_phase(Phase::Boot) {
            self.phase.elapsed().as_secs_f64() * 1_000.0
        } else {
            self.animator.scaled_total_ms()
        }
    }

    /// Lines the clock alone would show right now.
    pub fn live_visible_count(&self) -> usize {
        self.animator
            .visible_count_at(self.boot_elapsed_ms(), DepthLimit::Unlimited)
    }

    pub fn boot_frame(&self) -> BootFrame {
        let playhead = self.debugger.playhead().unwrap_or(Playhead::Clock {
            elapsed_ms: self.boot_elapsed_ms(),
        });
        self.animator.project(playhead, self.debugger.depth_limit())
    }

    pub fn inspection(&self) -> Option<Inspection> {
        if !self.debugger.is_enabled() {
            return None;
        }
        let messages = self.animator.messages();
        let current = messages.get(self.debugger.index())?;
        let context = self.animator.context();
        Some(Inspection {
            mode: self.debugger.mode(),
            index: self.debugger.index(),
            total: self.debugger.total(),
            id: current.id.clone(),
            kind: current.kind,
            depth: current.depth,
            text: current.resolve(context).text,
            depth_limit: self.debugger.depth_limit(),
            call_stack: self
                .debugger
                .call_stack()
                .into_iter()
                .filter_map(|i| messages.get(i).map(|m| m.id.clone()))
                .collect(),
        })
    }
}
