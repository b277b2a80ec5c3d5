//! Timing and state-machine core for the lostpage "404" sequence.
//!
//! The sequence plays a fake browser boot log, corrupts it, then settles on a
//! randomly chosen programming-error visualization. A step-debugger can pause
//! the boot log and walk it like a call tree.
//!
//! Everything here is in-process state transformation: time is always passed
//! in as an [`std::time::Instant`] and nothing blocks. Front-ends feed in
//! [`Context`] facts and pointer/key events, and read back phase, progress and
//! the visible slice of the log.

#![deny(clippy::print_stdout, clippy::print_stderr)]

pub mod aftermath;
pub mod animator;
pub mod boot_log;
pub mod config;
pub mod context;
pub mod debugger;
pub mod error;
pub mod glitch;
pub mod influence;
pub mod message;
pub mod phase;
pub mod schedule;
pub mod scheduler;
pub mod store;

pub use aftermath::{ErrorVisualization, choose_visualization, visualization_at};
pub use animator::{BootAnimator, BootFrame, CursorBlink, DepthLimit, Playhead, StageProgress};
pub use boot_log::create_messages;
pub use config::{AppConfig, ConfigLoader};
pub use context::{ConnectionFacts, Context, DomSnapshot, TimingFacts};
pub use debugger::{DEBUG_MODE_KEY, DebugMode, DebugState, StepDebugger};
pub use error::{EngineError, Result};
pub use glitch::GlitchField;
pub use influence::{InfluenceParams, MouseInfluence};
pub use message::{
    FlattenedMessage, Message, MessageKind, MessageText, ResolvedMessage, flatten, resolve_text,
};
pub use phase::{Phase, PhaseController, PhaseDurations, PhaseState};
pub use schedule::{AdaptiveScale, BASE_DURATION_MS, ProgressStage, scale};
pub use scheduler::{CancelFlag, FrameScheduler, TimerId};
pub use store::{FileFlagStore, FlagStore, MemoryFlagStore};

/// Engine version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
