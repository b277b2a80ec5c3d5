//! Key-to-command dispatch table for the step-debugger.
//!
//! Every row is `(binding, modes, command)`. A key that matches a binding
//! but not the current mode is still swallowed, so F5 or F11 never reach
//! the terminal while the sequence is on screen.

use crossterm::event::{KeyCode, KeyEvent};
use lostpage_engine::DebugMode;

use crate::key_hint::{KeyBinding, ctrl, ctrl_shift, plain, shift};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DebugCommand {
    Enable,
    Continue,
    Pause,
    StepOver,
    StepInto,
    StepOut,
    StepBack,
    Stop,
    Fold,
    Unfold,
    Quit,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOutcome {
    Run(DebugCommand),
    /// Bound key pressed in a mode where it does nothing.
    Swallow,
    Ignore,
}

#[derive(Debug, Clone, Copy)]
pub struct Binding {
    pub key: KeyBinding,
    pub modes: &'static [DebugMode],
    pub command: DebugCommand,
    pub hint: &'static str,
}

const ANY: &[DebugMode] = &[DebugMode::Disabled, DebugMode::Running, DebugMode::Paused];
const DISABLED: &[DebugMode] = &[DebugMode::Disabled];
const RUNNING: &[DebugMode] = &[DebugMode::Running];
const PAUSED: &[DebugMode] = &[DebugMode::Paused];
const ENABLED: &[DebugMode] = &[DebugMode::Running, DebugMode::Paused];

/// Shifted function keys come before their plain forms.
pub const BINDINGS: &[Binding] = &[
    Binding {
        key: plain(KeyCode::F(5)),
        modes: DISABLED,
        command: DebugCommand::Enable,
        hint: "debug",
    },
    Binding {
        key: plain(KeyCode::F(5)),
        modes: PAUSED,
        command: DebugCommand::Continue,
        hint: "continue",
    },
    Binding {
        key: plain(KeyCode::F(6)),
        modes: RUNNING,
        command: DebugCommand::Pause,
        hint: "pause",
    },
    Binding {
        key: shift(KeyCode::F(10)),
        modes: PAUSED,
        command: DebugCommand::StepBack,
        hint: "step back",
    },
    Binding {
        key: plain(KeyCode::F(10)),
        modes: PAUSED,
        command: DebugCommand::StepOver,
        hint: "step over",
    },
    Binding {
        key: shift(KeyCode::F(11)),
        modes: PAUSED,
        command: DebugCommand::StepOut,
        hint: "step out",
    },
    Binding {
        key: plain(KeyCode::F(11)),
        modes: PAUSED,
        command: DebugCommand::StepInto,
        hint: "step into",
    },
    Binding {
        key: plain(KeyCode::Esc),
        modes: ANY,
        command: DebugCommand::Stop,
        hint: "stop",
    },
    Binding {
        key: ctrl_shift(KeyCode::Char('d')),
        modes: DISABLED,
        command: DebugCommand::Enable,
        hint: "debug",
    },
    Binding {
        key: plain(KeyCode::Char('-')),
        modes: PAUSED,
        command: DebugCommand::Fold,
        hint: "fold",
    },
    Binding {
        key: plain(KeyCode::Char('+')),
        modes: PAUSED,
        command: DebugCommand::Unfold,
        hint: "unfold",
    },
    Binding {
        key: plain(KeyCode::Char('q')),
        modes: ANY,
        command: DebugCommand::Quit,
        hint: "quit",
    },
    Binding {
        key: ctrl(KeyCode::Char('c')),
        modes: ANY,
        command: DebugCommand::Quit,
        hint: "quit",
    },
];

pub fn dispatch(event: KeyEvent, mode: DebugMode) -> KeyOutcome {
    let mut swallowed = false;
    for binding in BINDINGS.iter().filter(|b| b.key.is_press(event)) {
        if binding.modes.contains(&mode) {
            return KeyOutcome::Run(binding.command);
        }
        swallowed = true;
    }
    if swallowed {
        KeyOutcome::Swallow
    } else {
        KeyOutcome::Ignore
    }
}

/// Footer hints for `mode`, one per command. Escape is only offered once
/// the debugger is on.
pub fn hints(mode: DebugMode) -> Vec<&'static Binding> {
    let mut seen: Vec<DebugCommand> = Vec::new();
    BINDINGS
        .iter()
        .filter(|b| b.modes.contains(&mode))
        .filter(|b| b.command != DebugCommand::Stop || ENABLED.contains(&mode))
        .filter(|b| {
            if seen.contains(&b.command) {
                false
            } else {
                seen.push(b.command);
                true
            }
        })
        .collect()
}
