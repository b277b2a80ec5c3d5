//! IDE-style step-debugger over the flattened boot log.
//!
//! The debugger is a three-state machine (disabled, running, paused) with an
//! integer cursor into the pre-order message sequence. The step verbs move
//! the cursor using only the depth of each entry:
//!
//! - **step over**: next entry at the same depth or shallower
//! - **step into**: the very next entry
//! - **step out**: next entry strictly shallower
//! - **step back**: the previous entry
//!
//! Only the enabled flag is persisted. The cursor is never restored from
//! storage; it is synchronized to however many lines are already live.

use crate::animator::{DepthLimit, Playhead};
use crate::store::FlagStore;

/// Storage key holding `"true"` while the debugger is enabled.
pub const DEBUG_MODE_KEY: &str = "lostpage-debug-mode";

const ENABLED_VALUE: &str = "true";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DebugState {
    pub is_enabled: bool,
    pub is_paused: bool,
    pub debug_index: usize,
    pub max_visible_depth: DepthLimit,
}

impl Default for DebugState {
    fn default() -> Self {
        Self {
            is_enabled: false,
            is_paused: false,
            debug_index: 0,
            max_visible_depth: DepthLimit::Unlimited,
        }
    }
}

/// Coarse state used for key dispatch and display.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DebugMode {
    Disabled,
    Running,
    Paused,
}

impl DebugMode {
    pub fn label(self) -> &'static str {
        match self {
            DebugMode::Disabled => "disabled",
            DebugMode::Running => "running",
            DebugMode::Paused => "paused",
        }
    }
}

pub struct StepDebugger<S: FlagStore> {
    state: DebugState,
    depths: Vec<usize>,
    store: S,
}

impl<S: FlagStore> std::fmt::Debug for StepDebugger<S> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("StepDebugger")
            .field("state", &self.state)
            .field("total", &self.depths.len())
            .finish_non_exhaustive()
    }
}

impl<S: FlagStore> StepDebugger<S> {
    /// Build a debugger over a sequence with the given per-entry depths. The
    /// persisted flag is read exactly once, here.
    pub fn new(depths: Vec<usize>, store: S) -> Self {
        let restored = store.get(DEBUG_MODE_KEY).as_deref() == Some(ENABLED_VALUE);
        if restored {
            tracing::debug!("debugger restored from persisted flag");
        }
        Self {
            state: DebugState {
                is_enabled: restored,
                ..DebugState::default()
            },
            depths,
            store,
        }
    }

    pub fn state(&self) -> DebugState {
        self.state
    }

    pub fn mode(&self) -> DebugMode {
        match (self.state.is_enabled, self.state.is_paused) {
            (false, _) => DebugMode::Disabled,
            (true, false) => DebugMode::Running,
            (true, true) => DebugMode::Paused,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.state.is_enabled
    }

    pub fn is_paused(&self) -> bool {
        self.state.is_enabled && self.state.is_paused
    }

    pub fn index(&self) -> usize {
        self.state.debug_index
    }

    pub fn total(&self) -> usize {
        self.depths.len()
    }

    pub fn depths(&self) -> &[usize] {
        &self.depths
    }

    pub fn current_depth(&self) -> Option<usize> {
        self.depths.get(self.state.debug_index).copied()
    }

    /// Cursor mode while paused, clock mode otherwise.
    pub fn playhead(&self) -> Option<Playhead> {
        self.is_paused().then_some(Playhead::Cursor {
            index: self.state.debug_index,
        })
    }

    pub fn depth_limit(&self) -> DepthLimit {
        self.state.max_visible_depth
    }

    fn last_index(&self) -> usize {
        self.depths.len().saturating_sub(1)
    }

    fn synced_index(&self, live_visible_count: usize) -> usize {
        live_visible_count.saturating_sub(1).min(self.last_index())
    }

    /// Wire the debugger to a running animator. When the debugger came back
    /// enabled from storage and lines are already streaming, jump the cursor
    /// to the newest live line. Returns whether the cursor moved. A paused
    /// cursor belongs to the user and is never moved.
    pub fn attach(&mut self, live_visible_count: usize) -> bool {
        if !self.state.is_enabled || self.state.is_paused || live_visible_count <= 1 {
            return false;
        }
        self.state.debug_index = self.synced_index(live_visible_count);
        tracing::debug!(index = self.state.debug_index, "debugger resynchronized");
        true
    }

    /// Enable and pause on the newest live line.
    pub fn enable(&mut self, live_visible_count: usize) {
        self.state = DebugState {
            is_enabled: true,
            is_paused: true,
            debug_index: self.synced_index(live_visible_count),
            max_visible_depth: DepthLimit::Unlimited,
        };
        if let Err(err) = self.store.set(DEBUG_MODE_KEY, ENABLED_VALUE) {
            tracing::warn!("failed to persist debug flag: {err}");
        }
        tracing::debug!(index = self.state.debug_index, "debugger enabled");
    }

    /// Resume clock-driven playback.
    pub fn continue_run(&mut self) -> bool {
        if !self.state.is_enabled {
            return false;
        }
        self.state.is_paused = false;
        self.state.max_visible_depth = DepthLimit::Unlimited;
        tracing::debug!("debugger continue");
        true
    }

    /// Pause on the newest live line.
    pub fn pause(&mut self, live_visible_count: usize) -> bool {
        if self.mode() != DebugMode::Running {
            return false;
        }
        self.state.is_paused = true;
        self.state.debug_index = self.synced_index(live_visible_count);
        tracing::debug!(index = self.state.debug_index, "debugger paused");
        true
    }

    fn move_to(&mut self, index: usize, verb: &'static str) {
        self.state.debug_index = index;
        tracing::debug!(
            verb,
            index,
            depth = self.current_depth().unwrap_or_default(),
            "debugger step"
        );
    }

    /// Skip the current entry's descendants.
    pub fn step_over(&mut self) -> bool {
        if !self.is_paused() {
            return false;
        }
        let Some(depth) = self.current_depth() else {
            return false;
        };
        let from = self.state.debug_index;
        if let Some(next) = self.find_forward(from, |d| d <= depth) {
            self.move_to(next, "over");
        }
        true
    }

    /// Advance one entry; at the last entry this resumes playback instead.
    pub fn step_into(&mut self) -> bool {
        if !self.is_paused() {
            return false;
        }
        if self.state.debug_index >= self.last_index() {
            return self.continue_run();
        }
        self.move_to(self.state.debug_index + 1, "into");
        true
    }

    /// Leave the current entry's parent.
    pub fn step_out(&mut self) -> bool {
        if !self.is_paused() {
            return false;
        }
        let Some(depth) = self.current_depth() else {
            return false;
        };
        let from = self.state.debug_index;
        if let Some(next) = self.find_forward(from, |d| d < depth) {
            self.move_to(next, "out");
        }
        true
    }

    pub fn step_back(&mut self) -> bool {
        if !self.is_paused() {
            return false;
        }
        self.move_to(self.state.debug_index.saturating_sub(1), "back");
        true
    }

    /// Fold the view to at most `limit` levels while paused.
    pub fn set_max_visible_depth(&mut self, limit: DepthLimit) -> bool {
        if !self.is_paused() {
            return false;
        }
        self.state.max_visible_depth = limit;
        true
    }

    /// Hide one more nesting level, starting from the deepest level in the log.
    pub fn fold(&mut self) -> bool {
        let deepest = self.depths.iter().copied().max().unwrap_or_default();
        let next = match self.state.max_visible_depth {
            DepthLimit::Unlimited => deepest.saturating_sub(1),
            DepthLimit::Max(max) => max.saturating_sub(1),
        };
        self.set_max_visible_depth(DepthLimit::Max(next))
    }

    /// Show one more level; past the deepest entry the limit is lifted.
    pub fn unfold(&mut self) -> bool {
        let deepest = self.depths.iter().copied().max().unwrap_or_default();
        let next = match self.state.max_visible_depth {
            DepthLimit::Unlimited => DepthLimit::Unlimited,
            DepthLimit::Max(max) if max + 1 >= deepest => DepthLimit::Unlimited,
            DepthLimit::Max(max) => DepthLimit::Max(max + 1),
        };
        self.set_max_visible_depth(next)
    }

    /// Disable and forget the persisted flag.
    pub fn stop(&mut self) {
        self.state = DebugState::default();
        if let Err(err) = self.store.remove(DEBUG_MODE_KEY) {
            tracing::warn!("failed to clear debug flag: {err}");
        }
        tracing::debug!("debugger stopped");
    }

    /// Indices of the cursor's ancestors, outermost first.
    pub fn call_stack(&self) -> Vec<usize> {
        call_stack(&self.depths, self.state.debug_index)
    }

    fn find_forward(&self, from: usize, accept: impl Fn(usize) -> bool) -> Option<usize> {
        self.depths
            .iter()
            .enumerate()
            .skip(from + 1)
            .find(|(_, depth)| accept(**depth))
            .map(|(i, _)| i)
    }
}

/// Ancestors of `index` in a pre-order depth sequence, outermost first.
pub fn call_stack(depths: &[usize], index: usize) -> Vec<usize> {
    let Some(mut wanted) = depths.get(index).copied() else {
        return Vec::new();
    };
    let mut stack = Vec::with_capacity(wanted);
    for i in (0..index).rev() {
        if wanted == 0 {
            break;
        }
        if let Some(&depth) = depths.get(i)
            && depth < wanted
        {
            stack.push(i);
            wanted = depth;
        }
    }
    stack.reverse();
    stack
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::MemoryFlagStore;
    use pretty_assertions::assert_eq;

    const DEPTHS: [usize; 6] = [0, 1, 1, 2, 0, 1];

    fn paused_at(index: usize) -> StepDebugger<MemoryFlagStore> {
        let mut dbg = StepDebugger::new(DEPTHS.to_vec(), MemoryFlagStore::default());
        dbg.enable(index + 1);
        assert_eq!(dbg.index(), index);
        dbg
    }

    #[test]
    fn step_over_skips_descendants() {
        let mut dbg = paused_at(0);
        assert!(dbg.step_over());
        assert_eq!(dbg.index(), 4);

        let mut dbg = paused_at(1);
        dbg.step_over();
        assert_eq!(dbg.index(), 2);
    }

    #[test]
    fn step_over_without_target_stays() {
        let mut dbg = paused_at(5);
        assert!(dbg.step_over());
        assert_eq!(dbg.index(), 5);
    }

    #[test]
    fn step_out_finds_shallower_entry() {
        let mut dbg = paused_at(2);
        dbg.step_out();
        assert_eq!(dbg.index(), 4);

        let mut dbg = paused_at(4);
        dbg.step_out();
        assert_eq!(dbg.index(), 4);
    }

    #[test]
    fn attach_leaves_a_paused_cursor_alone() {
        let mut dbg = paused_at(0);
        assert!(!dbg.attach(5));
        assert_eq!(dbg.index(), 0);

        dbg.continue_run();
        assert!(dbg.attach(5));
        assert_eq!(dbg.index(), 4);
    }

    #[test]
    fn step_back_saturates() {
        let mut dbg = paused_at(0);
        dbg.step_back();
        assert_eq!(dbg.index(), 0);

        let mut dbg = paused_at(2);
        dbg.step_back();
        assert_eq!(dbg.index(), 1);
    }

    #[test]
    fn step_into_at_end_continues() {
        let mut dbg = paused_at(4);
        dbg.step_into();
        assert_eq!(dbg.index(), 5);
        assert!(dbg.is_paused());

        dbg.step_into();
        assert_eq!(dbg.index(), 5);
        assert_eq!(dbg.mode(), DebugMode::Running);
    }

    #[test]
    fn steps_require_pause() {
        let mut dbg = StepDebugger::new(DEPTHS.to_vec(), MemoryFlagStore::default());
        assert!(!dbg.step_over());
        assert!(!dbg.step_into());
        assert!(!dbg.continue_run());
        assert!(!dbg.pause(3));

        dbg.enable(1);
        dbg.continue_run();
        assert!(!dbg.step_back());
        assert!(dbg.pause(3));
        assert_eq!(dbg.index(), 2);
        assert!(!dbg.pause(4));
    }

    #[test]
    fn enable_clamps_to_sequence() {
        let mut dbg = StepDebugger::new(DEPTHS.to_vec(), MemoryFlagStore::default());
        dbg.enable(40);
        assert_eq!(dbg.index(), 5);
        dbg.stop();
        dbg.enable(0);
        assert_eq!(dbg.index(), 0);
    }

    #[test]
    fn fold_and_unfold_walk_depth_limit() {
        let mut dbg = paused_at(0);
        assert!(dbg.fold());
        assert_eq!(dbg.depth_limit(), DepthLimit::Max(1));
        dbg.fold();
        assert_eq!(dbg.depth_limit(), DepthLimit::Max(0));
        dbg.unfold();
        assert_eq!(dbg.depth_limit(), DepthLimit::Max(1));
        dbg.unfold();
        assert_eq!(dbg.depth_limit(), DepthLimit::Unlimited);

        dbg.fold();
        dbg.continue_run();
        assert_eq!(dbg.depth_limit(), DepthLimit::Unlimited);
    }

    #[test]
    fn call_stack_lists_ancestors() {
        assert_eq!(call_stack(&DEPTHS, 3), vec![0, 2]);
        assert_eq!(call_stack(&DEPTHS, 5), vec![4]);
        assert_eq!(call_stack(&DEPTHS, 0), Vec::<usize>::new());
        assert_eq!(call_stack(&DEPTHS, 99), Vec::<usize>::new());
    }

    #[test]
    fn playhead_follows_mode() {
        let mut dbg = paused_at(3);
        assert_eq!(dbg.playhead(), Some(Playhead::Cursor { index: 3 }));
        dbg.continue_run();
        assert_eq!(dbg.playhead(), None);
    }

    #[test]
    fn empty_sequence_is_inert() {
        let mut dbg = StepDebugger::new(Vec::new(), MemoryFlagStore::default());
        dbg.enable(5);
        assert_eq!(dbg.index(), 0);
        assert!(!dbg.step_over());
        assert!(!dbg.step_out());
        assert!(dbg.step_into());
        assert_eq!(dbg.mode(), DebugMode::Running);
    }
}
