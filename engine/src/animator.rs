//! Time-to-state projection for the boot log.
//!
//! [`BootAnimator::project`] is a pure function of its inputs: given either an
//! elapsed time or a debugger cursor it returns the visible lines, the active
//! progress stage and whether everything has been shown.

use crate::context::Context;
use crate::message::{FlattenedMessage, Message, ResolvedMessage, flatten};
use crate::schedule::{AdaptiveScale, BASE_DURATION_MS, ProgressStage, progress_stages, scale};

/// Deepest nesting level that may be shown.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum DepthLimit {
    #[default]
    Unlimited,
    Max(usize),
}

impl DepthLimit {
    pub fn allows(self, depth: usize) -> bool {
        match self {
            DepthLimit::Unlimited => true,
            DepthLimit::Max(max) => depth <= max,
        }
    }
}

/// What drives the projection.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Playhead {
    /// Milliseconds since the boot log started.
    Clock { elapsed_ms: f64 },
    /// A paused debugger cursor into the flattened sequence.
    Cursor { index: usize },
}

/// Progress of the stage that contains the effective elapsed time.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StageProgress {
    pub index: usize,
    pub label: &'static str,
    /// Within-stage progress in `[0, 1]`.
    pub progress: f64,
}

/// One projected frame of the boot log.
#[derive(Debug, Clone, PartialEq)]
pub struct BootFrame {
    pub visible: Vec<ResolvedMessage>,
    pub stage: StageProgress,
    /// Overall schedule completion in `[0, 1]`.
    pub overall: f64,
    pub all_displayed: bool,
}

#[derive(Debug, Clone)]
pub struct BootAnimator {
    messages: Vec<FlattenedMessage>,
    stages: &'static [ProgressStage],
    scale: AdaptiveScale,
    context: Context,
}

impl BootAnimator {
    /// Flatten `tree` and derive the adaptive scale from the context's timing.
    pub fn new(tree: &[Message], context: Context) -> Self {
        let scale = scale(&context.timing);
        Self::with_scale(tree, context, scale)
    }

    pub fn with_scale(tree: &[Message], context: Context, scale: AdaptiveScale) -> Self {
        tracing::debug!(factor = scale.factor(), "boot schedule scale");
        Self {
            messages: flatten(tree),
            stages: progress_stages(),
            scale,
            context,
        }
    }

    pub fn messages(&self) -> &[FlattenedMessage] {
        &self.messages
    }

    pub fn depths(&self) -> Vec<usize> {
        self.messages.iter().map(|m| m.depth).collect()
    }

    pub fn total_messages(&self) -> usize {
        self.messages.len()
    }

    pub fn scale(&self) -> AdaptiveScale {
        self.scale
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    /// Length of the schedule after scaling.
    pub fn scaled_total_ms(&self) -> f64 {
        self.scale.apply(BASE_DURATION_MS)
    }

    /// Number of lines visible at `elapsed_ms` in clock mode.
    pub fn visible_count_at(&self, elapsed_ms: f64, limit: DepthLimit) -> usize {
        self.visible_indices(Playhead::Clock { elapsed_ms }, limit)
            .count()
    }

    fn visible_indices(
        &self,
        playhead: Playhead,
        limit: DepthLimit,
    ) -> impl Iterator<Item = usize> + '_ {
        let (elapsed_ms, take) = match playhead {
            Playhead::Clock { elapsed_ms } => (elapsed_ms, self.messages.len()),
            Playhead::Cursor { index } => (f64::INFINITY, index.saturating_add(1)),
        };
        self.messages
            .iter()
            .enumerate()
            .take(take)
            .filter(move |(_, m)| {
                limit.allows(m.depth) && self.scale.apply(m.base_delay_ms) <= elapsed_ms
            })
            .map(|(i, _)| i)
    }

    /// Elapsed time used for the progress bar. In cursor mode this is a
    /// linear approximation from the cursor position.
    pub fn effective_elapsed_ms(&self, playhead: Playhead) -> f64 {
        match playhead {
            Playhead::Clock { elapsed_ms } => elapsed_ms.max(0.0),
            Playhead::Cursor { index } => {
                let total = self.messages.len();
                if total == 0 {
                    0.0
                } else {
                    (index as f64 / total as f64) * self.scaled_total_ms()
                }
            }
        }
    }

    pub fn stage_at(&self, effective_elapsed_ms: f64) -> StageProgress {
        let found = self.stages.iter().enumerate().find(|(_, stage)| {
            let start = self.scale.apply(stage.start_at_ms);
            let end = self.scale.apply(stage.end_ms());
            effective_elapsed_ms >= start && effective_elapsed_ms < end
        });

        match found {
            Some((index, stage)) => {
                let start = self.scale.apply(stage.start_at_ms);
                let duration = self.scale.apply(stage.duration_ms);
                let progress = if duration > 0.0 {
                    ((effective_elapsed_ms - start) / duration).clamp(0.0, 1.0)
                } else {
                    1.0
                };
                StageProgress {
                    index,
                    label: stage.label,
                    progress,
                }
            }
            None => StageProgress {
                index: self.stages.len().saturating_sub(1),
                label: self.stages.last().map(|s| s.label).unwrap_or_default(),
                progress: 1.0,
            },
        }
    }

    /// Project the boot log at `playhead`, hiding lines deeper than `limit`.
    pub fn project(&self, playhead: Playhead, limit: DepthLimit) -> BootFrame {
        let visible: Vec<ResolvedMessage> = self
            .visible_indices(playhead, limit)
            .filter_map(|i| self.messages.get(i))
            .map(|m| m.resolve(&self.context))
            .collect();

        let effective = self.effective_elapsed_ms(playhead);
        let total = self.scaled_total_ms();
        let overall = if total > 0.0 {
            (effective / total).clamp(0.0, 1.0)
        } else {
            1.0
        };

        BootFrame {
            all_displayed: visible.len() >= self.messages.len(),
            stage: self.stage_at(effective),
            overall,
            visible,
        }
    }
}

/// Blinking terminal cursor at the end of the log.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CursorBlink {
    on: bool,
}

impl Default for CursorBlink {
    fn default() -> Self {
        Self { on: true }
    }
}

impl CursorBlink {
    /// Advance one blink interval.
    pub fn toggle(&mut self) {
        self.on = !self.on;
    }

    /// A paused debugger keeps the cursor solid.
    pub fn visible(self, paused: bool) -> bool {
        paused || self.on
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::message::MessageKind;
    use pretty_assertions::assert_eq;

    fn tree() -> Vec<Message> {
        vec![
            Message::new("a", MessageKind::Info, 0, "a").with_children(vec![
                Message::new("a.1", MessageKind::Info, 500, "a.1").with_children(vec![
                    Message::new("a.1.x", MessageKind::Info, 600, "a.1.x"),
                ]),
            ]),
            Message::new("b", MessageKind::Info, 1_000, "b"),
            Message::new("c", MessageKind::Error, 4_000, "c"),
        ]
    }

    fn animator() -> BootAnimator {
        BootAnimator::with_scale(&tree(), Context::default(), AdaptiveScale::IDENTITY)
    }

    fn ids(frame: &BootFrame) -> Vec<&str> {
        frame.visible.iter().map(|m| m.id.as_str()).collect()
    }

    #[test]
    fn clock_mode_gates_on_scaled_delay() {
        let anim = animator();
        let frame = anim.project(Playhead::Clock { elapsed_ms: 550.0 }, DepthLimit::Unlimited);
        assert_eq!(ids(&frame), vec!["a", "a.1"]);
        assert!(!frame.all_displayed);

        let scaled = BootAnimator::with_scale(
            &tree(),
            Context::default(),
            AdaptiveScale::from_factor(1.3),
        );
        // a.1 is scheduled at 650ms once stretched.
        let frame = scaled.project(Playhead::Clock { elapsed_ms: 550.0 }, DepthLimit::Unlimited);
        assert_eq!(ids(&frame), vec!["a"]);
    }

    #[test]
    fn clock_mode_respects_depth_limit() {
        let anim = animator();
        let frame = anim.project(Playhead::Clock { elapsed_ms: 5_000.0 }, DepthLimit::Max(0));
        assert_eq!(ids(&frame), vec!["a", "b", "c"]);
        assert!(!frame.all_displayed);
    }

    #[test]
    fn cursor_mode_ignores_time() {
        let anim = animator();
        let frame = anim.project(Playhead::Cursor { index: 3 }, DepthLimit::Unlimited);
        assert_eq!(ids(&frame), vec!["a", "a.1", "a.1.x", "b"]);

        let frame = anim.project(Playhead::Cursor { index: 3 }, DepthLimit::Max(1));
        assert_eq!(ids(&frame), vec!["a", "a.1", "b"]);

        let frame = anim.project(Playhead::Cursor { index: 4 }, DepthLimit::Unlimited);
        assert!(frame.all_displayed);
    }

    #[test]
    fn cursor_mode_progress_is_linear_in_index() {
        let anim = animator();
        // 2 of 5 messages -> 40% of 5000ms = 2000ms, inside "Downloading document".
        let frame = anim.project(Playhead::Cursor { index: 2 }, DepthLimit::Unlimited);
        assert_eq!(frame.stage.label, "Downloading document");
        assert!((frame.stage.progress - 200.0 / 1_200.0).abs() < 1e-9);
    }

    #[test]
    fn stage_progress_within_window() {
        let anim = animator();
        let stage = anim.stage_at(400.0);
        assert_eq!(stage.index, 0);
        assert!((stage.progress - 0.5).abs() < 1e-9);
    }

    #[test]
    fn past_the_end_pins_last_stage() {
        let anim = animator();
        let frame = anim.project(Playhead::Clock { elapsed_ms: 9_000.0 }, DepthLimit::Unlimited);
        assert_eq!(frame.stage.index, 4);
        assert_eq!(frame.stage.progress, 1.0);
        assert_eq!(frame.overall, 1.0);
        assert!(frame.all_displayed);
    }

    #[test]
    fn visible_count_matches_projection() {
        let anim = animator();
        assert_eq!(anim.visible_count_at(0.0, DepthLimit::Unlimited), 1);
        assert_eq!(anim.visible_count_at(1_000.0, DepthLimit::Unlimited), 4);
    }

    #[test]
    fn empty_log_projects_cleanly() {
        let anim = BootAnimator::with_scale(&[], Context::default(), AdaptiveScale::IDENTITY);
        let frame = anim.project(Playhead::Cursor { index: 0 }, DepthLimit::Unlimited);
        assert!(frame.visible.is_empty());
        assert!(frame.all_displayed);
        assert_eq!(frame.stage.index, 0);
    }

    #[test]
    fn paused_cursor_is_solid() {
        let mut blink = CursorBlink::default();
        assert!(blink.visible(false));
        blink.toggle();
        assert!(!blink.visible(false));
        assert!(blink.visible(true));
    }
}
