//! Boot-log messages, pre-order flattening and text resolution.

use std::collections::HashSet;
use std::fmt;

use serde::{Deserialize, Serialize};
use strum_macros::{Display, EnumIter};

use crate::context::Context;
use crate::schedule::BASE_DURATION_MS;

/// Visual category of a log line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, Display, EnumIter)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum MessageKind {
    Info,
    Success,
    Warning,
    Error,
    Group,
}

/// Computed text. A plain function pointer cannot capture state, so the
/// result depends on the [`Context`] alone.
pub type TextFn = fn(&Context) -> String;

/// Either literal text or text derived from the [`Context`].
#[derive(Clone)]
pub enum MessageText {
    Literal(String),
    Computed(TextFn),
}

impl MessageText {
    pub fn resolve(&self, ctx: &Context) -> String {
        match self {
            MessageText::Literal(text) => text.clone(),
            MessageText::Computed(f) => f(ctx),
        }
    }

    pub fn is_computed(&self) -> bool {
        matches!(self, MessageText::Computed(_))
    }
}

impl fmt::Debug for MessageText {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MessageText::Literal(text) => f.debug_tuple("Literal").field(text).finish(),
            MessageText::Computed(_) => f.write_str("Computed(<fn>)"),
        }
    }
}

impl From<&str> for MessageText {
    fn from(text: &str) -> Self {
        MessageText::Literal(text.to_string())
    }
}

impl From<String> for MessageText {
    fn from(text: String) -> Self {
        MessageText::Literal(text)
    }
}

impl From<TextFn> for MessageText {
    fn from(f: TextFn) -> Self {
        MessageText::Computed(f)
    }
}

/// A node in the static log tree.
#[derive(Debug, Clone)]
pub struct Message {
    pub id: String,
    pub text: MessageText,
    pub kind: MessageKind,
    /// Milliseconds from sequence start, before adaptive scaling.
    pub base_delay_ms: u64,
    pub children: Vec<Message>,
}

impl Message {
    pub fn new(
        id: impl Into<String>,
        kind: MessageKind,
        base_delay_ms: u64,
        text: impl Into<MessageText>,
    ) -> Self {
        Self {
            id: id.into(),
            text: text.into(),
            kind,
            base_delay_ms,
            children: Vec::new(),
        }
    }

    /// Shorthand for a node whose text is computed from the context.
    pub fn computed(id: impl Into<String>, kind: MessageKind, base_delay_ms: u64, f: TextFn) -> Self {
        Self::new(id, kind, base_delay_ms, MessageText::Computed(f))
    }

    pub fn with_children(mut self, children: Vec<Message>) -> Self {
        self.children = children;
        self
    }

    pub fn resolve(&self, ctx: &Context) -> String {
        self.text.resolve(ctx)
    }
}

/// A message annotated with its nesting depth (root = 0).
#[derive(Debug, Clone)]
pub struct FlattenedMessage {
    pub id: String,
    pub text: MessageText,
    pub kind: MessageKind,
    pub base_delay_ms: u64,
    pub depth: usize,
}

impl FlattenedMessage {
    pub fn resolve(&self, ctx: &Context) -> ResolvedMessage {
        ResolvedMessage {
            id: self.id.clone(),
            kind: self.kind,
            depth: self.depth,
            text: self.text.resolve(ctx),
        }
    }
}

/// What the presentation layer draws for one visible line.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ResolvedMessage {
    pub id: String,
    pub kind: MessageKind,
    pub depth: usize,
    pub text: String,
}

/// Pre-order linearization of `messages` starting at depth 0.
pub fn flatten(messages: &[Message]) -> Vec<FlattenedMessage> {
    flatten_at(messages, 0)
}

/// Pre-order linearization with an explicit starting depth.
pub fn flatten_at(messages: &[Message], depth: usize) -> Vec<FlattenedMessage> {
    let mut out = Vec::with_capacity(count_nodes(messages));
    flatten_into(messages, depth, &mut out);
    out
}

fn flatten_into(messages: &[Message], depth: usize, out: &mut Vec<FlattenedMessage>) {
    for message in messages {
        out.push(FlattenedMessage {
            id: message.id.clone(),
            text: message.text.clone(),
            kind: message.kind,
            base_delay_ms: message.base_delay_ms,
            depth,
        });
        flatten_into(&message.children, depth + 1, out);
    }
}

/// Total number of nodes in the tree.
pub fn count_nodes(messages: &[Message]) -> usize {
    messages
        .iter()
        .map(|m| 1 + count_nodes(&m.children))
        .sum()
}

/// Resolve a message's text against `ctx`.
pub fn resolve_text(message: &Message, ctx: &Context) -> String {
    message.resolve(ctx)
}

/// Structural defects in a message tree. These are build-time mistakes;
/// the runtime never checks for them.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TreeDefect {
    DuplicateId(String),
    RootDelayDecreases { id: String, previous_ms: u64, delay_ms: u64 },
    DelayBeyondSchedule { id: String, delay_ms: u64 },
}

/// Collect every [`TreeDefect`] in `messages`.
pub fn validate_tree(messages: &[Message]) -> Vec<TreeDefect> {
    let mut defects = Vec::new();

    let mut seen = HashSet::new();
    for node in flatten(messages) {
        if !seen.insert(node.id.clone()) {
            defects.push(TreeDefect::DuplicateId(node.id.clone()));
        }
        if node.base_delay_ms > BASE_DURATION_MS {
            defects.push(TreeDefect::DelayBeyondSchedule {
                id: node.id,
                delay_ms: node.base_delay_ms,
            });
        }
    }

    for pair in messages.windows(2) {
        if pair[1].base_delay_ms < pair[0].base_delay_ms {
            defects.push(TreeDefect::RootDelayDecreases {
                id: pair[1].id.clone(),
                previous_ms: pair[0].base_delay_ms,
                delay_ms: pair[1].base_delay_ms,
            });
        }
    }

    defects
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn leaf(id: &str, delay: u64) -> Message {
        Message::new(id, MessageKind::Info, delay, id)
    }

    fn ids(flat: &[FlattenedMessage]) -> Vec<&str> {
        flat.iter().map(|m| m.id.as_str()).collect()
    }

    fn depths(flat: &[FlattenedMessage]) -> Vec<usize> {
        flat.iter().map(|m| m.depth).collect()
    }

    #[test]
    fn empty_tree_flattens_to_nothing() {
        assert!(flatten(&[]).is_empty());
    }

    #[test]
    fn flat_list_stays_at_depth_zero() {
        let flat = flatten(&[leaf("a", 0), leaf("b", 10), leaf("c", 20)]);
        assert_eq!(ids(&flat), vec!["a", "b", "c"]);
        assert_eq!(depths(&flat), vec![0, 0, 0]);
    }

    #[test]
    fn one_level_of_nesting() {
        let tree = vec![
            leaf("a", 0).with_children(vec![leaf("a1", 5), leaf("a2", 6)]),
            leaf("b", 10),
        ];
        let flat = flatten(&tree);
        assert_eq!(ids(&flat), vec!["a", "a1", "a2", "b"]);
        assert_eq!(depths(&flat), vec![0, 1, 1, 0]);
    }

    #[test]
    fn four_levels_of_nesting() {
        let tree = vec![
            leaf("r", 0).with_children(vec![
                leaf("r.1", 1).with_children(vec![
                    leaf("r.1.1", 2).with_children(vec![leaf("r.1.1.1", 3)]),
                ]),
                leaf("r.2", 4),
            ]),
            leaf("s", 5),
        ];
        let flat = flatten(&tree);
        assert_eq!(ids(&flat), vec!["r", "r.1", "r.1.1", "r.1.1.1", "r.2", "s"]);
        assert_eq!(depths(&flat), vec![0, 1, 2, 3, 1, 0]);
    }

    #[test]
    fn flatten_at_offsets_depth() {
        let flat = flatten_at(&[leaf("a", 0).with_children(vec![leaf("b", 0)])], 2);
        assert_eq!(depths(&flat), vec![2, 3]);
    }

    #[test]
    fn literal_text_ignores_context() {
        let msg = Message::new("x", MessageKind::Success, 0, "static line");
        assert_eq!(resolve_text(&msg, &Context::default()), "static line");
        assert_eq!(resolve_text(&msg, &Context::sample()), "static line");
    }

    #[test]
    fn computed_text_reads_context() {
        fn title(ctx: &Context) -> String {
            format!("title={}", ctx.dom.title)
        }
        let msg = Message::computed("x", MessageKind::Info, 0, title);
        let ctx = Context::sample();
        assert_eq!(resolve_text(&msg, &ctx), title(&ctx));
        assert!(msg.text.is_computed());
    }

    #[test]
    fn validate_reports_duplicates_and_order() {
        let tree = vec![
            leaf("a", 100).with_children(vec![leaf("dup", 0)]),
            leaf("dup", 50),
            leaf("late", BASE_DURATION_MS + 1),
        ];
        let defects = validate_tree(&tree);
        assert!(defects.contains(&TreeDefect::DuplicateId("dup".to_string())));
        assert!(defects.contains(&TreeDefect::RootDelayDecreases {
            id: "dup".to_string(),
            previous_ms: 100,
            delay_ms: 50,
        }));
        assert!(defects.contains(&TreeDefect::DelayBeyondSchedule {
            id: "late".to_string(),
            delay_ms: BASE_DURATION_MS + 1,
        }));
    }

    #[test]
    fn kind_display_is_lowercase() {
        assert_eq!(MessageKind::Warning.to_string(), "warning");
    }
}
