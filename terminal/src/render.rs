//! Drawing. Everything here reads from [`App`] and never mutates it.

use std::time::Instant;

use lostpage_engine::schedule::progress_stages;
use lostpage_engine::{
    BootFrame, DebugMode, DepthLimit, FlagStore, InfluenceParams, MessageKind, Phase,
    ResolvedMessage,
};
use ratatui::Frame;
use ratatui::layout::{Alignment, Constraint, Layout, Rect};
use ratatui::style::{Color, Modifier, Style, Stylize};
use ratatui::text::{Line, Span};
use ratatui::widgets::{Block, Borders, Clear, Gauge, Paragraph, Wrap};

use crate::app::{App, Inspection};
use crate::keymap;

const DEBUG_PANEL_WIDTH: u16 = 44;
const CURSOR_GLYPH: &str = "█";

pub fn draw<S: FlagStore>(frame: &mut Frame, app: &App<S>, now: Instant) {
    let area = frame.area();
    match app.phase().current() {
        Phase::Boot => draw_boot(frame, area, app, now),
        Phase::Corruption => draw_corruption(frame, area, app, now),
        Phase::Aftermath => draw_aftermath(frame, area, app),
    }
}

fn split_debug_panel<S: FlagStore>(area: Rect, app: &App<S>) -> (Rect, Option<Rect>) {
    if !app.debugger().is_enabled() || area.width <= DEBUG_PANEL_WIDTH * 2 {
        return (area, None);
    }
    let [main, panel] = Layout::horizontal([
        Constraint::Min(0),
        Constraint::Length(DEBUG_PANEL_WIDTH),
    ])
    .areas(area);
    (main, Some(panel))
}

fn draw_boot<S: FlagStore>(frame: &mut Frame, area: Rect, app: &App<S>, now: Instant) {
    let boot = app.boot_frame();
    let [body, gauge, footer] = Layout::vertical([
        Constraint::Min(1),
        Constraint::Length(1),
        Constraint::Length(1),
    ])
    .areas(area);
    let (log_area, panel) = split_debug_panel(body, app);

    let inspection = app.inspection();
    // A folded-away cursor has no line of its own to highlight.
    let highlight = inspection
        .as_ref()
        .filter(|i| i.mode == DebugMode::Paused)
        .and_then(|i| boot.visible.iter().rposition(|m| m.id == i.id));
    let folded = inspection.as_ref().is_some_and(Inspection::is_folded);
    let lines = log_lines(&boot.visible, highlight, app.cursor_visible());
    let lines = apply_glow(lines, log_area, app.pointer(), app.influence(now));
    frame.render_widget(
        Paragraph::new(tail(lines, log_area.height)).block(Block::default()),
        log_area,
    );

    frame.render_widget(progress_gauge(&boot, folded), gauge);
    frame.render_widget(Paragraph::new(hint_line(app.debugger().mode())), footer);

    if let (Some(panel), Some(inspection)) = (panel, inspection) {
        frame.render_widget(debug_panel(&inspection), panel);
    }
}

fn draw_corruption<S: FlagStore>(frame: &mut Frame, area: Rect, app: &App<S>, now: Instant) {
    let boot = app.boot_frame();
    let progress = app.phase().progress();
    let pointer = app.pointer();
    let influence = app.influence(now);
    let glitch = app.glitch();

    let lines: Vec<Line<'static>> = tail(log_lines(&boot.visible, None, false), area.height)
        .into_iter()
        .enumerate()
        .map(|(row, line)| {
            let row = u16::try_from(row).unwrap_or(u16::MAX);
            let text: String = line.spans.iter().map(|s| s.content.as_ref()).collect();
            let scrambled = glitch.scramble(&text, row, progress, pointer, influence);
            Line::from(Span::styled(scrambled, corruption_style(progress, row)))
        })
        .collect();
    frame.render_widget(Paragraph::new(lines), area);

    let banner = format!(" {} ", glitch.banner());
    let width = u16::try_from(banner.chars().count())
        .unwrap_or(u16::MAX)
        .min(area.width);
    let banner_area = Rect {
        x: area.x + (area.width - width) / 2,
        y: area.y + area.height / 2,
        width,
        height: 1.min(area.height),
    };
    frame.render_widget(Clear, banner_area);
    frame.render_widget(
        Paragraph::new(banner).style(Style::default().fg(Color::White).bg(Color::Red).bold()),
        banner_area,
    );
}

fn corruption_style(progress: f64, row: u16) -> Style {
    // Rows flicker between red and the normal foreground as corruption deepens.
    let red_rows = (progress * 10.0) as u16 + 1;
    if row % 10 < red_rows {
        Style::default().fg(Color::Red)
    } else {
        Style::default().fg(Color::DarkGray)
    }
}

fn draw_aftermath<S: FlagStore>(frame: &mut Frame, area: Rect, app: &App<S>) {
    let viz = app.visualization();
    let mut lines = vec![
        Line::from("404".red().bold()),
        Line::from(""),
        Line::from(vec![viz.title.bold(), "  ".into(), viz.code.dim()]),
        Line::from(""),
    ];
    lines.extend(
        viz.lines
            .iter()
            .map(|l| Line::from(Span::styled(*l, Style::default().fg(Color::Yellow)))),
    );
    lines.push(Line::from(""));
    lines.push(Line::from(viz.hint.italic()));
    lines.push(Line::from(""));
    lines.push(Line::from(vec![
        "q".bold(),
        " quit".dim(),
    ]));

    let height = u16::try_from(lines.len() + 2).unwrap_or(u16::MAX).min(area.height);
    let width = 60.min(area.width);
    let [_, middle, _] = Layout::vertical([
        Constraint::Fill(1),
        Constraint::Length(height),
        Constraint::Fill(1),
    ])
    .areas(area);
    let [_, center, _] = Layout::horizontal([
        Constraint::Fill(1),
        Constraint::Length(width),
        Constraint::Fill(1),
    ])
    .areas(middle);

    frame.render_widget(
        Paragraph::new(lines)
            .alignment(Alignment::Center)
            .block(Block::default().borders(Borders::ALL).title(" page not found ")),
        center,
    );
}

fn kind_badge(kind: MessageKind) -> Span<'static> {
    match kind {
        MessageKind::Info => Span::styled("[ .. ]", Style::default().fg(Color::Gray)),
        MessageKind::Success => Span::styled("[ OK ]", Style::default().fg(Color::Green)),
        MessageKind::Warning => Span::styled("[WARN]", Style::default().fg(Color::Yellow)),
        MessageKind::Error => Span::styled("[FAIL]", Style::default().fg(Color::Red).bold()),
        MessageKind::Group => Span::styled("[ >> ]", Style::default().fg(Color::Cyan).bold()),
    }
}

/// One line per visible message, indented by depth, with the blinking
/// cursor after the last line.
pub fn log_lines(
    visible: &[ResolvedMessage],
    highlight: Option<usize>,
    cursor_visible: bool,
) -> Vec<Line<'static>> {
    let last = visible.len().saturating_sub(1);
    visible
        .iter()
        .enumerate()
        .map(|(i, message)| {
            let mut spans = vec![
                kind_badge(message.kind),
                Span::raw(" "),
                Span::raw("  ".repeat(message.depth)),
                Span::raw(message.text.clone()),
            ];
            if i == last && cursor_visible {
                spans.push(Span::raw(" "));
                spans.push(Span::raw(CURSOR_GLYPH));
            }
            let line = Line::from(spans);
            if highlight == Some(i) {
                line.style(Style::default().add_modifier(Modifier::REVERSED))
            } else {
                line
            }
        })
        .collect()
}

fn tail(lines: Vec<Line<'static>>, height: u16) -> Vec<Line<'static>> {
    let skip = lines.len().saturating_sub(usize::from(height));
    lines.into_iter().skip(skip).collect()
}

/// Bold the row under the pointer once the glow is bright enough.
fn apply_glow(
    lines: Vec<Line<'static>>,
    area: Rect,
    pointer: Option<(u16, u16)>,
    influence: InfluenceParams,
) -> Vec<Line<'static>> {
    let Some((_, y)) = pointer else {
        return lines;
    };
    if influence.glow_intensity < 0.3 || y < area.y {
        return lines;
    }
    let shown = lines.len().min(usize::from(area.height));
    let offset = lines.len() - shown;
    let target = offset + usize::from(y - area.y);
    lines
        .into_iter()
        .enumerate()
        .map(|(i, line)| {
            if i == target {
                line.patch_style(Style::default().add_modifier(Modifier::BOLD))
            } else {
                line
            }
        })
        .collect()
}

fn progress_gauge(boot: &BootFrame, cursor_folded: bool) -> Gauge<'static> {
    let mut label = format!(
        "{} {:>3.0}%  ({}/{})",
        boot.stage.label,
        boot.stage.progress * 100.0,
        boot.stage.index + 1,
        progress_stages().len()
    );
    if cursor_folded {
        label.push_str("  [cursor folded]");
    }
    Gauge::default()
        .gauge_style(Style::default().fg(Color::Cyan).bg(Color::Black))
        .ratio(boot.overall.clamp(0.0, 1.0))
        .label(label)
}

pub fn hint_line(mode: DebugMode) -> Line<'static> {
    let mut spans = Vec::new();
    for (i, binding) in keymap::hints(mode).into_iter().enumerate() {
        if i > 0 {
            spans.push("  ".into());
        }
        spans.push(Span::from(binding.key));
        spans.push(Span::raw(format!(" {}", binding.hint)).dim());
    }
    Line::from(spans)
}

fn depth_limit_label(limit: DepthLimit) -> String {
    match limit {
        DepthLimit::Unlimited => "all".to_string(),
        DepthLimit::Max(max) => format!("<= {max}"),
    }
}

pub fn debug_panel(inspection: &Inspection) -> Paragraph<'static> {
    let label = |name: &'static str| Span::styled(format!("{name:<7}"), Style::default().dim());
    let mut lines = vec![
        Line::from(vec![
            label("cursor"),
            Span::raw(format!("{}/{}", inspection.index + 1, inspection.total)),
        ]),
        Line::from(vec![label("id"), Span::raw(inspection.id.clone())]),
        Line::from(vec![label("kind"), Span::raw(inspection.kind.to_string())]),
        Line::from(vec![label("depth"), Span::raw(inspection.depth.to_string())]),
        Line::from(vec![
            label("folds"),
            Span::raw(depth_limit_label(inspection.depth_limit)),
            if inspection.is_folded() {
                Span::raw(" (cursor hidden)").yellow()
            } else {
                Span::raw("")
            },
        ]),
        Line::from(""),
        Line::from(Span::raw(inspection.text.clone())),
        Line::from(""),
        Line::from("call stack".bold()),
    ];
    for (depth, id) in inspection.call_stack.iter().enumerate() {
        lines.push(Line::from(format!("{}{id}", "  ".repeat(depth))));
    }
    lines.push(Line::from(Span::styled(
        format!("{}{}", "  ".repeat(inspection.call_stack.len()), inspection.id),
        Style::default().add_modifier(Modifier::REVERSED),
    )));

    let title = format!(" debugger [{}] ", inspection.mode.label());
    Paragraph::new(lines)
        .wrap(Wrap { trim: false })
        .block(Block::default().borders(Borders::LEFT).title(title))
}
