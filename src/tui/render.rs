//! Frame rendering for the tracker list.
//!
//! [`frame`] turns the model into styled lines without touching the terminal;
//! [`draw`] queues those lines through crossterm. Keeping the two apart lets
//! tests assert on exact cell text.

#![allow(missing_docs)]

use std::io::{self, Write};

use crossterm::cursor::MoveTo;
use crossterm::queue;
use crossterm::style::{
    Attribute, Color, ResetColor, SetAttribute, SetBackgroundColor, SetForegroundColor,
};
use crossterm::terminal::{Clear, ClearType};

use super::focus::Row;
use super::model::AppModel;
use super::picker::IssuePicker;
use super::widgets::TextField;
use crate::tracking::reconcile::Phase;
use crate::tracking::session::TrackingSession;
use crate::tracking::timecode::format_duration;

/// Width of the centered action labels.
const LABEL_WIDTH: usize = 10;
/// Minimum width of the time cell.
const TIME_WIDTH: usize = 9;

const NEW_TIMER_PLACEHOLDER: &str = "Create a new timer (or type an issue)";
const HELP: &str = "↑↓←→ move · enter/space activate · esc clear · ctrl+c quit";

// ──────────────────── styled lines ────────────────────

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Style {
    pub fg: Option<Color>,
    pub bg: Option<Color>,
    pub bold: bool,
    pub reverse: bool,
    pub dim: bool,
}

impl Style {
    const fn fg(color: Color) -> Self {
        Self {
            fg: Some(color),
            bg: None,
            bold: false,
            reverse: false,
            dim: false,
        }
    }

    const fn on(mut self, color: Color) -> Self {
        self.bg = Some(color);
        self
    }

    const fn bold(mut self) -> Self {
        self.bold = true;
        self
    }

    const fn dim() -> Self {
        Self {
            fg: None,
            bg: None,
            bold: false,
            reverse: false,
            dim: true,
        }
    }

    const fn reverse() -> Self {
        Self {
            fg: None,
            bg: None,
            bold: false,
            reverse: true,
            dim: false,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Span {
    pub text: String,
    pub style: Style,
}

impl Span {
    fn styled(text: impl Into<String>, style: Style) -> Self {
        Self {
            text: text.into(),
            style,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Line {
    pub spans: Vec<Span>,
}

impl Line {
    fn from_spans(spans: Vec<Span>) -> Self {
        Self { spans }
    }

    fn text(text: impl Into<String>, style: Style) -> Self {
        Self::from_spans(vec![Span::styled(text, style)])
    }

    /// The line's characters without styling.
    #[must_use]
    pub fn plain_text(&self) -> String {
        self.spans.iter().map(|span| span.text.as_str()).collect()
    }
}

/// Pad `text` to `width` with the extra space split around it.
///
/// The odd space goes to the left.
#[must_use]
pub fn center_text(text: &str, width: usize) -> String {
    let len = text.chars().count();
    let right = width.saturating_sub(len) / 2;
    let left = width.saturating_sub(len + right);
    format!("{}{text}{}", " ".repeat(left), " ".repeat(right))
}

// ──────────────────── frame building ────────────────────

/// Build every line of the current frame.
#[must_use]
pub fn frame(model: &AppModel) -> Vec<Line> {
    let tracking = &model.tracking;
    if tracking.phase() == Phase::Loading {
        let text = if tracking.has_error() {
            "… Failing to load trackers, retrying"
        } else {
            "… Loading your trackers"
        };
        return vec![Line::text(text, Style::fg(Color::Cyan))];
    }

    let mut lines = Vec::new();
    for (index, session) in model.sessions().iter().enumerate() {
        let selected = tracking.selected() == index;
        lines.push(session_line(model, session, selected));
        if selected
            && model.issue_suggestions_open()
            && let Some(picker) = model.picker.as_ref()
        {
            push_suggestions(&mut lines, picker);
        }
    }

    lines.push(new_timer_line(model));
    if tracking.is_new_row_selected()
        && (model.new_list_focused || model.new_field.has_text())
        && let Some(picker) = model.picker.as_ref()
    {
        push_suggestions(&mut lines, picker);
    }

    lines.push(Line::default());
    if tracking.has_error() {
        lines.push(Line::text(
            "Failing to refresh trackers, retrying",
            Style::fg(Color::Yellow),
        ));
    }
    if let Some(notice) = model.notice.as_deref() {
        lines.push(Line::text(notice, Style::fg(Color::Red)));
    }
    lines.push(Line::text(HELP, Style::dim()));
    lines
}

fn session_line(model: &AppModel, session: &TrackingSession, selected: bool) -> Line {
    let focused = |row: Row| selected && model.row == row;
    let busy = model.busy_for(&session.id);
    let busy_label = |row: Row| busy.filter(|b| b.row == row).map(|b| b.label);
    let has_issue = session.has_issue();
    let mut spans = Vec::new();

    // Time: field text while editing, elapsed time otherwise.
    let time_bg = if session.is_playing {
        Color::Green
    } else {
        Color::Red
    };
    if let Some(label) = busy_label(Row::SelectTime) {
        spans.push(Span::styled(
            format!("{label:<TIME_WIDTH$}"),
            Style::fg(Color::White).on(time_bg),
        ));
    } else if focused(Row::SelectTime) {
        push_field(
            &mut spans,
            &model.time_field,
            &elapsed_label(session, model.now_ms),
            TIME_WIDTH,
            Style::fg(Color::White).on(time_bg),
        );
    } else {
        spans.push(Span::styled(
            format!("{:<TIME_WIDTH$}", elapsed_label(session, model.now_ms)),
            Style::fg(Color::White).on(time_bg),
        ));
    }

    // Play / Stop.
    let state = busy_label(Row::SelectRow).unwrap_or(if session.is_playing { "Stop" } else { "Play" });
    let state_style = match (focused(Row::SelectRow), session.is_playing) {
        (true, true) => Style::fg(Color::White).on(Color::Yellow).bold(),
        (true, false) => Style::fg(Color::White).on(Color::Green).bold(),
        (false, true) => Style::fg(Color::Yellow),
        (false, false) => Style::fg(Color::Green),
    };
    spans.push(Span::styled(center_text(state, LABEL_WIDTH), state_style));

    let log = busy_label(Row::Log).unwrap_or("Log Time");
    let log_style = match (focused(Row::Log), has_issue) {
        (true, true) => Style::fg(Color::White).on(Color::Blue).bold(),
        (true, false) => Style::reverse(),
        (false, true) => Style::fg(Color::Blue),
        (false, false) => Style::fg(Color::DarkGrey),
    };
    spans.push(Span::styled(center_text(log, LABEL_WIDTH), log_style));

    let delete = busy_label(Row::Delete).unwrap_or("Delete");
    let delete_style = if focused(Row::Delete) {
        Style::fg(Color::White).on(Color::Red).bold()
    } else {
        Style::fg(Color::Red)
    };
    spans.push(Span::styled(center_text(delete, LABEL_WIDTH), delete_style));

    // Issue: search text while typing, the key or a prompt otherwise.
    let issue_focused = focused(Row::ChangeIssue);
    let issue_style = if issue_focused {
        Style::fg(Color::White).on(Color::Blue)
    } else {
        Style::default()
    };
    let placeholder = match session.issue_key.as_deref() {
        Some(key) if !key.trim().is_empty() => key,
        _ if issue_focused => "type an issue...",
        _ => "...",
    };
    if let Some(label) = busy_label(Row::ChangeIssue) {
        spans.push(Span::styled(label, issue_style));
    } else if issue_focused {
        push_field(&mut spans, &model.issue_field, placeholder, 0, issue_style);
        if has_issue && !model.issue_field.has_text() {
            spans.push(Span::styled(" (open browser) ", Style::dim()));
        }
    } else {
        spans.push(Span::styled(placeholder, issue_style));
    }

    Line::from_spans(spans)
}

fn new_timer_line(model: &AppModel) -> Line {
    if model.creating {
        return Line::text("… Creating a new timer...", Style::fg(Color::Cyan));
    }
    let selected = model.tracking.is_new_row_selected();
    let style = if selected && !model.new_list_focused {
        Style::fg(Color::Green).bold()
    } else {
        Style::fg(Color::DarkGrey)
    };
    let mut spans = vec![Span::styled("[+] ", style)];
    if selected {
        push_field(&mut spans, &model.new_field, NEW_TIMER_PLACEHOLDER, 0, style);
    } else {
        spans.push(Span::styled(NEW_TIMER_PLACEHOLDER, style));
    }
    Line::from_spans(spans)
}

fn push_suggestions(lines: &mut Vec<Line>, picker: &IssuePicker) {
    if picker.is_loading() && picker.items().is_empty() {
        lines.push(Line::text("    … Loading results", Style::dim()));
        return;
    }
    for (index, issue) in picker.visible() {
        let line = if index == picker.highlight() {
            Line::text(format!("  > {}", issue.label()), Style::fg(Color::Cyan).bold())
        } else {
            Line::text(format!("    {}", issue.label()), Style::default())
        };
        lines.push(line);
    }
}

/// Draw a focused text field with a reverse-video cursor, or its placeholder.
fn push_field(
    spans: &mut Vec<Span>,
    field: &TextField,
    placeholder: &str,
    min_width: usize,
    style: Style,
) {
    let cursor = Style {
        reverse: true,
        ..style
    };
    if field.value().is_empty() {
        let mut chars = placeholder.chars();
        let first = chars.next().map_or_else(|| " ".to_string(), String::from);
        spans.push(Span::styled(first, cursor));
        let rest: String = chars.collect();
        let pad = min_width.saturating_sub(placeholder.chars().count().max(1));
        spans.push(Span::styled(format!("{rest}{}", " ".repeat(pad)), Style { dim: true, ..style }));
        return;
    }

    let (before, under, after) = field.split_at_cursor();
    spans.push(Span::styled(before, style));
    spans.push(Span::styled(under.map_or_else(|| " ".to_string(), String::from), cursor));
    let used = field.value().chars().count() + usize::from(under.is_none());
    let pad = min_width.saturating_sub(used);
    spans.push(Span::styled(format!("{after}{}", " ".repeat(pad)), style));
}

fn elapsed_label(session: &TrackingSession, now_ms: i64) -> String {
    let elapsed = session.elapsed_ms(now_ms);
    format_duration(elapsed.div_euclid(1_000) * 1_000)
}

// ──────────────────── terminal output ────────────────────

/// Queue `lines` to `out`, clipped to the terminal size, and flush.
pub fn draw<W: Write>(out: &mut W, lines: &[Line], width: u16, height: u16) -> io::Result<()> {
    queue!(out, MoveTo(0, 0), Clear(ClearType::All))?;
    let width = usize::from(width);
    for (row, line) in lines.iter().take(usize::from(height)).enumerate() {
        let row = u16::try_from(row).unwrap_or(u16::MAX);
        queue!(out, MoveTo(0, row))?;
        let mut used = 0;
        for span in &line.spans {
            let remaining = width.saturating_sub(used);
            if remaining == 0 {
                break;
            }
            let text: String = span.text.chars().take(remaining).collect();
            used += text.chars().count();
            apply_style(out, span.style)?;
            write!(out, "{text}")?;
            queue!(out, SetAttribute(Attribute::Reset), ResetColor)?;
        }
    }
    out.flush()
}

fn apply_style<W: Write>(out: &mut W, style: Style) -> io::Result<()> {
    if let Some(fg) = style.fg {
        queue!(out, SetForegroundColor(fg))?;
    }
    if let Some(bg) = style.bg {
        queue!(out, SetBackgroundColor(bg))?;
    }
    if style.bold {
        queue!(out, SetAttribute(Attribute::Bold))?;
    }
    if style.dim {
        queue!(out, SetAttribute(Attribute::Dim))?;
    }
    if style.reverse {
        queue!(out, SetAttribute(Attribute::Reverse))?;
    }
    Ok(())
}
