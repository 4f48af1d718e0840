//! Bottom line: status messages and the `:` prompt

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use crate::app::state::{CommandLineState, CommandMode};
use crate::theme::Theme;

/// Shown when there is no message
const HINT: &str = "Press : for commands, ? for help";

pub fn draw(frame: &mut Frame, area: Rect, state: &CommandLineState, theme: &Theme) {
    draw_with_hint(frame, area, state, theme, HINT);
}

/// Draw the command line with a custom idle hint
pub fn draw_with_hint(
    frame: &mut Frame,
    area: Rect,
    state: &CommandLineState,
    theme: &Theme,
    hint: &str,
) {
    let line = match state.mode {
        CommandMode::Normal => {
            let (text, style) = match state.message {
                Some(ref msg) if state.is_error => (msg.as_str(), Style::default().fg(theme.error)),
                Some(ref msg) => (msg.as_str(), Style::default().fg(theme.fg_secondary)),
                None => (hint, Style::default().fg(theme.fg_muted)),
            };
            Line::from(Span::styled(text.to_string(), style))
        }
        CommandMode::Command => {
            // The cursor index is shifted past the `:` prefix
            let text = format!(":{}", state.input.text);
            let style = Style::default().fg(theme.accent_primary);
            build_line_with_cursor(&text, state.input.cursor + 1, style, theme)
        }
    };

    frame.render_widget(Paragraph::new(line), area);
}

/// `text` as a line with the character at `cursor` (a char index) drawn as a block.
/// A cursor past the end is drawn on a trailing space.
pub fn build_line_with_cursor(
    text: &str,
    cursor: usize,
    base_style: Style,
    theme: &Theme,
) -> Line<'static> {
    let split = text.char_indices().nth(cursor).map(|(i, _)| i).unwrap_or(text.len());
    let (before, rest) = text.split_at(split);
    let mut rest = rest.chars();
    let under = rest.next().unwrap_or(' ');
    let after = rest.as_str();

    let block = Style::default().fg(theme.bg_primary).bg(theme.cursor).add_modifier(Modifier::BOLD);
    let mut spans = Vec::with_capacity(3);
    if !before.is_empty() {
        spans.push(Span::styled(before.to_string(), base_style));
    }
    spans.push(Span::styled(under.to_string(), block));
    if !after.is_empty() {
        spans.push(Span::styled(after.to_string(), base_style));
    }
    Line::from(spans)
}
