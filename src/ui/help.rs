//! Help overlay listing keys and commands

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph},
};

use super::layout;
use crate::theme::Theme;

const KEYS: &[(&str, &str)] = &[
    ("←/→  Ctrl+P/N", "previous / next card"),
    ("Home/End", "first / last card"),
    ("h l g G", "the same, with vim_mode on"),
    ("Tab", "switch between the main and difficult queues"),
    ("a  Enter", "write an answer (Enter submits, Alt+Enter adds a line)"),
    ("r", "reveal the expected answer"),
    ("s / t", "cycle the subject / topic filter"),
    ("↑/↓", "scroll feedback, select cards, scroll history"),
    ("1 2 3", "practice, cards, history"),
    ("e / d", "edit / delete the selected card (cards screen)"),
    (":", "command line"),
    ("Ctrl+C", "quit"),
];

const COMMANDS: &[(&str, &str)] = &[
    (":add s | t | q | a", "add a card to your collection"),
    (":add-shared s | t | q | a", "add a card to the shared pool (admin)"),
    (":edit n s | t | q | a", "replace card n"),
    (":delete n", "delete card n"),
    (":subject name|all", "filter by subject"),
    (":topic name|all", "filter by topic"),
    (":clear-history", "delete your graded answers"),
    (":practice :cards :history", "switch screens"),
    (":logout", "return to the login form"),
    (":q", "quit"),
];

pub fn draw(frame: &mut Frame, area: Rect, theme: &Theme) {
    let overlay = layout::centered_rect(80, 85, area);
    frame.render_widget(Clear, overlay);

    let block = layout::panel(" Help ", theme, true)
        .title_bottom(Line::from(" any key to close ").centered())
        .style(Style::default().bg(theme.bg_secondary));
    let inner = block.inner(overlay);
    frame.render_widget(block, overlay);

    let heading = Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD);
    let mut lines = vec![Line::from(Span::styled("Keys", heading))];
    lines.extend(rows(KEYS, theme));
    lines.push(Line::from(""));
    lines.push(Line::from(Span::styled("Commands", heading)));
    lines.extend(rows(COMMANDS, theme));

    frame.render_widget(Paragraph::new(lines), inner);
}

fn rows(entries: &[(&'static str, &'static str)], theme: &Theme) -> Vec<Line<'static>> {
    entries
        .iter()
        .map(|(key, what)| {
            Line::from(vec![
                Span::styled(format!("  {:<28}", key), Style::default().fg(theme.accent_secondary)),
                Span::styled(*what, Style::default().fg(theme.fg_primary)),
            ])
        })
        .collect()
}
