//! Cards screen: the numbered deck with scores

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::layout;
use crate::app::state::AppState;
use crate::practice::Session;
use crate::store::Card;
use crate::theme::Theme;

/// Markers for a card's collection
const OWN_MARKER: &str = " ";
const SHARED_MARKER: &str = "◆";

pub fn draw(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let Some(session) = state.session.as_ref() else {
        return;
    };
    let deck = session.deck();

    let chunks = Layout::vertical([Constraint::Min(3), Constraint::Length(8)]).split(area);

    let block = layout::panel(format!(" Cards ({}) ", deck.len()), theme, true).title_bottom(
        Line::from(" [↑/↓] select  [a] add  [e] edit  [d] delete  ◆ shared ").centered(),
    );
    let inner = block.inner(chunks[0]);
    frame.render_widget(block, chunks[0]);

    if deck.is_empty() {
        let msg = Paragraph::new(
            "No cards yet.\n\nAdd one with:\n:add subject | topic | question | expected answer",
        )
        .style(Style::default().fg(theme.fg_muted))
        .wrap(Wrap { trim: true });
        frame.render_widget(msg, inner);
        return;
    }

    let visible_height = inner.height as usize;
    let start = scroll_start(state.selected_card, visible_height);
    let lines: Vec<Line> = deck
        .iter()
        .enumerate()
        .skip(start)
        .take(visible_height)
        .map(|(i, card)| card_line(i, card, session, i == state.selected_card, theme))
        .collect();
    frame.render_widget(Paragraph::new(lines), inner);

    if let Some(card) = deck.get(state.selected_card) {
        draw_detail(frame, chunks[1], card, theme);
    }
}

/// First row to show so that `selected` stays visible
fn scroll_start(selected: usize, visible_height: usize) -> usize {
    if visible_height == 0 { selected } else { (selected + 1).saturating_sub(visible_height) }
}

fn card_line(
    index: usize,
    card: &Card,
    session: &Session,
    selected: bool,
    theme: &Theme,
) -> Line<'static> {
    let score = session.latest_score(card);
    let score_text = score.map_or_else(|| " --".to_string(), |s| format!("{:>3}", s));
    let marker = if session.is_shared(&card.id) { SHARED_MARKER } else { OWN_MARKER };

    let text_style = if selected {
        Style::default().fg(theme.bg_primary).bg(theme.accent_primary).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg_primary)
    };

    Line::from(vec![
        Span::styled(format!("{:>4} ", index + 1), Style::default().fg(theme.fg_muted)),
        Span::styled(format!("{} ", marker), Style::default().fg(theme.info)),
        Span::styled(score_text, Style::default().fg(theme.score_color(score))),
        Span::raw("  "),
        Span::styled(
            format!("{} › {} › {}", card.subject, card.topic, card.question),
            text_style,
        ),
    ])
}

fn draw_detail(frame: &mut Frame, area: Rect, card: &Card, theme: &Theme) {
    let block = layout::panel(" Expected answer ", theme, false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let para = Paragraph::new(card.expected_answer.clone())
        .style(Style::default().fg(theme.fg_secondary))
        .wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}
