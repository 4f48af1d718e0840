//! History screen: graded attempts, newest first, with summary figures

use chrono::Local;
use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::layout;
use crate::app::state::{AppState, HistoryView};
use crate::practice::HistoryStats;
use crate::store::FeedbackEntry;
use crate::theme::Theme;

pub fn draw(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme) {
    let Some(session) = state.session.as_ref() else {
        return;
    };
    let view = &mut state.history;
    let stats = session.stats(view.subject.as_deref(), view.topic.as_deref());

    let chunks = Layout::vertical([Constraint::Length(4), Constraint::Min(3)]).split(area);
    draw_summary(frame, chunks[0], &stats, view, theme);

    let block = layout::panel(" Attempts ", theme, true)
        .title_bottom(Line::from(" [↑/↓] scroll  [s/t] filter  :clear-history ").centered());
    let inner = block.inner(chunks[1]);
    frame.render_widget(block, chunks[1]);

    if stats.is_empty() {
        let msg = Paragraph::new("No graded answers yet.").style(Style::default().fg(theme.fg_muted));
        frame.render_widget(msg, inner);
        return;
    }

    let width = inner.width.saturating_sub(2) as usize;
    let lines: Vec<Line> =
        stats.entries.iter().flat_map(|entry| entry_lines(entry, width, theme)).collect();

    let visible_lines = inner.height as usize;
    let total_lines = lines.len();
    view.scroll = layout::clamp_scroll(view.scroll, total_lines, visible_lines);

    let para = Paragraph::new(lines).scroll((view.scroll as u16, 0));
    frame.render_widget(para, inner);

    if total_lines > visible_lines {
        let max_scroll = total_lines - visible_lines;
        layout::draw_scroll_indicator(frame, inner, view.scroll, max_scroll, theme);
    }
}

fn draw_summary(
    frame: &mut Frame,
    area: Rect,
    stats: &HistoryStats,
    view: &HistoryView,
    theme: &Theme,
) {
    let block = layout::panel(" History ", theme, false);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let label = Style::default().fg(theme.fg_muted);
    let value = Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD);
    let average = stats.average.map(|a| a.round() as u32);
    let average_text = stats.average.map_or_else(|| "--".to_string(), |a| format!("{:.1}", a));

    let lines = vec![
        Line::from(vec![
            Span::styled("Attempts ", label),
            Span::styled(stats.total.to_string(), value),
            Span::styled("   Scored ", label),
            Span::styled(stats.scored.to_string(), value),
            Span::styled("   Average ", label),
            Span::styled(
                average_text,
                Style::default().fg(theme.score_color(average)).add_modifier(Modifier::BOLD),
            ),
        ]),
        Line::from(vec![
            Span::styled("Subject ", label),
            Span::styled(view.subject.as_deref().unwrap_or("all").to_string(), value),
            Span::styled("   Topic ", label),
            Span::styled(view.topic.as_deref().unwrap_or("all").to_string(), value),
        ]),
    ];
    frame.render_widget(Paragraph::new(lines), inner);
}

fn entry_lines(entry: &FeedbackEntry, width: usize, theme: &Theme) -> Vec<Line<'static>> {
    let when = entry.timestamp.with_timezone(&Local).format("%Y-%m-%d %H:%M").to_string();
    let score = entry.score.map_or_else(|| " --".to_string(), |s| format!("{:>3}", s));

    let mut lines = vec![
        Line::from(vec![
            Span::styled(when, Style::default().fg(theme.fg_muted)),
            Span::raw("  "),
            Span::styled(
                score,
                Style::default().fg(theme.score_color(entry.score)).add_modifier(Modifier::BOLD),
            ),
            Span::raw("  "),
            Span::styled(
                format!("{} › {}", entry.subject, entry.topic),
                Style::default().fg(theme.accent_secondary),
            ),
        ]),
        Line::from(Span::styled(entry.question.clone(), Style::default().fg(theme.fg_primary))),
    ];

    if let Some(gaps) = &entry.content_gaps {
        for line in layout::wrap_text(gaps, width.saturating_sub(2)) {
            lines.push(Line::from(Span::styled(
                format!("  {}", line),
                Style::default().fg(theme.fg_secondary),
            )));
        }
    }
    lines.push(Line::from(""));
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::store::{Card, CardDraft, CardId};
    use pretty_assertions::assert_eq;

    fn entry(gaps: Option<&str>) -> FeedbackEntry {
        let card = Card::new(CardId::from("c1"), CardDraft::new("Penal", "Dolo", "O que é?", "X"));
        FeedbackEntry::for_card(&card, Some(42), gaps.map(str::to_string))
    }

    #[test]
    fn entry_without_gaps_is_three_lines() {
        let theme = Theme::default();
        let lines = entry_lines(&entry(None), 60, &theme);
        assert_eq!(lines.len(), 3);
        assert_eq!(lines[0].spans[2].content, " 42");
        assert_eq!(lines[0].spans[2].style.fg, Some(theme.error));
    }

    #[test]
    fn content_gaps_are_indented() {
        let theme = Theme::default();
        let lines = entry_lines(&entry(Some("Faltou citar o artigo 18.")), 60, &theme);
        assert_eq!(lines.len(), 4);
        assert_eq!(lines[2].spans[0].content, "  Faltou citar o artigo 18.");
    }
}
