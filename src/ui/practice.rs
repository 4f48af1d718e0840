//! Practice screen: the current card, the answer box and the feedback

use ratatui::{
    Frame,
    layout::{Constraint, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Paragraph, Wrap},
};

use super::{command_line, feedback, layout};
use crate::app::state::AppState;
use crate::grading::SectionSet;
use crate::practice::{DIFFICULTY_THRESHOLD, QueueKind, RankingMode, Session};
use crate::theme::Theme;

/// Height of the answer box, borders included
const ANSWER_HEIGHT: u16 = 7;

pub fn draw(frame: &mut Frame, area: Rect, state: &mut AppState, theme: &Theme, set: &SectionSet) {
    let Some(session) = state.session.as_ref() else {
        return;
    };

    let chunks = Layout::vertical([
        Constraint::Percentage(35),
        Constraint::Length(ANSWER_HEIGHT),
        Constraint::Min(5),
    ])
    .split(area);

    draw_card(frame, chunks[0], session, theme);
    draw_answer(frame, chunks[1], state, theme);

    let feedback = session.active_queue().visible_feedback();
    feedback::draw(frame, chunks[2], feedback, &mut state.feedback_scroll, set, theme);
}

fn queue_title(session: &Session) -> String {
    let queue = session.active_queue();
    let position = if queue.is_empty() {
        "0/0".to_string()
    } else {
        format!("{}/{}", queue.current_index() + 1, queue.len())
    };
    let other = session.queue(session.active().other());

    let mut title = format!(" {} queue {} ", session.active().label(), position);
    if session.active() == QueueKind::Main && session.ranking_mode() == RankingMode::Average {
        title.push_str("· by average ");
    }
    if let Some(subject) = queue.subject_filter() {
        title.push_str(&format!("· {} ", subject));
    }
    if let Some(topic) = queue.topic_filter() {
        title.push_str(&format!("· {} ", topic));
    }
    title.push_str(&format!("· [Tab] {} ({}) ", session.active().other().label(), other.len()));
    title
}

fn draw_card(frame: &mut Frame, area: Rect, session: &Session, theme: &Theme) {
    let queue = session.active_queue();
    let focused = session.active() == QueueKind::Difficult;
    let block = layout::panel(queue_title(session), theme, focused)
        .title_bottom(Line::from(" [←/→] move  [a] answer  [r] reveal  [s/t] filter ").centered());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(card) = queue.current() else {
        let message = match session.active() {
            QueueKind::Main if queue.cards().is_empty() => {
                "No cards yet. Add one with :add subject | topic | question | expected answer"
                    .to_string()
            }
            QueueKind::Difficult if queue.cards().is_empty() => format!(
                "No difficult cards. Every answered card last scored {} or more.",
                DIFFICULTY_THRESHOLD
            ),
            _ => "No cards match the current filters. Press s or t to change them.".to_string(),
        };
        let para = Paragraph::new(message)
            .style(Style::default().fg(theme.fg_muted))
            .wrap(Wrap { trim: true });
        frame.render_widget(para, inner);
        return;
    };

    let score = session.latest_score(card);
    let score_text = match score {
        Some(s) => format!("last score {}", s),
        None => "not answered yet".to_string(),
    };
    let shared = if session.is_shared(&card.id) { " · shared" } else { "" };

    let mut lines = vec![
        Line::from(vec![
            Span::styled(
                format!("{} › {}", card.subject, card.topic),
                Style::default().fg(theme.accent_secondary),
            ),
            Span::styled(format!("{}  ", shared), Style::default().fg(theme.fg_muted)),
            Span::styled(score_text, Style::default().fg(theme.score_color(score))),
        ]),
        Line::from(""),
        Line::from(Span::styled(
            card.question.clone(),
            Style::default().fg(theme.fg_primary).add_modifier(Modifier::BOLD),
        )),
    ];

    if queue.is_revealed() {
        lines.push(Line::from(""));
        lines.push(Line::from(Span::styled(
            "Expected answer",
            Style::default().fg(theme.info).add_modifier(Modifier::BOLD),
        )));
        for line in card.expected_answer.lines() {
            lines.push(Line::from(Span::styled(
                line.to_string(),
                Style::default().fg(theme.fg_secondary),
            )));
        }
    }

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);
}

fn draw_answer(frame: &mut Frame, area: Rect, state: &AppState, theme: &Theme) {
    let title = if state.busy {
        " Your answer · grading… "
    } else if state.answering {
        " Your answer · [Enter] submit  [Alt+Enter] new line  [Esc] stop "
    } else {
        " Your answer · [a] write "
    };
    let block = layout::panel(title, theme, state.answering);
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let text_style = if state.busy {
        Style::default().fg(theme.fg_muted)
    } else {
        Style::default().fg(theme.fg_primary)
    };

    let lines: Vec<Line> = if state.answering {
        answer_lines_with_cursor(&state.answer.text, state.answer.cursor, text_style, theme)
    } else if state.answer.is_blank() {
        vec![Line::from(Span::styled(
            "Write your answer in your own words.",
            Style::default().fg(theme.fg_muted),
        ))]
    } else {
        state
            .answer
            .text
            .lines()
            .map(|l| Line::from(Span::styled(l.to_string(), text_style)))
            .collect()
    };

    // Keep the cursor line in view
    let cursor_row =
        state.answer.text.chars().take(state.answer.cursor).filter(|c| *c == '\n').count();
    let scroll = cursor_row.saturating_sub(inner.height.saturating_sub(1) as usize);

    let para = Paragraph::new(lines).wrap(Wrap { trim: false }).scroll((scroll as u16, 0));
    frame.render_widget(para, inner);
}

/// Split a multi-line answer into lines, drawing the cursor on its line
fn answer_lines_with_cursor(
    text: &str,
    cursor: usize,
    style: Style,
    theme: &Theme,
) -> Vec<Line<'static>> {
    let mut lines = Vec::new();
    let mut offset = 0;
    for line in text.split('\n') {
        let len = line.chars().count();
        if (offset..=offset + len).contains(&cursor) {
            lines.push(command_line::build_line_with_cursor(line, cursor - offset, style, theme));
        } else {
            lines.push(Line::from(Span::styled(line.to_string(), style)));
        }
        offset += len + 1;
    }
    lines
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn cursor_lands_on_its_line() {
        let theme = Theme::default();
        let lines = answer_lines_with_cursor("ab\ncde", 4, Style::default(), &theme);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[0].spans.len(), 1);
        assert_eq!(lines[1].spans.len(), 3); // before + cursor + after
        assert_eq!(lines[1].spans[1].content, "d");
    }

    #[test]
    fn cursor_after_trailing_newline() {
        let theme = Theme::default();
        let lines = answer_lines_with_cursor("ab\n", 3, Style::default(), &theme);
        assert_eq!(lines.len(), 2);
        assert_eq!(lines[1].spans.len(), 1);
        assert_eq!(lines[1].spans[0].content, " ");
    }
}
