//! Grader feedback panel

use ratatui::{
    Frame,
    layout::Rect,
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::Paragraph,
};

use super::layout;
use crate::grading::{ParsedFeedback, SectionKey, SectionSet};
use crate::practice::{FeedbackBody, PendingFeedback};
use crate::theme::Theme;

/// Draw the feedback for the displayed card, clamping `scroll` to the text
pub fn draw(
    frame: &mut Frame,
    area: Rect,
    feedback: Option<&PendingFeedback>,
    scroll: &mut usize,
    set: &SectionSet,
    theme: &Theme,
) {
    let block = layout::panel(" Feedback ", theme, false)
        .title_bottom(Line::from(" [↑/↓] scroll ").right_aligned());
    let inner = block.inner(area);
    frame.render_widget(block, area);

    let Some(feedback) = feedback else {
        let empty = Paragraph::new("Answer the question to see Claude's feedback here.")
            .style(Style::default().fg(theme.fg_muted));
        frame.render_widget(empty, inner);
        return;
    };

    let width = inner.width.saturating_sub(2) as usize;
    let lines = feedback_lines(&feedback.body, set, theme, width);

    let visible_lines = inner.height as usize;
    let total_lines = lines.len();
    *scroll = layout::clamp_scroll(*scroll, total_lines, visible_lines);

    let para = Paragraph::new(lines)
        .style(Style::default().fg(theme.fg_primary))
        .scroll((*scroll as u16, 0));
    frame.render_widget(para, inner);

    if total_lines > visible_lines {
        let max_scroll = total_lines - visible_lines;
        layout::draw_scroll_indicator(frame, inner, *scroll, max_scroll, theme);
    }
}

/// Lay out a feedback body as wrapped, styled lines
pub fn feedback_lines(
    body: &FeedbackBody,
    set: &SectionSet,
    theme: &Theme,
    width: usize,
) -> Vec<Line<'static>> {
    let graded = match body {
        FeedbackBody::MissingInput(prompt) => {
            return plain(prompt, Style::default().fg(theme.warning), width);
        }
        FeedbackBody::Graded(graded) => graded,
    };

    if graded.raw.starts_with(set.error_marker) {
        return plain(&graded.raw, Style::default().fg(theme.error), width);
    }

    match &graded.feedback {
        ParsedFeedback::Raw { raw, error } => {
            tracing::debug!("Showing unparsed feedback: {}", error);
            plain(raw, Style::default().fg(theme.fg_primary), width)
        }
        ParsedFeedback::Sections(_) => {
            let mut lines = Vec::new();
            for key in SectionKey::ALL {
                let text = graded.feedback.section(key).unwrap_or(set.unavailable);
                let heading =
                    Style::default().fg(theme.accent_secondary).add_modifier(Modifier::BOLD);
                lines.push(Line::from(Span::styled(set.label(key).to_string(), heading)));

                let style = if key == SectionKey::Score {
                    Style::default().fg(theme.score_color(graded.score)).add_modifier(Modifier::BOLD)
                } else if text == set.unavailable {
                    Style::default().fg(theme.fg_muted)
                } else {
                    Style::default().fg(theme.fg_primary)
                };
                lines.extend(plain(text, style, width));
                lines.push(Line::from(""));
            }
            lines.pop();
            lines
        }
    }
}

fn plain(text: &str, style: Style, width: usize) -> Vec<Line<'static>> {
    layout::wrap_text(text, width)
        .into_iter()
        .map(|line| Line::from(Span::styled(line, style)))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::grading::GradedAnswer;
    use crate::grading::sections::ENGLISH;
    use pretty_assertions::assert_eq;

    fn texts(lines: &[Line]) -> Vec<String> {
        lines.iter().map(|l| l.spans.iter().map(|s| s.content.as_ref()).collect()).collect()
    }

    #[test]
    fn missing_input_shows_prompt() {
        let theme = Theme::default();
        let lines =
            feedback_lines(&FeedbackBody::MissingInput(ENGLISH.missing_input), &ENGLISH, &theme, 80);
        assert_eq!(texts(&lines), vec![ENGLISH.missing_input]);
    }

    #[test]
    fn sections_are_labelled_in_order() {
        let theme = Theme::default();
        let raw = "**1. Meaning Score (0-100):** 85\n\
                   **2. Main Meaning Assessment:** Good.\n\
                   **3. Content Gaps:** None.\n\
                   **4. Grammar/Spelling Errors:** None.\n\
                   **5. Quick Improvement Suggestions:** Cite the article."
            .to_string();
        let graded = GradedAnswer::from_reply(raw, &ENGLISH);
        let lines = feedback_lines(&FeedbackBody::Graded(graded), &ENGLISH, &theme, 80);
        let texts = texts(&lines);

        assert_eq!(texts[0], "Meaning Score (0-100)");
        assert_eq!(texts[1], "85");
        assert_eq!(texts[3], "Main Meaning Assessment");
        assert_eq!(texts.last().map(String::as_str), Some("Cite the article."));
        assert_eq!(lines[1].spans[0].style.fg, Some(theme.success));
    }

    #[test]
    fn grader_errors_are_shown_as_errors() {
        let theme = Theme::default();
        let raw = format!("{}timeout", ENGLISH.error_marker);
        let graded = GradedAnswer::from_reply(raw.clone(), &ENGLISH);
        let lines = feedback_lines(&FeedbackBody::Graded(graded), &ENGLISH, &theme, 80);
        assert_eq!(texts(&lines), vec![raw]);
        assert_eq!(lines[0].spans[0].style.fg, Some(theme.error));
    }
}
