//! Layout utilities and common components

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Direction, Layout, Rect},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Block, Borders, Paragraph},
};

use crate::theme::Theme;

/// Screens reachable from the tab bar, with their key
const TABS: [(&str, &str); 3] = [("1", "Practice"), ("2", "Cards"), ("3", "History")];

/// Areas of a logged-in screen
pub struct ScreenAreas {
    pub header: Rect,
    pub body: Rect,
    pub command: Rect,
}

/// Split the frame into a one-line header, the body and the command line
pub fn screen_areas(area: Rect) -> ScreenAreas {
    let chunks = Layout::default()
        .direction(Direction::Vertical)
        .constraints([Constraint::Length(1), Constraint::Min(3), Constraint::Length(1)])
        .split(area);
    ScreenAreas { header: chunks[0], body: chunks[1], command: chunks[2] }
}

/// Bordered panel in the theme's colors
pub fn panel<'a>(title: impl Into<Line<'a>>, theme: &Theme, focused: bool) -> Block<'a> {
    let border_color = if focused { theme.border_focused } else { theme.border };
    Block::default()
        .title(title)
        .borders(Borders::ALL)
        .border_style(Style::default().fg(border_color))
        .style(Style::default().bg(theme.bg_primary))
}

/// Header line: tabs on the left, the user on the right
pub fn draw_header(frame: &mut Frame, area: Rect, active: &str, user: &str, theme: &Theme) {
    let mut spans = vec![Span::styled(
        " discursiva ",
        Style::default().fg(theme.bg_primary).bg(theme.accent_primary).add_modifier(Modifier::BOLD),
    )];
    for (key, name) in TABS {
        let style = if name == active {
            Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD)
        } else {
            Style::default().fg(theme.fg_muted)
        };
        spans.push(Span::styled(format!("  {} {}", key, name), style));
    }

    let tabs = Paragraph::new(Line::from(spans)).style(Style::default().bg(theme.bg_secondary));
    frame.render_widget(tabs, area);

    let who = Paragraph::new(Line::from(Span::styled(
        format!("{} ", user),
        Style::default().fg(theme.fg_secondary),
    )))
    .alignment(Alignment::Right);
    frame.render_widget(who, area);
}

/// Create a centered rectangle with the given percentage of width and height
pub fn centered_rect(percent_x: u16, percent_y: u16, r: Rect) -> Rect {
    let popup_layout = Layout::vertical([
        Constraint::Percentage((100 - percent_y) / 2),
        Constraint::Percentage(percent_y),
        Constraint::Percentage((100 - percent_y) / 2),
    ])
    .split(r);

    Layout::horizontal([
        Constraint::Percentage((100 - percent_x) / 2),
        Constraint::Percentage(percent_x),
        Constraint::Percentage((100 - percent_x) / 2),
    ])
    .split(popup_layout[1])[1]
}

/// Wrap `text` to `width` columns, keeping blank lines
pub fn wrap_text(text: &str, width: usize) -> Vec<String> {
    if width == 0 {
        return vec![String::new()];
    }
    text.lines()
        .flat_map(|line| {
            if line.trim().is_empty() {
                vec![String::new()]
            } else {
                textwrap::wrap(line, width).into_iter().map(|l| l.into_owned()).collect()
            }
        })
        .collect()
}

/// Clamp a scroll offset so the last page stays full
pub fn clamp_scroll(scroll: usize, total_lines: usize, visible_lines: usize) -> usize {
    scroll.min(total_lines.saturating_sub(visible_lines))
}

/// Draw scroll indicator on the right side
pub fn draw_scroll_indicator(
    frame: &mut Frame,
    area: Rect,
    scroll: usize,
    max_scroll: usize,
    theme: &Theme,
) {
    if area.height < 3 || max_scroll == 0 {
        return;
    }

    let track_height = area.height.saturating_sub(2) as usize;
    let thumb_pos = (scroll * track_height) / max_scroll;

    let thumb_y = area.y + 1 + thumb_pos as u16;
    let thumb_x = area.x + area.width - 1;

    if thumb_y < area.y + area.height - 1 {
        let thumb = Paragraph::new("█").style(Style::default().fg(theme.fg_muted));
        frame.render_widget(thumb, Rect::new(thumb_x, thumb_y, 1, 1));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn centered_rect_is_inside() {
        let outer = Rect::new(0, 0, 100, 50);
        let inner = centered_rect(60, 40, outer);
        assert_eq!(inner.width, 60);
        assert_eq!(inner.height, 20);
        assert_eq!(inner.x, 20);
        assert_eq!(inner.y, 15);
    }

    #[test]
    fn wrap_text_keeps_paragraphs() {
        let lines = wrap_text("uma frase longa demais\n\nfim", 10);
        assert_eq!(lines, vec!["uma frase", "longa", "demais", "", "fim"]);
    }

    #[test]
    fn wrap_text_zero_width() {
        assert_eq!(wrap_text("abc", 0), vec![String::new()]);
    }

    #[test]
    fn scroll_is_clamped_to_last_page() {
        assert_eq!(clamp_scroll(50, 20, 5), 15);
        assert_eq!(clamp_scroll(3, 20, 5), 3);
        assert_eq!(clamp_scroll(3, 4, 5), 0);
    }
}
