//! Login, registration and first-run administrator form

use ratatui::{
    Frame,
    layout::{Alignment, Constraint, Layout},
    style::{Modifier, Style},
    text::{Line, Span},
    widgets::{Clear, Paragraph, Wrap},
};

use super::{command_line, layout};
use crate::app::state::{CommandLineState, LoginField, LoginForm, LoginMode, TextInput};
use crate::theme::Theme;

/// Character shown in place of each password character
const MASK: char = '•';

pub fn draw(
    frame: &mut Frame,
    form: &LoginForm,
    status: &CommandLineState,
    theme: &Theme,
) {
    let area = frame.area();
    frame.render_widget(Paragraph::new("").style(Style::default().bg(theme.bg_primary)), area);

    let chunks = Layout::vertical([Constraint::Min(3), Constraint::Length(1)]).split(area);
    let form_area = layout::centered_rect(50, 60, chunks[0]);
    frame.render_widget(Clear, form_area);

    let (title, intro) = match form.mode {
        LoginMode::CreateAdmin => (
            " First run ",
            "No administrator exists yet. Choose the password of the 'admin' account.",
        ),
        LoginMode::Login => (" Log in ", "Practice open-ended questions graded by Claude."),
        LoginMode::Register => (" Register ", "Create an account. The administrator must exist."),
    };

    let block =
        layout::panel(title, theme, true).title_bottom(Line::from(footer(form.mode)).centered());
    let inner = block.inner(form_area);
    frame.render_widget(block, form_area);

    let mut lines = vec![
        Line::from(Span::styled(
            "discursiva",
            Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD),
        ))
        .alignment(Alignment::Center),
        Line::from(Span::styled(intro, Style::default().fg(theme.fg_muted)))
            .alignment(Alignment::Center),
        Line::from(""),
    ];

    let focused = form.focused();
    for &field in form.fields() {
        lines.push(field_line(field, form.field(field), field == focused, theme));
        lines.push(Line::from(""));
    }

    let para = Paragraph::new(lines).wrap(Wrap { trim: false });
    frame.render_widget(para, inner);

    command_line::draw_with_hint(frame, chunks[1], status, theme, "Enter to submit");
}

fn footer(mode: LoginMode) -> &'static str {
    match mode {
        LoginMode::CreateAdmin => " [Tab] next field  [Enter] create  [Esc] quit ",
        LoginMode::Login => " [Tab] next field  [Enter] log in  [Ctrl+R] register  [Esc] quit ",
        LoginMode::Register => " [Tab] next field  [Enter] register  [Ctrl+R] log in  [Esc] quit ",
    }
}

/// Text shown for a field; secret fields are masked
fn display_text(field: LoginField, input: &TextInput) -> String {
    if field.is_secret() {
        std::iter::repeat_n(MASK, input.text.chars().count()).collect()
    } else {
        input.text.clone()
    }
}

fn field_line(field: LoginField, input: &TextInput, focused: bool, theme: &Theme) -> Line<'static> {
    let label_style = if focused {
        Style::default().fg(theme.accent_primary).add_modifier(Modifier::BOLD)
    } else {
        Style::default().fg(theme.fg_secondary)
    };
    let label = Span::styled(format!("{:>18}: ", field.label()), label_style);

    let text = display_text(field, input);
    let value_style = Style::default().fg(theme.fg_primary);
    if !focused {
        return Line::from(vec![label, Span::styled(text, value_style)]);
    }

    let mut spans = vec![label];
    spans.extend(command_line::build_line_with_cursor(&text, input.cursor, value_style, theme).spans);
    Line::from(spans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn passwords_are_masked() {
        let mut input = TextInput::default();
        input.set("segredo");
        assert_eq!(display_text(LoginField::Password, &input), "•••••••");
        assert_eq!(display_text(LoginField::Confirm, &input).chars().count(), 7);
        assert_eq!(display_text(LoginField::Username, &input), "segredo");
    }
}
