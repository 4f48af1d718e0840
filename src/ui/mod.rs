//! UI rendering components

pub mod cards;
pub mod command_line;
pub mod feedback;
pub mod help;
pub mod history;
pub mod layout;
pub mod login;
pub mod practice;

use ratatui::{Frame, style::Style, widgets::Block};

use crate::app::state::{AppState, Screen};
use crate::grading::SectionSet;
use crate::theme::Theme;

/// Main draw function
pub fn draw(frame: &mut Frame, state: &mut AppState, theme: &Theme, sections: &SectionSet) {
    let area = frame.area();
    frame.render_widget(Block::default().style(Style::default().bg(theme.bg_primary)), area);

    if state.screen == Screen::Login {
        login::draw(frame, &state.login, &state.command_line, theme);
        return;
    }

    let user = state.session.as_ref().map(|s| s.user().to_string()).unwrap_or_default();
    let areas = layout::screen_areas(area);

    // Help draws over the screen it was opened from
    let screen = if state.screen == Screen::Help { state.previous_screen } else { state.screen };
    let tab = match screen {
        Screen::Cards => "Cards",
        Screen::History => "History",
        _ => "Practice",
    };
    layout::draw_header(frame, areas.header, tab, &user, theme);

    match screen {
        Screen::Cards => cards::draw(frame, areas.body, state, theme),
        Screen::History => history::draw(frame, areas.body, state, theme),
        _ => practice::draw(frame, areas.body, state, theme, sections),
    }

    if state.screen == Screen::Help {
        help::draw(frame, areas.body, theme);
    }

    command_line::draw(frame, areas.command, &state.command_line, theme);
}
