//! Key mapping for the browsing screens

use crossterm::event::{KeyCode, KeyModifiers};

/// Actions that can be taken outside text entry
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    // Navigation
    Previous,
    Next,
    First,
    Last,
    Up,
    Down,

    // Practice
    SwitchQueue,
    Answer,
    Reveal,
    CycleSubject,
    CycleTopic,

    // Screens
    ShowPractice,
    ShowCards,
    ShowHistory,
    Help,
    Back,

    // Cards screen
    EditCard,
    DeleteCard,

    // Modes
    Command,
    Quit,
}

/// Key mapping without modifiers; `vim` adds the h/j/k/l/g/G motions
pub fn key_to_action(key: KeyCode, vim: bool) -> Option<Action> {
    let motion = match key {
        KeyCode::Left => Some(Action::Previous),
        KeyCode::Right => Some(Action::Next),
        KeyCode::Home => Some(Action::First),
        KeyCode::End => Some(Action::Last),
        KeyCode::Up => Some(Action::Up),
        KeyCode::Down => Some(Action::Down),
        KeyCode::Char('h') if vim => Some(Action::Previous),
        KeyCode::Char('l') if vim => Some(Action::Next),
        KeyCode::Char('g') if vim => Some(Action::First),
        KeyCode::Char('G') if vim => Some(Action::Last),
        KeyCode::Char('k') if vim => Some(Action::Up),
        KeyCode::Char('j') if vim => Some(Action::Down),
        _ => None,
    };
    if motion.is_some() {
        return motion;
    }

    match key {
        KeyCode::Tab => Some(Action::SwitchQueue),
        KeyCode::Char('a') | KeyCode::Enter => Some(Action::Answer),
        KeyCode::Char('r') => Some(Action::Reveal),
        KeyCode::Char('s') => Some(Action::CycleSubject),
        KeyCode::Char('t') => Some(Action::CycleTopic),
        KeyCode::Char('1') => Some(Action::ShowPractice),
        KeyCode::Char('2') => Some(Action::ShowCards),
        KeyCode::Char('3') => Some(Action::ShowHistory),
        KeyCode::Char('e') => Some(Action::EditCard),
        KeyCode::Char('d') => Some(Action::DeleteCard),
        KeyCode::Char('?') => Some(Action::Help),
        KeyCode::Char(':') => Some(Action::Command),
        KeyCode::Esc => Some(Action::Back),
        // Note: 'q' intentionally not mapped - use :q command to quit
        _ => None,
    }
}

/// Key mapping with modifiers (for Ctrl combinations)
pub fn key_with_modifier_to_action(
    key: KeyCode,
    modifiers: KeyModifiers,
    vim: bool,
) -> Option<Action> {
    if modifiers.contains(KeyModifiers::CONTROL) {
        match key {
            KeyCode::Char('c') => Some(Action::Quit),
            KeyCode::Char('n') => Some(Action::Next),
            KeyCode::Char('p') => Some(Action::Previous),
            _ => None,
        }
    } else {
        key_to_action(key, vim)
    }
}
