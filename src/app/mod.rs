//! Application state and event handling

pub mod command;
pub mod input;
pub mod state;

use std::io::{self, Stdout};
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::accounts::{self, ADMIN_USERNAME, Account};
use crate::config::Config;
use crate::grading::{Grader, GradingGateway};
use crate::practice::{CardScope, QueueKind, Session, SubmitOutcome, cycle_option};
use crate::store::Store;
use crate::theme::Theme;
use crate::ui;
use command::{Command, ParseResult, parse_command};
use input::{Action, key_with_modifier_to_action};
use state::{AppState, LoginMode, Screen, TextInput};

/// The main application
pub struct App<G> {
    /// Application configuration
    config: Config,

    /// Colors resolved from the configuration
    theme: Theme,

    /// Current application state
    state: AppState,

    /// Cards, history and accounts
    store: Box<dyn Store>,

    /// Grades submitted answers
    gateway: GradingGateway<G>,

    /// Terminal backend
    terminal: Terminal<CrosstermBackend<Stdout>>,
}

impl<G: Grader> App<G> {
    /// How long to wait for input before redrawing
    const POLL_INTERVAL: Duration = Duration::from_millis(250);

    /// Create a new application instance
    pub fn new(config: Config, store: Box<dyn Store>, gateway: GradingGateway<G>) -> Result<Self> {
        let login = if accounts::admin_exists(store.as_ref())? {
            LoginMode::Login
        } else {
            LoginMode::CreateAdmin
        };
        let terminal = Self::setup_terminal()?;
        let theme = config.active_theme();

        Ok(Self { config, theme, state: AppState::new(login), store, gateway, terminal })
    }

    /// Set up the terminal for TUI rendering
    fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
        enable_raw_mode()?;
        let mut stdout = io::stdout();
        execute!(stdout, EnterAlternateScreen)?;
        let backend = CrosstermBackend::new(stdout);
        let terminal = Terminal::new(backend)?;
        Ok(terminal)
    }

    /// Restore the terminal to its original state
    fn restore_terminal(&mut self) -> Result<()> {
        disable_raw_mode()?;
        execute!(self.terminal.backend_mut(), LeaveAlternateScreen)?;
        self.terminal.show_cursor()?;
        Ok(())
    }

    fn draw(&mut self) -> Result<()> {
        self.terminal.draw(|frame| {
            ui::draw(frame, &mut self.state, &self.theme, self.gateway.sections());
        })?;
        Ok(())
    }

    /// Run the application main loop
    pub async fn run(&mut self) -> Result<()> {
        // Set up panic hook to restore terminal
        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen);
            original_hook(panic_info);
        }));

        tracing::info!("TUI started");
        loop {
            self.draw()?;

            if event::poll(Self::POLL_INTERVAL)? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press {
                        match self.handle_key(key).await {
                            Ok(true) => break, // Exit requested
                            Ok(false) => {}    // Continue
                            Err(e) => {
                                tracing::error!("Error handling key: {}", e);
                                self.state.command_line.set_error(e.to_string());
                            }
                        }
                    }
                }
            }
        }

        self.restore_terminal()?;
        tracing::info!("TUI closed");
        Ok(())
    }

    /// Handle a key press, returns true if should exit
    async fn handle_key(&mut self, key: KeyEvent) -> Result<bool> {
        if self.state.command_line.is_input_mode() {
            return self.handle_command_key(key);
        }
        match self.state.screen {
            Screen::Login => self.handle_login_key(key),
            Screen::Practice if self.state.answering => self.handle_answer_key(key).await,
            _ => Ok(self.handle_browse_key(key)),
        }
    }

    fn handle_command_key(&mut self, key: KeyEvent) -> Result<bool> {
        let cl = &mut self.state.command_line;
        match key.code {
            KeyCode::Esc => cl.exit_input_mode(),
            KeyCode::Enter => {
                let line = cl.input.take();
                cl.add_to_history(line.clone());
                cl.exit_input_mode();
                return self.run_command_line(&line);
            }
            KeyCode::Up => cl.history_up(),
            KeyCode::Down => cl.history_down(),
            code => edit_text(&mut cl.input, code),
        }
        Ok(false)
    }

    fn run_command_line(&mut self, line: &str) -> Result<bool> {
        match parse_command(line) {
            ParseResult::Ok(command) => self.execute(command),
            ParseResult::UnknownCommand(cmd) => {
                self.state.command_line.set_error(format!("Unknown command: {}", cmd));
                Ok(false)
            }
            ParseResult::MissingArgument(cmd) => {
                self.state.command_line.set_error(format!(":{} needs an argument", cmd));
                Ok(false)
            }
            ParseResult::InvalidArgument(hint) => {
                self.state.command_line.set_error(hint);
                Ok(false)
            }
        }
    }

    fn handle_login_key(&mut self, key: KeyEvent) -> Result<bool> {
        let form = &mut self.state.login;
        if key.modifiers.contains(KeyModifiers::CONTROL) {
            match key.code {
                KeyCode::Char('c') => return Ok(true),
                KeyCode::Char('r') => form.toggle_register(),
                _ => {}
            }
            return Ok(false);
        }

        match key.code {
            KeyCode::Esc => return Ok(true),
            KeyCode::Tab | KeyCode::Down => form.focus_next(),
            KeyCode::BackTab | KeyCode::Up => form.focus_previous(),
            KeyCode::Enter => self.submit_login()?,
            code => edit_text(form.focused_input(), code),
        }
        Ok(false)
    }

    fn submit_login(&mut self) -> Result<()> {
        let form = self.state.login.clone();
        let store = self.store.as_mut();
        let cl = &mut self.state.command_line;

        match form.mode {
            LoginMode::CreateAdmin => {
                match accounts::create_admin(store, &form.password.text, &form.confirm.text) {
                    Ok(_) => {
                        self.state.login.reset_for_login(ADMIN_USERNAME);
                        cl.set_message("Administrator created. Log in to continue.");
                    }
                    Err(e) => cl.set_error(e.to_string()),
                }
            }
            LoginMode::Register => match accounts::register(
                store,
                &form.username.text,
                &form.password.text,
                &form.confirm.text,
            ) {
                Ok(account) => {
                    self.state.login.reset_for_login(&account.username);
                    cl.set_message("Account created. Log in to continue.");
                }
                Err(e) => cl.set_error(e.to_string()),
            },
            LoginMode::Login => {
                match accounts::login(store, &form.username.text, &form.password.text) {
                    Ok(account) => self.open_session(&account),
                    Err(e) => {
                        self.state.login.password.clear();
                        cl.set_error(e.to_string());
                    }
                }
            }
        }
        Ok(())
    }

    fn open_session(&mut self, account: &Account) {
        let session = Session::open(
            self.store.as_ref(),
            &account.username,
            account.is_admin(),
            self.config.ranking,
        );
        let greeting = format!(
            "Welcome, {}: {} cards, {} difficult. Press ? for help.",
            account.username,
            session.active_queue().cards().len(),
            session.queue(QueueKind::Difficult).cards().len()
        );

        self.state.session = Some(session);
        self.state.login = Default::default();
        self.state.show(Screen::Practice);
        self.state.command_line.set_message(greeting);
        self.show_notices();
    }

    /// Surface notices the session raised since the last check
    fn show_notices(&mut self) {
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        let notices = session.take_notices();
        if !notices.is_empty() {
            self.state.command_line.set_error(notices.join(" | "));
        }
    }

    async fn handle_answer_key(&mut self, key: KeyEvent) -> Result<bool> {
        match key.code {
            KeyCode::Esc => self.state.answering = false,
            KeyCode::Enter if key.modifiers.contains(KeyModifiers::ALT) => {
                self.state.answer.insert_char('\n');
            }
            KeyCode::Enter => self.submit_answer().await?,
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => return Ok(true),
            code => edit_text(&mut self.state.answer, code),
        }
        Ok(false)
    }

    async fn submit_answer(&mut self) -> Result<()> {
        if self.state.session.is_none() {
            return Ok(());
        }
        self.state.busy = true;
        self.draw()?;

        let answer = self.state.answer.text.clone();
        let outcome = match self.state.session.as_mut() {
            Some(session) => session.submit(self.store.as_mut(), &self.gateway, &answer).await,
            None => SubmitOutcome::NoCard,
        };
        self.state.busy = false;

        // Keys pressed while grading are dropped
        while event::poll(Duration::ZERO)? {
            let _ = event::read()?;
        }

        let cl = &mut self.state.command_line;
        match outcome {
            SubmitOutcome::NoCard => cl.set_error("There is no card to answer."),
            SubmitOutcome::MissingInput => cl.set_error("Write an answer before submitting."),
            SubmitOutcome::Graded { score } => {
                self.state.answer.clear();
                self.state.answering = false;
                self.state.feedback_scroll = 0;
                match score {
                    Some(score) => cl.set_message(format!("Graded: {}/100", score)),
                    None => cl.set_message("Graded, but no score was found in the feedback."),
                }
            }
        }
        self.show_notices();
        Ok(())
    }

    fn handle_browse_key(&mut self, key: KeyEvent) -> bool {
        let action = key_with_modifier_to_action(key.code, key.modifiers, self.config.vim_mode);

        // Any key closes help
        if self.state.screen == Screen::Help {
            if action == Some(Action::Quit) {
                return true;
            }
            let back = self.state.previous_screen;
            self.state.show(back);
            return false;
        }
        let Some(action) = action else {
            return false;
        };

        match action {
            Action::Quit => return true,
            Action::Command => self.state.command_line.enter_command_mode(),
            Action::Help => self.state.show(Screen::Help),
            Action::ShowPractice => self.state.show(Screen::Practice),
            Action::ShowCards => {
                self.state.clamp_selection();
                self.state.show(Screen::Cards);
            }
            Action::ShowHistory => self.state.show(Screen::History),
            Action::Back => self.state.command_line.clear_message(),
            _ => match self.state.screen {
                Screen::Practice => self.practice_action(action),
                Screen::Cards => self.cards_action(action),
                Screen::History => self.history_action(action),
                Screen::Login | Screen::Help => {}
            },
        }
        false
    }

    fn practice_action(&mut self, action: Action) {
        let Some(session) = self.state.session.as_mut() else {
            return;
        };
        let cl = &mut self.state.command_line;

        let nav = match action {
            Action::Previous => Some(session.active_queue_mut().previous()),
            Action::Next => Some(session.active_queue_mut().next()),
            Action::First => Some(session.active_queue_mut().first()),
            Action::Last => Some(session.active_queue_mut().last()),
            _ => None,
        };
        if let Some(outcome) = nav {
            self.state.feedback_scroll = 0;
            match outcome.notice() {
                Some(notice) => cl.set_message(notice),
                None => cl.clear_message(),
            }
            return;
        }

        match action {
            Action::SwitchQueue => {
                session.switch_queue();
                let kind = session.active();
                cl.set_message(format!(
                    "{} queue: {} cards",
                    kind.label(),
                    session.active_queue().len()
                ));
            }
            Action::Answer => {
                if session.active_queue().current().is_some() {
                    self.state.answering = true;
                } else {
                    cl.set_error("There is no card to answer.");
                }
            }
            Action::Reveal => session.active_queue_mut().toggle_reveal(),
            Action::CycleSubject => {
                session.active_queue_mut().cycle_subject();
                let subject = session.active_queue().subject_filter().unwrap_or("all");
                cl.set_message(format!("Subject: {}", subject));
            }
            Action::CycleTopic => {
                session.active_queue_mut().cycle_topic();
                let topic = session.active_queue().topic_filter().unwrap_or("all");
                cl.set_message(format!("Topic: {}", topic));
            }
            Action::Up => {
                self.state.feedback_scroll = self.state.feedback_scroll.saturating_sub(1);
            }
            Action::Down => self.state.feedback_scroll += 1,
            _ => {}
        }
    }

    fn cards_action(&mut self, action: Action) {
        let Some(session) = self.state.session.as_ref() else {
            return;
        };
        let len = session.deck().len();
        let number = self.state.selected_card + 1;

        match action {
            Action::Up | Action::Previous => {
                self.state.selected_card = self.state.selected_card.saturating_sub(1);
            }
            Action::Down | Action::Next => {
                if self.state.selected_card + 1 < len {
                    self.state.selected_card += 1;
                }
            }
            Action::First => self.state.selected_card = 0,
            Action::Last => self.state.selected_card = len.saturating_sub(1),
            Action::Answer => self.state.command_line.prefill("add "),
            Action::EditCard => {
                if let Some(card) = session.card_at(number) {
                    let line = format!(
                        "edit {} {} | {} | {} | {}",
                        number, card.subject, card.topic, card.question, card.expected_answer
                    );
                    self.state.command_line.prefill(line);
                }
            }
            Action::DeleteCard => {
                if session.card_at(number).is_some() {
                    self.state.command_line.prefill(format!("delete {}", number));
                }
            }
            _ => {}
        }
    }

    fn history_action(&mut self, action: Action) {
        let Some(session) = self.state.session.as_ref() else {
            return;
        };
        let view = &mut self.state.history;

        match action {
            Action::Up => view.scroll = view.scroll.saturating_sub(1),
            Action::Down => view.scroll += 1,
            Action::First => view.scroll = 0,
            Action::CycleSubject => {
                let stats = session.stats(None, None);
                view.subject = cycle_option(&stats.subjects, view.subject.as_deref());
                view.topic = None;
                view.scroll = 0;
            }
            Action::CycleTopic => {
                let stats = session.stats(view.subject.as_deref(), None);
                view.topic = cycle_option(&stats.topics, view.topic.as_deref());
                view.scroll = 0;
            }
            _ => {}
        }
    }

    /// Execute a parsed command, returns true if should exit
    fn execute(&mut self, command: Command) -> Result<bool> {
        match command {
            Command::Nop => self.state.command_line.clear_message(),
            Command::Quit => return Ok(true),
            Command::Help => self.state.show(Screen::Help),
            Command::Practice => self.state.show(Screen::Practice),
            Command::Cards => {
                self.state.clamp_selection();
                self.state.show(Screen::Cards);
            }
            Command::History => self.state.show(Screen::History),
            Command::Logout => {
                self.state.logout();
                self.state.command_line.set_message("Logged out.");
            }
            command => self.execute_session_command(command),
        }
        Ok(false)
    }

    fn execute_session_command(&mut self, command: Command) {
        let Some(session) = self.state.session.as_mut() else {
            self.state.command_line.set_error("Log in first.");
            return;
        };
        let store = self.store.as_mut();
        let on_history = self.state.screen == Screen::History;

        let result: Result<String, String> = match command {
            Command::Add(draft) => session
                .add_card(store, CardScope::Own, draft)
                .map(|card| format!("Added: {}", card.question))
                .map_err(|e| e.to_string()),
            Command::AddShared(draft) => session
                .add_card(store, CardScope::Shared, draft)
                .map(|card| format!("Added to the shared pool: {}", card.question))
                .map_err(|e| e.to_string()),
            Command::Edit(number, draft) => match session.card_at(number).map(|c| c.id.clone()) {
                Some(id) => session
                    .edit_card(store, &id, draft)
                    .map(|()| format!("Updated card {}", number))
                    .map_err(|e| e.to_string()),
                None => Err(format!("There is no card {}", number)),
            },
            Command::Delete(number) => match session.card_at(number).map(|c| c.id.clone()) {
                Some(id) => session
                    .delete_card(store, &id)
                    .map(|()| format!("Deleted card {}", number))
                    .map_err(|e| e.to_string()),
                None => Err(format!("There is no card {}", number)),
            },
            Command::Subject(subject) if on_history => {
                let label = subject.clone().unwrap_or_else(|| "all".into());
                self.state.history.subject = subject;
                self.state.history.topic = None;
                self.state.history.scroll = 0;
                Ok(format!("History subject: {}", label))
            }
            Command::Topic(topic) if on_history => {
                let label = topic.clone().unwrap_or_else(|| "all".into());
                self.state.history.topic = topic;
                self.state.history.scroll = 0;
                Ok(format!("History topic: {}", label))
            }
            Command::Subject(subject) => {
                let label = subject.clone().unwrap_or_else(|| "all".into());
                session.active_queue_mut().set_subject(subject);
                Ok(format!("Subject: {}", label))
            }
            Command::Topic(topic) => {
                let label = topic.clone().unwrap_or_else(|| "all".into());
                session.active_queue_mut().set_topic(topic);
                Ok(format!("Topic: {}", label))
            }
            Command::ClearHistory => session
                .clear_history(store)
                .map(|()| "History cleared.".to_string())
                .map_err(|e| e.to_string()),
            _ => Ok(String::new()),
        };

        match result {
            Ok(message) => self.state.command_line.set_message(message),
            Err(error) => self.state.command_line.set_error(error),
        }
        self.state.clamp_selection();
        self.show_notices();
    }
}

impl<G> Drop for App<G> {
    fn drop(&mut self) {
        let _ = disable_raw_mode();
        let _ = execute!(self.terminal.backend_mut(), LeaveAlternateScreen);
        let _ = self.terminal.show_cursor();
    }
}

/// Apply an editing key to a text input
fn edit_text(input: &mut TextInput, code: KeyCode) {
    match code {
        KeyCode::Char(c) => input.insert_char(c),
        KeyCode::Backspace => input.delete_char(),
        KeyCode::Delete => input.delete_char_forward(),
        KeyCode::Left => input.move_left(),
        KeyCode::Right => input.move_right(),
        KeyCode::Home => input.move_start(),
        KeyCode::End => input.move_end(),
        _ => {}
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn editing_keys_apply_to_input() {
        let mut input = TextInput::default();
        for code in [KeyCode::Char('o'), KeyCode::Char('k'), KeyCode::Left, KeyCode::Backspace] {
            edit_text(&mut input, code);
        }
        assert_eq!(input.text, "k");
        edit_text(&mut input, KeyCode::End);
        edit_text(&mut input, KeyCode::Char('!'));
        edit_text(&mut input, KeyCode::F(5));
        assert_eq!(input.text, "k!");
    }
}
