//! Screen, form and command line state of the TUI

use crate::practice::Session;

/// Screen in the foreground
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Screen {
    #[default]
    Login,
    Practice,
    Cards,
    History,
    Help,
}

/// Editable single-buffer text with a character cursor
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TextInput {
    pub text: String,
    /// Cursor position as a character index
    pub cursor: usize,
}

impl TextInput {
    fn char_to_byte_index(&self, char_idx: usize) -> usize {
        self.text.char_indices().nth(char_idx).map(|(i, _)| i).unwrap_or(self.text.len())
    }

    fn char_count(&self) -> usize {
        self.text.chars().count()
    }

    pub fn set(&mut self, text: impl Into<String>) {
        self.text = text.into();
        self.cursor = self.char_count();
    }

    pub fn clear(&mut self) {
        self.text.clear();
        self.cursor = 0;
    }

    /// Take the text out, leaving the input empty
    pub fn take(&mut self) -> String {
        self.cursor = 0;
        std::mem::take(&mut self.text)
    }

    pub fn is_blank(&self) -> bool {
        self.text.trim().is_empty()
    }

    /// Insert at the cursor and step past the new character
    pub fn insert_char(&mut self, c: char) {
        let byte_idx = self.char_to_byte_index(self.cursor);
        self.text.insert(byte_idx, c);
        self.cursor += 1;
    }

    /// Backspace
    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.text.remove(byte_idx);
        }
    }

    /// Delete
    pub fn delete_char_forward(&mut self) {
        if self.cursor < self.char_count() {
            let byte_idx = self.char_to_byte_index(self.cursor);
            self.text.remove(byte_idx);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        if self.cursor < self.char_count() {
            self.cursor += 1;
        }
    }

    pub fn move_start(&mut self) {
        self.cursor = 0;
    }

    pub fn move_end(&mut self) {
        self.cursor = self.char_count();
    }
}

/// Whether the bottom line is taking a `:` command
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum CommandMode {
    /// Shows the last status or error
    #[default]
    Normal,
    /// Typing after `:`
    Command,
}

/// Bottom line: `:` commands and status messages
#[derive(Debug, Clone, Default)]
pub struct CommandLineState {
    pub mode: CommandMode,
    pub input: TextInput,
    /// Shown while not typing
    pub message: Option<String>,
    pub is_error: bool,
    /// Executed commands, oldest first
    pub history: Vec<String>,
    /// Entry recalled with ↑/↓
    pub history_index: Option<usize>,
}

impl CommandLineState {
    /// Oldest commands are dropped beyond this
    const MAX_HISTORY: usize = 1000;

    pub fn enter_command_mode(&mut self) {
        self.mode = CommandMode::Command;
        self.input.clear();
        self.message = None;
        self.history_index = None;
    }

    /// Start command mode with `text` already typed
    pub fn prefill(&mut self, text: impl Into<String>) {
        self.enter_command_mode();
        self.input.set(text);
    }

    /// Back to showing messages, discarding what was typed
    pub fn exit_input_mode(&mut self) {
        self.mode = CommandMode::Normal;
        self.input.clear();
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = true;
    }

    pub fn clear_message(&mut self) {
        self.message = None;
    }

    pub fn is_input_mode(&self) -> bool {
        self.mode == CommandMode::Command
    }

    /// Remember an executed command, skipping blanks and repeats
    pub fn add_to_history(&mut self, cmd: String) {
        if cmd.is_empty() || self.history.last() == Some(&cmd) {
            return;
        }
        if self.history.len() >= Self::MAX_HISTORY {
            self.history.remove(0);
        }
        self.history.push(cmd);
    }

    /// Recall the previous command
    pub fn history_up(&mut self) {
        let index = match self.history_index {
            None if !self.history.is_empty() => self.history.len() - 1,
            Some(i) => i.saturating_sub(1),
            None => return,
        };
        self.recall(index);
    }

    /// Recall the next command, or an empty line past the newest
    pub fn history_down(&mut self) {
        match self.history_index {
            Some(i) if i + 1 < self.history.len() => self.recall(i + 1),
            Some(_) => {
                self.history_index = None;
                self.input.clear();
            }
            None => {}
        }
    }

    fn recall(&mut self, index: usize) {
        self.history_index = Some(index);
        self.input.set(self.history[index].clone());
    }
}

/// What the login screen is asking for
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum LoginMode {
    /// First run: set the administrator password
    CreateAdmin,
    #[default]
    Login,
    Register,
}

/// A field of the login form
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoginField {
    Username,
    Password,
    Confirm,
}

impl LoginField {
    pub fn label(self) -> &'static str {
        match self {
            LoginField::Username => "Username",
            LoginField::Password => "Password",
            LoginField::Confirm => "Confirm password",
        }
    }

    pub fn is_secret(self) -> bool {
        !matches!(self, LoginField::Username)
    }
}

/// State of the login / registration / admin bootstrap form
#[derive(Debug, Clone, Default)]
pub struct LoginForm {
    pub mode: LoginMode,
    pub username: TextInput,
    pub password: TextInput,
    pub confirm: TextInput,
    /// Index into [`LoginForm::fields`]
    pub focus: usize,
}

impl LoginForm {
    pub fn new(mode: LoginMode) -> Self {
        Self { mode, ..Self::default() }
    }

    /// Fields shown in the current mode, in tab order
    pub fn fields(&self) -> &'static [LoginField] {
        match self.mode {
            LoginMode::CreateAdmin => &[LoginField::Password, LoginField::Confirm],
            LoginMode::Login => &[LoginField::Username, LoginField::Password],
            LoginMode::Register => {
                &[LoginField::Username, LoginField::Password, LoginField::Confirm]
            }
        }
    }

    pub fn focused(&self) -> LoginField {
        let fields = self.fields();
        fields[self.focus.min(fields.len() - 1)]
    }

    pub fn field(&self, field: LoginField) -> &TextInput {
        match field {
            LoginField::Username => &self.username,
            LoginField::Password => &self.password,
            LoginField::Confirm => &self.confirm,
        }
    }

    pub fn focused_input(&mut self) -> &mut TextInput {
        match self.focused() {
            LoginField::Username => &mut self.username,
            LoginField::Password => &mut self.password,
            LoginField::Confirm => &mut self.confirm,
        }
    }

    pub fn focus_next(&mut self) {
        self.focus = (self.focus + 1) % self.fields().len();
    }

    pub fn focus_previous(&mut self) {
        let len = self.fields().len();
        self.focus = (self.focus + len - 1) % len;
    }

    /// Switch between logging in and registering, keeping the username
    pub fn toggle_register(&mut self) {
        self.mode = match self.mode {
            LoginMode::Login => LoginMode::Register,
            LoginMode::Register => LoginMode::Login,
            LoginMode::CreateAdmin => return,
        };
        self.password.clear();
        self.confirm.clear();
        self.focus = 0;
    }

    /// Reset to the login form with `username` filled in
    pub fn reset_for_login(&mut self, username: &str) {
        *self = Self::new(LoginMode::Login);
        self.username.set(username);
        self.focus = 1;
    }
}

/// Filters applied on the history screen
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HistoryView {
    pub subject: Option<String>,
    pub topic: Option<String>,
    pub scroll: usize,
}

/// Everything the UI draws from
#[derive(Debug, Default)]
pub struct AppState {
    pub screen: Screen,

    /// Screen to return to when help closes
    pub previous_screen: Screen,

    /// Login form, shown until a session opens
    pub login: LoginForm,

    /// The logged-in user's session
    pub session: Option<Session>,

    /// Answer being typed on the practice screen
    pub answer: TextInput,

    /// Whether keys go to the answer box
    pub answering: bool,

    /// A grading call is in flight
    pub busy: bool,

    /// Scroll offset of the feedback panel
    pub feedback_scroll: usize,

    /// Selected row on the cards screen
    pub selected_card: usize,

    /// History screen filters
    pub history: HistoryView,

    pub command_line: CommandLineState,
}

impl AppState {
    pub fn new(login: LoginMode) -> Self {
        Self { login: LoginForm::new(login), ..Self::default() }
    }

    /// Move to `screen`, leaving answer mode
    pub fn show(&mut self, screen: Screen) {
        if screen == Screen::Help && self.screen != Screen::Help {
            self.previous_screen = self.screen;
        }
        self.screen = screen;
        self.answering = false;
    }

    /// Drop the session and go back to the login form
    pub fn logout(&mut self) {
        let user = self.session.take().map(|s| s.user().to_string()).unwrap_or_default();
        self.login.reset_for_login(&user);
        self.answer.clear();
        self.answering = false;
        self.selected_card = 0;
        self.history = HistoryView::default();
        self.screen = Screen::Login;
    }

    /// Clamp the cards screen selection to the deck size
    pub fn clamp_selection(&mut self) {
        let len = self.session.as_ref().map(|s| s.deck().len()).unwrap_or(0);
        if self.selected_card >= len {
            self.selected_card = len.saturating_sub(1);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn text_input_edits_multibyte_text() {
        let mut input = TextInput::default();
        for c in "ação".chars() {
            input.insert_char(c);
        }
        assert_eq!(input.cursor, 4);
        input.move_left();
        input.delete_char();
        assert_eq!(input.text, "aço");
        input.move_start();
        input.delete_char_forward();
        assert_eq!(input.text, "ço");
        input.move_end();
        assert_eq!(input.cursor, 2);
        assert_eq!(input.take(), "ço");
        assert!(input.is_blank());
    }

    #[test]
    fn command_history_navigation() {
        let mut cl = CommandLineState::default();
        cl.add_to_history("subject Civil".into());
        cl.add_to_history("subject Civil".into());
        cl.add_to_history("q".into());
        assert_eq!(cl.history.len(), 2);

        cl.history_up();
        assert_eq!(cl.input.text, "q");
        cl.history_up();
        assert_eq!(cl.input.text, "subject Civil");
        cl.history_down();
        cl.history_down();
        assert_eq!(cl.input.text, "");
        assert_eq!(cl.history_index, None);
    }

    #[test]
    fn prefill_enters_command_mode() {
        let mut cl = CommandLineState::default();
        cl.set_error("old");
        cl.prefill("delete 3");
        assert!(cl.is_input_mode());
        assert_eq!(cl.input.text, "delete 3");
        assert_eq!(cl.input.cursor, 8);
        assert_eq!(cl.message, None);
    }

    #[test]
    fn login_form_fields_follow_mode() {
        let mut form = LoginForm::new(LoginMode::CreateAdmin);
        assert_eq!(form.fields(), &[LoginField::Password, LoginField::Confirm]);
        form.toggle_register();
        assert_eq!(form.mode, LoginMode::CreateAdmin);

        let mut form = LoginForm::new(LoginMode::Login);
        form.focus_next();
        assert_eq!(form.focused(), LoginField::Password);
        form.focus_next();
        assert_eq!(form.focused(), LoginField::Username);
        form.focus_previous();
        assert_eq!(form.focused(), LoginField::Password);

        form.username.set("ana");
        form.password.set("secret");
        form.toggle_register();
        assert_eq!(form.mode, LoginMode::Register);
        assert_eq!(form.username.text, "ana");
        assert!(form.password.is_blank());
        assert_eq!(form.fields().len(), 3);
    }

    #[test]
    fn reset_for_login_focuses_password() {
        let mut form = LoginForm::new(LoginMode::Register);
        form.password.set("x");
        form.reset_for_login("ana");
        assert_eq!(form.mode, LoginMode::Login);
        assert_eq!(form.username.text, "ana");
        assert_eq!(form.focused(), LoginField::Password);
        assert!(form.password.is_blank());
    }

    #[test]
    fn help_remembers_previous_screen() {
        let mut state = AppState::new(LoginMode::Login);
        state.screen = Screen::Cards;
        state.answering = true;
        state.show(Screen::Help);
        assert_eq!(state.previous_screen, Screen::Cards);
        assert!(!state.answering);
        state.show(Screen::Help);
        assert_eq!(state.previous_screen, Screen::Cards);
    }
}
