//! Command parsing for the command line

use crate::store::CardDraft;

/// Separator between card fields in `:add` and `:edit`
const FIELD_SEPARATOR: char = '|';

/// Parsed command from the command line
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Add a card to your own collection: :add subject | topic | question | answer
    Add(CardDraft),
    /// Add a card to the shared pool (admin): :add-shared subject | topic | question | answer
    AddShared(CardDraft),
    /// Replace card n as numbered on the cards screen: :edit n subject | topic | question | answer
    Edit(usize, CardDraft),
    /// Delete card n: :delete n
    Delete(usize),
    /// Filter by subject, `None` for all: :subject <name|all>
    Subject(Option<String>),
    /// Filter by topic, `None` for all: :topic <name|all>
    Topic(Option<String>),
    /// Empty your answer history: :clear-history
    ClearHistory,
    /// Show the practice screen: :practice
    Practice,
    /// Show the cards screen: :cards
    Cards,
    /// Show the history screen: :history
    History,
    /// Log out: :logout
    Logout,
    /// Quit the application: :q or :quit
    Quit,
    /// Show help: :help or :h
    Help,
    /// Clear message: (empty command)
    Nop,
}

/// Result of parsing a command
#[derive(Debug, PartialEq, Eq)]
pub enum ParseResult {
    /// Successfully parsed command
    Ok(Command),
    /// Unknown command
    UnknownCommand(String),
    /// Command needs an argument
    MissingArgument(String),
    /// Argument present but unusable, with a usage hint
    InvalidArgument(String),
}

/// Parse a command string (without the leading :)
pub fn parse_command(input: &str) -> ParseResult {
    let input = input.trim();

    if input.is_empty() {
        return ParseResult::Ok(Command::Nop);
    }

    // Split into command and arguments
    let mut parts = input.splitn(2, char::is_whitespace);
    let cmd = parts.next().unwrap_or("");
    let args = parts.next().map(|s| s.trim()).unwrap_or("");

    match cmd.to_lowercase().as_str() {
        "add" | "a" => with_args("add", args, |args| parse_draft(args).map(Command::Add)),
        "add-shared" | "as" => {
            with_args("add-shared", args, |args| parse_draft(args).map(Command::AddShared))
        }
        "edit" | "e" => with_args("edit", args, |args| {
            let mut parts = args.splitn(2, char::is_whitespace);
            let number = parse_number(parts.next().unwrap_or(""))?;
            let draft = parse_draft(parts.next().unwrap_or(""))?;
            Ok(Command::Edit(number, draft))
        }),
        "delete" | "del" | "rm" => {
            with_args("delete", args, |args| parse_number(args).map(Command::Delete))
        }
        "subject" | "s" => with_args("subject", args, |args| Ok(Command::Subject(filter(args)))),
        "topic" | "t" => with_args("topic", args, |args| Ok(Command::Topic(filter(args)))),
        "clear-history" => ParseResult::Ok(Command::ClearHistory),
        "practice" | "p" => ParseResult::Ok(Command::Practice),
        "cards" | "c" => ParseResult::Ok(Command::Cards),
        "history" => ParseResult::Ok(Command::History),
        "logout" => ParseResult::Ok(Command::Logout),
        "quit" | "q" => ParseResult::Ok(Command::Quit),
        "help" | "h" | "?" => ParseResult::Ok(Command::Help),
        _ => ParseResult::UnknownCommand(cmd.to_string()),
    }
}

fn with_args(
    name: &str,
    args: &str,
    parse: impl FnOnce(&str) -> Result<Command, String>,
) -> ParseResult {
    if args.is_empty() {
        return ParseResult::MissingArgument(name.to_string());
    }
    match parse(args) {
        Ok(command) => ParseResult::Ok(command),
        Err(hint) => ParseResult::InvalidArgument(hint),
    }
}

/// `subject | topic | question | expected answer`; emptiness is checked later
fn parse_draft(args: &str) -> Result<CardDraft, String> {
    let fields: Vec<&str> = args.split(FIELD_SEPARATOR).map(str::trim).collect();
    match fields.as_slice() {
        [subject, topic, question, answer] => {
            Ok(CardDraft::new(*subject, *topic, *question, *answer))
        }
        _ => Err(format!(
            "Expected 4 fields separated by '{}': subject | topic | question | expected answer",
            FIELD_SEPARATOR
        )),
    }
}

/// A 1-based card number
fn parse_number(arg: &str) -> Result<usize, String> {
    match arg.trim().parse::<usize>() {
        Ok(n) if n > 0 => Ok(n),
        _ => Err(format!("Not a card number: {:?}", arg.trim())),
    }
}

fn filter(arg: &str) -> Option<String> {
    if arg.eq_ignore_ascii_case("all") { None } else { Some(arg.to_string()) }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn parse_quit_command() {
        assert_eq!(parse_command("q"), ParseResult::Ok(Command::Quit));
        assert_eq!(parse_command("quit"), ParseResult::Ok(Command::Quit));
        assert_eq!(parse_command("Q"), ParseResult::Ok(Command::Quit));
    }

    #[test]
    fn parse_help_command() {
        assert_eq!(parse_command("help"), ParseResult::Ok(Command::Help));
        assert_eq!(parse_command("?"), ParseResult::Ok(Command::Help));
    }

    #[test]
    fn parse_add_command() {
        assert_eq!(
            parse_command("add Direito Penal | Dolo | O que é dolo? | Vontade consciente"),
            ParseResult::Ok(Command::Add(CardDraft::new(
                "Direito Penal",
                "Dolo",
                "O que é dolo?",
                "Vontade consciente"
            )))
        );
        assert!(matches!(parse_command("as a | b | c | d"), ParseResult::Ok(Command::AddShared(_))));
    }

    #[test]
    fn parse_add_needs_four_fields() {
        assert_eq!(parse_command("add"), ParseResult::MissingArgument("add".into()));
        assert!(matches!(parse_command("add a | b | c"), ParseResult::InvalidArgument(_)));
        assert!(matches!(parse_command("add a | b | c | d | e"), ParseResult::InvalidArgument(_)));
    }

    #[test]
    fn empty_fields_pass_parsing() {
        // Field validation happens when the card is saved
        assert_eq!(
            parse_command("add a | | c | d"),
            ParseResult::Ok(Command::Add(CardDraft::new("a", "", "c", "d")))
        );
    }

    #[test]
    fn parse_edit_command() {
        assert_eq!(
            parse_command("edit 3 Civil | Posse | Q | A"),
            ParseResult::Ok(Command::Edit(3, CardDraft::new("Civil", "Posse", "Q", "A")))
        );
        assert!(matches!(parse_command("edit x a | b | c | d"), ParseResult::InvalidArgument(_)));
        assert!(matches!(parse_command("edit 0 a | b | c | d"), ParseResult::InvalidArgument(_)));
        assert!(matches!(parse_command("edit 2"), ParseResult::InvalidArgument(_)));
    }

    #[test]
    fn parse_delete_command() {
        assert_eq!(parse_command("delete 2"), ParseResult::Ok(Command::Delete(2)));
        assert_eq!(parse_command("rm 7"), ParseResult::Ok(Command::Delete(7)));
        assert_eq!(parse_command("delete"), ParseResult::MissingArgument("delete".into()));
    }

    #[test]
    fn parse_filters() {
        assert_eq!(
            parse_command("subject Direito Civil"),
            ParseResult::Ok(Command::Subject(Some("Direito Civil".into())))
        );
        assert_eq!(parse_command("subject ALL"), ParseResult::Ok(Command::Subject(None)));
        assert_eq!(parse_command("topic all"), ParseResult::Ok(Command::Topic(None)));
        assert_eq!(parse_command("t Dolo"), ParseResult::Ok(Command::Topic(Some("Dolo".into()))));
    }

    #[test]
    fn parse_screens_and_session() {
        assert_eq!(parse_command("clear-history"), ParseResult::Ok(Command::ClearHistory));
        assert_eq!(parse_command("cards"), ParseResult::Ok(Command::Cards));
        assert_eq!(parse_command("history"), ParseResult::Ok(Command::History));
        assert_eq!(parse_command("logout"), ParseResult::Ok(Command::Logout));
    }

    #[test]
    fn parse_unknown_command() {
        assert_eq!(parse_command("unknown"), ParseResult::UnknownCommand("unknown".into()));
    }

    #[test]
    fn parse_empty_is_nop() {
        assert_eq!(parse_command(""), ParseResult::Ok(Command::Nop));
        assert_eq!(parse_command("   "), ParseResult::Ok(Command::Nop));
    }
}
