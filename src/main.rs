use std::fs::OpenOptions;
use std::io::{self, BufRead, Write};
use std::path::Path;
use std::sync::Mutex;

use anyhow::{Context, Result, bail};
use clap::{Args, Parser, Subcommand};
use discursiva::accounts::{self, Account};
use discursiva::claude::{ApiKeyManager, ClaudeClient, ClaudeModel};
use discursiva::grading::{
    ClaudeGrader, GradedAnswer, GradingGateway, Language, ParsedFeedback, SectionKey, SectionSet,
};
use discursiva::practice::{CardScope, FeedbackBody, RankingMode, Session, SubmitOutcome};
use discursiva::store::{CardDraft, JsonStore, MemoryStore, Store};
use discursiva::{App, Config, Theme};
use tracing_subscriber::{EnvFilter, layer::SubscriberExt, util::SubscriberInitExt};

#[derive(Parser)]
#[command(name = "discursiva")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Keep everything in memory and discard it on exit (TUI only)
    #[arg(long)]
    ephemeral: bool,

    /// Grade with this model instead of the configured one
    #[arg(long, global = true)]
    model: Option<ClaudeModel>,

    #[command(subcommand)]
    command: Option<Commands>,
}

#[derive(Subcommand)]
enum Commands {
    /// Create the administrator account (password read twice from stdin)
    Init,
    /// Register a user account (password read twice from stdin)
    Register {
        /// Name of the new account
        username: String,
    },
    /// List and change cards
    Cards {
        #[command(subcommand)]
        action: CardsCommand,
    },
    /// Show graded answers with their summary
    History {
        #[command(flatten)]
        user: UserArg,
        /// Only answers to cards of this subject
        #[arg(long)]
        subject: Option<String>,
        /// Only answers to cards of this topic
        #[arg(long)]
        topic: Option<String>,
        #[command(subcommand)]
        action: Option<HistoryCommand>,
    },
    /// Manage accounts (administrator)
    Users {
        #[command(subcommand)]
        action: UsersCommand,
    },
    /// Grade one answer against a card and record the attempt
    Grade {
        #[command(flatten)]
        user: UserArg,
        /// Card number, as shown by `cards list`
        card: usize,
        /// The answer to grade
        answer: String,
    },
    /// Show the configuration, or change and save the given settings
    Config {
        /// Grading model (haiku, haiku3, sonnet4, sonnet, opus)
        #[arg(long = "set-model")]
        set_model: Option<ClaudeModel>,
        /// Feedback language (pt, en)
        #[arg(long)]
        language: Option<Language>,
        /// Practice order (latest, average)
        #[arg(long)]
        ranking: Option<RankingMode>,
        /// Built-in theme name
        #[arg(long)]
        theme: Option<String>,
    },
    /// Manage the Anthropic API key in the system keyring
    Key {
        #[command(subcommand)]
        action: KeyCommand,
    },
}

#[derive(Args)]
struct UserArg {
    /// Account to act as; the password is read from stdin
    #[arg(long, short)]
    user: String,
}

#[derive(Args)]
struct CardFields {
    subject: String,
    topic: String,
    question: String,
    expected_answer: String,
}

impl CardFields {
    fn into_draft(self) -> CardDraft {
        CardDraft::new(self.subject, self.topic, self.question, self.expected_answer)
    }
}

#[derive(Subcommand)]
enum CardsCommand {
    /// List your cards and the shared pool, numbered
    List {
        #[command(flatten)]
        user: UserArg,
    },
    /// Add a card
    Add {
        #[command(flatten)]
        user: UserArg,
        /// Add to the shared pool (administrator)
        #[arg(long)]
        shared: bool,
        #[command(flatten)]
        fields: CardFields,
    },
    /// Replace a card's fields
    Edit {
        #[command(flatten)]
        user: UserArg,
        /// Card number, as shown by `cards list`
        number: usize,
        #[command(flatten)]
        fields: CardFields,
    },
    /// Delete a card
    Remove {
        #[command(flatten)]
        user: UserArg,
        /// Card number, as shown by `cards list`
        number: usize,
    },
}

#[derive(Subcommand)]
enum HistoryCommand {
    /// Delete every graded answer of the user
    Clear,
}

#[derive(Subcommand)]
enum UsersCommand {
    /// List accounts
    List {
        #[command(flatten)]
        admin: UserArg,
    },
    /// Set a new password (read from stdin after the administrator's)
    ResetPassword {
        #[command(flatten)]
        admin: UserArg,
        /// Account whose password changes
        username: String,
    },
}

#[derive(Subcommand)]
enum KeyCommand {
    /// Store the API key in the system keyring
    Set { key: String },
    /// Show the key in use, masked, and where it was found
    Show,
    /// Send a minimal request with the key and the configured model
    Test,
    /// Remove the key from the system keyring
    Delete,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();
    let mut config = Config::load()?;
    let saved = config.clone();
    if let Some(model) = cli.model {
        config.model = model;
    }

    let data_dir = config.data_dir()?;
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("Data directory {:?} is not usable", data_dir))?;

    let Some(command) = cli.command else {
        init_logging(Some(&Config::log_path(&data_dir)))?;
        return run_tui(config, &data_dir, cli.ephemeral).await;
    };
    init_logging(None)?;

    let mut store = JsonStore::open(&data_dir)
        .with_context(|| format!("Data directory {:?} is not usable", data_dir))?;

    match command {
        Commands::Init => {
            let password = read_line("Administrator password")?;
            let confirm = read_line("Confirm password")?;
            accounts::create_admin(&mut store, &password, &confirm)?;
            println!("Administrator account created.");
        }
        Commands::Register { username } => {
            let password = read_line("Password")?;
            let confirm = read_line("Confirm password")?;
            let account = accounts::register(&mut store, &username, &password, &confirm)?;
            println!("Registered {}.", account.username);
        }
        Commands::Cards { action } => cards(&mut store, &config, action)?,
        Commands::History { user, subject, topic, action } => {
            let account = login(&mut store, &user)?;
            let mut session = open_session(&store, &account, &config)?;
            match action {
                Some(HistoryCommand::Clear) => {
                    session.clear_history(&mut store)?;
                    println!("History cleared.");
                }
                None => print_history(&session, subject.as_deref(), topic.as_deref()),
            }
        }
        Commands::Users { action } => users(&mut store, action)?,
        Commands::Grade { user, card, answer } => {
            let account = login(&mut store, &user)?;
            grade(&mut store, &config, &account, card, &answer).await?;
        }
        Commands::Config { set_model, language, ranking, theme } => {
            let mut saved = saved;
            let changed = set_model.is_some()
                || language.is_some()
                || ranking.is_some()
                || theme.is_some();
            if let Some(model) = set_model {
                saved.model = model;
            }
            if let Some(language) = language {
                saved.language = language;
            }
            if let Some(ranking) = ranking {
                saved.ranking = ranking;
            }
            if let Some(theme) = theme {
                if Theme::by_name(&theme).is_none() {
                    bail!("Unknown theme: {}. Options: Tokyo Night, Tokyo Night Day", theme);
                }
                saved.theme = theme;
            }
            if changed {
                saved.save()?;
                println!("Saved {}", Config::config_path()?.display());
            }
            println!("{}", serde_json::to_string_pretty(&saved)?);
        }
        Commands::Key { action } => key(action, &config).await?,
    }

    Ok(())
}

/// Log to `log_file` while the TUI owns the terminal, to stderr otherwise
fn init_logging(log_file: Option<&Path>) -> Result<()> {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("discursiva=info"));
    let registry = tracing_subscriber::registry().with(filter);

    match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .with_context(|| format!("Failed to open log file {:?}", path))?;
            registry
                .with(
                    tracing_subscriber::fmt::layer()
                        .with_target(false)
                        .with_ansi(false)
                        .with_writer(Mutex::new(file)),
                )
                .init();
        }
        None => {
            registry
                .with(tracing_subscriber::fmt::layer().with_target(false).with_writer(io::stderr))
                .init();
        }
    }
    Ok(())
}

async fn run_tui(config: Config, data_dir: &Path, ephemeral: bool) -> Result<()> {
    let store: Box<dyn Store> = if ephemeral {
        tracing::info!("Using an in-memory store");
        Box::new(MemoryStore::new())
    } else {
        Box::new(
            JsonStore::open(data_dir)
                .with_context(|| format!("Data directory {:?} is not usable", data_dir))?,
        )
    };

    let gateway = gateway(&config)?;
    let mut app = App::new(config, store, gateway)?;
    app.run().await
}

fn gateway(config: &Config) -> Result<GradingGateway<ClaudeGrader>> {
    let key = ApiKeyManager::get_api_key().context(
        "No Anthropic API key. Set ANTHROPIC_API_KEY or run `discursiva key set <key>`",
    )?;
    let client = ClaudeClient::new(key)?;
    let grader = ClaudeGrader::new(client, config.model, config.language);
    Ok(GradingGateway::new(grader, config.language))
}

/// Read one line from stdin after a prompt on stderr
fn read_line(prompt: &str) -> Result<String> {
    eprint!("{}: ", prompt);
    io::stderr().flush()?;
    let line = io::stdin().lock().lines().next().transpose()?.unwrap_or_default();
    Ok(line.trim_end_matches(['\r', '\n']).to_string())
}

fn login(store: &mut dyn Store, user: &UserArg) -> Result<Account> {
    let password = read_line(&format!("Password for {}", user.user))?;
    Ok(accounts::login(store, &user.user, &password)?)
}

fn open_session(store: &dyn Store, account: &Account, config: &Config) -> Result<Session> {
    let mut session = Session::open(store, &account.username, account.is_admin(), config.ranking);
    for notice in session.take_notices() {
        eprintln!("warning: {}", notice);
    }
    Ok(session)
}

fn cards(store: &mut JsonStore, config: &Config, action: CardsCommand) -> Result<()> {
    match action {
        CardsCommand::List { user } => {
            let account = login(store, &user)?;
            let session = open_session(store, &account, config)?;
            for (i, card) in session.deck().iter().enumerate() {
                let score =
                    session.latest_score(card).map_or_else(|| "--".to_string(), |s| s.to_string());
                let shared = if session.is_shared(&card.id) { " [shared]" } else { "" };
                println!(
                    "{:>4}. [{:>3}] {} / {} / {}{}",
                    i + 1,
                    score,
                    card.subject,
                    card.topic,
                    card.question,
                    shared
                );
            }
        }
        CardsCommand::Add { user, shared, fields } => {
            let account = login(store, &user)?;
            let mut session = open_session(store, &account, config)?;
            let scope = if shared { CardScope::Shared } else { CardScope::Own };
            let card = session.add_card(store, scope, fields.into_draft())?;
            println!("Added card {}.", card.id);
        }
        CardsCommand::Edit { user, number, fields } => {
            let account = login(store, &user)?;
            let mut session = open_session(store, &account, config)?;
            let Some(id) = session.card_at(number).map(|card| card.id.clone()) else {
                bail!("There is no card {}", number);
            };
            session.edit_card(store, &id, fields.into_draft())?;
            println!("Updated card {}.", number);
        }
        CardsCommand::Remove { user, number } => {
            let account = login(store, &user)?;
            let mut session = open_session(store, &account, config)?;
            let Some(id) = session.card_at(number).map(|card| card.id.clone()) else {
                bail!("There is no card {}", number);
            };
            session.delete_card(store, &id)?;
            println!("Deleted card {}.", number);
        }
    }
    Ok(())
}

fn print_history(session: &Session, subject: Option<&str>, topic: Option<&str>) {
    let stats = session.stats(subject, topic);
    let average = stats.average.map_or_else(|| "--".to_string(), |a| format!("{:.1}", a));
    println!("{} attempts, {} scored, average {}", stats.total, stats.scored, average);

    for entry in &stats.entries {
        let score = entry.score.map_or_else(|| "--".to_string(), |s| s.to_string());
        println!(
            "{}  [{:>3}]  {} / {} / {}",
            entry.timestamp.format("%Y-%m-%d %H:%M"),
            score,
            entry.subject,
            entry.topic,
            entry.question
        );
        if let Some(gaps) = &entry.content_gaps {
            println!("      {}", gaps);
        }
    }
}

fn users(store: &mut JsonStore, action: UsersCommand) -> Result<()> {
    match action {
        UsersCommand::List { admin } => {
            let account = login(store, &admin)?;
            for user in accounts::list_users(store, &account)? {
                match user.created_at {
                    Some(at) => println!("{}  (since {})", user.username, at.format("%Y-%m-%d")),
                    None => println!("{}", user.username),
                }
            }
        }
        UsersCommand::ResetPassword { admin, username } => {
            let account = login(store, &admin)?;
            let password = read_line(&format!("New password for {}", username))?;
            accounts::reset_password(store, &account, &username, &password)?;
            println!("Password of {} reset.", username);
        }
    }
    Ok(())
}

async fn grade(
    store: &mut JsonStore,
    config: &Config,
    account: &Account,
    number: usize,
    answer: &str,
) -> Result<()> {
    let mut session = open_session(store, account, config)?;
    let Some(id) = session.card_at(number).map(|card| card.id.clone()) else {
        bail!("There is no card {}", number);
    };
    session.select_card(&id);

    let gateway = gateway(config)?;
    let outcome = session.submit(store, &gateway, answer).await;
    for notice in session.take_notices() {
        eprintln!("warning: {}", notice);
    }
    match outcome {
        SubmitOutcome::NoCard => bail!("There is no card {}", number),
        SubmitOutcome::MissingInput => bail!("{}", gateway.sections().missing_input),
        SubmitOutcome::Graded { .. } => {}
    }

    let feedback = session.active_queue().visible_feedback().map(|pending| &pending.body);
    if let Some(FeedbackBody::Graded(graded)) = feedback {
        print_feedback(graded, gateway.sections());
    }
    Ok(())
}

fn print_feedback(graded: &GradedAnswer, set: &SectionSet) {
    match &graded.feedback {
        ParsedFeedback::Sections(_) if !graded.raw.starts_with(set.error_marker) => {
            for key in SectionKey::ALL {
                println!("{}", set.label(key));
                println!("  {}", graded.feedback.section(key).unwrap_or(set.unavailable));
            }
        }
        _ => println!("{}", graded.raw),
    }
}

async fn key(action: KeyCommand, config: &Config) -> Result<()> {
    match action {
        KeyCommand::Set { key } => {
            ApiKeyManager::set_api_key(key.trim())?;
            println!("API key stored.");
        }
        KeyCommand::Show => {
            let (key, source) = ApiKeyManager::resolve()?;
            println!("{} (from {})", ApiKeyManager::mask_key(&key), source);
        }
        KeyCommand::Test => {
            let client = ClaudeClient::new(ApiKeyManager::get_api_key()?)?;
            match client.test_connection(config.model).await {
                Ok(()) => println!("{} answered.", config.model),
                Err(e) if e.requires_reauth() => {
                    bail!("{}. Store a valid key with `discursiva key set <key>`", e)
                }
                Err(e) if e.is_recoverable() => bail!("{}. Try again shortly", e),
                Err(e) => return Err(e.into()),
            }
        }
        KeyCommand::Delete => {
            ApiKeyManager::delete_api_key()?;
            println!("API key removed.");
        }
    }
    Ok(())
}
