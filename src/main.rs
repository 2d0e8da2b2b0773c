//! bimehyar — insurance document Q&A assistant.
//!
//! All state lives on this machine; questions go out to the generative
//! answering API together with the user's active knowledge sources.

use std::io::Write as _;
use std::path::PathBuf;

use anyhow::{bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::mpsc;
use tokio::time::{interval, Duration};
use tracing_subscriber::EnvFilter;

use bimehyar::commands::chat::AnswerCompletion;
use bimehyar::commands::{auth, chat, config, sources, system};
use bimehyar::models::{ChatSessionListItem, Message, Role, SourceKind};
use bimehyar::services::network_service;
use bimehyar::{App, APP_VERSION};

#[derive(Parser)]
#[command(name = "bimehyar", version, about = "Insurance document Q&A assistant")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,
}

#[derive(Subcommand)]
enum Command {
    /// Start an interactive chat session (default)
    Chat,
    /// Manage knowledge sources
    Sources {
        #[command(subcommand)]
        action: SourcesAction,
    },
    /// Browse archived chat sessions
    History {
        #[command(subcommand)]
        action: HistoryAction,
    },
    /// Manage the API credential
    Auth {
        #[command(subcommand)]
        action: AuthAction,
    },
    /// Show the system status dashboard
    Status,
    /// Erase all locally stored data
    Reset {
        /// Skip the confirmation prompt
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum SourcesAction {
    /// Add a knowledge source
    Add {
        title: String,
        /// Inline source text
        #[arg(long, conflicts_with_all = ["file", "link"])]
        text: Option<String>,
        /// Read the source content from a file
        #[arg(long, conflicts_with = "link")]
        file: Option<PathBuf>,
        /// Store a link as the source content
        #[arg(long)]
        link: Option<String>,
    },
    /// List sources
    List,
    /// Toggle a source on or off (id prefix)
    Toggle { id: String },
    /// Remove a source (id prefix)
    Remove { id: String },
}

#[derive(Subcommand)]
enum HistoryAction {
    /// List archived sessions
    List,
    /// Print one archived session (id prefix)
    Show { id: String },
    /// Delete one archived session (id prefix)
    Delete { id: String },
    /// Delete all archived sessions
    Clear {
        #[arg(long)]
        yes: bool,
    },
}

#[derive(Subcommand)]
enum AuthAction {
    /// Validate and store an API key (prompts when omitted)
    SetKey { key: Option<String> },
    /// Remove the stored key
    Reset,
    /// Show whether a key is configured
    Status,
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .with_writer(std::io::stderr)
        .init();

    let cli = Cli::parse();
    let mut app = App::load().context("failed to open application state")?;

    match cli.command.unwrap_or(Command::Chat) {
        Command::Chat => run_chat(app).await,
        Command::Sources { action } => run_sources(&mut app, action),
        Command::History { action } => run_history(&mut app, action),
        Command::Auth { action } => run_auth(action),
        Command::Status => run_status(&mut app).await,
        Command::Reset { yes } => run_reset(&app, yes),
    }
}

// ============================================================================
// INTERACTIVE CHAT
// ============================================================================

async fn run_chat(mut app: App) -> Result<()> {
    ensure_credential()?;

    if system::welcome_needed(&app) {
        print_welcome();
        system::acknowledge_welcome(&app);
    }

    let location = network_service::fetch_location(&app.http).await;
    app.set_location(location);

    if !app.messages.is_empty() {
        println!("-- resuming previous conversation ({} messages) --", app.messages.len());
        for message in &app.messages {
            print_message(message);
        }
    }

    let update_url = config::get_update_url()?;
    let (completions_tx, mut completions_rx) = mpsc::unbounded_channel::<AnswerCompletion>();

    let mut stdin = BufReader::new(tokio::io::stdin()).lines();
    let mut ping_timer = interval(Duration::from_secs(network_service::PING_INTERVAL_SECS));
    let mut update_timer = interval(Duration::from_secs(network_service::UPDATE_INTERVAL_SECS));
    let mut rollover_timer = interval(Duration::from_secs(network_service::ROLLOVER_INTERVAL_SECS));

    println!("Ask a question, or /help for commands.");
    prompt();

    loop {
        tokio::select! {
            line = stdin.next_line() => {
                match line {
                    Ok(Some(line)) => {
                        if !handle_line(&mut app, line.trim(), &completions_tx)? {
                            break;
                        }
                        prompt();
                    }
                    Ok(None) | Err(_) => break, // EOF or closed terminal
                }
            }
            Some(completion) = completions_rx.recv() => {
                if chat::apply_completion(&mut app, completion) {
                    if let Some(message) = app.messages.last() {
                        print_message(message);
                    }
                    prompt();
                }
            }
            _ = ping_timer.tick() => {
                app.connection = network_service::check_connection(&app.http).await;
            }
            _ = update_timer.tick() => {
                if let Some(url) = &update_url {
                    if let Some(timestamp) = network_service::fetch_version_timestamp(&app.http, url).await {
                        if app.observe_version(timestamp) {
                            println!("\nA new version is available. Restart the app to update.");
                            prompt();
                        }
                    }
                }
            }
            _ = rollover_timer.tick() => {
                app.run_daily_rollover(Local::now());
            }
        }
    }

    println!("\nتا دیدار بعدی!");
    Ok(())
}

/// Dispatch one line of input. Returns false to quit the session.
fn handle_line(
    app: &mut App,
    line: &str,
    completions: &mpsc::UnboundedSender<AnswerCompletion>,
) -> Result<bool> {
    if line.is_empty() {
        return Ok(true);
    }

    if !line.starts_with('/') {
        match chat::send_message(app, line, false, completions) {
            Ok(_) => println!("..."),
            Err(e) => println!("{}", e),
        }
        return Ok(true);
    }

    let mut parts = line.splitn(2, ' ');
    let command = parts.next().unwrap_or("");
    let rest = parts.next().unwrap_or("").trim();

    match command {
        "/new" => match chat::new_chat(app) {
            Some(_) => println!("Conversation archived. Starting fresh."),
            None => println!("Nothing to archive."),
        },
        "/retry" => match chat::retry_last(app, completions) {
            Ok(Some(_)) => println!("..."),
            Ok(None) => println!("No question to retry."),
            Err(e) => println!("{}", e),
        },
        "/load" => {
            let ids: Vec<String> = app.history.iter().map(|s| s.id.clone()).collect();
            match resolve_id(&ids, rest) {
                Ok(id) => match chat::load_chat(app, &id) {
                    Ok(()) => {
                        for message in &app.messages {
                            print_message(message);
                        }
                    }
                    Err(e) => println!("{}", e),
                },
                Err(e) => println!("{}", e),
            }
        }
        "/history" => {
            if app.history.is_empty() {
                println!("No archived sessions.");
            }
            for session in &app.history {
                let item = ChatSessionListItem::from(session);
                println!(
                    "{}  {}  ({} messages, {})",
                    &item.id[..8],
                    item.title,
                    item.message_count,
                    item.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        "/sources" => {
            for source in &app.sources {
                let marker = if source.is_active { "*" } else { " " };
                println!("[{}] {}  {}", marker, &source.id[..8], source.title);
            }
        }
        "/status" => print_dashboard(&system::dashboard(app)),
        "/bookmark" => {
            let mut args = rest.splitn(2, ' ');
            let index: usize = args.next().unwrap_or("").parse().unwrap_or(0);
            let note = args.next().unwrap_or("").trim();

            match app.messages.get(index.wrapping_sub(1)).map(|m| m.id.clone()) {
                Some(id) => {
                    match chat::toggle_bookmark(app, &id) {
                        Ok(true) => println!("Bookmarked message {}.", index),
                        Ok(false) => println!("Removed bookmark from message {}.", index),
                        Err(e) => println!("{}", e),
                    }
                    if !note.is_empty() {
                        if let Err(e) = chat::set_bookmark_note(app, &id, note) {
                            println!("{}", e);
                        }
                    }
                }
                None => println!("No message number {}.", index),
            }
        }
        "/help" => print_help(),
        "/quit" | "/exit" => return Ok(false),
        other => println!("Unknown command: {} (try /help)", other),
    }

    Ok(true)
}

/// Block until a syntactically valid API key is stored
fn ensure_credential() -> Result<()> {
    loop {
        if auth::auth_status()?.is_configured {
            return Ok(());
        }

        println!("An API key is required. Paste your key (it stays on this machine):");
        let mut input = String::new();
        std::io::stdin().read_line(&mut input)?;

        if input.trim().is_empty() {
            bail!("an API key is required to continue");
        }

        match auth::set_api_key(&input) {
            Ok(_) => {
                println!("API key saved.");
                return Ok(());
            }
            Err(e) => println!("{}", e),
        }
    }
}

// ============================================================================
// SUBCOMMANDS
// ============================================================================

fn run_sources(app: &mut App, action: SourcesAction) -> Result<()> {
    match action {
        SourcesAction::Add { title, text, file, link } => {
            let (content, kind) = if let Some(text) = text {
                (text, SourceKind::Text)
            } else if let Some(path) = file {
                let content = std::fs::read_to_string(&path)
                    .with_context(|| format!("failed to read {}", path.display()))?;
                (content, SourceKind::File)
            } else if let Some(link) = link {
                (link, SourceKind::Link)
            } else {
                bail!("provide the source content via --text, --file, or --link");
            };

            let id = sources::add_source(app, &title, &content, kind)?;
            println!("Added source {}.", &id[..8]);
        }
        SourcesAction::List => {
            for source in &app.sources {
                let marker = if source.is_active { "*" } else { " " };
                println!(
                    "[{}] {}  {:?}  {}",
                    marker,
                    &source.id[..8],
                    source.kind,
                    source.title
                );
            }
        }
        SourcesAction::Toggle { id } => {
            let ids: Vec<String> = app.sources.iter().map(|s| s.id.clone()).collect();
            let id = resolve_id(&ids, &id)?;
            let active = sources::toggle_source(app, &id)?;
            println!(
                "Source {} is now {}.",
                &id[..8],
                if active { "active" } else { "inactive" }
            );
        }
        SourcesAction::Remove { id } => {
            let ids: Vec<String> = app.sources.iter().map(|s| s.id.clone()).collect();
            let id = resolve_id(&ids, &id)?;
            sources::delete_source(app, &id)?;
            println!("Removed source {}.", &id[..8]);
        }
    }

    Ok(())
}

fn run_history(app: &mut App, action: HistoryAction) -> Result<()> {
    match action {
        HistoryAction::List => {
            for session in &app.history {
                let item = ChatSessionListItem::from(session);
                println!(
                    "{}  {}  ({} messages, {})",
                    &item.id[..8],
                    item.title,
                    item.message_count,
                    item.created_at.format("%Y-%m-%d %H:%M")
                );
            }
        }
        HistoryAction::Show { id } => {
            let ids: Vec<String> = app.history.iter().map(|s| s.id.clone()).collect();
            let id = resolve_id(&ids, &id)?;
            if let Some(session) = app.history.iter().find(|s| s.id == id) {
                println!("{} ({})", session.title, session.created_at.format("%Y-%m-%d %H:%M"));
                for message in &session.messages {
                    print_message(message);
                }
            }
        }
        HistoryAction::Delete { id } => {
            let ids: Vec<String> = app.history.iter().map(|s| s.id.clone()).collect();
            let id = resolve_id(&ids, &id)?;
            chat::delete_chat(app, &id)?;
            println!("Deleted session {}.", &id[..8]);
        }
        HistoryAction::Clear { yes } => {
            if yes || confirm("Delete ALL archived sessions?")? {
                chat::clear_history(app);
                println!("History cleared.");
            }
        }
    }

    Ok(())
}

fn run_auth(action: AuthAction) -> Result<()> {
    match action {
        AuthAction::SetKey { key } => {
            let input = match key {
                Some(key) => key,
                None => {
                    print!("API key: ");
                    std::io::stdout().flush()?;
                    let mut input = String::new();
                    std::io::stdin().read_line(&mut input)?;
                    input
                }
            };
            let saved = auth::set_api_key(&input)?;
            println!(
                "API key saved ({}...).",
                saved.chars().take(8).collect::<String>()
            );
        }
        AuthAction::Reset => {
            auth::reset_api_key()?;
            println!("API key removed.");
        }
        AuthAction::Status => {
            let status = auth::auth_status()?;
            match status.key_preview {
                Some(preview) => println!("Configured: {}", preview),
                None => println!("No API key configured."),
            }
        }
    }

    Ok(())
}

async fn run_status(app: &mut App) -> Result<()> {
    app.connection = network_service::check_connection(&app.http).await;
    let location = network_service::fetch_location(&app.http).await;
    app.set_location(location);

    print_dashboard(&system::dashboard(app));
    Ok(())
}

fn run_reset(app: &App, yes: bool) -> Result<()> {
    if yes || confirm("Erase ALL local data (history, sources, settings)?")? {
        system::clear_cache(app)?;
        println!("All local data erased. The app will start clean next time.");
    }

    Ok(())
}

// ============================================================================
// OUTPUT HELPERS
// ============================================================================

fn prompt() {
    print!("> ");
    let _ = std::io::stdout().flush();
}

fn print_message(message: &Message) {
    let speaker = match message.role {
        Role::User => "you",
        Role::Model => "bimehyar",
    };

    let bookmark = if message.is_bookmarked { " [bookmarked]" } else { "" };
    if message.is_error {
        println!("{} [error]> {}", speaker, message.text);
    } else {
        println!("{}{}> {}", speaker, bookmark, message.text);
    }
}

fn print_welcome() {
    println!("دستیار هوشمند بیمه — {}", APP_VERSION);
    println!("Answers are grounded in your knowledge sources and generated by an external API.");
    println!("A VPN may be required depending on your region.\n");
}

fn print_help() {
    println!("/new              archive the conversation and start fresh");
    println!("/retry            resend the last question");
    println!("/history          list archived sessions");
    println!("/load <id>        restore an archived session");
    println!("/sources          list knowledge sources");
    println!("/status           connection, usage, and activity dashboard");
    println!("/bookmark <n> [note]  toggle a bookmark on message n");
    println!("/quit             leave");
}

fn print_dashboard(dashboard: &system::Dashboard) {
    let connection = if dashboard.online {
        match dashboard.ping_ms {
            Some(ping) => format!("online ({} ms)", ping),
            None => "online".to_string(),
        }
    } else {
        "offline".to_string()
    };

    println!("Connection:   {}", connection);
    println!("Location:     {} ({})", dashboard.location.city, dashboard.location.ip);
    println!("Active users: {}", dashboard.active_users);
    if dashboard.update_available {
        println!("Update:       new version available");
    }

    println!("\nModel usage (advisory, free tier):");
    for model in &dashboard.models {
        let flag = if model.status.limited { "  << limited" } else { "" };
        println!(
            "  {:40} {:>3}/{:<4} rpm  {:>4}/{:<5} rpd{}",
            model.name,
            model.status.minute_used,
            model.status.minute_limit,
            model.status.day_used,
            model.status.day_limit,
            flag
        );
    }

    if !dashboard.visitor_logs.is_empty() {
        println!("\nRecent activity:");
        for log in &dashboard.visitor_logs {
            println!(
                "  {}  {:20}  {:12}  {:?}",
                log.timestamp.format("%H:%M:%S"),
                log.location,
                log.model_used,
                log.status
            );
        }
    }
}

fn confirm(prompt_text: &str) -> Result<bool> {
    print!("{} [y/N] ", prompt_text);
    std::io::stdout().flush()?;

    let mut input = String::new();
    std::io::stdin().read_line(&mut input)?;
    Ok(matches!(input.trim(), "y" | "Y" | "yes"))
}

/// Resolve a (possibly abbreviated) id against a list of full ids
fn resolve_id(ids: &[String], prefix: &str) -> Result<String> {
    if prefix.is_empty() {
        bail!("an id is required");
    }

    let matches: Vec<&String> = ids.iter().filter(|id| id.starts_with(prefix)).collect();
    match matches.as_slice() {
        [id] => Ok((*id).clone()),
        [] => bail!("no entry matches id {}", prefix),
        _ => bail!("id {} is ambiguous ({} matches)", prefix, matches.len()),
    }
}
