use std::io::Write;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use clap::Parser;
use questro::command::{self, Command, HELP};
use questro::{QuestroConfig, QuestroError, attach};
use questro_client::ChatClient;
use questro_history_fs::FsHistory;
use questro_history_memory::MemoryHistory;
use questro_session::ChatSession;
use questro_types::{Attachment, HistoryStore};
use tokio::io::{AsyncBufReadExt, BufReader};

/// Chat with the Questro assistant from the terminal.
#[derive(Debug, Parser)]
#[command(name = "questro", version, about)]
struct Cli {
    /// JSON config file (default: ./questro.json if present).
    #[arg(long)]
    config: Option<PathBuf>,
    /// Chat endpoint URL, overriding config and environment.
    #[arg(long)]
    endpoint: Option<String>,
    /// History file, overriding config and environment.
    #[arg(long, conflicts_with = "no_history")]
    history: Option<PathBuf>,
    /// Keep history in memory only.
    #[arg(long)]
    no_history: bool,
}

#[tokio::main]
async fn main() {
    init_tracing();
    if let Err(err) = run(Cli::parse()).await {
        eprintln!("questro error: {err}");
        std::process::exit(1);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

async fn run(cli: Cli) -> Result<(), QuestroError> {
    let mut config = QuestroConfig::load(cli.config.as_deref())?;
    config.apply_env();
    if let Some(endpoint) = cli.endpoint {
        config.endpoint = endpoint;
    }
    if let Some(path) = cli.history {
        config.history_path = path;
    }
    config.validate()?;

    let store: Arc<dyn HistoryStore> = if cli.no_history {
        Arc::new(MemoryHistory::new())
    } else {
        Arc::new(FsHistory::open(&config.history_path).await?)
    };
    let client = ChatClient::from_config(&config.client_config());
    tracing::info!(endpoint = %client.endpoint(), user = %config.user_id, "questro ready");

    let mut session = ChatSession::new(config.user_id.clone(), client, store);
    spawn_interrupt_watcher(&session);
    repl(&mut session).await
}

/// Ctrl-C cancels the reply in flight; with nothing in flight it exits.
fn spawn_interrupt_watcher(session: &ChatSession<ChatClient>) {
    let handle = session.cancel_handle();
    tokio::spawn(async move {
        while tokio::signal::ctrl_c().await.is_ok() {
            if !handle.cancel() {
                println!();
                std::process::exit(0);
            }
        }
    });
}

async fn repl(session: &mut ChatSession<ChatClient>) -> Result<(), QuestroError> {
    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut listing: Vec<String> = Vec::new();
    let mut attachment: Option<Attachment> = None;

    println!("Questro chat. /help for commands.");
    loop {
        print!("{}> ", if attachment.is_some() { "[+file] " } else { "" });
        std::io::stdout().flush()?;

        let Some(line) = lines.next_line().await? else {
            break;
        };
        let command = match command::parse(&line) {
            Ok(command) => command,
            Err(err) => {
                eprintln!("{err}");
                continue;
            }
        };

        match command {
            Command::Send(text) => {
                if text.is_empty() && attachment.is_none() {
                    continue;
                }
                send(session, &text, attachment.take()).await;
            }
            Command::New => {
                session.new_chat();
                attachment = None;
                println!("Started a new chat.");
            }
            Command::List => match session.history().await {
                Ok(records) => {
                    listing = records.iter().map(|r| r.id.clone()).collect();
                    if records.is_empty() {
                        println!("No saved chats.");
                    }
                    for (i, record) in records.iter().enumerate() {
                        let current = if session.chat_id() == Some(record.id.as_str()) {
                            "*"
                        } else {
                            " "
                        };
                        println!(
                            "{current}{:>3}. {}  ({})",
                            i + 1,
                            record.title,
                            record.updated_at.format("%Y-%m-%d %H:%M")
                        );
                    }
                }
                Err(err) => eprintln!("{}", err.user_message()),
            },
            Command::Open(target) => {
                let Some(id) = target.resolve(&listing) else {
                    eprintln!("No such chat, run /list first.");
                    continue;
                };
                match session.open(id).await {
                    Ok(()) => print_transcript(session),
                    Err(err) => eprintln!("{}", err.user_message()),
                }
            }
            Command::Rename(target, title) => {
                let Some(id) = target.resolve(&listing) else {
                    eprintln!("No such chat, run /list first.");
                    continue;
                };
                match session.rename_chat(id, &title).await {
                    Ok(()) => println!("Renamed."),
                    Err(err) => eprintln!("{}", err.user_message()),
                }
            }
            Command::Delete(target) => {
                let Some(id) = target.resolve(&listing).map(str::to_string) else {
                    eprintln!("No such chat, run /list first.");
                    continue;
                };
                match session.delete_chat(&id).await {
                    Ok(()) => {
                        listing.retain(|listed| listed != &id);
                        println!("Deleted.");
                    }
                    Err(err) => eprintln!("{}", err.user_message()),
                }
            }
            Command::Clear => match session.clear_history().await {
                Ok(()) => {
                    listing.clear();
                    println!("All chats deleted.");
                }
                Err(err) => eprintln!("{}", err.user_message()),
            },
            Command::Attach(path) => match attach::load_attachment(Path::new(&path)).await {
                Ok(loaded) => {
                    println!("Attached {path} ({}).", loaded.mime_type);
                    attachment = Some(loaded);
                }
                Err(err) => eprintln!("Cannot attach {path}: {err}"),
            },
            Command::Help => println!("{HELP}"),
            Command::Quit => break,
        }
    }
    Ok(())
}

async fn send(session: &mut ChatSession<ChatClient>, text: &str, attachment: Option<Attachment>) {
    let mut printed = 0;
    let result = session
        .submit(text, attachment, |reply: &str| {
            // Cumulative text: print only what is new.
            if let Some(fresh) = reply.get(printed..) {
                print!("{fresh}");
                let _ = std::io::stdout().flush();
            }
            printed = reply.len();
        })
        .await;
    println!();
    if let Err(err) = result {
        if err.is_cancelled() {
            eprintln!("[cancelled]");
        } else {
            eprintln!("{}", err.user_message());
        }
    }
}

fn print_transcript(session: &ChatSession<ChatClient>) {
    for message in session.messages() {
        println!("{}: {}", message.role.as_str(), message.content);
    }
}
