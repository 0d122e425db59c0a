mod config;
mod error;
mod repl;

use std::io::{self, Write};
use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use client::{Client, Notification};
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::sync::broadcast::{self, error::RecvError};
use tracing::debug;
use tracing_subscriber::EnvFilter;
use transport::HttpTransport;

use config::Config;
use error::Result;
use repl::Command;

const CONFIG_FILE: &str = "splitter.toml";

type App = Arc<Client<HttpTransport>>;

#[derive(Parser)]
#[command(name = "splitter")]
#[command(about = "Terminal client for the expense splitter service", long_about = None)]
#[command(version)]
struct Cli {
    /// Path to the configuration file
    #[arg(short, long, default_value = CONFIG_FILE)]
    config: PathBuf,

    /// Override the service base URL
    #[arg(long)]
    base_url: Option<String>,
}

#[tokio::main]
async fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")))
        .with_writer(io::stderr)
        .init();

    if let Err(e) = run().await {
        eprintln!("Error: {e}");
        std::process::exit(1);
    }
}

async fn run() -> Result<()> {
    let cli = Cli::parse();

    debug!(path = %cli.config.display(), "loading configuration");
    let mut config = Config::load_or_default(&cli.config)?;
    if let Some(base_url) = cli.base_url {
        config.service.base_url = base_url;
    }

    let transport = config.service.transport()?;
    println!("splitter v{}", env!("CARGO_PKG_VERSION"));
    println!("Service: {}", transport.base_url());
    println!("Type 'help' for commands, 'quit' or Ctrl+D to exit.\n");

    let app: App = Arc::new(Client::new(transport, config.contract)?);
    let watcher = tokio::spawn(watch(app.subscribe()));

    let mut lines = BufReader::new(tokio::io::stdin()).lines();
    let mut stdout = io::stdout();

    loop {
        print!("> ");
        stdout.flush()?;

        let Some(line) = lines.next_line().await? else {
            // EOF
            break;
        };
        let input = line.trim();
        if input.is_empty() {
            continue;
        }

        let command = match input.parse::<Command>() {
            Ok(command) => command,
            Err(e) => {
                eprintln!("{e}");
                continue;
            }
        };
        if command == Command::Quit {
            break;
        }
        if let Err(e) = execute(&app, command) {
            eprintln!("Error: {e}");
        }
    }

    watcher.abort();
    println!("\nBye.");
    Ok(())
}

/// Run a command. Network-bound commands are spawned so several can be in
/// flight; their outcomes arrive through the notification watcher.
fn execute(app: &App, command: Command) -> Result<()> {
    match command {
        Command::Signup {
            email,
            password,
            name,
        } => {
            let app = Arc::clone(app);
            tokio::spawn(async move {
                report(app.auth().signup(&email, &password, &name).await);
            });
        }
        Command::Login { email, password } => {
            let app = Arc::clone(app);
            tokio::spawn(async move {
                report(app.auth().login(&email, &password).await);
            });
        }
        Command::Logout => app.auth().logout(),
        Command::Ack => app.auth().acknowledge(),
        Command::Create { participants, name } => {
            let app = Arc::clone(app);
            tokio::spawn(async move {
                report(app.events().create_event(&name, participants).await);
            });
        }
        Command::Retry(prefix) => {
            let local_id = repl::find_event(&app.events().list_events(), &prefix)?;
            let app = Arc::clone(app);
            tokio::spawn(async move {
                report(app.events().retry_event(local_id).await);
            });
        }
        Command::Dismiss(prefix) => {
            let local_id = repl::find_event(&app.events().list_events(), &prefix)?;
            app.events().dismiss_event(local_id)?;
        }
        Command::Events => print_events(app),
        Command::Status => {
            let session = app.auth().session();
            println!("Session: {}", session.state);
        }
        Command::Help => println!("{}", repl::HELP),
        Command::Quit => {}
    }
    Ok(())
}

/// Print errors the notification stream does not already show.
fn report<T>(outcome: client::Result<T>) {
    match outcome {
        Ok(_)
        | Err(client::Error::Transport(_))
        | Err(client::Error::InvalidResponse(_))
        | Err(client::Error::Superseded) => {}
        Err(e) => eprintln!("\nError: {e}"),
    }
}

fn print_events(app: &App) {
    let events = app.events().list_events();
    if events.is_empty() {
        println!("No events yet.");
        return;
    }
    for record in &events {
        println!("{}", repl::format_event(record));
    }
}

async fn watch(mut notifications: broadcast::Receiver<Notification>) {
    loop {
        match notifications.recv().await {
            Ok(notification) => println!("\n{}", repl::format_notification(&notification)),
            Err(RecvError::Lagged(missed)) => eprintln!("\n({missed} updates missed)"),
            Err(RecvError::Closed) => break,
        }
    }
}
