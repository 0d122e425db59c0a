//! Interactive command parsing and display helpers.

use crate::error::{Error, Result};
use client::{EventRecord, LocalId, Notification, SyncState};
use std::str::FromStr;

pub const HELP: &str = "\
Commands:
  signup <email> <password> [name]   register an account
  login <email> <password>           log in
  logout                             drop the session
  ack                                clear a failed login/signup
  create <participants> <name...>    create an event
  retry <id>                         resend a failed event (id prefix)
  dismiss <id>                       remove a failed event (id prefix)
  events                             list events
  status                             show the session
  help                               show this help
  quit                               exit";

const DEFAULT_DISPLAY_NAME: &str = "User";

/// A parsed REPL line.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Command {
    Signup {
        email: String,
        password: String,
        name: String,
    },
    Login {
        email: String,
        password: String,
    },
    Logout,
    Ack,
    Create {
        participants: u32,
        name: String,
    },
    Retry(String),
    Dismiss(String),
    Events,
    Status,
    Help,
    Quit,
}

impl FromStr for Command {
    type Err = String;

    fn from_str(line: &str) -> std::result::Result<Self, Self::Err> {
        let mut words = line.split_whitespace();
        let Some(verb) = words.next() else {
            return Err("empty command".into());
        };
        let rest: Vec<&str> = words.collect();

        let command = match (verb, rest.as_slice()) {
            ("signup", [email, password]) => Self::Signup {
                email: email.to_string(),
                password: password.to_string(),
                name: DEFAULT_DISPLAY_NAME.to_string(),
            },
            ("signup", [email, password, name @ ..]) => Self::Signup {
                email: email.to_string(),
                password: password.to_string(),
                name: name.join(" "),
            },
            ("login", [email, password]) => Self::Login {
                email: email.to_string(),
                password: password.to_string(),
            },
            ("logout", []) => Self::Logout,
            ("ack", []) => Self::Ack,
            ("create", [participants, name @ ..]) if !name.is_empty() => Self::Create {
                participants: participants
                    .parse()
                    .map_err(|_| format!("participants must be a number, got '{participants}'"))?,
                name: name.join(" "),
            },
            ("retry", [id]) => Self::Retry(id.to_string()),
            ("dismiss", [id]) => Self::Dismiss(id.to_string()),
            ("events" | "ls", []) => Self::Events,
            ("status", []) => Self::Status,
            ("help" | "?", []) => Self::Help,
            ("quit" | "exit", []) => Self::Quit,
            (
                "signup" | "login" | "logout" | "ack" | "create" | "retry" | "dismiss" | "events"
                | "status",
                _,
            ) => return Err(format!("wrong arguments for '{verb}', see 'help'")),
            _ => return Err(format!("unknown command '{verb}', see 'help'")),
        };
        Ok(command)
    }
}

/// Resolve an event id prefix against the current records.
pub fn find_event(records: &[EventRecord], prefix: &str) -> Result<LocalId> {
    let matching: Vec<_> = records
        .iter()
        .filter(|r| r.local_id.to_string().starts_with(prefix))
        .collect();

    match matching.as_slice() {
        [] => Err(Error::EventNotFound {
            prefix: prefix.to_string(),
        }),
        [record] => Ok(record.local_id),
        _ => Err(Error::AmbiguousEvent {
            prefix: prefix.to_string(),
            matches: matching.iter().map(|r| r.local_id.to_string()).collect(),
        }),
    }
}

/// Short form of a local id for display.
pub fn short_id(id: LocalId) -> String {
    id.to_string().chars().take(8).collect()
}

pub fn format_event(record: &EventRecord) -> String {
    let status = match &record.sync {
        SyncState::Pending => "pending".to_string(),
        SyncState::Confirmed { server_id } => format!("confirmed (#{server_id})"),
        SyncState::Failed { error } => format!("failed: {error}"),
    };
    format!(
        "{}  {} ({} people)  {status}",
        short_id(record.local_id),
        record.name,
        record.participants
    )
}

pub fn format_notification(notification: &Notification) -> String {
    match notification {
        Notification::Session(session) => format!("[session] {}", session.state),
        Notification::SignedUp { email } => {
            format!("[session] signed up as {email}, log in to continue")
        }
        Notification::Event(record) => format!("[event] {}", format_event(record)),
        Notification::EventDismissed(id) => format!("[event] {} dismissed", short_id(*id)),
    }
}
