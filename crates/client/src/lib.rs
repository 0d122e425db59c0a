//! Expense-splitter client core: session and event synchronization.
//!
//! This crate holds the client-side state of the expense-splitter service and
//! keeps it consistent with the remote service while requests are in flight.
//!
//! # Overview
//!
//! - **AuthSession**: owns the session lifecycle (anonymous, authenticating,
//!   authenticated, failed) and the bearer credential.
//! - **EventStore**: owns the locally known events. Creations are inserted
//!   as pending immediately and reconciled by their [`LocalId`] when the
//!   service answers.
//! - **Notification**: the change stream observers re-render from. Observers
//!   only ever see snapshots; all mutation goes through the controllers.
//!
//! # Example
//!
//! ```no_run
//! use client::Client;
//! use contract::Contract;
//! use transport::HttpTransport;
//!
//! # async fn example() -> Result<(), Box<dyn std::error::Error>> {
//! let http = HttpTransport::builder("http://localhost:5000").build()?;
//! let client = Client::new(http, Contract::default())?;
//!
//! client.auth().login("a@b.com", "secret").await?;
//! let record = client.events().create_event("Trip", 4).await?;
//! println!("{} is {}", record.name, record.sync);
//! # Ok(())
//! # }
//! ```

mod error;
mod event;
mod notify;
mod session;
mod store;
#[cfg(test)]
mod testing;

pub use error::{Error, Result};
pub use event::{EventRecord, LocalId, ServerId, SyncState};
pub use notify::Notification;
pub use session::{AuthSession, Session, SessionState};
pub use store::EventStore;

use contract::Contract;
use notify::Notifier;
use std::sync::Arc;
use tokio::sync::broadcast;
use transport::Transport;

/// The session controller and event store, wired to one transport.
pub struct Client<T> {
    auth: Arc<AuthSession<T>>,
    events: EventStore<T>,
    transport: Arc<T>,
}

impl<T: Transport> Client<T> {
    /// Create a client. Fails if the contract does not validate.
    pub fn new(transport: T, contract: Contract) -> Result<Self> {
        contract.validate()?;
        let transport = Arc::new(transport);
        let auth = Arc::new(AuthSession::new(
            Arc::clone(&transport),
            Arc::new(contract),
            Notifier::new(),
        ));
        let events = EventStore::new(Arc::clone(&auth));
        Ok(Self {
            auth,
            events,
            transport,
        })
    }

    pub fn auth(&self) -> &AuthSession<T> {
        &self.auth
    }

    pub fn events(&self) -> &EventStore<T> {
        &self.events
    }

    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Subscribe to state changes.
    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.auth.notifier().subscribe()
    }
}
