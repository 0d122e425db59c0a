//! Optimistic event store.

use crate::notify::Notification;
use crate::{AuthSession, Error, EventRecord, LocalId, Result, ServerId, SyncState};
use contract::Field;
use indexmap::IndexMap;
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use transport::{Credential, Request, Transport};

/// Local view of the events the user has created.
///
/// Records are inserted before the service answers and reconciled by
/// [`LocalId`] when it does, so concurrent creations never interfere, even
/// when they share a name.
pub struct EventStore<T> {
    auth: Arc<AuthSession<T>>,
    records: Mutex<IndexMap<LocalId, EventRecord>>,
}

impl<T: Transport> EventStore<T> {
    pub(crate) fn new(auth: Arc<AuthSession<T>>) -> Self {
        Self {
            auth,
            records: Mutex::new(IndexMap::new()),
        }
    }

    /// Create an event.
    ///
    /// The record is visible as `Pending` before the request resolves. The
    /// returned record carries the outcome: `Confirmed` with the server id,
    /// or `Failed` with the reason. `Err` is reserved for preconditions
    /// (`Unauthenticated`, `Validation`), in which case nothing is inserted.
    pub async fn create_event(&self, name: &str, participants: u32) -> Result<EventRecord> {
        if name.trim().is_empty() {
            return Err(Error::Validation("event name must not be empty".into()));
        }
        let (credential, principal) = self.auth.authenticated().ok_or(Error::Unauthenticated)?;

        let record = EventRecord::pending(name, participants);
        let local_id = record.local_id;
        self.lock().insert(local_id, record.clone());
        debug!(%local_id, name, "event inserted optimistically");
        self.auth.notifier().emit(Notification::Event(record));

        self.dispatch(local_id, name, participants, credential, &principal)
            .await
    }

    /// Re-send a failed record's creation request.
    pub async fn retry_event(&self, local_id: LocalId) -> Result<EventRecord> {
        let (credential, principal) = self.auth.authenticated().ok_or(Error::Unauthenticated)?;

        let record = {
            let mut records = self.lock();
            let record = records
                .get_mut(&local_id)
                .ok_or(Error::UnknownEvent(local_id))?;
            if !record.is_failed() {
                return Err(Error::InvalidState(format!(
                    "event {local_id} is {}, only failed events can be retried",
                    record.sync
                )));
            }
            record.sync = SyncState::Pending;
            record.clone()
        };
        debug!(%local_id, "retrying event");
        self.auth.notifier().emit(Notification::Event(record.clone()));

        self.dispatch(
            local_id,
            &record.name,
            record.participants,
            credential,
            &principal,
        )
        .await
    }

    /// Remove a failed record.
    pub fn dismiss_event(&self, local_id: LocalId) -> Result<()> {
        {
            let mut records = self.lock();
            let record = records.get(&local_id).ok_or(Error::UnknownEvent(local_id))?;
            if !record.is_failed() {
                return Err(Error::InvalidState(format!(
                    "event {local_id} is {}, only failed events can be dismissed",
                    record.sync
                )));
            }
            records.shift_remove(&local_id);
        }
        debug!(%local_id, "event dismissed");
        self.auth
            .notifier()
            .emit(Notification::EventDismissed(local_id));
        Ok(())
    }

    /// All records in creation order, including pending and failed ones.
    pub fn list_events(&self) -> Vec<EventRecord> {
        self.lock().values().cloned().collect()
    }

    pub fn event(&self, local_id: LocalId) -> Option<EventRecord> {
        self.lock().get(&local_id).cloned()
    }

    /// Send the creation request and reconcile the record it belongs to.
    async fn dispatch(
        &self,
        local_id: LocalId,
        name: &str,
        participants: u32,
        credential: Credential,
        principal: &str,
    ) -> Result<EventRecord> {
        let contract = self.auth.contract();
        let endpoint = &contract.create_event;
        let body = endpoint.encode([
            (Field::EventName, json!(name)),
            (Field::CreatorName, json!(principal)),
            (Field::Participants, json!(participants)),
        ]);
        let request = Request::post(&endpoint.path).json(body).bearer(credential);

        let outcome = self.auth.transport().send(request).await;

        let sync = match outcome
            .map_err(Error::from)
            .and_then(|body| extract_server_id(&body, &contract.event_id_field))
        {
            Ok(server_id) => {
                info!(%local_id, %server_id, "event confirmed");
                SyncState::Confirmed { server_id }
            }
            Err(e) => {
                warn!(%local_id, error = %e, "event creation failed");
                SyncState::Failed {
                    error: e.user_message(),
                }
            }
        };

        let record = {
            let mut records = self.lock();
            let record = records
                .get_mut(&local_id)
                .ok_or(Error::UnknownEvent(local_id))?;
            record.sync = sync;
            record.clone()
        };
        self.auth.notifier().emit(Notification::Event(record.clone()));
        Ok(record)
    }

    fn lock(&self) -> MutexGuard<'_, IndexMap<LocalId, EventRecord>> {
        self.records.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

fn extract_server_id(body: &Value, field: &str) -> Result<ServerId> {
    body.get(field)
        .and_then(ServerId::from_json)
        .ok_or_else(|| Error::InvalidResponse(format!("missing {field} in response")))
}
