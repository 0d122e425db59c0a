//! Locally tracked event records.

use serde_json::Value;
use uuid::Uuid;

/// Client-generated identifier of an event record.
///
/// Stable for the record's lifetime, independent of the server id.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct LocalId(pub Uuid);

impl LocalId {
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }
}

impl Default for LocalId {
    fn default() -> Self {
        Self::new()
    }
}

impl std::fmt::Display for LocalId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// Identifier assigned by the service.
///
/// The service has returned both numeric and string ids; both are kept in
/// their textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct ServerId(String);

impl ServerId {
    /// Read an id from a JSON value. Accepts integers and non-empty strings.
    pub fn from_json(value: &Value) -> Option<Self> {
        match value {
            Value::Number(n) => Some(Self(n.to_string())),
            Value::String(s) if !s.trim().is_empty() => Some(Self(s.clone())),
            _ => None,
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl From<u64> for ServerId {
    fn from(id: u64) -> Self {
        Self(id.to_string())
    }
}

impl From<&str> for ServerId {
    fn from(id: &str) -> Self {
        Self(id.to_string())
    }
}

impl std::fmt::Display for ServerId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

/// Synchronization state of a record with the service.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SyncState {
    /// Inserted locally, request in flight.
    Pending,
    /// Accepted by the service.
    Confirmed { server_id: ServerId },
    /// Rejected or unreachable; kept until retried or dismissed.
    Failed { error: String },
}

impl std::fmt::Display for SyncState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Pending => write!(f, "pending"),
            Self::Confirmed { .. } => write!(f, "confirmed"),
            Self::Failed { .. } => write!(f, "failed"),
        }
    }
}

/// A locally tracked expense group.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EventRecord {
    pub local_id: LocalId,
    pub name: String,
    pub participants: u32,
    pub sync: SyncState,
}

impl EventRecord {
    pub(crate) fn pending(name: impl Into<String>, participants: u32) -> Self {
        Self {
            local_id: LocalId::new(),
            name: name.into(),
            participants,
            sync: SyncState::Pending,
        }
    }

    /// Server id, present only once confirmed.
    pub fn server_id(&self) -> Option<&ServerId> {
        match &self.sync {
            SyncState::Confirmed { server_id } => Some(server_id),
            _ => None,
        }
    }

    /// Failure message, present only when failed.
    pub fn last_error(&self) -> Option<&str> {
        match &self.sync {
            SyncState::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_pending(&self) -> bool {
        self.sync == SyncState::Pending
    }

    pub fn is_failed(&self) -> bool {
        matches!(self.sync, SyncState::Failed { .. })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn server_id_accepts_numbers_and_strings() {
        assert_eq!(ServerId::from_json(&json!(42)), Some(ServerId::from(42)));
        assert_eq!(ServerId::from_json(&json!("evt_9")), Some(ServerId::from("evt_9")));
        assert_eq!(ServerId::from_json(&json!("")), None);
        assert_eq!(ServerId::from_json(&json!(null)), None);
        assert_eq!(ServerId::from_json(&json!({"id": 1})), None);
    }

    #[test]
    fn accessors_follow_sync_state() {
        let mut record = EventRecord::pending("Trip", 3);
        assert!(record.is_pending());
        assert_eq!(record.server_id(), None);
        assert_eq!(record.last_error(), None);

        record.sync = SyncState::Confirmed {
            server_id: ServerId::from(7),
        };
        assert_eq!(record.server_id().map(ServerId::as_str), Some("7"));
        assert_eq!(record.sync.to_string(), "confirmed");

        record.sync = SyncState::Failed {
            error: "boom".into(),
        };
        assert!(record.is_failed());
        assert_eq!(record.server_id(), None);
        assert_eq!(record.last_error(), Some("boom"));
    }

    #[test]
    fn local_ids_are_distinct() {
        assert_ne!(LocalId::new(), LocalId::new());
    }
}
