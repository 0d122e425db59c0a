//! Contract definition, presets, and payload encoding.

use crate::{Error, Result};
use serde::Deserialize;
use serde_json::{Map, Value};
use std::collections::{BTreeMap, HashSet};
use std::path::Path;

/// A local field the client can place on the wire.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Field {
    Email,
    Password,
    DisplayName,
    EventName,
    CreatorName,
    Participants,
}

impl std::fmt::Display for Field {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let name = match self {
            Self::Email => "email",
            Self::Password => "password",
            Self::DisplayName => "display_name",
            Self::EventName => "event_name",
            Self::CreatorName => "creator_name",
            Self::Participants => "participants",
        };
        f.write_str(name)
    }
}

/// One route and its local-to-wire field mapping.
///
/// Local fields with no entry in `fields` are not sent.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Endpoint {
    pub path: String,
    #[serde(default)]
    pub fields: BTreeMap<Field, String>,
}

impl Endpoint {
    pub fn new(path: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            fields: BTreeMap::new(),
        }
    }

    /// Map a local field to a wire name.
    pub fn map(mut self, field: Field, wire: impl Into<String>) -> Self {
        self.fields.insert(field, wire.into());
        self
    }

    /// Build the JSON body from local values, keeping only mapped fields.
    pub fn encode(&self, values: impl IntoIterator<Item = (Field, Value)>) -> Value {
        let body: Map<String, Value> = values
            .into_iter()
            .filter_map(|(field, value)| Some((self.fields.get(&field)?.clone(), value)))
            .collect();
        Value::Object(body)
    }

    fn validate(&self, endpoint: &str, required: &[Field]) -> Result<()> {
        if !self.path.starts_with('/') || self.path.len() < 2 {
            return Err(Error::Invalid(format!(
                "{endpoint}: path must start with '/' (got {:?})",
                self.path
            )));
        }

        let mut seen = HashSet::new();
        for (field, wire) in &self.fields {
            if wire.trim().is_empty() {
                return Err(Error::Invalid(format!(
                    "{endpoint}: empty wire name for {field}"
                )));
            }
            if !seen.insert(wire.as_str()) {
                return Err(Error::Invalid(format!(
                    "{endpoint}: wire name {wire:?} mapped more than once"
                )));
            }
        }

        for field in required {
            if !self.fields.contains_key(field) {
                return Err(Error::Invalid(format!("{endpoint}: {field} must be mapped")));
            }
        }
        Ok(())
    }
}

/// Wire contract for the three service routes the client calls.
///
/// Missing tables in a TOML file fall back to the current revision.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Contract {
    #[serde(default = "default_signup")]
    pub signup: Endpoint,

    #[serde(default = "default_login")]
    pub login: Endpoint,

    #[serde(default = "default_create_event")]
    pub create_event: Endpoint,

    /// Login response field holding the bearer token.
    #[serde(default = "default_token_field")]
    pub token_field: String,

    /// Create-event response field holding the server-assigned id.
    #[serde(default = "default_event_id_field")]
    pub event_id_field: String,
}

fn default_signup() -> Endpoint {
    Endpoint::new("/auth/signup")
        .map(Field::Email, "email")
        .map(Field::Password, "password")
        .map(Field::DisplayName, "name")
}

fn default_login() -> Endpoint {
    Endpoint::new("/auth/login")
        .map(Field::Email, "email")
        .map(Field::Password, "password")
}

fn default_create_event() -> Endpoint {
    Endpoint::new("/event/create")
        .map(Field::EventName, "event_name")
        .map(Field::CreatorName, "creator_name")
        .map(Field::Participants, "total_people")
}

fn default_token_field() -> String {
    "access_token".to_string()
}

fn default_event_id_field() -> String {
    "event_id".to_string()
}

impl Default for Contract {
    fn default() -> Self {
        Self {
            signup: default_signup(),
            login: default_login(),
            create_event: default_create_event(),
            token_field: default_token_field(),
            event_id_field: default_event_id_field(),
        }
    }
}

impl Contract {
    /// Earliest revision: events are created from a bare `{name}`.
    pub fn legacy() -> Self {
        Self {
            create_event: Endpoint::new("/event/create").map(Field::EventName, "name"),
            ..Self::default()
        }
    }

    /// Revision that sends the creator as `user_id` alongside `name`.
    pub fn with_owner() -> Self {
        Self {
            create_event: Endpoint::new("/event/create")
                .map(Field::EventName, "name")
                .map(Field::CreatorName, "user_id"),
            ..Self::default()
        }
    }

    /// Load a contract from a TOML file.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        Self::parse(&content)
    }

    /// Parse and validate a contract from a TOML string.
    pub fn parse(toml: &str) -> Result<Self> {
        let contract: Self = toml::from_str(toml).map_err(|e| Error::Parse(e.to_string()))?;
        contract.validate()?;
        Ok(contract)
    }

    /// Check paths, wire names, and required mappings.
    pub fn validate(&self) -> Result<()> {
        self.signup
            .validate("signup", &[Field::Email, Field::Password])?;
        self.login.validate("login", &[Field::Email, Field::Password])?;
        self.create_event.validate("create_event", &[Field::EventName])?;

        if self.token_field.trim().is_empty() {
            return Err(Error::Invalid("token_field must not be empty".into()));
        }
        if self.event_id_field.trim().is_empty() {
            return Err(Error::Invalid("event_id_field must not be empty".into()));
        }
        Ok(())
    }
}
