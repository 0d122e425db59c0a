//! Authentication session management.

use crate::notify::{Notification, Notifier};
use crate::{Error, Result};
use contract::{Contract, Field};
use serde_json::{Value, json};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, info, warn};
use transport::{Credential, Request, Transport};

/// Authentication state of the client.
///
/// The credential only exists inside `Authenticated` and the error only
/// inside `Failed`, so neither can outlive its state.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    Anonymous,
    Authenticating,
    Authenticated {
        credential: Credential,
        /// Email the session was opened with.
        principal: String,
    },
    Failed {
        error: String,
    },
}

impl std::fmt::Display for SessionState {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Anonymous => write!(f, "anonymous"),
            Self::Authenticating => write!(f, "authenticating"),
            Self::Authenticated { principal, .. } => write!(f, "authenticated as {principal}"),
            Self::Failed { error } => write!(f, "failed: {error}"),
        }
    }
}

/// Snapshot of the session handed to observers.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Session {
    pub state: SessionState,
    /// Generation counter; bumped by every new attempt and every reset.
    pub epoch: u64,
}

impl Session {
    fn new() -> Self {
        Self {
            state: SessionState::Anonymous,
            epoch: 0,
        }
    }

    pub fn credential(&self) -> Option<&Credential> {
        match &self.state {
            SessionState::Authenticated { credential, .. } => Some(credential),
            _ => None,
        }
    }

    pub fn principal(&self) -> Option<&str> {
        match &self.state {
            SessionState::Authenticated { principal, .. } => Some(principal),
            _ => None,
        }
    }

    pub fn last_error(&self) -> Option<&str> {
        match &self.state {
            SessionState::Failed { error } => Some(error),
            _ => None,
        }
    }

    pub fn is_authenticated(&self) -> bool {
        matches!(self.state, SessionState::Authenticated { .. })
    }

    pub fn is_authenticating(&self) -> bool {
        self.state == SessionState::Authenticating
    }
}

/// Owns the session lifecycle and the bearer credential.
///
/// Methods take `&self`; the session lock is never held across a request, so
/// an authentication attempt can overlap with event operations.
pub struct AuthSession<T> {
    transport: Arc<T>,
    contract: Arc<Contract>,
    notifier: Notifier,
    session: Mutex<Session>,
}

impl<T: Transport> AuthSession<T> {
    pub(crate) fn new(transport: Arc<T>, contract: Arc<Contract>, notifier: Notifier) -> Self {
        Self {
            transport,
            contract,
            notifier,
            session: Mutex::new(Session::new()),
        }
    }

    /// Current session snapshot.
    pub fn session(&self) -> Session {
        self.lock().clone()
    }

    /// Current credential, read at the moment of the call.
    pub fn credential(&self) -> Option<Credential> {
        self.lock().credential().cloned()
    }

    /// Credential and principal, when authenticated.
    pub(crate) fn authenticated(&self) -> Option<(Credential, String)> {
        match &self.lock().state {
            SessionState::Authenticated {
                credential,
                principal,
            } => Some((credential.clone(), principal.clone())),
            _ => None,
        }
    }

    pub(crate) fn transport(&self) -> &T {
        &self.transport
    }

    pub(crate) fn contract(&self) -> &Contract {
        &self.contract
    }

    pub(crate) fn notifier(&self) -> &Notifier {
        &self.notifier
    }

    /// Register a new account.
    ///
    /// Signing up does not authenticate: on success the session returns to
    /// `Anonymous` and a [`Notification::SignedUp`] is emitted. A live
    /// session is left alone; signup is refused with `InvalidState` until
    /// the user logs out.
    pub async fn signup(&self, email: &str, password: &str, display_name: &str) -> Result<()> {
        let email = validate_credentials(email, password)?;
        let epoch = self.begin(Attempt::Signup)?;

        let endpoint = &self.contract.signup;
        let body = endpoint.encode([
            (Field::Email, json!(email)),
            (Field::Password, json!(password)),
            (Field::DisplayName, json!(display_name)),
        ]);
        let outcome = self
            .transport
            .send(Request::post(&endpoint.path).json(body))
            .await;

        match outcome {
            Ok(_) => {
                self.settle(epoch, SessionState::Anonymous)?;
                info!(%email, "signup accepted");
                self.notifier.emit(Notification::SignedUp {
                    email: email.to_string(),
                });
                Ok(())
            }
            Err(e) => self.fail(epoch, e.into()),
        }
    }

    /// Authenticate and store the bearer credential.
    ///
    /// Any previous credential is discarded before the request is sent.
    pub async fn login(&self, email: &str, password: &str) -> Result<()> {
        let email = validate_credentials(email, password)?;
        let epoch = self.begin(Attempt::Login)?;

        let endpoint = &self.contract.login;
        let body = endpoint.encode([
            (Field::Email, json!(email)),
            (Field::Password, json!(password)),
        ]);
        let outcome = self
            .transport
            .send(Request::post(&endpoint.path).json(body))
            .await;

        match outcome
            .map_err(Error::from)
            .and_then(|body| extract_token(&body, &self.contract.token_field))
        {
            Ok(credential) => self.settle(
                epoch,
                SessionState::Authenticated {
                    credential,
                    principal: email.to_string(),
                },
            ),
            Err(e) => self.fail(epoch, e),
        }
    }

    /// Drop the session from any state.
    ///
    /// A response for an attempt started before the logout is discarded.
    pub fn logout(&self) {
        let snapshot = {
            let mut session = self.lock();
            session.epoch += 1;
            session.state = SessionState::Anonymous;
            session.clone()
        };
        info!(epoch = snapshot.epoch, "logged out");
        self.notifier.emit(Notification::Session(snapshot));
    }

    /// Clear a failure and return to `Anonymous`. No-op in any other state.
    pub fn acknowledge(&self) {
        let snapshot = {
            let mut session = self.lock();
            if !matches!(session.state, SessionState::Failed { .. }) {
                return;
            }
            session.state = SessionState::Anonymous;
            session.clone()
        };
        self.notifier.emit(Notification::Session(snapshot));
    }

    /// Enter `Authenticating`, rejecting overlapping attempts.
    fn begin(&self, attempt: Attempt) -> Result<u64> {
        let snapshot = {
            let mut session = self.lock();
            if session.is_authenticating() {
                warn!(%attempt, "rejected: authentication already in progress");
                return Err(Error::ConcurrentOperation);
            }
            if attempt == Attempt::Signup && session.is_authenticated() {
                warn!(%attempt, "rejected: already authenticated");
                return Err(Error::InvalidState(
                    "already logged in, log out before signing up".into(),
                ));
            }
            session.epoch += 1;
            session.state = SessionState::Authenticating;
            session.clone()
        };
        debug!(%attempt, epoch = snapshot.epoch, "authentication attempt started");
        self.notifier.emit(Notification::Session(snapshot.clone()));
        Ok(snapshot.epoch)
    }

    /// Apply the outcome of the attempt started at `epoch`, unless superseded.
    fn settle(&self, epoch: u64, state: SessionState) -> Result<()> {
        let snapshot = {
            let mut session = self.lock();
            if session.epoch != epoch {
                debug!(epoch, current = session.epoch, "discarding stale response");
                return Err(Error::Superseded);
            }
            session.state = state;
            session.clone()
        };
        info!(state = %snapshot.state, "session transition");
        self.notifier.emit(Notification::Session(snapshot));
        Ok(())
    }

    fn fail(&self, epoch: u64, error: Error) -> Result<()> {
        warn!(error = %error, "authentication attempt failed");
        self.settle(
            epoch,
            SessionState::Failed {
                error: error.user_message(),
            },
        )?;
        Err(error)
    }

    fn lock(&self) -> MutexGuard<'_, Session> {
        self.session.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Attempt {
    Signup,
    Login,
}

impl std::fmt::Display for Attempt {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Signup => write!(f, "signup"),
            Self::Login => write!(f, "login"),
        }
    }
}

fn validate_credentials<'a>(email: &'a str, password: &str) -> Result<&'a str> {
    let email = email.trim();
    if email.is_empty() {
        return Err(Error::Validation("email must not be empty".into()));
    }
    if password.is_empty() {
        return Err(Error::Validation("password must not be empty".into()));
    }
    Ok(email)
}

fn extract_token(body: &Value, field: &str) -> Result<Credential> {
    body.get(field)
        .and_then(Value::as_str)
        .and_then(Credential::new)
        .ok_or_else(|| Error::InvalidResponse(format!("missing {field} in response")))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::testing::{ScriptedTransport, client_error, server_error};
    use crate::Client;
    use serde_json::json;

    fn client(transport: ScriptedTransport) -> Client<ScriptedTransport> {
        Client::new(transport, Contract::default()).unwrap()
    }

    #[tokio::test]
    async fn login_success_stores_credential() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"access_token": "tok123"}));
        let client = client(transport);

        client.auth().login("a@b.com", "x").await.unwrap();

        let session = client.auth().session();
        assert!(session.is_authenticated());
        assert_eq!(session.credential().map(Credential::expose), Some("tok123"));
        assert_eq!(session.principal(), Some("a@b.com"));
        assert_eq!(session.last_error(), None);

        let sent = client.transport().sent();
        assert_eq!(sent[0].path, "/auth/login");
        assert_eq!(sent[0].body, Some(json!({"email": "a@b.com", "password": "x"})));
        assert!(!sent[0].requires_auth());
    }

    #[tokio::test]
    async fn login_failure_records_service_message() {
        let transport = ScriptedTransport::new();
        transport.reply_err(client_error(401, "bad credentials"));
        let client = client(transport);

        let err = client.auth().login("a@b.com", "wrong").await.unwrap_err();

        assert!(matches!(err, Error::Transport(_)));
        let session = client.auth().session();
        assert_eq!(session.last_error(), Some("bad credentials"));
        assert!(session.credential().is_none());
    }

    #[tokio::test]
    async fn failed_relogin_discards_previous_credential() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"access_token": "first"}));
        transport.reply_err(server_error(503, "maintenance"));
        let client = client(transport);

        client.auth().login("a@b.com", "x").await.unwrap();
        client.auth().login("a@b.com", "x").await.unwrap_err();

        assert!(client.auth().credential().is_none());
        assert_eq!(client.auth().session().last_error(), Some("maintenance"));
    }

    #[tokio::test]
    async fn login_from_failed_state_succeeds() {
        let transport = ScriptedTransport::new();
        transport.reply_err(client_error(401, "nope"));
        transport.reply(json!({"access_token": "tok"}));
        let client = client(transport);

        client.auth().login("a@b.com", "x").await.unwrap_err();
        client.auth().login("a@b.com", "x").await.unwrap();

        assert!(client.auth().session().is_authenticated());
    }

    #[tokio::test]
    async fn login_without_token_fails() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"message": "ok"}));
        let client = client(transport);

        let err = client.auth().login("a@b.com", "x").await.unwrap_err();

        assert!(matches!(err, Error::InvalidResponse(_)));
        assert_eq!(
            client.auth().session().last_error(),
            Some("invalid response: missing access_token in response")
        );
    }

    #[tokio::test]
    async fn signup_returns_to_anonymous() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"message": "User created successfully"}));
        let client = client(transport);
        let mut notifications = client.subscribe();

        client.auth().signup("a@b.com", "x", "User").await.unwrap();

        assert_eq!(client.auth().session().state, SessionState::Anonymous);
        assert_eq!(
            client.transport().sent()[0].body,
            Some(json!({"email": "a@b.com", "password": "x", "name": "User"}))
        );

        let mut signed_up = false;
        while let Ok(n) = notifications.try_recv() {
            if let Notification::SignedUp { email } = n {
                assert_eq!(email, "a@b.com");
                signed_up = true;
            }
        }
        assert!(signed_up);
    }

    #[tokio::test]
    async fn signup_failure_enters_failed_then_acknowledge_resets() {
        let transport = ScriptedTransport::new();
        transport.reply_err(client_error(409, "email already registered"));
        let client = client(transport);

        client.auth().signup("a@b.com", "x", "User").await.unwrap_err();
        assert_eq!(
            client.auth().session().last_error(),
            Some("email already registered")
        );

        client.auth().acknowledge();
        assert_eq!(client.auth().session().state, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn empty_credentials_are_rejected_locally() {
        let client = client(ScriptedTransport::new());

        let err = client.auth().signup("  ", "x", "User").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));
        let err = client.auth().login("a@b.com", "").await.unwrap_err();
        assert!(matches!(err, Error::Validation(_)));

        assert!(client.transport().sent().is_empty());
        assert_eq!(client.auth().session().state, SessionState::Anonymous);
    }

    #[tokio::test]
    async fn overlapping_attempt_is_rejected() {
        let transport = ScriptedTransport::new();
        let gate = transport.gated();
        let client = client(transport);

        let (first, second) = tokio::join!(client.auth().login("a@b.com", "x"), async {
            tokio::task::yield_now().await;
            let second = client.auth().login("a@b.com", "x").await;
            gate.release(Ok(json!({"access_token": "tok"})));
            second
        });

        first.unwrap();
        assert!(matches!(second, Err(Error::ConcurrentOperation)));
        assert_eq!(client.transport().sent().len(), 1);
        assert!(client.auth().session().is_authenticated());
    }

    #[tokio::test]
    async fn signup_during_login_is_rejected() {
        let transport = ScriptedTransport::new();
        let gate = transport.gated();
        let client = client(transport);

        let (login, signup) = tokio::join!(client.auth().login("a@b.com", "x"), async {
            tokio::task::yield_now().await;
            let signup = client.auth().signup("c@d.com", "y", "Other").await;
            gate.release(Ok(json!({"access_token": "tok"})));
            signup
        });

        login.unwrap();
        assert!(matches!(signup, Err(Error::ConcurrentOperation)));
        let sent = client.transport().sent();
        assert_eq!(sent.len(), 1);
        assert_eq!(sent[0].path, "/auth/login");
        assert_eq!(client.auth().session().principal(), Some("a@b.com"));
    }

    #[tokio::test]
    async fn signup_while_authenticated_keeps_session() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"access_token": "tok123"}));
        let client = client(transport);
        client.auth().login("a@b.com", "x").await.unwrap();
        let before = client.auth().session();

        let err = client
            .auth()
            .signup("c@d.com", "y", "Other")
            .await
            .unwrap_err();

        assert!(matches!(err, Error::InvalidState(_)));
        assert_eq!(client.auth().session(), before);
        assert_eq!(
            client.auth().credential().as_ref().map(Credential::expose),
            Some("tok123")
        );
        assert_eq!(client.transport().sent().len(), 1);
    }

    #[tokio::test]
    async fn logout_discards_in_flight_login() {
        let transport = ScriptedTransport::new();
        let gate = transport.gated();
        let client = client(transport);

        let (login, ()) = tokio::join!(client.auth().login("a@b.com", "x"), async {
            tokio::task::yield_now().await;
            client.auth().logout();
            gate.release(Ok(json!({"access_token": "tok"})));
        });

        assert!(matches!(login, Err(Error::Superseded)));
        assert_eq!(client.auth().session().state, SessionState::Anonymous);
        assert!(client.auth().credential().is_none());
    }

    #[tokio::test]
    async fn logout_clears_credential() {
        let transport = ScriptedTransport::new();
        transport.reply(json!({"access_token": "tok"}));
        let client = client(transport);
        client.auth().login("a@b.com", "x").await.unwrap();
        let epoch = client.auth().session().epoch;

        client.auth().logout();

        let session = client.auth().session();
        assert_eq!(session.state, SessionState::Anonymous);
        assert!(session.epoch > epoch);
    }

    #[test]
    fn acknowledge_is_noop_outside_failed() {
        let client = client(ScriptedTransport::new());
        client.auth().acknowledge();
        assert_eq!(client.auth().session().epoch, 0);
        assert_eq!(client.auth().session().state, SessionState::Anonymous);
    }

    #[test]
    fn token_extraction() {
        assert_eq!(
            extract_token(&json!({"access_token": "t"}), "access_token")
                .unwrap()
                .expose(),
            "t"
        );
        assert!(extract_token(&json!({"access_token": ""}), "access_token").is_err());
        assert!(extract_token(&json!({"token": "t"}), "access_token").is_err());
        assert!(extract_token(&Value::Null, "access_token").is_err());
    }
}
