//! Outbound request description.

use serde_json::Value;

/// HTTP method of a request.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    Post,
}

impl std::fmt::Display for Method {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Post => write!(f, "POST"),
        }
    }
}

impl From<Method> for reqwest::Method {
    fn from(method: Method) -> Self {
        match method {
            Method::Post => reqwest::Method::POST,
        }
    }
}

/// Opaque bearer credential issued by the service.
///
/// `Debug` is redacted so credentials never end up in logs.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    /// Wrap a token. Returns `None` for an empty or blank token.
    pub fn new(token: impl Into<String>) -> Option<Self> {
        let token = token.into();
        if token.trim().is_empty() {
            None
        } else {
            Some(Self(token))
        }
    }

    /// The raw token, for building the authorization header.
    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl std::fmt::Debug for Credential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "Credential(***)")
    }
}

/// A single call to the remote service.
#[derive(Debug, Clone)]
pub struct Request {
    pub method: Method,
    /// Service-relative route, starting with `/`.
    pub path: String,
    pub body: Option<Value>,
    /// Present when the route requires authentication.
    pub bearer: Option<Credential>,
}

impl Request {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            bearer: None,
        }
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::Post, path)
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: Value) -> Self {
        self.body = Some(body);
        self
    }

    /// Attach the bearer credential; marks the request as auth-required.
    pub fn bearer(mut self, credential: Credential) -> Self {
        self.bearer = Some(credential);
        self
    }

    pub fn requires_auth(&self) -> bool {
        self.bearer.is_some()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn blank_credentials_are_rejected() {
        assert!(Credential::new("").is_none());
        assert!(Credential::new("   ").is_none());
        assert_eq!(Credential::new("tok123").unwrap().expose(), "tok123");
    }

    #[test]
    fn credential_debug_is_redacted() {
        let cred = Credential::new("secret-token").unwrap();
        let shown = format!("{:?}", Request::post("/x").bearer(cred));
        assert!(!shown.contains("secret-token"));
        assert!(shown.contains("Credential(***)"));
    }

    #[test]
    fn builder_sets_fields() {
        let req = Request::post("/event/create").json(json!({"event_name": "Trip"}));
        assert_eq!(req.method, Method::Post);
        assert_eq!(req.path, "/event/create");
        assert!(!req.requires_auth());
        assert_eq!(req.body, Some(json!({"event_name": "Trip"})));
    }
}
