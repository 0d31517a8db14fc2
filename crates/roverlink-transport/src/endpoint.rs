//! Where to connect, and what to do when the target is a secure endpoint.
//!
//! The rover backend only serves plain `ws://`. A console loaded over HTTPS
//! would produce a `wss://` (port 443) target that can never succeed, so the
//! handling of that case is an explicit policy instead of a silent skip.

use std::fmt;

use url::Url;

use crate::TransportError;

/// Path the backend serves the rover socket on.
pub const DEFAULT_PATH: &str = "/rover";

/// What to do when the endpoint is secure (`wss` or port 443).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum SecureEndpointPolicy {
    /// Fail the connect with [`TransportError::Unsupported`].
    #[default]
    Reject,
    /// Skip the connection: connect succeeds with a permanently closed
    /// handle and an empty event stream.
    SkipConnection,
}

/// The outcome of resolving an [`Endpoint`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Target {
    /// Connect to this URL.
    Url(String),
    /// Do not connect at all.
    Skip,
}

/// A backend address.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Endpoint {
    host: String,
    port: u16,
    path: String,
    query: Option<String>,
    userinfo: Option<String>,
    secure: bool,
    policy: SecureEndpointPolicy,
}

impl Endpoint {
    /// Creates a plain endpoint on [`DEFAULT_PATH`].
    pub fn new(host: impl Into<String>, port: u16) -> Self {
        Self {
            host: host.into(),
            port,
            path: DEFAULT_PATH.to_string(),
            query: None,
            userinfo: None,
            secure: false,
            policy: SecureEndpointPolicy::default(),
        }
    }

    /// Parses a `ws://host:port/path` or `wss://...` URL.
    ///
    /// The port defaults to 80 (`ws`) or 443 (`wss`), the path to `/`.
    /// Userinfo and the query string are kept for the dial URL.
    pub fn parse(url: &str) -> Result<Self, TransportError> {
        let parsed = Url::parse(url).map_err(|err| {
            TransportError::InvalidEndpoint(format!("invalid url {url:?}: {err}"))
        })?;

        let secure = match parsed.scheme() {
            "ws" => false,
            "wss" => true,
            other => {
                return Err(TransportError::InvalidEndpoint(format!(
                    "unsupported scheme {other:?} in {url:?}"
                )));
            }
        };

        let host = parsed
            .host_str()
            .filter(|host| !host.is_empty())
            .ok_or_else(|| TransportError::InvalidEndpoint(format!("missing host in {url:?}")))?;
        let port = parsed
            .port_or_known_default()
            .ok_or_else(|| TransportError::InvalidEndpoint(format!("missing port in {url:?}")))?;

        let userinfo = match (parsed.username(), parsed.password()) {
            ("", None) => None,
            (user, None) => Some(user.to_string()),
            (user, Some(password)) => Some(format!("{user}:{password}")),
        };

        Ok(Self {
            host: host.to_string(),
            port,
            path: parsed.path().to_string(),
            query: parsed.query().map(str::to_string),
            userinfo,
            secure,
            policy: SecureEndpointPolicy::default(),
        })
    }

    /// Sets the socket path.
    pub fn with_path(mut self, path: impl Into<String>) -> Self {
        self.path = path.into();
        self
    }

    /// Marks the endpoint as secure (`wss`).
    pub fn with_secure(mut self, secure: bool) -> Self {
        self.secure = secure;
        self
    }

    /// Sets the secure endpoint policy.
    pub fn with_policy(mut self, policy: SecureEndpointPolicy) -> Self {
        self.policy = policy;
        self
    }

    /// Returns the host name. IPv6 literals keep their brackets.
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Returns the port.
    pub fn port(&self) -> u16 {
        self.port
    }

    /// Returns `true` for `wss` endpoints and anything on port 443.
    pub fn is_secure(&self) -> bool {
        self.secure || self.port == 443
    }

    /// Applies the secure endpoint policy and builds the URL to dial.
    ///
    /// # Errors
    /// - [`TransportError::InvalidEndpoint`] for an empty host.
    /// - [`TransportError::Unsupported`] for a secure endpoint under
    ///   [`SecureEndpointPolicy::Reject`].
    pub fn target(&self) -> Result<Target, TransportError> {
        if self.host.is_empty() {
            return Err(TransportError::InvalidEndpoint(
                "missing host".into(),
            ));
        }
        if self.is_secure() {
            return match self.policy {
                SecureEndpointPolicy::Reject => Err(
                    TransportError::Unsupported(format!(
                        "{self} is secure; the rover backend only serves ws://"
                    )),
                ),
                SecureEndpointPolicy::SkipConnection => Ok(Target::Skip),
            };
        }
        Ok(Target::Url(self.to_string()))
    }
}

impl fmt::Display for Endpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let scheme = if self.secure { "wss" } else { "ws" };
        let slash = if self.path.starts_with('/') { "" } else { "/" };
        write!(f, "{scheme}://")?;
        if let Some(userinfo) = &self.userinfo {
            write!(f, "{userinfo}@")?;
        }
        write!(f, "{}:{}{slash}{}", self.host, self.port, self.path)?;
        if let Some(query) = &self.query {
            write!(f, "?{query}")?;
        }
        Ok(())
    }
}
