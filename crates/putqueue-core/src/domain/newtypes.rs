//! Domain newtypes with validation
//!
//! This module provides strongly-typed wrappers for queue entry identifiers,
//! upload destinations and credentials.

use std::fmt::{self, Display, Formatter};
use std::str::FromStr;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::errors::DomainError;

/// Environment variable through which the upload program receives credentials
pub const AUTH_ENV_VAR: &str = "CAMLI_AUTH";

/// Port assumed when the destination omits one
pub const DEFAULT_PORT: u16 = 80;

/// Port for which the destination is addressed over TLS
pub const HTTPS_PORT: u16 = 443;

// ============================================================================
// QueueEntryId
// ============================================================================

/// Identifier for a single entry in the upload queue
///
/// Entries are removed from the live queue by id, so the worker can iterate
/// a snapshot while the owner keeps appending to the real queue.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct QueueEntryId(Uuid);

impl QueueEntryId {
    /// Create a new random QueueEntryId
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Get the inner UUID value
    #[must_use]
    pub const fn as_uuid(&self) -> &Uuid {
        &self.0
    }
}

impl Default for QueueEntryId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for QueueEntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for QueueEntryId {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(s)
            .map(Self)
            .map_err(|e| DomainError::ValidationFailed(format!("Invalid entry id: {e}")))
    }
}

// ============================================================================
// HostPort
// ============================================================================

/// Upload destination parsed from a `host[:port]` string
///
/// Parsing never fails: an unusable string yields a `HostPort` whose
/// [`is_valid`](HostPort::is_valid) is `false`, so the worker can report the
/// bad destination instead of the configuration layer refusing to load.
/// Use [`FromStr`] when an error is preferred.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct HostPort {
    raw: String,
    host: String,
    port: u16,
    valid: bool,
}

impl HostPort {
    /// Parses `raw`, recording whether the result is usable
    pub fn new(raw: impl Into<String>) -> Self {
        let raw = raw.into();
        match parse_host_port(raw.trim()) {
            Some((host, port)) => Self {
                raw,
                host,
                port,
                valid: true,
            },
            None => Self {
                raw,
                host: String::new(),
                port: 0,
                valid: false,
            },
        }
    }

    /// Whether the destination can be uploaded to
    pub fn is_valid(&self) -> bool {
        self.valid
    }

    /// Host name or address (empty when invalid)
    pub fn host(&self) -> &str {
        &self.host
    }

    /// Port number (0 when invalid)
    pub fn port(&self) -> u16 {
        self.port
    }

    /// The string this destination was parsed from
    pub fn raw(&self) -> &str {
        &self.raw
    }

    /// Server URL handed to the upload program
    ///
    /// Port 443 maps to `https://host`; anything else to `http://host:port`.
    pub fn url_prefix(&self) -> String {
        if self.port == HTTPS_PORT {
            format!("https://{}", self.host)
        } else {
            format!("http://{}:{}", self.host, self.port)
        }
    }
}

impl Display for HostPort {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        if self.valid {
            write!(f, "{}:{}", self.host, self.port)
        } else {
            write!(f, "{}", self.raw)
        }
    }
}

impl FromStr for HostPort {
    type Err = DomainError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let hp = HostPort::new(s);
        if hp.is_valid() {
            Ok(hp)
        } else {
            Err(DomainError::InvalidHostPort(s.to_string()))
        }
    }
}

fn parse_host_port(s: &str) -> Option<(String, u16)> {
    if s.is_empty() {
        return None;
    }

    // Bracketed IPv6: [::1]:3179
    let (host, port) = if let Some(rest) = s.strip_prefix('[') {
        let (inner, after) = rest.split_once(']')?;
        if inner.is_empty() {
            return None;
        }
        let port = match after {
            "" => None,
            p => Some(p.strip_prefix(':')?),
        };
        (format!("[{inner}]"), port)
    } else {
        match s.split_once(':') {
            Some((h, p)) => (h.to_string(), Some(p)),
            None => (s.to_string(), None),
        }
    };

    if host.is_empty() || host.contains(|c: char| c.is_whitespace() || c == '/') {
        return None;
    }

    let port = match port {
        Some(p) => match p.parse::<u16>() {
            Ok(0) | Err(_) => return None,
            Ok(n) => n,
        },
        None => DEFAULT_PORT,
    };

    Some((host, port))
}

// ============================================================================
// Credentials
// ============================================================================

/// Username/password pair handed to the upload program
///
/// The password is redacted from `Debug` output. The pair only ever reaches
/// the child through [`AUTH_ENV_VAR`].
#[derive(Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Credentials {
    pub username: String,
    pub password: String,
}

impl Credentials {
    pub fn new(username: impl Into<String>, password: impl Into<String>) -> Self {
        Self {
            username: username.into(),
            password: password.into(),
        }
    }

    /// Value of the auth environment variable: `userpass:<user>:<password>`
    pub fn auth_env_value(&self) -> String {
        format!("userpass:{}:{}", self.username, self.password)
    }
}

impl fmt::Debug for Credentials {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.debug_struct("Credentials")
            .field("username", &self.username)
            .field("password", &"<redacted>")
            .finish()
    }
}
