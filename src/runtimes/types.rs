//! Runtime execution types: session ids and step counters.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::utils::id_generator::IdGenerator;

/// Monotonic step counter within a session.
pub type StepNumber = u64;

/// Opaque identifier of one session.
///
/// ```
/// use agentloop::runtimes::SessionId;
///
/// let id = SessionId::generate();
/// assert!(id.as_str().starts_with("session-"));
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct SessionId(String);

impl SessionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Mints a fresh unique session id.
    #[must_use]
    pub fn generate() -> Self {
        Self(IdGenerator::new().generate_session_id())
    }

    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for SessionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for SessionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for SessionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl AsRef<str> for SessionId {
    fn as_ref(&self) -> &str {
        &self.0
    }
}
