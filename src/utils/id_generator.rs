//! Unique identifier generation for sessions and tool calls.

use uuid::Uuid;

/// Generator for runtime identifiers.
///
/// ```
/// use agentloop::utils::id_generator::IdGenerator;
///
/// let ids = IdGenerator::new();
/// let a = ids.generate_session_id();
/// let b = ids.generate_session_id();
/// assert_ne!(a, b);
/// ```
#[derive(Clone, Copy, Debug, Default)]
pub struct IdGenerator;

impl IdGenerator {
    #[must_use]
    pub fn new() -> Self {
        Self
    }

    /// Mints a `session-<uuid>` identifier.
    #[must_use]
    pub fn generate_session_id(&self) -> String {
        format!("session-{}", Uuid::new_v4())
    }

    /// Mints a `call-<uuid>` identifier for tool-call correlation.
    #[must_use]
    pub fn generate_call_id(&self) -> String {
        format!("call-{}", Uuid::new_v4())
    }
}
