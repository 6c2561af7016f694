//! Session state and partial-update deltas.
//!
//! [`SessionState`] is the mutable record threaded through every step of one
//! session: the transcript, the success criteria for the current task, the
//! latest evaluator feedback, and the two terminal flags. Nodes never mutate
//! it directly; they return a [`StateDelta`] which the executor merges via
//! [`SessionState::apply`].
//!
//! # Invariants
//!
//! - `messages` is append-only within a step; never reordered or deleted.
//! - At most one system-role message exists per session. `apply` enforces
//!   this structurally: a delta's system message is dropped if one is
//!   already present.
//! - `criteria_met` and `user_input_needed` are written only by the
//!   evaluator node; a session is terminal iff either is true.

use serde::{Deserialize, Serialize};

use crate::message::{Message, Role};

/// Criterion used when the caller supplies none.
pub const DEFAULT_SUCCESS_CRITERIA: &str = "The answer should be clear and accurate";

/// The per-session record threaded through every node.
///
/// # Examples
///
/// ```rust
/// use agentloop::message::Message;
/// use agentloop::state::SessionState;
///
/// let mut state = SessionState::new("numeric answer");
/// state.push_message(Message::user("What is 2+2?"));
///
/// assert_eq!(state.messages.len(), 1);
/// assert!(state.feedback.is_none());
/// assert!(!state.is_terminal());
/// ```
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionState {
    /// Ordered transcript; the single source of truth for what happened.
    pub messages: Vec<Message>,
    /// When the current task is considered done. Read-only during execution.
    pub success_criteria: String,
    /// Most recent evaluator critique; overwritten each evaluation cycle.
    pub feedback: Option<String>,
    /// Set by the evaluator when the criteria are satisfied.
    pub criteria_met: bool,
    /// Set by the evaluator when the loop must stop for human input.
    pub user_input_needed: bool,
}

impl SessionState {
    /// Creates an empty session with the given success criteria.
    pub fn new(success_criteria: impl Into<String>) -> Self {
        Self {
            messages: Vec::new(),
            success_criteria: success_criteria.into(),
            feedback: None,
            criteria_met: false,
            user_input_needed: false,
        }
    }

    /// Creates a session seeded with one user message.
    pub fn new_with_user_message(
        success_criteria: impl Into<String>,
        user_text: impl Into<String>,
    ) -> Self {
        let mut state = Self::new(success_criteria);
        state.messages.push(Message::user(user_text));
        state
    }

    /// Creates a builder for constructing state with a fluent API.
    ///
    /// ```rust
    /// use agentloop::state::SessionState;
    ///
    /// let state = SessionState::builder()
    ///     .with_success_criteria("cite at least one source")
    ///     .with_user_message("Who invented the transistor?")
    ///     .build();
    /// assert_eq!(state.messages.len(), 1);
    /// ```
    pub fn builder() -> SessionStateBuilder {
        SessionStateBuilder::default()
    }

    /// A session is terminal iff the criteria were met or user input is needed.
    #[must_use]
    pub fn is_terminal(&self) -> bool {
        self.criteria_met || self.user_input_needed
    }

    /// The single system message, if one has been inserted.
    #[must_use]
    pub fn system_message(&self) -> Option<&Message> {
        self.messages.iter().find(|m| m.has_role(Role::System))
    }

    /// The most recently appended message.
    #[must_use]
    pub fn last_message(&self) -> Option<&Message> {
        self.messages.last()
    }

    /// Appends a message to the transcript.
    pub fn push_message(&mut self, message: Message) {
        self.messages.push(message);
    }

    /// Re-arms a restored session for a fresh task over the shared transcript.
    ///
    /// Overwrites the criteria when one is supplied, clears the previous
    /// evaluator feedback, and resets both terminal flags.
    pub fn begin_task(&mut self, success_criteria: Option<&str>) {
        if let Some(criteria) = success_criteria {
            self.success_criteria = criteria.to_string();
        }
        self.feedback = None;
        self.criteria_met = false;
        self.user_input_needed = false;
    }

    /// Merges a node's partial update into this state.
    ///
    /// The delta's system message is inserted at the front only when no
    /// system message exists yet; appended messages keep their order;
    /// feedback and the terminal flags are overwritten when present.
    pub fn apply(&mut self, delta: StateDelta) {
        if let Some(system) = delta.system {
            if self.system_message().is_none() {
                self.messages.insert(0, system);
            }
        }
        if let Some(messages) = delta.messages {
            self.messages.extend(messages);
        }
        if let Some(feedback) = delta.feedback {
            self.feedback = Some(feedback);
        }
        if let Some(met) = delta.criteria_met {
            self.criteria_met = met;
        }
        if let Some(needed) = delta.user_input_needed {
            self.user_input_needed = needed;
        }
    }
}

/// Partial state update returned by node execution.
///
/// All fields are optional, allowing nodes to update only the state aspects
/// they are responsible for. The executor merges deltas in node-completion
/// order via [`SessionState::apply`].
///
/// # Examples
///
/// ```rust
/// use agentloop::message::Message;
/// use agentloop::state::StateDelta;
///
/// // Simple message-only update
/// let delta = StateDelta::new().with_messages(vec![Message::assistant("Done")]);
///
/// // Evaluator verdict update
/// let delta = StateDelta::new()
///     .with_feedback("answer is numeric and correct")
///     .with_criteria_met(true)
///     .with_user_input_needed(false);
/// ```
#[derive(Clone, Debug, Default)]
pub struct StateDelta {
    /// System message to insert at the front, if none exists yet.
    pub system: Option<Message>,
    /// Messages to append to the transcript, in order.
    pub messages: Option<Vec<Message>>,
    /// New evaluator feedback, overwriting the previous critique.
    pub feedback: Option<String>,
    /// New value for the criteria-met flag.
    pub criteria_met: Option<bool>,
    /// New value for the user-input-needed flag.
    pub user_input_needed: Option<bool>,
}

impl StateDelta {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with_system(mut self, system: Message) -> Self {
        self.system = Some(system);
        self
    }

    #[must_use]
    pub fn with_messages(mut self, messages: Vec<Message>) -> Self {
        self.messages = Some(messages);
        self
    }

    #[must_use]
    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    #[must_use]
    pub fn with_criteria_met(mut self, met: bool) -> Self {
        self.criteria_met = Some(met);
        self
    }

    #[must_use]
    pub fn with_user_input_needed(mut self, needed: bool) -> Self {
        self.user_input_needed = Some(needed);
        self
    }
}

/// Builder for constructing `SessionState` with a fluent API.
///
/// Useful for tests and for restoring state shapes by hand.
#[derive(Debug, Default)]
pub struct SessionStateBuilder {
    messages: Vec<Message>,
    success_criteria: Option<String>,
    feedback: Option<String>,
}

impl SessionStateBuilder {
    pub fn with_success_criteria(mut self, criteria: impl Into<String>) -> Self {
        self.success_criteria = Some(criteria.into());
        self
    }

    pub fn with_user_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::user(content));
        self
    }

    pub fn with_assistant_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::assistant(content));
        self
    }

    pub fn with_system_message(mut self, content: impl Into<String>) -> Self {
        self.messages.push(Message::system(content));
        self
    }

    pub fn with_message(mut self, message: Message) -> Self {
        self.messages.push(message);
        self
    }

    pub fn with_feedback(mut self, feedback: impl Into<String>) -> Self {
        self.feedback = Some(feedback.into());
        self
    }

    pub fn build(self) -> SessionState {
        SessionState {
            messages: self.messages,
            success_criteria: self
                .success_criteria
                .unwrap_or_else(|| DEFAULT_SUCCESS_CRITERIA.to_string()),
            feedback: self.feedback,
            criteria_met: false,
            user_input_needed: false,
        }
    }
}
