//! Step-run execution engine.
//!
//! The [`Executor`] drives a compiled [`Workflow`] for one session at a
//! time: it loads (or initializes) the session checkpoint, appends the new
//! user message, walks the graph from the entry node consulting the edge
//! table after every node, and persists the resulting state once a router
//! halts the loop.
//!
//! # Persistence contract
//!
//! - A checkpoint is written only after a terminal routing decision, or when
//!   the step ceiling is hit (so the work done up to the limit survives).
//! - Node failures (model transport, malformed structured output) leave the
//!   session at its last committed checkpoint; a retried step re-enters
//!   cleanly. Cancelling the `run_step` future mid-collaborator-call has the
//!   same effect: no partial write ever occurs.
//!
//! # Reentrancy
//!
//! `run_step` invocations are not reentrant per session: two overlapping
//! steps would both load the same pre-step checkpoint and the second write
//! would silently clobber the first. The executor detects this and fails
//! fast with [`ExecutorError::SessionBusy`]; distinct sessions run freely in
//! parallel.

use miette::Diagnostic;
use rustc_hash::FxHashSet;
use std::sync::{Arc, Mutex};
use thiserror::Error;
use tracing::instrument;

use crate::graphs::Edge;
use crate::message::{Message, Role};
use crate::node::{NodeContext, NodeError};
use crate::runtimes::checkpointer::{
    Checkpoint, Checkpointer, CheckpointerError, CheckpointerType, InMemoryCheckpointer,
};
use crate::runtimes::runtime_config::RuntimeConfig;
use crate::state::{DEFAULT_SUCCESS_CRITERIA, SessionState};
use crate::types::NodeKind;
use crate::workflow::Workflow;

/// The user-facing result of one step-run: the echoed user message, the
/// final worker reply, and the evaluator's note.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Turn {
    pub user: Message,
    pub reply: Message,
    pub evaluation: Message,
}

impl Turn {
    /// The `(user, reply, evaluation)` triple in transcript order, for
    /// appending to a caller-held history.
    #[must_use]
    pub fn into_messages(self) -> [Message; 3] {
        [self.user, self.reply, self.evaluation]
    }
}

/// Errors surfaced by [`Executor::run_step`].
#[derive(Debug, Error, Diagnostic)]
pub enum ExecutorError {
    /// The loop exceeded its node-execution ceiling without a terminal
    /// routing decision. State accumulated up to the limit is checkpointed.
    #[error("step limit of {limit} exceeded for session {session_id}")]
    #[diagnostic(
        code(agentloop::executor::step_limit),
        help("Raise RuntimeConfig::step_limit or tighten the success criteria.")
    )]
    StepLimitExceeded { session_id: String, limit: usize },

    /// The caller-supplied deadline elapsed before the loop halted.
    /// The in-flight step was dropped at a suspension point; no partial
    /// checkpoint was written.
    #[error("step for session {session_id} timed out after {elapsed:?}")]
    #[diagnostic(
        code(agentloop::executor::step_timeout),
        help("Retry the step; it re-enters from the last committed checkpoint.")
    )]
    StepTimeout {
        session_id: String,
        elapsed: std::time::Duration,
    },

    /// A step-run is already in flight for this session id.
    #[error("a step is already in flight for session {session_id}")]
    #[diagnostic(
        code(agentloop::executor::session_busy),
        help("Serialize run_step calls per session; distinct sessions may overlap.")
    )]
    SessionBusy { session_id: String },

    /// A router produced a label with no table entry and no default.
    #[error("router on {node} returned unmapped label {label:?} with no default")]
    #[diagnostic(code(agentloop::executor::route_unmapped))]
    RouteUnmapped { node: NodeKind, label: String },

    /// The walk reached a node or edge missing from the workflow. Compiled
    /// workflows cannot produce this; kept as a guard against registry
    /// drift.
    #[error("workflow has no node or edge for {node}")]
    #[diagnostic(code(agentloop::executor::unknown_node))]
    UnknownNode { node: NodeKind },

    /// The halted transcript lacks a message the turn extraction needs.
    #[error("step-run halted without producing a {what}")]
    #[diagnostic(code(agentloop::executor::incomplete_turn))]
    IncompleteTurn { what: &'static str },

    /// A node failed; the session remains at its last committed checkpoint.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Node(#[from] NodeError),

    /// The persistence backend failed.
    #[error(transparent)]
    #[diagnostic(transparent)]
    Checkpointer(#[from] CheckpointerError),
}

/// Drives a workflow over checkpointed sessions.
pub struct Executor {
    workflow: Arc<Workflow>,
    checkpointer: Arc<dyn Checkpointer>,
    step_limit: usize,
    in_flight: Mutex<FxHashSet<String>>,
}

impl std::fmt::Debug for Executor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Executor")
            .field("workflow", &self.workflow)
            .field("step_limit", &self.step_limit)
            .finish_non_exhaustive()
    }
}

impl Executor {
    /// Creates an executor with an explicit checkpointer.
    #[must_use]
    pub fn new(
        workflow: Workflow,
        checkpointer: Arc<dyn Checkpointer>,
        step_limit: usize,
    ) -> Self {
        Self {
            workflow: Arc::new(workflow),
            checkpointer,
            step_limit,
            in_flight: Mutex::new(FxHashSet::default()),
        }
    }

    /// Creates an executor, constructing the checkpointer the configuration
    /// asks for.
    ///
    /// If a durable backend fails to initialize, the executor falls back to
    /// in-memory checkpointing and logs the failure.
    #[must_use]
    pub async fn from_config(workflow: Workflow, config: RuntimeConfig) -> Self {
        let checkpointer = Self::create_checkpointer(&config).await;
        Self::new(workflow, checkpointer, config.step_limit)
    }

    async fn create_checkpointer(config: &RuntimeConfig) -> Arc<dyn Checkpointer> {
        match config.checkpointer.clone().unwrap_or(CheckpointerType::InMemory) {
            CheckpointerType::InMemory => Arc::new(InMemoryCheckpointer::new()),
            #[cfg(feature = "sqlite")]
            CheckpointerType::Sqlite => {
                let db_url = std::env::var("AGENTLOOP_SQLITE_URL")
                    .ok()
                    .or_else(|| {
                        config
                            .sqlite_db_name
                            .as_ref()
                            .map(|name| format!("sqlite://{name}"))
                    })
                    .unwrap_or_else(|| "sqlite://agentloop.db".to_string());
                // sqlx will not create the file itself; do it up front.
                if let Some(path) = db_url.strip_prefix("sqlite://") {
                    let path = path.trim();
                    if !path.is_empty() && !path.contains(":memory:") {
                        let p = std::path::Path::new(path);
                        if let Some(parent) = p.parent() {
                            let _ = std::fs::create_dir_all(parent);
                        }
                        if !p.exists() {
                            let _ = std::fs::File::create_new(p);
                        }
                    }
                }
                match crate::runtimes::SqliteCheckpointer::connect(&db_url).await {
                    Ok(cp) => Arc::new(cp) as Arc<dyn Checkpointer>,
                    Err(e) => {
                        tracing::error!(
                            url = %db_url,
                            error = %e,
                            "SqliteCheckpointer initialization failed; falling back to in-memory"
                        );
                        Arc::new(InMemoryCheckpointer::new())
                    }
                }
            }
        }
    }

    /// The workflow this executor drives.
    #[must_use]
    pub fn workflow(&self) -> &Workflow {
        &self.workflow
    }

    /// The checkpointer backing this executor.
    #[must_use]
    pub fn checkpointer(&self) -> &Arc<dyn Checkpointer> {
        &self.checkpointer
    }

    /// Run one step: submit a user message and drive the graph until a
    /// router halts.
    ///
    /// Loads the session checkpoint (initializing a fresh session when the
    /// id is unseen), appends the user message, walks the graph under the
    /// step ceiling, persists the final state, and returns the
    /// `(user, reply, evaluation)` triple.
    #[instrument(skip(self, user_message, success_criteria), err)]
    pub async fn run_step(
        &self,
        session_id: &str,
        user_message: &str,
        success_criteria: Option<&str>,
    ) -> Result<Turn, ExecutorError> {
        let _claim = self.claim_session(session_id)?;

        let (mut state, prior_step) = match self.checkpointer.load_latest(session_id).await? {
            Some(checkpoint) => {
                tracing::debug!(session = %session_id, step = checkpoint.step, "resumed from checkpoint");
                let mut state = checkpoint.state;
                state.begin_task(success_criteria);
                (state, checkpoint.step)
            }
            None => {
                let criteria = success_criteria.unwrap_or(DEFAULT_SUCCESS_CRITERIA);
                (SessionState::new(criteria), 0)
            }
        };

        let user = Message::user(user_message);
        state.push_message(user.clone());

        let executed = match self.drive(session_id, &mut state).await {
            Ok(executed) => executed,
            Err(err @ ExecutorError::StepLimitExceeded { .. }) => {
                // The work done so far stays recoverable.
                let checkpoint =
                    Checkpoint::new(session_id, prior_step + self.step_limit as u64, state);
                if let Err(save_err) = self.checkpointer.save(checkpoint).await {
                    tracing::warn!(
                        session = %session_id,
                        error = %save_err,
                        "failed to checkpoint state at step limit"
                    );
                }
                return Err(err);
            }
            // No partial commit: the last good checkpoint stands.
            Err(err) => return Err(err),
        };

        let checkpoint = Checkpoint::new(session_id, prior_step + executed, state.clone());
        self.checkpointer.save(checkpoint).await?;

        extract_turn(user, &state)
    }

    /// Run one step under a deadline.
    ///
    /// On timeout the in-flight step future is dropped at its current
    /// suspension point (a collaborator call); no partial checkpoint is
    /// written and the session claim is released, so a retried step resumes
    /// cleanly from the last committed state.
    pub async fn run_step_with_timeout(
        &self,
        session_id: &str,
        user_message: &str,
        success_criteria: Option<&str>,
        deadline: std::time::Duration,
    ) -> Result<Turn, ExecutorError> {
        match tokio::time::timeout(
            deadline,
            self.run_step(session_id, user_message, success_criteria),
        )
        .await
        {
            Ok(result) => result,
            Err(_) => Err(ExecutorError::StepTimeout {
                session_id: session_id.to_string(),
                elapsed: deadline,
            }),
        }
    }

    /// Drop a session's checkpoint so the id starts fresh on next use.
    pub async fn reset(&self, session_id: &str) -> Result<(), ExecutorError> {
        self.checkpointer.delete(session_id).await?;
        Ok(())
    }

    /// Walk the graph from the entry node until a terminal routing decision,
    /// returning the number of node executions.
    async fn drive(
        &self,
        session_id: &str,
        state: &mut SessionState,
    ) -> Result<u64, ExecutorError> {
        let mut current = self.workflow.entry().clone();
        let mut executed: u64 = 0;

        loop {
            if executed as usize >= self.step_limit {
                tracing::warn!(
                    session = %session_id,
                    limit = self.step_limit,
                    "step ceiling reached without terminal routing decision"
                );
                return Err(ExecutorError::StepLimitExceeded {
                    session_id: session_id.to_string(),
                    limit: self.step_limit,
                });
            }
            executed += 1;

            let node = self
                .workflow
                .node(&current)
                .ok_or_else(|| ExecutorError::UnknownNode {
                    node: current.clone(),
                })?;
            let ctx = NodeContext {
                session_id: session_id.to_string(),
                node: current.clone(),
                step: executed,
            };
            tracing::debug!(session = %session_id, node = %current, step = executed, "running node");
            let delta = node.run(state, &ctx).await?;
            state.apply(delta);

            match self.next(&current, state)? {
                None => {
                    tracing::debug!(session = %session_id, steps = executed, "terminal routing decision");
                    return Ok(executed);
                }
                Some(next) => current = next,
            }
        }
    }

    /// Resolve the next node after `current`, or `None` on halt.
    fn next(
        &self,
        current: &NodeKind,
        state: &SessionState,
    ) -> Result<Option<NodeKind>, ExecutorError> {
        let edge = self
            .workflow
            .edge(current)
            .ok_or_else(|| ExecutorError::UnknownNode {
                node: current.clone(),
            })?;
        let target = match edge {
            Edge::To(target) => target,
            Edge::Routed(router_edge) => {
                let label = router_edge.label(state);
                tracing::debug!(node = %current, label = %label, "router decision");
                router_edge
                    .resolve(&label)
                    .ok_or_else(|| ExecutorError::RouteUnmapped {
                        node: current.clone(),
                        label,
                    })?
            }
        };
        if target.is_end() {
            Ok(None)
        } else {
            Ok(Some(target.clone()))
        }
    }

    fn claim_session(&self, session_id: &str) -> Result<SessionClaim<'_>, ExecutorError> {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        if !in_flight.insert(session_id.to_string()) {
            return Err(ExecutorError::SessionBusy {
                session_id: session_id.to_string(),
            });
        }
        Ok(SessionClaim {
            in_flight: &self.in_flight,
            session_id: session_id.to_string(),
        })
    }
}

/// RAII marker for one in-flight step-run; releases the session on drop,
/// including when the step future is cancelled.
struct SessionClaim<'a> {
    in_flight: &'a Mutex<FxHashSet<String>>,
    session_id: String,
}

impl Drop for SessionClaim<'_> {
    fn drop(&mut self) {
        let mut in_flight = match self.in_flight.lock() {
            Ok(guard) => guard,
            Err(poisoned) => poisoned.into_inner(),
        };
        in_flight.remove(&self.session_id);
    }
}

/// Pick the turn messages out of the halted transcript by role tags.
///
/// The evaluator note is the last assistant-role message; the final worker
/// reply is the closest earlier assistant-role message that carries no
/// pending tool calls. Scanning by role keeps this correct even if a node
/// appends bookkeeping messages of other roles.
fn extract_turn(user: Message, state: &SessionState) -> Result<Turn, ExecutorError> {
    let mut assistants = state
        .messages
        .iter()
        .rev()
        .filter(|m| m.has_role(Role::Assistant));
    let evaluation = assistants
        .next()
        .cloned()
        .ok_or(ExecutorError::IncompleteTurn {
            what: "evaluator note",
        })?;
    let reply = assistants
        .find(|m| m.pending_tool_calls().is_empty())
        .cloned()
        .ok_or(ExecutorError::IncompleteTurn {
            what: "final worker reply",
        })?;
    Ok(Turn {
        user,
        reply,
        evaluation,
    })
}
