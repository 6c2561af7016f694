use serde_json::json;
use std::sync::Arc;
use std::time::Duration;

use agentloop::graphs::GraphBuilder;
use agentloop::message::{Message, Role};
use agentloop::node::NodeError;
use agentloop::runtimes::{Checkpointer, Executor, ExecutorError, InMemoryCheckpointer};
use agentloop::session::build_workflow;
use agentloop::state::SessionState;
use agentloop::tools::ToolRegistry;
use agentloop::types::NodeKind;

mod common;
use common::*;

const STEP_LIMIT: usize = 24;

fn executor_with(
    chat: Arc<ScriptedChat>,
    registry: Arc<ToolRegistry>,
    step_limit: usize,
) -> Executor {
    let workflow = build_workflow(chat, registry).expect("default workflow compiles");
    Executor::new(workflow, Arc::new(InMemoryCheckpointer::new()), step_limit)
}

#[tokio::test]
async fn numeric_answer_round_trip() {
    let chat = Arc::new(ScriptedChat::new());
    chat.push_reply(Message::assistant("4"));
    chat.push_verdict("numeric and correct", true, false);

    let executor = executor_with(chat, Arc::new(ToolRegistry::new()), STEP_LIMIT);
    let turn = executor
        .run_step("sess-1", "What is 2+2?", Some("numeric answer"))
        .await
        .expect("terminal step-run");

    assert_eq!(turn.user.content, "What is 2+2?");
    assert_eq!(turn.reply.content, "4");
    assert!(turn.evaluation.content.contains("numeric and correct"));

    let checkpoint = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .expect("checkpoint written on halt");
    assert!(checkpoint.state.criteria_met);
    assert!(checkpoint.state.is_terminal());
    // worker + evaluator
    assert_eq!(checkpoint.step, 2);
}

#[tokio::test]
async fn unknown_tool_is_recoverable_in_band() {
    let chat = Arc::new(ScriptedChat::new());
    chat.push_reply(assistant_tool_call("call-1", "search", json!({"query": "X"})));
    chat.push_reply(Message::assistant("search is unavailable; answering from memory"));
    chat.push_verdict("acceptable given the tool failure", true, false);

    let executor = executor_with(chat, Arc::new(ToolRegistry::new()), STEP_LIMIT);
    let turn = executor
        .run_step("sess-1", "look this up", None)
        .await
        .expect("recovers through the worker");

    assert_eq!(
        turn.reply.content,
        "search is unavailable; answering from memory"
    );

    let checkpoint = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .unwrap();
    let tool_results: Vec<_> = checkpoint
        .state
        .messages
        .iter()
        .filter(|m| m.has_role(Role::Tool))
        .collect();
    assert_eq!(tool_results.len(), 1);
    assert!(tool_results[0].content.contains("unknown tool: search"));
    assert_eq!(tool_results[0].tool_call_id.as_deref(), Some("call-1"));
    // worker, tools, worker, evaluator
    assert_eq!(checkpoint.step, 4);
}

#[tokio::test]
async fn tool_results_preserve_request_order() {
    let chat = Arc::new(ScriptedChat::new());
    chat.push_reply(Message::assistant_with_tool_calls(
        "",
        vec![
            agentloop::message::ToolCall::new("a", "slow", json!({})),
            agentloop::message::ToolCall::new("b", "fast", json!({})),
        ],
    ));
    chat.push_reply(Message::assistant("combined both results"));
    chat.push_verdict("both tools were used", true, false);

    let registry = ToolRegistry::new()
        .with_tool(DelayedTool {
            name: "slow".into(),
            delay: Duration::from_millis(50),
            payload: json!("slow-result"),
        })
        .with_tool(DelayedTool {
            name: "fast".into(),
            delay: Duration::ZERO,
            payload: json!("fast-result"),
        });

    let executor = executor_with(chat, Arc::new(registry), STEP_LIMIT);
    executor
        .run_step("sess-1", "use both tools", None)
        .await
        .expect("terminal step-run");

    let checkpoint = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .unwrap();
    let result_ids: Vec<_> = checkpoint
        .state
        .messages
        .iter()
        .filter(|m| m.has_role(Role::Tool))
        .map(|m| m.tool_call_id.clone().unwrap())
        .collect();
    // B finishes first; results still land in request order.
    assert_eq!(result_ids, vec!["a", "b"]);
}

#[tokio::test]
async fn step_ceiling_raises_instead_of_looping() {
    let chat = Arc::new(ScriptedChat::new());
    for _ in 0..3 {
        chat.push_reply(Message::assistant("another attempt"));
        chat.push_verdict("still not good enough", false, false);
    }

    // Ceiling of 6 allows exactly three worker/evaluator cycles.
    let executor = executor_with(chat, Arc::new(ToolRegistry::new()), 6);
    let err = executor
        .run_step("sess-1", "impossible task", None)
        .await
        .unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::StepLimitExceeded { limit: 6, .. }
    ));

    // The work done up to the limit stays recoverable.
    let checkpoint = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .expect("state up to the limit is checkpointed");
    assert_eq!(checkpoint.step, 6);
    assert!(!checkpoint.state.is_terminal());
    assert_eq!(
        checkpoint.state.feedback.as_deref(),
        Some("still not good enough")
    );
}

#[tokio::test]
async fn at_most_one_system_message_across_steps() {
    let chat = Arc::new(ScriptedChat::new());
    for i in 0..3 {
        chat.push_reply(Message::assistant(format!("answer {i}")));
        chat.push_verdict("fine", true, false);
    }

    let executor = executor_with(chat, Arc::new(ToolRegistry::new()), STEP_LIMIT);
    for i in 0..3 {
        executor
            .run_step("sess-1", &format!("question {i}"), Some("be brief"))
            .await
            .expect("terminal step-run");
    }

    let checkpoint = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .unwrap();
    let system_count = checkpoint
        .state
        .messages
        .iter()
        .filter(|m| m.has_role(Role::System))
        .count();
    assert_eq!(system_count, 1);
    // 3 user + 3 replies + 3 evaluator notes + 1 system
    assert_eq!(checkpoint.state.messages.len(), 10);
}

#[tokio::test]
async fn checkpoint_resumes_across_executor_instances() {
    let script_both = |chat: &ScriptedChat| {
        chat.push_reply(Message::assistant("first answer"));
        chat.push_verdict("good", true, false);
        chat.push_reply(Message::assistant("second answer"));
        chat.push_verdict("also good", true, false);
    };

    // Continuous run: both messages through one executor.
    let continuous_chat = Arc::new(ScriptedChat::new());
    script_both(&continuous_chat);
    let continuous = executor_with(continuous_chat, Arc::new(ToolRegistry::new()), STEP_LIMIT);
    continuous.run_step("sess", "first", Some("criteria")).await.unwrap();
    continuous.run_step("sess", "second", Some("criteria")).await.unwrap();
    let expected = continuous
        .checkpointer()
        .load_latest("sess")
        .await
        .unwrap()
        .unwrap();

    // Split run: a fresh executor instance picks up the checkpoint.
    let store: Arc<dyn Checkpointer> = Arc::new(InMemoryCheckpointer::new());
    let chat_a = Arc::new(ScriptedChat::new());
    chat_a.push_reply(Message::assistant("first answer"));
    chat_a.push_verdict("good", true, false);
    let executor_a = Executor::new(
        build_workflow(chat_a, Arc::new(ToolRegistry::new())).unwrap(),
        store.clone(),
        STEP_LIMIT,
    );
    executor_a.run_step("sess", "first", Some("criteria")).await.unwrap();
    drop(executor_a);

    let chat_b = Arc::new(ScriptedChat::new());
    chat_b.push_reply(Message::assistant("second answer"));
    chat_b.push_verdict("also good", true, false);
    let executor_b = Executor::new(
        build_workflow(chat_b, Arc::new(ToolRegistry::new())).unwrap(),
        store.clone(),
        STEP_LIMIT,
    );
    let turn = executor_b.run_step("sess", "second", Some("criteria")).await.unwrap();
    assert_eq!(turn.reply.content, "second answer");

    let resumed = store.load_latest("sess").await.unwrap().unwrap();
    assert_eq!(resumed.state.messages, expected.state.messages);
    assert_eq!(resumed.step, expected.step);
}

#[tokio::test]
async fn model_failure_leaves_no_partial_checkpoint() {
    let chat = Arc::new(ScriptedChat::new());
    chat.push_failure("connection reset by provider");

    let executor = executor_with(chat, Arc::new(ToolRegistry::new()), STEP_LIMIT);
    let err = executor.run_step("sess-1", "hello", None).await.unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::Node(NodeError::Model(_))
    ));

    // The failed step-run committed nothing.
    assert!(
        executor
            .checkpointer()
            .load_latest("sess-1")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn model_failure_preserves_previous_checkpoint() {
    let chat = Arc::new(ScriptedChat::new());
    chat.push_reply(Message::assistant("answer"));
    chat.push_verdict("fine", true, false);
    chat.push_failure("provider outage");

    let executor = executor_with(chat, Arc::new(ToolRegistry::new()), STEP_LIMIT);
    executor.run_step("sess-1", "first", None).await.unwrap();
    let before = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .unwrap();

    executor.run_step("sess-1", "second", None).await.unwrap_err();
    let after = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .unwrap();
    // Retry re-enters from the pre-failure checkpoint.
    assert_eq!(after.state, before.state);
    assert_eq!(after.step, before.step);
}

#[tokio::test]
async fn malformed_verdict_is_a_hard_error() {
    let chat = Arc::new(ScriptedChat::new());
    chat.push_reply(Message::assistant("answer"));
    chat.push_raw_verdict(json!({ "feedback": "missing the flags" }));

    let executor = executor_with(chat, Arc::new(ToolRegistry::new()), STEP_LIMIT);
    let err = executor.run_step("sess-1", "hello", None).await.unwrap_err();
    assert!(matches!(err, ExecutorError::Node(NodeError::Model(_))));
    assert!(
        executor
            .checkpointer()
            .load_latest("sess-1")
            .await
            .unwrap()
            .is_none()
    );
}

#[tokio::test]
async fn unmapped_router_label_is_an_executor_error() {
    let workflow = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_router(
            "step".into(),
            |_: &SessionState| "nowhere".to_string(),
            [("END", NodeKind::End)],
        )
        .compile()
        .expect("labels the builder maps are valid");
    let executor = Executor::new(workflow, Arc::new(InMemoryCheckpointer::new()), STEP_LIMIT);

    let err = executor.run_step("sess-1", "hello", None).await.unwrap_err();
    assert!(matches!(
        err,
        ExecutorError::RouteUnmapped { label, .. } if label == "nowhere"
    ));
}

#[tokio::test]
async fn default_route_covers_unmapped_labels() {
    let workflow = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_router_with_default(
            "step".into(),
            |_: &SessionState| "nowhere".to_string(),
            [("loop", NodeKind::from("step"))],
            NodeKind::End,
        )
        .compile()
        .unwrap();
    let executor = Executor::new(workflow, Arc::new(InMemoryCheckpointer::new()), STEP_LIMIT);

    // NoopNode appends a single assistant message, so turn extraction cannot
    // find both a reply and an evaluation; the halt itself still commits.
    let result = executor.run_step("sess-1", "hello", None).await;
    assert!(matches!(
        result,
        Err(ExecutorError::IncompleteTurn { .. })
    ));
    let checkpoint = executor
        .checkpointer()
        .load_latest("sess-1")
        .await
        .unwrap()
        .expect("the default route halted and the state was checkpointed");
    assert_eq!(checkpoint.step, 1);
}

#[tokio::test]
async fn timed_out_step_is_cancelled_cleanly() {
    let chat = Arc::new(BlockingChat::new());
    let release = chat.release.clone();

    let workflow = build_workflow(chat, Arc::new(ToolRegistry::new())).unwrap();
    let executor = Executor::new(workflow, Arc::new(InMemoryCheckpointer::new()), STEP_LIMIT);

    let err = executor
        .run_step_with_timeout("sess-1", "hello", None, Duration::from_millis(50))
        .await
        .unwrap_err();
    assert!(matches!(err, ExecutorError::StepTimeout { .. }));

    // Cancellation wrote nothing.
    assert!(
        executor
            .checkpointer()
            .load_latest("sess-1")
            .await
            .unwrap()
            .is_none()
    );

    // The session claim was released with the dropped future, so a retry
    // re-enters instead of reporting the session busy.
    release.notify_one();
    let turn = executor
        .run_step("sess-1", "hello again", None)
        .await
        .expect("retry succeeds after cancellation");
    assert_eq!(turn.reply.content, "done");
}
