use agentloop::graphs::{GraphBuilder, GraphConfigError, HALT};
use agentloop::state::SessionState;
use agentloop::types::NodeKind;

mod common;
use common::NoopNode;

fn always(label: &'static str) -> impl Fn(&SessionState) -> String + Send + Sync {
    move |_: &SessionState| label.to_string()
}

#[test]
fn compile_accepts_a_minimal_linear_graph() {
    let workflow = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_edge("step".into(), NodeKind::End)
        .compile()
        .expect("valid graph");
    assert_eq!(workflow.entry(), &NodeKind::from("step"));
    assert!(workflow.node(&"step".into()).is_some());
}

#[test]
fn compile_accepts_a_routed_loop() {
    let workflow = GraphBuilder::new()
        .add_node("check".into(), NoopNode)
        .add_edge(NodeKind::Start, "check".into())
        .add_router(
            "check".into(),
            always(HALT),
            [("check", NodeKind::from("check")), (HALT, NodeKind::End)],
        )
        .compile()
        .expect("valid graph");
    assert_eq!(workflow.node_kinds().count(), 1);
}

#[test]
fn compile_rejects_missing_entry_edge() {
    let err = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge("step".into(), NodeKind::End)
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::MissingEntry));
}

#[test]
fn compile_rejects_routed_entry_edge() {
    let err = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_router(NodeKind::Start, always("step"), [("step", NodeKind::from("step"))])
        .add_edge("step".into(), NodeKind::End)
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::RoutedEntry));
}

#[test]
fn compile_rejects_unregistered_entry_node() {
    let err = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "ghost".into())
        .add_edge("step".into(), NodeKind::End)
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::UnknownEntry { .. }));
}

#[test]
fn compile_rejects_edge_to_unregistered_node() {
    let err = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_edge("step".into(), "ghost".into())
        .compile()
        .unwrap_err();
    match err {
        GraphConfigError::UnknownEdgeTarget { from, to } => {
            assert_eq!(from, NodeKind::from("step"));
            assert_eq!(to, NodeKind::from("ghost"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn compile_rejects_router_label_to_unregistered_node() {
    let err = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_router(
            "step".into(),
            always(HALT),
            [("retry", NodeKind::from("ghost")), (HALT, NodeKind::End)],
        )
        .compile()
        .unwrap_err();
    match err {
        GraphConfigError::UnknownRouteTarget { from, label, to } => {
            assert_eq!(from, NodeKind::from("step"));
            assert_eq!(label, "retry");
            assert_eq!(to, NodeKind::from("ghost"));
        }
        other => panic!("unexpected error: {other}"),
    }
}

#[test]
fn compile_rejects_node_without_outgoing_edge() {
    let err = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_node("orphan".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_edge("step".into(), NodeKind::End)
        .compile()
        .unwrap_err();
    assert!(matches!(
        err,
        GraphConfigError::MissingEdge { node } if node == NodeKind::from("orphan")
    ));
}

#[test]
fn compile_rejects_edge_from_unregistered_node() {
    let err = GraphBuilder::new()
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_edge("step".into(), NodeKind::End)
        .add_edge("ghost".into(), NodeKind::End)
        .compile()
        .unwrap_err();
    assert!(matches!(err, GraphConfigError::UnknownEdgeSource { .. }));
}

#[test]
fn registering_virtual_endpoints_is_ignored() {
    // Start/End never enter the node registry, so the graph still validates.
    let workflow = GraphBuilder::new()
        .add_node(NodeKind::Start, NoopNode)
        .add_node(NodeKind::End, NoopNode)
        .add_node("step".into(), NoopNode)
        .add_edge(NodeKind::Start, "step".into())
        .add_edge("step".into(), NodeKind::End)
        .compile()
        .expect("valid graph");
    assert_eq!(workflow.node_kinds().count(), 1);
}
