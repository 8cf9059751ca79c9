mod common;

use fixchain_graph::{
    edges, route, EdgeKind, GraphError, GraphProgram, NodeFailure, NodeId, Outcome, RepairGraph,
    Transition,
};

fn device_not_found() -> NodeFailure {
    NodeFailure::DeviceNotFound {
        query: "xq9000".to_string(),
    }
}

#[test]
fn success_edges_follow_pipeline_order() {
    let expected = [
        (NodeId::Normalize, NodeId::ResolveDevice),
        (NodeId::ResolveDevice, NodeId::ListGuides),
        (NodeId::ListGuides, NodeId::SelectGuide),
        (NodeId::SelectGuide, NodeId::FetchGuide),
        (NodeId::FetchGuide, NodeId::FormatResponse),
        (NodeId::FallbackSearch, NodeId::FormatResponse),
    ];
    for (from, to) in expected {
        assert_eq!(route(from, &Outcome::Advance), Transition::Goto(to), "from {from}");
    }
    assert_eq!(route(NodeId::FormatResponse, &Outcome::Advance), Transition::Finish);
}

#[test]
fn catalog_failures_route_to_fallback() {
    for from in [NodeId::ResolveDevice, NodeId::ListGuides, NodeId::FetchGuide] {
        assert_eq!(
            route(from, &Outcome::Failed(device_not_found())),
            Transition::Goto(NodeId::FallbackSearch),
            "from {from}"
        );
    }
}

#[test]
fn exhausted_fallback_aborts() {
    let failure = NodeFailure::FallbackSearchFailure {
        attempted: vec!["primary: timeout".to_string()],
    };
    assert_eq!(
        route(NodeId::FallbackSearch, &Outcome::Failed(failure.clone())),
        Transition::Abort(failure.clone())
    );
    assert!(failure.is_fatal());
    assert!(failure.user_message().is_some());
    assert!(!device_not_found().is_fatal());
    assert!(device_not_found().user_message().is_none());
}

#[test]
fn degraded_normalize_continues_on_success_edge() {
    let outcome = Outcome::Degraded(NodeFailure::NormalizationFailure("quota".to_string()));
    assert_eq!(
        route(NodeId::Normalize, &outcome),
        Transition::Goto(NodeId::ResolveDevice)
    );
}

#[test]
fn program_is_acyclic_and_starts_at_normalize() {
    let program = GraphProgram::from_router();
    let order = program.topological_order().unwrap();

    assert_eq!(order.first(), Some(&NodeId::Normalize));
    assert_eq!(order.last(), Some(&NodeId::FormatResponse));
    assert_eq!(order.len(), NodeId::ALL.len());
    assert_eq!(program.node_names().len(), 7);
    assert_eq!(program.edge_names().len(), edges().len());
}

#[test]
fn fallback_is_only_entered_through_failure_edges() {
    let program = GraphProgram::from_router();

    assert_eq!(
        program.predecessors(NodeId::FallbackSearch),
        vec![
            (NodeId::ResolveDevice, EdgeKind::Failure),
            (NodeId::ListGuides, EdgeKind::Failure),
            (NodeId::FetchGuide, EdgeKind::Failure),
        ]
    );
    assert_eq!(
        program.successors(NodeId::FallbackSearch),
        vec![(NodeId::FormatResponse, EdgeKind::Success)]
    );
    assert!(program.successors(NodeId::FormatResponse).is_empty());
}

#[test]
fn builder_rejects_missing_node() {
    let err = RepairGraph::builder(common::official_toolbox())
        .without_node(NodeId::SelectGuide)
        .build()
        .err()
        .unwrap();

    assert_eq!(
        err,
        GraphError::MissingNode {
            node: NodeId::SelectGuide
        }
    );
}
