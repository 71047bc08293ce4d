//! Graph mutation scenarios on the workflow aggregate.


use bdd_support::{start_click_workflow, ExpectEvents};
use pretty_assertions::assert_eq;
use serde_json::json;
use workflow_core::{
    AggregateRoot, EventKind, EventPayload, NodeConnected, NodeDisconnected, NodeRemoved, Position,
    Workflow,
};

#[test]
fn scenario_a_build_start_click() {
    // Given / When
    let (mut wf, n1, n2) = start_click_workflow();

    // Then
    let events = wf.collect_events();
    events.expect_kinds(&[EventKind::NodeAdded, EventKind::NodeAdded, EventKind::NodeConnected]);
    assert_eq!(events[0].node_id(), Some(n1));
    assert_eq!(events[1].node_id(), Some(n2));
    match &events[2].payload {
        EventPayload::NodeConnected(NodeConnected {
            source_node,
            source_port,
            target_node,
            target_port,
            ..
        }) => {
            assert_eq!((*source_node, source_port.as_str()), (n1, "out"));
            assert_eq!((*target_node, target_port.as_str()), (n2, "in"));
        }
        other => panic!("unexpected payload {other:?}"),
    }
    assert!(events.iter().all(|e| e.workflow_id() == wf.id()));
}

#[test]
fn scenario_b_remove_cascades() {
    // Given
    let (mut wf, n1, n2) = start_click_workflow();

    // When
    wf.remove_node(n1).unwrap();

    // Then
    let events = wf.collect_events();
    events.expect_kinds(&[
        EventKind::NodeAdded,
        EventKind::NodeAdded,
        EventKind::NodeConnected,
        EventKind::NodeDisconnected,
        EventKind::NodeRemoved,
    ]);
    assert!(matches!(
        &events[3].payload,
        EventPayload::NodeDisconnected(NodeDisconnected { source_node, target_node, .. })
            if *source_node == n1 && *target_node == n2
    ));
    assert!(matches!(
        &events[4].payload,
        EventPayload::NodeRemoved(NodeRemoved { node_id, .. }) if *node_id == n1
    ));
    assert_eq!(wf.connection_count(), 0);
    assert!(wf.get_connections_to(n2).is_empty());
}

#[test]
fn drain_once() {
    let (mut wf, _, _) = start_click_workflow();
    assert_eq!(wf.collect_events().len(), 3);
    assert!(wf.collect_events().is_empty());
}

#[test]
fn rejected_operations_leave_no_trace() {
    let (mut wf, n1, _) = start_click_workflow();
    wf.collect_events();
    let version = wf.version();

    assert!(wf.add_node("", Position::default(), Default::default()).unwrap_err().is_validation_error());
    assert!(wf.connect(n1, "out", n1, "in").unwrap_err().is_validation_error());
    assert!(wf.remove_node(workflow_core::NodeId::new()).unwrap_err().is_not_found());
    assert!(wf.disconnect(n1, "nope", n1, "in").unwrap_err().is_not_found());

    assert!(!wf.has_pending_events());
    assert_eq!(wf.version(), version);
    assert_eq!(wf.node_count(), 2);
    assert_eq!(wf.connection_count(), 1);
}

#[test]
fn round_trip_preserves_graph_and_empties_buffer() {
    let (mut wf, n1, n2) = start_click_workflow();
    wf.set_description("demo");
    wf.update_setting("timeout", json!(30));
    wf.update_node_config(n2, "selector", json!("#submit")).unwrap();

    let restored = Workflow::from_dict(wf.to_dict().unwrap()).unwrap();

    assert!(!restored.has_pending_events());
    assert_eq!(restored.id(), wf.id());
    assert_eq!(restored.description(), "demo");
    assert_eq!(restored.settings().get("timeout"), Some(&json!(30)));
    let types: Vec<_> = restored.get_all_nodes().map(|n| n.node_type().to_string()).collect();
    assert_eq!(types, vec!["Start", "Click"]);
    assert_eq!(restored.get_all_connections(), wf.get_all_connections());
    assert_eq!(
        restored.get_node(n2).unwrap().config_value("selector"),
        Some(&json!("#submit"))
    );
    assert_eq!(restored.get_connections_from(n1).len(), 1);
}

#[test]
fn serialized_shape_matches_document_format() {
    let (wf, n1, _) = start_click_workflow();
    let data = wf.to_dict().unwrap();

    for key in ["id", "name", "description", "nodes", "connections", "settings"] {
        assert!(data.get(key).is_some(), "missing {key}");
    }
    let node = &data["nodes"][n1.to_string()];
    assert_eq!(node["node_id"], json!(n1.to_string()));
    assert_eq!(node["node_type"], json!("Start"));
    assert_eq!(node["position"], json!({ "x": 0.0, "y": 0.0 }));
    assert_eq!(data["connections"][0]["source_port"], json!("out"));
}
