use std::collections::HashSet;

use proptest::prelude::*;
use workflow_core::{EventKind, NodeId, Position, Workflow};

/// Build a workflow with `nodes` nodes and the given index-pair edges,
/// skipping self-connections.
fn build(nodes: usize, edges: &[(usize, usize)]) -> (Workflow, Vec<NodeId>) {
    let mut wf = Workflow::new("prop");
    let ids: Vec<NodeId> = (0..nodes)
        .map(|i| {
            wf.add_node("Step", Position::new(i as f64, 0.0), Default::default())
                .unwrap()
        })
        .collect();
    for &(a, b) in edges {
        let (a, b) = (a % nodes, b % nodes);
        if a != b {
            wf.connect(ids[a], "out", ids[b], "in").unwrap();
        }
    }
    (wf, ids)
}

proptest! {
    #[test]
    fn node_ids_are_unique(count in 1usize..64) {
        let (wf, ids) = build(count, &[]);
        let unique: HashSet<_> = ids.iter().copied().collect();
        prop_assert_eq!(unique.len(), count);
        prop_assert_eq!(wf.node_count(), count);
    }

    #[test]
    fn remove_node_cascades_exactly_its_connections(
        nodes in 2usize..12,
        edges in proptest::collection::vec((0usize..12, 0usize..12), 0..40),
        victim in 0usize..12,
    ) {
        let (mut wf, ids) = build(nodes, &edges);
        let victim = ids[victim % nodes];
        let touching = wf
            .get_all_connections()
            .iter()
            .filter(|c| c.references(victim))
            .count();
        let before = wf.connection_count();
        wf.collect_events();

        wf.remove_node(victim).unwrap();

        prop_assert!(!wf.has_node(victim));
        prop_assert_eq!(wf.connection_count(), before - touching);
        prop_assert!(wf.get_all_connections().iter().all(|c| !c.references(victim)));
        prop_assert!(wf.get_all_connections().iter().all(|c| c.source_node != c.target_node));

        let kinds: Vec<_> = wf.collect_events().iter().map(|e| e.kind()).collect();
        let mut expected = vec![EventKind::NodeDisconnected; touching];
        expected.push(EventKind::NodeRemoved);
        prop_assert_eq!(kinds, expected);
    }

    #[test]
    fn round_trip_keeps_every_connection(
        nodes in 2usize..10,
        edges in proptest::collection::vec((0usize..10, 0usize..10), 0..30),
    ) {
        let (wf, _) = build(nodes, &edges);
        let restored = Workflow::from_dict(wf.to_dict().unwrap()).unwrap();
        prop_assert_eq!(restored.get_all_connections(), wf.get_all_connections());
        prop_assert_eq!(restored.node_count(), nodes);
        prop_assert!(!restored.has_pending_events());
    }
}
