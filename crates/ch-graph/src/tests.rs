//! Unit tests for ch-graph.
//!
//! All tests use hand-crafted graphs; no loader is involved.

#[cfg(test)]
mod helpers {
    use ch_core::{GeoPoint, NodeId};
    use crate::{EdgeKey, GraphRepBuilder};

    /// Three nodes in a line, middle node contracted first.
    ///
    /// ```text
    ///   a(rank 1) ──4── b(rank 0) ──6── c(rank 2)
    /// ```
    ///
    /// Contracting `b` adds shortcuts a→c and c→a of length 10.
    pub fn contracted_line() -> (GraphRepBuilder, [NodeId; 3], EdgeKey) {
        let mut b = GraphRepBuilder::new();
        let a = b.add_node(GeoPoint::new(0, 0), 10, 1);
        let m = b.add_node(GeoPoint::new(0, 10_000_000), 20, 0);
        let c = b.add_node(GeoPoint::new(0, 20_000_000), 30, 2);
        let (am, ma) = b.add_road(a, m, 4, 1.0);
        let (mc, cm) = b.add_road(m, c, 6, 2.0);
        let ac = b.add_shortcut(am, mc).unwrap();
        b.add_shortcut(cm, ma).unwrap();
        (b, [a, m, c], ac)
    }
}

// ── Builder & CSR structure ──────────────────────────────────────────────────

#[cfg(test)]
mod builder {
    use ch_core::{EdgeId, GeoPoint};
    use crate::GraphRepBuilder;

    #[test]
    fn empty_build() {
        let graph = GraphRepBuilder::new().build().unwrap();
        assert_eq!(graph.node_count(), 0);
        assert_eq!(graph.edge_count(), 0);
        assert!(graph.is_empty());
        assert!(graph.in_edges_down_first());
    }

    #[test]
    fn out_edges_are_grouped_by_source() {
        let (b, [a, m, c], _) = super::helpers::contracted_line();
        let graph = b.build().unwrap();
        assert_eq!(graph.edge_count(), 6);

        for node in [a, m, c] {
            for e in graph.out_edges(node) {
                assert_eq!(graph.source(e), node);
            }
        }
        assert_eq!(graph.out_degree(a), 2); // a→m, a→c
        assert_eq!(graph.out_degree(m), 2); // m→a, m→c
        assert_eq!(graph.out_degree(c), 2); // c→m, c→a
    }

    #[test]
    fn in_edges_grouped_and_down_first() {
        let (b, [a, m, c], _) = super::helpers::contracted_line();
        let graph = b.build().unwrap();

        for node in [a, m, c] {
            let ins = graph.in_edges(node);
            assert_eq!(ins.len(), graph.in_degree(node));
            for &e in ins {
                assert_eq!(graph.target(e), node);
            }
        }
        // Into a (rank 1): c→a (rank 2, down) before m→a (rank 0, up).
        let into_a: Vec<_> = graph.in_edges(a).iter().map(|&e| graph.source(e)).collect();
        assert_eq!(into_a, vec![c, m]);
        assert!(graph.in_edges_down_first());
    }

    #[test]
    fn shortcut_keys_remapped_to_edge_ids() {
        let (b, [a, m, c], _) = super::helpers::contracted_line();
        let graph = b.build().unwrap();

        let shortcut = graph
            .out_edges(a)
            .find(|&e| graph.target(e) == c)
            .expect("a→c shortcut");
        let (first, second) = graph.shortcut_parts(shortcut).unwrap();
        assert_eq!((graph.source(first), graph.target(first)), (a, m));
        assert_eq!((graph.source(second), graph.target(second)), (m, c));
        assert_eq!(graph.length(shortcut), 10);
        assert!(!graph.is_shortcut(first));
        // Weighted by length: (1.0 * 4 + 2.0 * 6) / 10
        assert!((graph.multiplier(shortcut) - 1.6).abs() < 1e-6);
    }

    #[test]
    fn up_edge_classification() {
        let (b, [a, m, c], _) = super::helpers::contracted_line();
        let graph = b.build().unwrap();
        let edge = |from, to| graph.out_edges(from).find(|&e| graph.target(e) == to).unwrap();

        assert!(graph.is_up_edge(edge(m, a)));
        assert!(!graph.is_up_edge(edge(a, m)));
        assert!(graph.is_up_edge(edge(a, c)));
        assert!(!graph.is_up_edge(edge(c, a)));
    }

    #[test]
    fn equal_ranks_are_up_edges() {
        let mut b = GraphRepBuilder::new();
        let x = b.add_node(GeoPoint::new(0, 0), 0, 0);
        let y = b.add_node(GeoPoint::new(0, 1), 0, 0);
        b.add_road(x, y, 1, 1.0);
        let graph = b.build().unwrap();
        assert!(graph.out_edges(x).all(|e| graph.is_up_edge(e)));
        assert!(graph.out_edges(y).all(|e| graph.is_up_edge(e)));
    }

    #[test]
    fn node_data_preserved() {
        let (b, [a, _, c], _) = super::helpers::contracted_line();
        let graph = b.build().unwrap();
        assert_eq!(graph.coordinates(c), GeoPoint::new(0, 20_000_000));
        assert_eq!(graph.elevation(a), 10);
        assert_eq!(graph.rank(c), 2);
    }

    #[test]
    fn edge_to_unknown_node_rejected() {
        let mut b = GraphRepBuilder::new();
        let x = b.add_node(GeoPoint::new(0, 0), 0, 0);
        b.add_edge(x, ch_core::NodeId(5), 1, 1.0);
        assert!(matches!(b.build(), Err(crate::GraphError::NodeOutOfRange { .. })));
    }

    #[test]
    fn shortcut_of_unknown_edge_rejected() {
        let mut b = GraphRepBuilder::new();
        let x = b.add_node(GeoPoint::new(0, 0), 0, 0);
        let y = b.add_node(GeoPoint::new(0, 1), 0, 1);
        let xy = b.add_edge(x, y, 1, 1.0);
        let err = b.add_shortcut(xy, crate::EdgeKey(9)).unwrap_err();
        assert!(matches!(err, crate::GraphError::EdgeOutOfRange { edge: EdgeId(9), .. }));
    }

    #[test]
    fn non_adjacent_shortcut_rejected() {
        let mut b = GraphRepBuilder::new();
        let x = b.add_node(GeoPoint::new(0, 0), 0, 2);
        let y = b.add_node(GeoPoint::new(0, 1), 0, 0);
        let z = b.add_node(GeoPoint::new(0, 2), 0, 1);
        let xy = b.add_edge(x, y, 1, 1.0);
        let xz = b.add_edge(x, z, 1, 1.0);
        b.add_shortcut(xy, xz).unwrap();
        assert!(matches!(b.build(), Err(crate::GraphError::BrokenShortcut { .. })));
    }

    #[test]
    fn shortcut_over_high_rank_node_rejected() {
        let mut b = GraphRepBuilder::new();
        let x = b.add_node(GeoPoint::new(0, 0), 0, 0);
        let y = b.add_node(GeoPoint::new(0, 1), 0, 5);
        let z = b.add_node(GeoPoint::new(0, 2), 0, 1);
        let xy = b.add_edge(x, y, 1, 1.0);
        let yz = b.add_edge(y, z, 1, 1.0);
        b.add_shortcut(xy, yz).unwrap();
        assert!(matches!(b.build(), Err(crate::GraphError::BrokenShortcut { .. })));
    }
}

// ── from_parts validation ─────────────────────────────────────────────────────

#[cfg(test)]
mod parts {
    use ch_core::{EdgeId, NodeId};
    use crate::{GraphError, GraphRep};

    fn valid_parts() -> crate::GraphParts {
        let (b, _, _) = super::helpers::contracted_line();
        b.build().unwrap().into_parts()
    }

    #[test]
    fn roundtrip_through_parts() {
        let graph = GraphRep::from_parts(valid_parts()).unwrap();
        assert_eq!(graph.node_count(), 3);
        assert_eq!(graph.edge_count(), 6);
        assert!(graph.in_edges_down_first());
    }

    #[test]
    fn length_mismatch() {
        let mut parts = valid_parts();
        parts.node_rank.pop();
        assert!(matches!(
            GraphRep::from_parts(parts),
            Err(GraphError::LengthMismatch { what: "node_rank", expected: 3, got: 2 })
        ));
    }

    #[test]
    fn offsets_must_close() {
        let mut parts = valid_parts();
        *parts.out_offsets.last_mut().unwrap() -= 1;
        assert!(matches!(GraphRep::from_parts(parts), Err(GraphError::BadOffsets { what: "out", .. })));
    }

    #[test]
    fn offsets_must_be_monotone() {
        let mut parts = valid_parts();
        parts.in_offsets[1] = 5;
        assert!(matches!(GraphRep::from_parts(parts), Err(GraphError::BadOffsets { what: "in", .. })));
    }

    #[test]
    fn target_out_of_range() {
        let mut parts = valid_parts();
        parts.edge_target[0] = NodeId(3);
        assert!(matches!(GraphRep::from_parts(parts), Err(GraphError::NodeOutOfRange { .. })));
    }

    #[test]
    fn duplicated_in_edge() {
        let mut parts = valid_parts();
        // Make both incoming slots of some node point at the same edge.
        let start = parts.in_offsets[0] as usize;
        parts.in_edges[start + 1] = parts.in_edges[start];
        assert!(matches!(GraphRep::from_parts(parts), Err(GraphError::InEdgeMismatch(_))));
    }

    #[test]
    fn half_set_shortcut() {
        let mut parts = valid_parts();
        let e = parts.edge_shortcut_first.iter().position(|e| e.is_valid()).unwrap();
        parts.edge_shortcut_second[e] = EdgeId::INVALID;
        assert!(matches!(GraphRep::from_parts(parts), Err(GraphError::BrokenShortcut { .. })));
    }

    #[test]
    fn shortcut_length_must_match_parts() {
        let mut parts = valid_parts();
        let e = parts.edge_shortcut_first.iter().position(|e| e.is_valid()).unwrap();
        assert_eq!(parts.edge_length[e], 10);
        parts.edge_length[e] = 1;
        match GraphRep::from_parts(parts) {
            Err(GraphError::BrokenShortcut { edge, reason }) => {
                assert_eq!(edge, EdgeId(e as u32));
                assert_eq!(reason, "length is not the sum of its parts");
            }
            other => panic!("expected BrokenShortcut, got {other:?}"),
        }
    }

    #[test]
    fn unsorted_in_edges_are_detected_not_rejected() {
        let mut parts = valid_parts();
        // Node 0 (rank 1) has a down-edge from rank 2 and an up-edge from
        // rank 0; swap them.
        let start = parts.in_offsets[0] as usize;
        parts.in_edges.swap(start, start + 1);
        let graph = GraphRep::from_parts(parts).unwrap();
        assert!(!graph.in_edges_down_first());
    }
}
