//! # Validation Tier Tests (T0-T4)
//!
//! If ANY tier fails, the compiler is INVALID.
//!
//! ## Tiers
//! - T0: Schematic Integrity
//! - T1: Series Loops
//! - T2: Single Parallel Groups
//! - T3: Nested Groups
//! - T4: Failure Containment

use ampere_core::{
    AmpereError, Component, ComponentId, CompiledNetwork, ReportKind, Schematic, compile,
};

const TOLERANCE: f64 = 1e-6;

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < TOLERANCE
}

fn id(s: &str) -> ComponentId {
    ComponentId::from(s)
}

/// Build a schematic from `(id, component)` parts and `(from, to)` links.
/// The first part is the head.
fn schematic(parts: &[(&str, Component)], links: &[(&str, &str)]) -> Schematic {
    let mut s = Schematic::new();
    for (name, component) in parts {
        s.insert_component(id(name), component.clone())
            .expect("insert");
    }
    for (from, to) in links {
        s.add_connection(&id(from), &id(to)).expect("connect");
    }
    s.set_head(&id(parts[0].0)).expect("head");
    s
}

fn current(net: &CompiledNetwork, key: &str) -> f64 {
    net.node(key).expect("node").current
}

fn voltage(net: &CompiledNetwork, key: &str) -> f64 {
    net.node(key).expect("node").voltage
}

// =============================================================================
// TIER T0: SCHEMATIC INTEGRITY
// =============================================================================

mod t0_schematic_integrity {
    use super::*;

    /// T0.1: Connections need both endpoints.
    #[test]
    fn connection_to_missing_component_rejected() {
        let mut s = Schematic::new();
        s.insert_component(id("a"), Component::resistor(1.0))
            .expect("insert");
        let result = s.add_connection(&id("a"), &id("ghost"));
        assert!(matches!(result, Err(AmpereError::UnknownComponent(_))));
    }

    /// T0.2: Forward and reverse indices agree after edits.
    #[test]
    fn indices_agree_after_edits() {
        let mut s = Schematic::demo();
        assert!(s.remove_connection(&id("resistor1"), &id("resistor4")));
        for conn in s.connections() {
            assert!(s.incoming(&conn.to).contains(conn));
        }
        assert_eq!(s.incoming(&id("resistor4")).len(), 1);
    }

    /// T0.3: JSON round trip preserves the compiled result.
    #[test]
    fn json_round_trip_compiles_identically() {
        let s = Schematic::demo();
        let reloaded = Schematic::from_json(&s.to_json().expect("save")).expect("load");
        assert_eq!(compile(&s), compile(&reloaded));
    }

    /// T0.4: Negative resistances never enter the store.
    #[test]
    fn invalid_component_rejected() {
        let mut s = Schematic::new();
        let result = s.add_component(Component::resistor(-2.0));
        assert!(matches!(result, Err(AmpereError::InvalidComponent(_))));
        assert_eq!(s.component_count(), 0);
    }
}

// =============================================================================
// TIER T1: SERIES LOOPS
// =============================================================================

mod t1_series_loops {
    use super::*;

    /// T1.1: Resistances add along a chain.
    #[test]
    fn resistances_add() {
        let s = schematic(
            &[
                ("cell", Component::cell(9.0)),
                ("r1", Component::resistor(1.0)),
                ("r2", Component::resistor(2.0)),
            ],
            &[("cell", "r1"), ("r1", "r2"), ("r2", "cell")],
        );
        let net = compile(&s);
        assert!(net.compiled);
        assert!(close(net.resistance, 3.0));
        assert!(close(net.current, 3.0));
        assert!(close(voltage(&net, "r1"), 3.0));
        assert!(close(voltage(&net, "r2"), 6.0));
    }

    /// T1.2: The same current flows through every element of a loop.
    #[test]
    fn current_is_uniform() {
        let s = schematic(
            &[
                ("cell", Component::cell(10.0)),
                ("a", Component::resistor(2.5)),
                ("b", Component::resistor(2.5)),
                ("c", Component::resistor(5.0)),
            ],
            &[("cell", "a"), ("a", "b"), ("b", "c"), ("c", "cell")],
        );
        let net = compile(&s);
        for (_, leaf) in net.leaves() {
            assert!(close(leaf.current, 1.0));
        }
    }

    /// T1.3: The head series node is the root at depth 0.
    #[test]
    fn root_is_head_series() {
        let s = schematic(
            &[("cell", Component::cell(1.0)), ("r", Component::resistor(1.0))],
            &[("cell", "r"), ("r", "cell")],
        );
        let net = compile(&s);
        let root = net.node("s-cell").expect("root");
        assert_eq!(root.kind, ReportKind::Series);
        assert_eq!(root.depth, 0);
        assert!(root.from.is_empty());
    }
}

// =============================================================================
// TIER T2: SINGLE PARALLEL GROUPS
// =============================================================================

mod t2_parallel_groups {
    use super::*;

    fn pair(a: f64, b: f64) -> CompiledNetwork {
        compile(&schematic(
            &[
                ("cell", Component::cell(12.0)),
                ("a", Component::resistor(a)),
                ("b", Component::resistor(b)),
            ],
            &[("cell", "a"), ("cell", "b"), ("a", "cell"), ("b", "cell")],
        ))
    }

    /// T2.1: Two branches combine as R1*R2/(R1+R2).
    #[test]
    fn product_over_sum() {
        let net = pair(4.0, 12.0);
        assert!(close(net.resistance, 3.0));
        assert!(close(net.current, 4.0));
    }

    /// T2.2: Current splits inversely to resistance.
    #[test]
    fn current_divider() {
        let net = pair(4.0, 12.0);
        assert!(close(current(&net, "a"), 3.0));
        assert!(close(current(&net, "b"), 1.0));
        assert!(close(voltage(&net, "a"), voltage(&net, "b")));
    }

    /// T2.3: Group nodes list their branches in connection order.
    #[test]
    fn group_lists_branches() {
        let net = pair(1.0, 1.0);
        let group = net.node("p0-a").expect("group");
        assert_eq!(group.kind, ReportKind::Parallel);
        assert_eq!(group.branches, vec!["s-a", "s-b"]);
        assert_eq!(net.node("s-a").expect("branch").depth, 1);
    }

    /// T2.4: A bare wire across a group shorts it.
    #[test]
    fn direct_wire_shorts_group() {
        let net = compile(&schematic(
            &[
                ("cell", Component::cell(6.0)),
                ("r", Component::resistor(3.0)),
                ("load", Component::resistor(2.0)),
            ],
            &[("cell", "load"), ("cell", "r"), ("r", "load"), ("load", "cell")],
        ));
        assert!(net.compiled, "{:?}", net.error);
        assert!(close(net.resistance, 2.0));
        assert!(close(net.current, 3.0));
        assert_eq!(current(&net, "r"), 0.0);
        assert_eq!(net.node("p0-load").expect("group").shorts, 1);
    }

    /// T2.5: A dead short survives a JSON round trip.
    #[test]
    fn shorted_network_round_trips_through_json() {
        let net = compile(&schematic(
            &[
                ("cell", Component::cell(6.0)),
                ("r1", Component::resistor(5.0)),
                ("j", Component::resistor(0.0)),
            ],
            &[("cell", "j"), ("cell", "r1"), ("r1", "j"), ("j", "cell")],
        ));
        assert!(net.compiled, "{:?}", net.error);

        let json = serde_json::to_string(&net).expect("serialize");
        assert!(json.contains(r#""current":"inf""#));
        let back: CompiledNetwork = serde_json::from_str(&json).expect("deserialize");

        assert!(back.compiled);
        assert_eq!(back.resistance, 0.0);
        assert!(back.current.is_infinite());
        assert_eq!(back.components.len(), net.components.len());
        let j = back.node("j").expect("j");
        assert!(j.current.is_infinite());
        assert!(j.voltage.is_nan());
        assert_eq!(back.node("r1").expect("r1").current, 0.0);
    }
}

// =============================================================================
// TIER T3: NESTED GROUPS
// =============================================================================

mod t3_nested_groups {
    use super::*;

    fn worked() -> Schematic {
        schematic(
            &[
                ("cell", Component::cell(6.0)),
                ("r1", Component::resistor(1.0)),
                ("r2", Component::resistor(2.0)),
                ("r3", Component::resistor(3.0)),
                ("r4", Component::resistor(4.0)),
            ],
            &[
                ("cell", "r1"),
                ("cell", "r2"),
                ("cell", "r3"),
                ("r1", "r4"),
                ("r2", "r4"),
                ("r3", "cell"),
                ("r4", "cell"),
            ],
        )
    }

    /// T3.1: ((R1 || R2) + R4) || R3.
    #[test]
    fn worked_scenario() {
        let net = compile(&worked());
        assert!(net.compiled, "{:?}", net.error);
        assert!(close(net.resistance, 42.0 / 23.0));
        assert!(close(net.current, 23.0 / 7.0));
        assert!(close(current(&net, "r3"), 2.0));
        assert!(close(current(&net, "r4"), 9.0 / 7.0));
        assert!(close(current(&net, "r1"), 6.0 / 7.0));
        assert!(close(current(&net, "r2"), 3.0 / 7.0));
        assert!(close(voltage(&net, "r4"), 36.0 / 7.0));
        assert!(close(voltage(&net, "r3"), 6.0));
    }

    /// T3.2: The nested group owns its merge point.
    #[test]
    fn nested_group_owns_merge() {
        let net = compile(&worked());
        let nested = net.node("pb1-r1").expect("nested");
        assert_eq!(nested.kind, ReportKind::ParallelBranch);
        assert_eq!(nested.connected_to.as_deref(), Some("r4"));
        assert_eq!(net.node("r4").expect("r4").depth, 1);
    }

    /// T3.3: Kirchhoff's current law holds at the merge.
    #[test]
    fn merge_conserves_current() {
        let net = compile(&worked());
        let into_merge = current(&net, "r1") + current(&net, "r2");
        assert!(close(into_merge, current(&net, "r4")));
    }

    /// T3.4: Voltages around each branch add up to the source.
    #[test]
    fn branch_voltages_match_source() {
        let net = compile(&worked());
        assert!(close(voltage(&net, "r1") + voltage(&net, "r4"), 6.0));
        assert!(close(voltage(&net, "r2") + voltage(&net, "r4"), 6.0));
    }

    /// T3.5: Two nested groups sharing the outer merge point.
    #[test]
    fn inner_group_defers_to_outer_merge() {
        let net = compile(&schematic(
            &[
                ("cell", Component::cell(10.0)),
                ("a", Component::resistor(1.0)),
                ("b", Component::resistor(2.0)),
                ("c", Component::resistor(2.0)),
                ("d", Component::resistor(2.0)),
                ("j", Component::resistor(4.0)),
            ],
            &[
                ("cell", "a"),
                ("cell", "d"),
                ("a", "b"),
                ("a", "c"),
                ("b", "j"),
                ("c", "j"),
                ("d", "j"),
                ("j", "cell"),
            ],
        ));
        assert!(net.compiled, "{:?}", net.error);
        // (1 + 2||2) || 2 = 1, plus 4.
        assert!(close(net.resistance, 5.0));
        assert!(close(net.current, 2.0));
        assert!(close(current(&net, "j"), 2.0));
        assert!(close(current(&net, "a"), 1.0));
        assert!(close(current(&net, "b"), 0.5));
    }

    /// T3.6: Two parallel groups in series, the first merging where the
    /// second splits.
    #[test]
    fn groups_in_series() {
        let net = compile(&schematic(
            &[
                ("cell", Component::cell(12.0)),
                ("a", Component::resistor(2.0)),
                ("b", Component::resistor(2.0)),
                ("j", Component::resistor(1.0)),
                ("c", Component::resistor(4.0)),
                ("d", Component::resistor(4.0)),
                ("k", Component::resistor(2.0)),
            ],
            &[
                ("cell", "a"),
                ("cell", "b"),
                ("a", "j"),
                ("b", "j"),
                ("j", "c"),
                ("j", "d"),
                ("c", "k"),
                ("d", "k"),
                ("k", "cell"),
            ],
        ));
        assert!(net.compiled, "{:?}", net.error);
        // 2||2 + 1 + 4||4 + 2
        assert!(close(net.resistance, 6.0));
        assert!(close(net.current, 2.0));
        assert!(close(current(&net, "a"), 1.0));
        assert!(close(current(&net, "j"), 2.0));
        assert!(close(current(&net, "c"), 1.0));
        assert!(close(current(&net, "k"), 2.0));
        assert!(close(voltage(&net, "c"), 4.0));
        assert_eq!(
            net.node("p0-a").expect("first group").connected_to.as_deref(),
            Some("j")
        );
    }

    /// T3.7: A nested group whose post-merge tail splits again before the
    /// outer merge.
    #[test]
    fn nested_tail_with_its_own_split() {
        let net = compile(&schematic(
            &[
                ("cell", Component::cell(8.0)),
                ("p", Component::resistor(2.0)),
                ("q", Component::resistor(2.0)),
                ("m", Component::resistor(1.0)),
                ("s", Component::resistor(2.0)),
                ("t", Component::resistor(2.0)),
                ("n", Component::resistor(1.0)),
                ("r", Component::resistor(4.0)),
                ("z", Component::resistor(2.0)),
            ],
            &[
                ("cell", "p"),
                ("cell", "q"),
                ("cell", "r"),
                ("p", "m"),
                ("q", "m"),
                ("m", "s"),
                ("m", "t"),
                ("s", "n"),
                ("t", "n"),
                ("n", "z"),
                ("r", "z"),
                ("z", "cell"),
            ],
        ));
        assert!(net.compiled, "{:?}", net.error);
        // (2||2 + 1 + 2||2 + 1) || 4 + 2
        assert!(close(net.resistance, 4.0));
        assert!(close(net.current, 2.0));

        let nested = net.node("pb1-p").expect("nested");
        assert_eq!(nested.kind, ReportKind::ParallelBranch);
        assert_eq!(nested.connected_to.as_deref(), Some("m"));
        assert!(close(nested.resistance, 4.0));

        assert!(close(current(&net, "r"), 1.0));
        assert!(close(current(&net, "p"), 0.5));
        assert!(close(current(&net, "m"), 1.0));
        assert!(close(current(&net, "s"), 0.5));
        assert!(close(current(&net, "n"), 1.0));
        assert!(close(current(&net, "z"), 2.0));
        // Both outer branches drop the same voltage.
        let upper = voltage(&net, "p") + voltage(&net, "m") + voltage(&net, "s") + voltage(&net, "n");
        assert!(close(upper, voltage(&net, "r")));
    }

    /// T3.8: The demo schematic.
    #[test]
    fn demo_schematic() {
        let net = compile(&Schematic::demo());
        assert!(net.compiled);
        assert!(close(net.resistance, 12.0 / 7.0));
        assert!(close(net.current, 1.75));
    }
}

// =============================================================================
// TIER T4: FAILURE CONTAINMENT
// =============================================================================

mod t4_failure_containment {
    use super::*;

    /// T4.1: An empty schematic does not compile.
    #[test]
    fn empty_schematic() {
        let net = compile(&Schematic::new());
        assert!(!net.compiled);
        assert!(net.components.is_empty());
    }

    /// T4.2: A dead end is reported, not panicked on.
    #[test]
    fn dead_end() {
        let net = compile(&schematic(
            &[("cell", Component::cell(1.0)), ("r", Component::resistor(1.0))],
            &[("cell", "r")],
        ));
        assert!(!net.compiled);
        assert!(net.error.expect("error").contains("Open circuit"));
    }

    /// T4.3: A bridge does not reduce to series/parallel blocks.
    #[test]
    fn bridge_rejected() {
        let net = compile(&schematic(
            &[
                ("cell", Component::cell(1.0)),
                ("a", Component::resistor(1.0)),
                ("b", Component::resistor(1.0)),
                ("c", Component::resistor(1.0)),
                ("d", Component::resistor(1.0)),
            ],
            &[
                ("cell", "a"),
                ("cell", "b"),
                ("a", "c"),
                ("a", "d"),
                ("b", "d"),
                ("c", "cell"),
                ("d", "cell"),
            ],
        ));
        assert!(!net.compiled);
        assert!(!net.components.is_empty());
    }

    /// T4.4: A dangling connection loaded from JSON is reported.
    #[test]
    fn dangling_connection_from_json() {
        let json = r#"{
            "components": {
                "cell": {"name": "cell", "voltage": 1.0},
                "r": {"name": "resistor", "resistance": 1.0}
            },
            "connections": {
                "cell": [{"from": "cell", "to": "r"}],
                "r": [{"from": "r", "to": "gone"}]
            },
            "head": "cell"
        }"#;
        let s = Schematic::from_json(json).expect("load");
        let net = compile(&s);
        assert!(!net.compiled);
        assert!(net.error.expect("error").contains("gone"));
    }

    /// T4.5: A failing edit leaves the last good result reproducible.
    #[test]
    fn failure_does_not_poison_later_compiles() {
        let mut s = Schematic::demo();
        let good = compile(&s);
        assert!(s.remove_connection(&id("resistor3"), &id("cell1")));
        assert!(!compile(&s).compiled);
        s.add_connection(&id("resistor3"), &id("cell1"))
            .expect("reconnect");
        assert_eq!(compile(&s), good);
    }
}
