//! # Network Compiler
//!
//! Compiles a [`Schematic`] into a hierarchy of series and parallel nodes
//! and solves it for resistance, current and voltage.
//!
//! ## Pipeline
//!
//! 1. `topology` checks that the head sits on a closed loop.
//! 2. `resolve` builds the node hierarchy into a fresh [`NodeArena`].
//! 3. `solve` computes resistance bottom-up, then current and voltage
//!    top-down.
//!
//! [`compile`] never fails: any error stops the pipeline, and the result
//! reports `compiled = false` with whatever nodes were built so far.

pub mod arena;
mod resolve;
mod solve;
mod solved_value;
mod topology;

pub use arena::{CompiledNode, NodeArena, NodeKey, NodeKind};

use crate::{AmpereError, ComponentId, Schematic};
use resolve::Resolver;
use serde::{Deserialize, Serialize};
use solve::Solver;
use std::collections::BTreeMap;
use tracing::{info, warn};

// =============================================================================
// OUTPUT
// =============================================================================

/// Role of a node in the compiled hierarchy.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ReportKind {
    Component,
    Series,
    Parallel,
    ParallelBranch,
}

/// Solved values of one compiled node, keyed by its display key.
///
/// Non-finite values serialize as `"inf"`, `"-inf"` or `"nan"`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct NodeReport {
    pub kind: ReportKind,
    pub depth: usize,
    #[serde(with = "solved_value")]
    pub resistance: f64,
    #[serde(with = "solved_value")]
    pub voltage: f64,
    #[serde(with = "solved_value")]
    pub current: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub connected_to: Option<String>,
    #[serde(default)]
    pub from: Vec<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub branches: Vec<String>,
    #[serde(default, skip_serializing_if = "is_zero")]
    pub shorts: usize,
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}

impl From<&CompiledNode> for NodeReport {
    fn from(node: &CompiledNode) -> Self {
        let (kind, branches, shorts) = match &node.kind {
            NodeKind::Component { .. } => (ReportKind::Component, Vec::new(), 0),
            NodeKind::Series { .. } => (ReportKind::Series, Vec::new(), 0),
            NodeKind::Parallel { branches, shorts } => {
                (ReportKind::Parallel, branches.clone(), *shorts)
            }
            NodeKind::ParallelBranch { branches, shorts } => {
                (ReportKind::ParallelBranch, branches.clone(), *shorts)
            }
        };
        Self {
            kind,
            depth: node.depth,
            resistance: node.resistance,
            voltage: node.voltage,
            current: node.current,
            connected_to: node.connected_to.as_ref().map(ToString::to_string),
            from: node.from.iter().map(ToString::to_string).collect(),
            branches: branches.iter().map(ToString::to_string).collect(),
            shorts,
        }
    }
}

/// Result of compiling a schematic.
///
/// `resistance`, `voltage` and `current` describe the network as seen from
/// the head. Non-finite values serialize as `"inf"`, `"-inf"` or `"nan"`
/// and read back unchanged.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CompiledNetwork {
    pub compiled: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(default)]
    pub head: Option<ComponentId>,
    #[serde(default)]
    pub root: Option<String>,
    #[serde(default, with = "solved_value")]
    pub resistance: f64,
    #[serde(default, with = "solved_value")]
    pub voltage: f64,
    #[serde(default, with = "solved_value")]
    pub current: f64,
    #[serde(default)]
    pub components: BTreeMap<String, NodeReport>,
}

impl CompiledNetwork {
    /// Report of the node with the given display key.
    #[must_use]
    pub fn node(&self, key: &str) -> Option<&NodeReport> {
        self.components.get(key)
    }

    /// Reports of leaf component nodes only.
    pub fn leaves(&self) -> impl Iterator<Item = (&String, &NodeReport)> {
        self.components
            .iter()
            .filter(|(_, report)| report.kind == ReportKind::Component)
    }
}

// =============================================================================
// FACADE
// =============================================================================

/// Compile and solve a schematic.
///
/// Builds a fresh arena per call; two compiles of the same schematic give
/// identical results.
pub fn compile(schematic: &Schematic) -> CompiledNetwork {
    let Some(head) = schematic.head() else {
        return CompiledNetwork {
            error: Some(AmpereError::NoHead.to_string()),
            ..CompiledNetwork::default()
        };
    };

    let mut network = CompiledNetwork {
        head: Some(head.clone()),
        ..CompiledNetwork::default()
    };
    let mut arena = NodeArena::new();

    match run(schematic, head, &mut arena, &mut network) {
        Ok(()) => {
            network.compiled = true;
            info!(
                head = %head,
                nodes = arena.len(),
                resistance = network.resistance,
                current = network.current,
                "network compiled"
            );
        }
        Err(e) => {
            warn!(head = %head, error = %e, "network failed to compile");
            network.error = Some(e.to_string());
        }
    }

    network.components = arena
        .iter()
        .map(|node| (node.key.to_string(), NodeReport::from(node)))
        .collect();
    network
}

fn run(
    schematic: &Schematic,
    head: &ComponentId,
    arena: &mut NodeArena,
    network: &mut CompiledNetwork,
) -> Result<(), AmpereError> {
    let reachable = topology::check(schematic, head)?;

    let root = {
        let mut resolver = Resolver::new(schematic, head, &reachable, arena);
        let root = resolver.series(head, &[], 0)?;
        resolver.verify_junctions()?;
        root
    };
    network.root = Some(root.to_string());

    let mut solver = Solver::new(arena);
    network.resistance = solver.resistance(&root)?;
    network.voltage = schematic
        .component(head)
        .and_then(|c| c.kind.supplied_voltage())
        .unwrap_or(0.0);
    network.current = network.voltage / network.resistance;

    solver.propagate_current(&root, network.current)?;
    solver.propagate_voltage()?;
    solver.ensure_solved()
}

// =============================================================================
// TESTS
// =============================================================================
