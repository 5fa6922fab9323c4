//! # Node Arena
//!
//! Identity-keyed store of compiled nodes for one compile invocation.
//!
//! The arena is the only owner of compiled nodes. The resolver writes it
//! while building the hierarchy; the solver then fills in the electrical
//! fields. Keys are typed, so a wrapper node can never collide with a
//! component of the same name.

use crate::primitives::{PARALLEL_BRANCH_PREFIX, PARALLEL_PREFIX, SERIES_PREFIX};
use crate::{AmpereError, ComponentId, ComponentKind};
use std::collections::BTreeMap;
use std::fmt;

// =============================================================================
// NODE KEYS
// =============================================================================

/// Identity of a compiled node.
///
/// Displayed as `<id>`, `s-<id>`, `p<depth>-<id>` or `pb<depth>-<id>`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum NodeKey {
    /// The node wrapping a single leaf component.
    Component(ComponentId),
    /// The series chain starting at a component.
    Series(ComponentId),
    /// A parallel group, keyed by nesting depth and its first branch head.
    Parallel { depth: usize, head: ComponentId },
    /// A nested parallel group that carries its own series tail.
    ParallelBranch { depth: usize, head: ComponentId },
}

impl NodeKey {
    /// The component this key was derived from.
    #[must_use]
    pub fn component(&self) -> &ComponentId {
        match self {
            Self::Component(id) | Self::Series(id) => id,
            Self::Parallel { head, .. } | Self::ParallelBranch { head, .. } => head,
        }
    }
}

impl fmt::Display for NodeKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Component(id) => write!(f, "{}", id),
            Self::Series(id) => write!(f, "{}{}", SERIES_PREFIX, id),
            Self::Parallel { depth, head } => write!(f, "{}{}-{}", PARALLEL_PREFIX, depth, head),
            Self::ParallelBranch { depth, head } => {
                write!(f, "{}{}-{}", PARALLEL_BRANCH_PREFIX, depth, head)
            }
        }
    }
}

// =============================================================================
// NODES
// =============================================================================

/// What a compiled node stands for.
#[derive(Debug, Clone, PartialEq)]
pub enum NodeKind {
    /// One leaf component; its kind is copied in so the solver never needs
    /// the schematic.
    Component { kind: ComponentKind },
    /// A chain that starts at `NodeKey::Component(head)` and follows
    /// `connected_to` links.
    Series { head: ComponentId },
    /// Diverging branches meeting again at the node's `connected_to`.
    /// `shorts` counts direct wires from the split to the merge.
    Parallel { branches: Vec<NodeKey>, shorts: usize },
    /// A parallel group nested inside another; its resistance includes the
    /// chain that starts at its own merge point.
    ParallelBranch { branches: Vec<NodeKey>, shorts: usize },
}

impl NodeKind {
    /// Branches and short count of either parallel variant.
    #[must_use]
    pub fn branches(&self) -> Option<(&[NodeKey], usize)> {
        match self {
            Self::Parallel { branches, shorts } | Self::ParallelBranch { branches, shorts } => {
                Some((branches.as_slice(), *shorts))
            }
            Self::Component { .. } | Self::Series { .. } => None,
        }
    }
}

/// A node of the compiled hierarchy.
#[derive(Debug, Clone, PartialEq)]
pub struct CompiledNode {
    pub key: NodeKey,
    pub kind: NodeKind,
    /// Nesting level. Junction components sit one level above the chain
    /// that first reached them.
    pub depth: usize,
    /// Keys this node was reached from, deduplicated, in arrival order.
    pub from: Vec<NodeKey>,
    /// The single downstream successor, if any.
    pub connected_to: Option<NodeKey>,
    pub resistance: f64,
    pub voltage: f64,
    pub current: f64,
}

impl CompiledNode {
    /// Create an unsolved node.
    #[must_use]
    pub fn new(key: NodeKey, kind: NodeKind, depth: usize, from: &[NodeKey]) -> Self {
        let mut node = Self {
            key,
            kind,
            depth,
            from: Vec::with_capacity(from.len()),
            connected_to: None,
            resistance: 0.0,
            voltage: 0.0,
            current: 0.0,
        };
        node.add_provenance(from);
        node
    }

    /// Record predecessors not seen before.
    pub fn add_provenance(&mut self, from: &[NodeKey]) {
        for key in from {
            if !self.from.contains(key) {
                self.from.push(key.clone());
            }
        }
    }
}

// =============================================================================
// ARENA
// =============================================================================

/// The per-compile store of compiled nodes.
#[derive(Debug, Default)]
pub struct NodeArena {
    nodes: BTreeMap<NodeKey, CompiledNode>,
}

impl NodeArena {
    /// Create an empty arena.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a new node. A key is created at most once.
    pub fn insert(&mut self, node: CompiledNode) -> Result<(), AmpereError> {
        if self.nodes.contains_key(&node.key) {
            return Err(AmpereError::MalformedHierarchy(format!(
                "{} registered twice",
                node.key
            )));
        }
        self.nodes.insert(node.key.clone(), node);
        Ok(())
    }

    /// Memoized lookup: if `key` exists, append `from` to its provenance and
    /// return `true`.
    pub fn revisit(&mut self, key: &NodeKey, from: &[NodeKey]) -> bool {
        match self.nodes.get_mut(key) {
            Some(node) => {
                node.add_provenance(from);
                true
            }
            None => false,
        }
    }

    /// Look up a node, failing if the hierarchy references a missing key.
    pub fn node(&self, key: &NodeKey) -> Result<&CompiledNode, AmpereError> {
        self.nodes
            .get(key)
            .ok_or_else(|| AmpereError::MalformedHierarchy(format!("{} is not compiled", key)))
    }

    /// Mutable variant of [`NodeArena::node`].
    pub fn node_mut(&mut self, key: &NodeKey) -> Result<&mut CompiledNode, AmpereError> {
        self.nodes
            .get_mut(key)
            .ok_or_else(|| AmpereError::MalformedHierarchy(format!("{} is not compiled", key)))
    }

    /// Optional lookup.
    #[must_use]
    pub fn get(&self, key: &NodeKey) -> Option<&CompiledNode> {
        self.nodes.get(key)
    }

    /// Number of compiled nodes.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Check if nothing has been compiled.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// All nodes in key order.
    pub fn iter(&self) -> impl Iterator<Item = &CompiledNode> {
        self.nodes.values()
    }
}

// =============================================================================
// TESTS
// =============================================================================
