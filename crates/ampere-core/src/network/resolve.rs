//! # Hierarchy Resolver
//!
//! Turns the connection graph into a tree of series and parallel nodes.
//!
//! Resolution starts from a series node on the head and follows outgoing
//! connections:
//! - a component with one successor continues its chain
//! - a component with several successors opens a parallel group whose
//!   branches are walked until they meet again
//! - a junction (a non-head component with several incoming connections)
//!   ends the chain that reached it; the parallel group that merges there
//!   owns it
//!
//! Every node is registered in the arena before its children are resolved,
//! so a cyclic reference finds the node instead of recursing. Chains are
//! walked iteratively; recursion only happens per nesting level.

use super::arena::{CompiledNode, NodeArena, NodeKey, NodeKind};
use crate::{AmpereError, ComponentId, Schematic};
use std::collections::{BTreeMap, BTreeSet};
use tracing::debug;

/// Builds the compiled hierarchy for one schematic into an arena.
pub(crate) struct Resolver<'a> {
    schematic: &'a Schematic,
    head: &'a ComponentId,
    reachable: &'a BTreeSet<ComponentId>,
    arena: &'a mut NodeArena,
    /// Merge points owned by the parallel groups currently being resolved,
    /// outermost first. The head closes the whole loop.
    merges: Vec<ComponentId>,
}

impl<'a> Resolver<'a> {
    /// Create a resolver. `reachable` is the loop returned by the topology
    /// check; connections from anything outside it are ignored.
    pub(crate) fn new(
        schematic: &'a Schematic,
        head: &'a ComponentId,
        reachable: &'a BTreeSet<ComponentId>,
        arena: &'a mut NodeArena,
    ) -> Self {
        Self {
            schematic,
            head,
            reachable,
            arena,
            merges: vec![head.clone()],
        }
    }

    // =========================================================================
    // SERIES
    // =========================================================================

    /// Resolve the series node wrapping `id`.
    pub(crate) fn series(
        &mut self,
        id: &ComponentId,
        from: &[NodeKey],
        depth: usize,
    ) -> Result<NodeKey, AmpereError> {
        let key = NodeKey::Series(id.clone());
        if self.arena.revisit(&key, from) {
            return Ok(key);
        }
        self.arena.insert(CompiledNode::new(
            key.clone(),
            NodeKind::Series { head: id.clone() },
            depth,
            from,
        ))?;
        debug!(node = %key, depth, "series node");

        let provenance = [key.clone()];
        let component = self.component(id, &provenance, depth)?;

        // Visit the continuation again so it records the series node among
        // its predecessors. Everything here is already registered.
        let component_depth = self.arena.node(&component)?.depth;
        let targets = self.targets(id);
        match targets.as_slice() {
            [] => {}
            [next] => {
                self.arena
                    .revisit(&NodeKey::Component(next.clone()), &provenance);
            }
            _ => {
                self.parallel(&targets, &provenance, component_depth, false)?;
            }
        }
        Ok(key)
    }

    // =========================================================================
    // COMPONENTS
    // =========================================================================

    /// Resolve the component node for `id` and the chain that follows it.
    fn component(
        &mut self,
        id: &ComponentId,
        from: &[NodeKey],
        depth: usize,
    ) -> Result<NodeKey, AmpereError> {
        let first = NodeKey::Component(id.clone());
        if self.arena.revisit(&first, from) {
            return Ok(first);
        }

        let mut current = id.clone();
        let mut provenance = from.to_vec();
        let mut depth = depth;

        loop {
            let leaf = self
                .schematic
                .component(&current)
                .ok_or_else(|| AmpereError::UnknownComponent(current.clone()))?;
            if self.is_junction(&current) {
                depth = depth.saturating_sub(1);
            }
            let key = NodeKey::Component(current.clone());
            self.arena.insert(CompiledNode::new(
                key.clone(),
                NodeKind::Component { kind: leaf.kind },
                depth,
                &provenance,
            ))?;
            debug!(node = %key, depth, "component node");

            let targets = self.targets(&current);
            match targets.as_slice() {
                [] => break,
                [next] => {
                    let next_key = NodeKey::Component(next.clone());
                    if self.links_to(next) {
                        self.arena.node_mut(&key)?.connected_to = Some(next_key.clone());
                    }
                    if self.arena.revisit(&next_key, std::slice::from_ref(&key)) {
                        break;
                    }
                    provenance = vec![key];
                    current = next.clone();
                }
                _ => {
                    let group = self.parallel(&targets, std::slice::from_ref(&key), depth, false)?;
                    self.arena.node_mut(&key)?.connected_to = Some(group);
                    break;
                }
            }
        }

        Ok(first)
    }

    // =========================================================================
    // PARALLEL GROUPS
    // =========================================================================

    /// Resolve the parallel group whose branches start at `heads`.
    ///
    /// `nested` groups are branches of an enclosing group and carry the
    /// series tail after their own merge point.
    fn parallel(
        &mut self,
        heads: &[ComponentId],
        from: &[NodeKey],
        depth: usize,
        nested: bool,
    ) -> Result<NodeKey, AmpereError> {
        let Some(first) = heads.first() else {
            return Err(AmpereError::MalformedHierarchy(
                "parallel group without branches".to_string(),
            ));
        };
        let key = if nested {
            NodeKey::ParallelBranch {
                depth,
                head: first.clone(),
            }
        } else {
            NodeKey::Parallel {
                depth,
                head: first.clone(),
            }
        };
        if self.arena.revisit(&key, from) {
            return Ok(key);
        }
        let placeholder = if nested {
            NodeKind::ParallelBranch {
                branches: Vec::new(),
                shorts: 0,
            }
        } else {
            NodeKind::Parallel {
                branches: Vec::new(),
                shorts: 0,
            }
        };
        self.arena
            .insert(CompiledNode::new(key.clone(), placeholder, depth, from))?;

        let mut walks = heads
            .iter()
            .map(|h| self.walk(h))
            .collect::<Result<Vec<_>, _>>()?;
        let merge =
            reconvergence(&walks).ok_or_else(|| AmpereError::NoReconvergence(first.clone()))?;
        for walk in &mut walks {
            if let Some(pos) = walk.iter().position(|id| id == &merge) {
                walk.truncate(pos);
            }
        }
        debug!(node = %key, merge = %merge, branches = heads.len(), "parallel group");

        let owned_elsewhere = self.merges.contains(&merge);
        self.merges.push(merge.clone());
        let built = self.branches(&key, heads, &walks, depth);
        self.merges.pop();
        let (branches, shorts) = built?;

        let connected_to = if owned_elsewhere {
            None
        } else {
            let provenance = [key.clone()];
            Some(self.component(&merge, &provenance, depth)?)
        };

        let node = self.arena.node_mut(&key)?;
        node.kind = if nested {
            NodeKind::ParallelBranch { branches, shorts }
        } else {
            NodeKind::Parallel { branches, shorts }
        };
        node.connected_to = connected_to;
        Ok(key)
    }

    /// Resolve the branches of a group from their truncated walks.
    fn branches(
        &mut self,
        key: &NodeKey,
        heads: &[ComponentId],
        walks: &[Vec<ComponentId>],
        depth: usize,
    ) -> Result<(Vec<NodeKey>, usize), AmpereError> {
        let provenance = [key.clone()];
        let mut branches = Vec::new();
        let mut shorts = 0;

        for group in group_branches(walks) {
            match group.as_slice() {
                [single] => {
                    if walks[*single].is_empty() {
                        // Direct wire from the split to the merge.
                        shorts += 1;
                    } else {
                        branches.push(self.series(&heads[*single], &provenance, depth + 1)?);
                    }
                }
                _ => {
                    let nested: Vec<ComponentId> =
                        group.iter().map(|&i| heads[i].clone()).collect();
                    branches.push(self.parallel(&nested, &provenance, depth + 1, true)?);
                }
            }
        }
        Ok((branches, shorts))
    }

    /// Follow first outgoing connections from `start` until the head.
    fn walk(&self, start: &ComponentId) -> Result<Vec<ComponentId>, AmpereError> {
        let mut walk = Vec::new();
        let mut seen = BTreeSet::new();
        let mut current = start.clone();
        loop {
            if !seen.insert(current.clone()) {
                return Err(AmpereError::CyclicBranch(current));
            }
            walk.push(current.clone());
            if &current == self.head {
                return Ok(walk);
            }
            let next = self
                .schematic
                .outgoing(&current)
                .first()
                .map(|c| c.to.clone())
                .ok_or_else(|| AmpereError::OpenCircuit(current.clone()))?;
            current = next;
        }
    }

    // =========================================================================
    // GRAPH QUERIES
    // =========================================================================

    /// Distinct successors of `id`, in connection order.
    fn targets(&self, id: &ComponentId) -> Vec<ComponentId> {
        let mut targets: Vec<ComponentId> = Vec::new();
        for conn in self.schematic.outgoing(id) {
            if !targets.contains(&conn.to) {
                targets.push(conn.to.clone());
            }
        }
        targets
    }

    /// A junction is a non-head component entered from more than one
    /// component of the loop.
    fn is_junction(&self, id: &ComponentId) -> bool {
        if id == self.head {
            return false;
        }
        let sources: BTreeSet<&ComponentId> = self
            .schematic
            .incoming(id)
            .iter()
            .map(|c| &c.from)
            .filter(|from| self.reachable.contains(*from))
            .collect();
        sources.len() > 1
    }

    /// Chains link forward unless the successor closes the loop or is a
    /// junction owned by a parallel group.
    fn links_to(&self, next: &ComponentId) -> bool {
        next != self.head && !self.is_junction(next)
    }

    /// Every junction must be the merge point of some parallel group.
    /// Anything else is a bridge that does not reduce to series/parallel.
    pub(crate) fn verify_junctions(&self) -> Result<(), AmpereError> {
        let owned: BTreeSet<&NodeKey> = self
            .arena
            .iter()
            .filter(|node| node.kind.branches().is_some())
            .filter_map(|node| node.connected_to.as_ref())
            .collect();

        for node in self.arena.iter() {
            if let NodeKey::Component(id) = &node.key
                && self.is_junction(id)
                && !owned.contains(&node.key)
            {
                return Err(AmpereError::Unsolved(id.clone()));
            }
        }
        Ok(())
    }
}

// =============================================================================
// BRANCH ANALYSIS
// =============================================================================

/// First component of the first walk that every other walk also visits.
fn reconvergence(walks: &[Vec<ComponentId>]) -> Option<ComponentId> {
    let (first, rest) = walks.split_first()?;
    first
        .iter()
        .find(|id| rest.iter().all(|walk| walk.contains(id)))
        .cloned()
}

/// Partition branch indices into groups of walks that share a component.
///
/// Groups are the connected classes of the "shares a component" relation,
/// ordered by their smallest branch index. Empty walks stay singletons.
fn group_branches(walks: &[Vec<ComponentId>]) -> Vec<Vec<usize>> {
    let mut parent: Vec<usize> = (0..walks.len()).collect();
    let mut owner: BTreeMap<&ComponentId, usize> = BTreeMap::new();

    for (index, walk) in walks.iter().enumerate() {
        for id in walk {
            match owner.get(id) {
                Some(&other) => union(&mut parent, index, other),
                None => {
                    owner.insert(id, index);
                }
            }
        }
    }

    // Roots are always the smallest index of their class.
    let mut groups: BTreeMap<usize, Vec<usize>> = BTreeMap::new();
    for index in 0..walks.len() {
        let root = find(&mut parent, index);
        groups.entry(root).or_default().push(index);
    }
    groups.into_values().collect()
}

fn find(parent: &mut [usize], index: usize) -> usize {
    let mut root = index;
    while parent[root] != root {
        root = parent[root];
    }
    let mut node = index;
    while parent[node] != root {
        let next = parent[node];
        parent[node] = root;
        node = next;
    }
    root
}

fn union(parent: &mut [usize], a: usize, b: usize) {
    let ra = find(parent, a);
    let rb = find(parent, b);
    if ra != rb {
        parent[ra.max(rb)] = ra.min(rb);
    }
}

// =============================================================================
// TESTS
// =============================================================================
