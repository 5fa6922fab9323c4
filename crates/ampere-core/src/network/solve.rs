//! # Solver
//!
//! Fills resistance, current and voltage into a resolved hierarchy.
//!
//! Three passes over the arena:
//! 1. Resistance, bottom-up and memoized. Series chains add, parallel
//!    groups combine by conductance.
//! 2. Current, top-down from the root. Series nodes pass their current to
//!    every node of their chain; parallel groups divide it among branches.
//! 3. Voltage, `V = I * R` per node. A voltage source reports its supply.
//!
//! Degenerate values follow IEEE arithmetic: an open group has infinite
//! resistance, a shorted group has zero, and `x / 0` is infinite. A shorted
//! group sends its whole current through its zero-resistance paths.
//! A 0 Ω component carrying the infinite current of a shorted loop reports
//! `V = inf * 0`, which is NaN.

use super::arena::{NodeArena, NodeKey, NodeKind};
use crate::{AmpereError, ComponentKind};
use std::collections::BTreeSet;

/// Electrical solver over one arena.
pub(crate) struct Solver<'a> {
    arena: &'a mut NodeArena,
    resolved: BTreeSet<NodeKey>,
    in_progress: BTreeSet<NodeKey>,
    reached: BTreeSet<NodeKey>,
}

impl<'a> Solver<'a> {
    pub(crate) fn new(arena: &'a mut NodeArena) -> Self {
        Self {
            arena,
            resolved: BTreeSet::new(),
            in_progress: BTreeSet::new(),
            reached: BTreeSet::new(),
        }
    }

    // =========================================================================
    // RESISTANCE
    // =========================================================================

    /// Equivalent resistance of a node, computed once.
    pub(crate) fn resistance(&mut self, key: &NodeKey) -> Result<f64, AmpereError> {
        if self.resolved.contains(key) {
            return Ok(self.arena.node(key)?.resistance);
        }
        if !self.in_progress.insert(key.clone()) {
            return Err(AmpereError::MalformedHierarchy(format!(
                "{} depends on its own resistance",
                key
            )));
        }

        let node = self.arena.node(key)?;
        let kind = node.kind.clone();
        let tail = node.connected_to.clone();

        let value = match kind {
            NodeKind::Component { kind } => kind.resistance(),
            NodeKind::Series { head } => self.chain_resistance(&NodeKey::Component(head))?,
            NodeKind::Parallel { branches, shorts } => {
                self.parallel_resistance(&branches, shorts)?
            }
            NodeKind::ParallelBranch { branches, shorts } => {
                let group = self.parallel_resistance(&branches, shorts)?;
                let tail = match tail {
                    Some(next) => self.chain_resistance(&next)?,
                    None => 0.0,
                };
                group + tail
            }
        };

        self.in_progress.remove(key);
        self.resolved.insert(key.clone());
        self.arena.node_mut(key)?.resistance = value;
        Ok(value)
    }

    /// Sum of own resistances along a `connected_to` chain.
    fn chain_resistance(&mut self, start: &NodeKey) -> Result<f64, AmpereError> {
        let mut total = 0.0;
        let mut seen = BTreeSet::new();
        let mut cursor = Some(start.clone());
        while let Some(key) = cursor {
            if !seen.insert(key.clone()) {
                return Err(AmpereError::MalformedHierarchy(format!(
                    "series chain revisits {}",
                    key
                )));
            }
            total += self.resistance(&key)?;
            cursor = self.arena.node(&key)?.connected_to.clone();
        }
        Ok(total)
    }

    /// `1 / sum(1 / R)`; any short makes the conductance infinite.
    fn parallel_resistance(
        &mut self,
        branches: &[NodeKey],
        shorts: usize,
    ) -> Result<f64, AmpereError> {
        let mut conductance = if shorts > 0 { f64::INFINITY } else { 0.0 };
        for branch in branches {
            conductance += 1.0 / self.resistance(branch)?;
        }
        Ok(1.0 / conductance)
    }

    // =========================================================================
    // CURRENT
    // =========================================================================

    /// Push `current` into `start` and everything below it.
    ///
    /// Every node is reached at most once; a second arrival means the
    /// hierarchy is not a tree.
    pub(crate) fn propagate_current(
        &mut self,
        start: &NodeKey,
        current: f64,
    ) -> Result<(), AmpereError> {
        let mut cursor = Some(start.clone());
        while let Some(key) = cursor {
            if !self.reached.insert(key.clone()) {
                return Err(AmpereError::MalformedHierarchy(format!(
                    "{} reached twice",
                    key
                )));
            }
            let node = self.arena.node_mut(&key)?;
            node.current = current;
            let kind = node.kind.clone();
            cursor = node.connected_to.clone();

            match kind {
                NodeKind::Component { .. } => {}
                NodeKind::Series { head } => {
                    self.propagate_current(&NodeKey::Component(head), current)?;
                }
                NodeKind::Parallel { branches, shorts }
                | NodeKind::ParallelBranch { branches, shorts } => {
                    let shares = self.divide(current, &branches, shorts)?;
                    for (branch, share) in branches.iter().zip(shares) {
                        self.propagate_current(branch, share)?;
                    }
                }
            }
        }
        Ok(())
    }

    /// Current through each branch of a group.
    ///
    /// Branch `i` gets `I * G_i / sum(G)`, which equals
    /// `I / sum_j(R_i / R_j)` with `j` running over every branch, `i`
    /// included. Zero-resistance paths (shorts and zero branches) take the
    /// whole current in equal parts; a group with no conductance carries
    /// nothing.
    fn divide(
        &self,
        current: f64,
        branches: &[NodeKey],
        shorts: usize,
    ) -> Result<Vec<f64>, AmpereError> {
        let resistances = branches
            .iter()
            .map(|b| self.arena.node(b).map(|n| n.resistance))
            .collect::<Result<Vec<f64>, _>>()?;

        let zero_paths = shorts + resistances.iter().filter(|r| **r == 0.0).count();
        if zero_paths > 0 {
            let share = current / zero_paths as f64;
            return Ok(resistances
                .iter()
                .map(|r| if *r == 0.0 { share } else { 0.0 })
                .collect());
        }

        let conductance: f64 = resistances.iter().map(|r| 1.0 / r).sum();
        if conductance == 0.0 {
            return Ok(vec![0.0; resistances.len()]);
        }
        Ok(resistances
            .iter()
            .map(|r| current * (1.0 / r) / conductance)
            .collect())
    }

    // =========================================================================
    // VOLTAGE
    // =========================================================================

    /// Set `V = I * R` on every node reached by the current pass.
    pub(crate) fn propagate_voltage(&mut self) -> Result<(), AmpereError> {
        let reached: Vec<NodeKey> = self.reached.iter().cloned().collect();
        for key in reached {
            let node = self.arena.node_mut(&key)?;
            node.voltage = match node.kind {
                NodeKind::Component {
                    kind: ComponentKind::VoltageSource { voltage },
                } => voltage,
                _ => node.current * node.resistance,
            };
        }
        Ok(())
    }

    // =========================================================================
    // COVERAGE
    // =========================================================================

    /// Fail if some component node never received a current.
    pub(crate) fn ensure_solved(&self) -> Result<(), AmpereError> {
        for node in self.arena.iter() {
            if let NodeKey::Component(id) = &node.key
                && !self.reached.contains(&node.key)
            {
                return Err(AmpereError::Unsolved(id.clone()));
            }
        }
        Ok(())
    }
}

// =============================================================================
// TESTS
// =============================================================================
