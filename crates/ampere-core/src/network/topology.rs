//! Closed-loop check run before resolution.
//!
//! Only components reachable from the head are inspected; islands are
//! ignored. Every reachable component must have an outgoing connection to
//! an existing component and must be able to get back to the head.

use crate::{AmpereError, ComponentId, Schematic};
use std::collections::{BTreeSet, VecDeque};

/// Validate the loop through `head` and return the set of components that
/// take part in it.
pub(crate) fn check(
    schematic: &Schematic,
    head: &ComponentId,
) -> Result<BTreeSet<ComponentId>, AmpereError> {
    if !schematic.contains(head) {
        return Err(AmpereError::UnknownComponent(head.clone()));
    }

    // Forward pass, in connection order so the reported culprit is stable.
    let mut reachable = BTreeSet::new();
    let mut order = Vec::new();
    let mut queue = VecDeque::from([head.clone()]);
    reachable.insert(head.clone());

    while let Some(id) = queue.pop_front() {
        let outgoing = schematic.outgoing(&id);
        if outgoing.is_empty() {
            return Err(AmpereError::OpenCircuit(id));
        }
        for conn in outgoing {
            if !schematic.contains(&conn.to) {
                return Err(AmpereError::DanglingConnection {
                    from: conn.from.clone(),
                    to: conn.to.clone(),
                });
            }
            if reachable.insert(conn.to.clone()) {
                queue.push_back(conn.to.clone());
            }
        }
        order.push(id);
    }

    // Backward pass from the head over reachable components only.
    let mut returns = BTreeSet::from([head.clone()]);
    let mut queue = VecDeque::from([head.clone()]);
    while let Some(id) = queue.pop_front() {
        for conn in schematic.incoming(&id) {
            if reachable.contains(&conn.from) && returns.insert(conn.from.clone()) {
                queue.push_back(conn.from.clone());
            }
        }
    }

    if let Some(stuck) = order.into_iter().find(|id| !returns.contains(id)) {
        return Err(AmpereError::UnclosedLoop(stuck));
    }

    Ok(reachable)
}
