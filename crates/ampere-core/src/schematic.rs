//! # Schematic Store
//!
//! The editable input of the compiler: leaf components, directed
//! connections, and the designated head.
//!
//! Connections are indexed twice, forward (`from -> [Connection]`) and
//! reverse (`to -> [Connection]`). The forward index is authoritative; the
//! reverse index is rebuilt from it whenever a schematic is loaded.
//!
//! All maps are `BTreeMap` so iteration order, and therefore every compile,
//! is deterministic.

use crate::primitives::{MAX_COMPONENTS, MAX_CONNECTIONS};
use crate::{AmpereError, Component, ComponentId, ComponentUpdate, Connection, Orientation};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

/// A planar electrical network under edit.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Schematic {
    /// Component storage: ComponentId -> Component
    components: BTreeMap<ComponentId, Component>,

    /// Forward adjacency: from -> outgoing connections, in insertion order
    #[serde(default)]
    connections: BTreeMap<ComponentId, Vec<Connection>>,

    /// Reverse adjacency: to -> incoming connections
    #[serde(default)]
    reverse_connections: BTreeMap<ComponentId, Vec<Connection>>,

    /// Entry component of the network
    #[serde(default)]
    head: Option<ComponentId>,

    /// Counter behind generated `c<n>` identifiers
    #[serde(skip)]
    next_id: u64,
}

impl Schematic {
    /// Create a new empty schematic.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// The demo network: a 3 V cell feeding two 2 Ω resistors that merge
    /// into a 3 Ω resistor, in parallel with a second 3 Ω resistor.
    #[must_use]
    pub fn demo() -> Self {
        let mut schematic = Self::new();
        let parts = [
            ("cell1", Component::cell(3.0).at(5, 5).facing(Orientation::E)),
            ("resistor1", Component::resistor(2.0).at(5, 8).facing(Orientation::W)),
            ("resistor2", Component::resistor(2.0).at(5, 9).facing(Orientation::W)),
            ("resistor3", Component::resistor(3.0).at(6, 10).facing(Orientation::W)),
            ("resistor4", Component::resistor(3.0).at(7, 8).facing(Orientation::W)),
        ];
        for (id, component) in parts {
            schematic.components.insert(ComponentId::from(id), component);
        }
        let links = [
            ("cell1", "resistor1"),
            ("cell1", "resistor2"),
            ("cell1", "resistor3"),
            ("resistor1", "resistor4"),
            ("resistor2", "resistor4"),
            ("resistor3", "cell1"),
            ("resistor4", "cell1"),
        ];
        for (from, to) in links {
            schematic.push_connection(Connection::new(from.into(), to.into()));
        }
        schematic.head = Some(ComponentId::from("cell1"));
        schematic
    }

    // =========================================================================
    // SERIALIZATION
    // =========================================================================

    /// Parse a schematic from its JSON form.
    ///
    /// The forward index is validated (each list must be keyed by its
    /// connections' `from`) and the reverse index is rebuilt from it.
    /// Dangling references are kept: the compiler reports them.
    pub fn from_json(json: &str) -> Result<Self, AmpereError> {
        let mut schematic: Self = serde_json::from_str(json)
            .map_err(|e| AmpereError::DeserializationError(e.to_string()))?;

        if schematic.components.len() > MAX_COMPONENTS {
            return Err(AmpereError::LimitExceeded(format!(
                "{} components exceeds maximum {}",
                schematic.components.len(),
                MAX_COMPONENTS
            )));
        }
        if schematic.connection_count() > MAX_CONNECTIONS {
            return Err(AmpereError::LimitExceeded(format!(
                "{} connections exceeds maximum {}",
                schematic.connection_count(),
                MAX_CONNECTIONS
            )));
        }

        for component in schematic.components.values() {
            component.validate()?;
        }

        for (from, list) in &schematic.connections {
            if let Some(bad) = list.iter().find(|c| &c.from != from) {
                return Err(AmpereError::DeserializationError(format!(
                    "connection {} -> {} listed under {}",
                    bad.from, bad.to, from
                )));
            }
        }

        schematic.rebuild_reverse_index();
        Ok(schematic)
    }

    /// Serialize the schematic to pretty-printed JSON.
    pub fn to_json(&self) -> Result<String, AmpereError> {
        serde_json::to_string_pretty(self).map_err(|e| AmpereError::SerializationError(e.to_string()))
    }

    fn rebuild_reverse_index(&mut self) {
        self.reverse_connections.clear();
        for conn in self.connections.values().flatten() {
            self.reverse_connections
                .entry(conn.to.clone())
                .or_default()
                .push(conn.clone());
        }
    }

    // =========================================================================
    // COMPONENTS
    // =========================================================================

    /// Add a component under a freshly generated identifier.
    pub fn add_component(&mut self, component: Component) -> Result<ComponentId, AmpereError> {
        let id = self.fresh_id();
        self.insert_component(id.clone(), component)?;
        Ok(id)
    }

    /// Add a component under a caller-chosen identifier.
    pub fn insert_component(
        &mut self,
        id: ComponentId,
        component: Component,
    ) -> Result<(), AmpereError> {
        component.validate()?;
        if self.components.contains_key(&id) {
            return Err(AmpereError::DuplicateComponent(id));
        }
        if self.components.len() >= MAX_COMPONENTS {
            return Err(AmpereError::LimitExceeded(format!(
                "schematic already holds {} components",
                MAX_COMPONENTS
            )));
        }
        self.components.insert(id, component);
        Ok(())
    }

    /// Replace an existing component, keeping its connections.
    pub fn update_component(
        &mut self,
        id: &ComponentId,
        component: Component,
    ) -> Result<(), AmpereError> {
        component.validate()?;
        let slot = self
            .components
            .get_mut(id)
            .ok_or_else(|| AmpereError::UnknownComponent(id.clone()))?;
        *slot = component;
        Ok(())
    }

    /// Apply a field-wise edit to an existing component and return the
    /// edited component.
    pub fn edit_component(
        &mut self,
        id: &ComponentId,
        update: &ComponentUpdate,
    ) -> Result<Component, AmpereError> {
        let current = self
            .components
            .get(id)
            .ok_or_else(|| AmpereError::UnknownComponent(id.clone()))?;
        let edited = update.apply(current)?;
        self.update_component(id, edited.clone())?;
        Ok(edited)
    }

    /// Remove a component together with every connection touching it.
    ///
    /// Removing the head leaves the schematic without one.
    pub fn remove_component(&mut self, id: &ComponentId) -> Result<Component, AmpereError> {
        let removed = self
            .components
            .remove(id)
            .ok_or_else(|| AmpereError::UnknownComponent(id.clone()))?;

        self.connections.remove(id);
        self.reverse_connections.remove(id);
        for list in self.connections.values_mut() {
            list.retain(|c| &c.to != id);
        }
        for list in self.reverse_connections.values_mut() {
            list.retain(|c| &c.from != id);
        }
        self.connections.retain(|_, list| !list.is_empty());
        self.reverse_connections.retain(|_, list| !list.is_empty());

        if self.head.as_ref() == Some(id) {
            self.head = None;
        }
        Ok(removed)
    }

    /// Look up a component.
    #[must_use]
    pub fn component(&self, id: &ComponentId) -> Option<&Component> {
        self.components.get(id)
    }

    /// Check whether a component exists.
    #[must_use]
    pub fn contains(&self, id: &ComponentId) -> bool {
        self.components.contains_key(id)
    }

    /// All components in deterministic order.
    pub fn components(&self) -> impl Iterator<Item = (&ComponentId, &Component)> {
        self.components.iter()
    }

    /// Number of components.
    #[must_use]
    pub fn component_count(&self) -> usize {
        self.components.len()
    }

    fn fresh_id(&mut self) -> ComponentId {
        loop {
            self.next_id = self.next_id.saturating_add(1);
            let id = ComponentId(format!("c{}", self.next_id));
            if !self.components.contains_key(&id) {
                return id;
            }
        }
    }

    // =========================================================================
    // CONNECTIONS
    // =========================================================================

    /// Connect port 0 of `from` to port 0 of `to`.
    ///
    /// Returns `false` if the connection already existed.
    pub fn add_connection(
        &mut self,
        from: &ComponentId,
        to: &ComponentId,
    ) -> Result<bool, AmpereError> {
        self.connect(Connection::new(from.clone(), to.clone()))
    }

    /// Insert a connection with explicit port indices.
    ///
    /// Both endpoints must exist. A connection between the same two
    /// components is stored once; returns `false` for a repeat.
    pub fn connect(&mut self, connection: Connection) -> Result<bool, AmpereError> {
        for end in [&connection.from, &connection.to] {
            if !self.components.contains_key(end) {
                return Err(AmpereError::UnknownComponent(end.clone()));
            }
        }
        if self
            .outgoing(&connection.from)
            .iter()
            .any(|c| c.to == connection.to)
        {
            return Ok(false);
        }
        if self.connection_count() >= MAX_CONNECTIONS {
            return Err(AmpereError::LimitExceeded(format!(
                "schematic already holds {} connections",
                MAX_CONNECTIONS
            )));
        }
        self.push_connection(connection);
        Ok(true)
    }

    fn push_connection(&mut self, connection: Connection) {
        self.reverse_connections
            .entry(connection.to.clone())
            .or_default()
            .push(connection.clone());
        self.connections
            .entry(connection.from.clone())
            .or_default()
            .push(connection);
    }

    /// Remove the connection `from -> to`.
    ///
    /// Returns `false` if there was none.
    pub fn remove_connection(&mut self, from: &ComponentId, to: &ComponentId) -> bool {
        let mut removed = false;
        if let Some(list) = self.connections.get_mut(from) {
            let before = list.len();
            list.retain(|c| &c.to != to);
            removed = list.len() != before;
            if list.is_empty() {
                self.connections.remove(from);
            }
        }
        if let Some(list) = self.reverse_connections.get_mut(to) {
            list.retain(|c| &c.from != from);
            if list.is_empty() {
                self.reverse_connections.remove(to);
            }
        }
        removed
    }

    /// Outgoing connections of a component, in insertion order.
    #[must_use]
    pub fn outgoing(&self, id: &ComponentId) -> &[Connection] {
        self.connections.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Incoming connections of a component.
    #[must_use]
    pub fn incoming(&self, id: &ComponentId) -> &[Connection] {
        self.reverse_connections
            .get(id)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// All connections in deterministic order.
    pub fn connections(&self) -> impl Iterator<Item = &Connection> {
        self.connections.values().flatten()
    }

    /// Total number of connections.
    #[must_use]
    pub fn connection_count(&self) -> usize {
        self.connections.values().map(Vec::len).sum()
    }

    // =========================================================================
    // HEAD
    // =========================================================================

    /// Designate the entry component.
    pub fn set_head(&mut self, id: &ComponentId) -> Result<(), AmpereError> {
        if !self.components.contains_key(id) {
            return Err(AmpereError::UnknownComponent(id.clone()));
        }
        self.head = Some(id.clone());
        Ok(())
    }

    /// Remove the head designation.
    pub fn clear_head(&mut self) {
        self.head = None;
    }

    /// The entry component, if any.
    #[must_use]
    pub fn head(&self) -> Option<&ComponentId> {
        self.head.as_ref()
    }
}

// =============================================================================
// TESTS
// =============================================================================
