//! # Core Type Definitions
//!
//! This module contains the leaf-level types shared by the schematic store
//! and the network compiler:
//! - Component identifiers (`ComponentId`)
//! - Leaf components (`Component`, `ComponentKind`, `Orientation`, `Position`)
//! - Field-wise component edits (`ComponentUpdate`)
//! - Directed connections (`Connection`)
//! - Error types (`AmpereError`)
//!
//! ## Determinism Guarantees
//!
//! Identifiers implement `Ord` so every map in the crate can be a `BTreeMap`
//! and every traversal visits components in a stable order.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

// =============================================================================
// IDENTIFIERS
// =============================================================================

/// Identifier of a leaf component in a schematic.
///
/// Identifiers are opaque strings. Schematics loaded from JSON keep the ids
/// they were saved with; components added at runtime get `c<n>` ids.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentId(pub String);

impl ComponentId {
    /// Create a new identifier from a string.
    #[must_use]
    pub fn new(s: impl Into<String>) -> Self {
        Self(s.into())
    }

    /// Get the identifier as a string slice.
    #[must_use]
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for ComponentId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for ComponentId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for ComponentId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// =============================================================================
// LEAF COMPONENTS
// =============================================================================

/// Electrical behaviour of a leaf component.
///
/// Serialized with a `name` tag so schematic files read
/// `{"name": "resistor", "resistance": 10.0}` or `{"name": "cell", "voltage": 6.0}`.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "name", rename_all = "snake_case")]
pub enum ComponentKind {
    /// A resistor with a fixed resistance in ohms.
    Resistor { resistance: f64 },
    /// A voltage source (cell) supplying a fixed voltage in volts.
    #[serde(rename = "cell", alias = "voltage_source")]
    VoltageSource { voltage: f64 },
}

impl ComponentKind {
    /// Series resistance contributed by this component.
    ///
    /// A voltage source contributes none.
    #[must_use]
    pub const fn resistance(&self) -> f64 {
        match self {
            Self::Resistor { resistance } => *resistance,
            Self::VoltageSource { .. } => 0.0,
        }
    }

    /// Supplied voltage, if this component is a source.
    #[must_use]
    pub const fn supplied_voltage(&self) -> Option<f64> {
        match self {
            Self::Resistor { .. } => None,
            Self::VoltageSource { voltage } => Some(*voltage),
        }
    }

    /// Short lowercase label used in CLI output.
    #[must_use]
    pub const fn label(&self) -> &'static str {
        match self {
            Self::Resistor { .. } => "resistor",
            Self::VoltageSource { .. } => "cell",
        }
    }
}

/// Facing of a component on the schematic grid.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Orientation {
    #[default]
    N,
    E,
    S,
    W,
}

impl FromStr for Orientation {
    type Err = AmpereError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "N" => Ok(Self::N),
            "E" => Ok(Self::E),
            "S" => Ok(Self::S),
            "W" => Ok(Self::W),
            other => Err(AmpereError::InvalidComponent(format!(
                "orientation must be one of N, E, S, W, got '{}'",
                other
            ))),
        }
    }
}

/// Grid position of a component, serialized as `[x, y]`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct Position(pub i32, pub i32);

/// A leaf component: what it is and where it sits.
///
/// Orientation and position are carried for the drawing surfaces only; the
/// compiler reads `kind` alone.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Component {
    #[serde(flatten)]
    pub kind: ComponentKind,
    #[serde(default)]
    pub orientation: Orientation,
    #[serde(default)]
    pub position: Position,
}

impl Component {
    /// Create a resistor at the origin.
    #[must_use]
    pub fn resistor(resistance: f64) -> Self {
        Self::new(ComponentKind::Resistor { resistance })
    }

    /// Create a voltage source at the origin.
    #[must_use]
    pub fn cell(voltage: f64) -> Self {
        Self::new(ComponentKind::VoltageSource { voltage })
    }

    /// Create a component of the given kind at the origin, facing north.
    #[must_use]
    pub fn new(kind: ComponentKind) -> Self {
        Self {
            kind,
            orientation: Orientation::default(),
            position: Position::default(),
        }
    }

    /// Place the component on the grid.
    #[must_use]
    pub fn at(mut self, x: i32, y: i32) -> Self {
        self.position = Position(x, y);
        self
    }

    /// Set the component's facing.
    #[must_use]
    pub fn facing(mut self, orientation: Orientation) -> Self {
        self.orientation = orientation;
        self
    }

    /// Check that the electrical value is usable by the solver.
    ///
    /// Resistance must be finite and non-negative, voltage must be finite.
    pub fn validate(&self) -> Result<(), AmpereError> {
        match self.kind {
            ComponentKind::Resistor { resistance } => {
                if !resistance.is_finite() || resistance < 0.0 {
                    return Err(AmpereError::InvalidComponent(format!(
                        "resistance must be finite and >= 0, got {}",
                        resistance
                    )));
                }
            }
            ComponentKind::VoltageSource { voltage } => {
                if !voltage.is_finite() {
                    return Err(AmpereError::InvalidComponent(format!(
                        "voltage must be finite, got {}",
                        voltage
                    )));
                }
            }
        }
        Ok(())
    }
}

// =============================================================================
// COMPONENT EDITS
// =============================================================================

/// Field-wise edit of an existing component.
///
/// Absent fields keep their current value. The kind never changes:
/// `resistance` applies to resistors only, `voltage` to cells only.
#[derive(Debug, Clone, Copy, Default, PartialEq, Serialize, Deserialize)]
pub struct ComponentUpdate {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub resistance: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voltage: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub orientation: Option<Orientation>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub position: Option<Position>,
}

impl ComponentUpdate {
    /// Whether the edit touches nothing.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        *self == Self::default()
    }

    /// The edited copy of `component`, validated.
    pub fn apply(&self, component: &Component) -> Result<Component, AmpereError> {
        let mut edited = component.clone();
        match (&mut edited.kind, self.resistance, self.voltage) {
            (ComponentKind::Resistor { .. }, _, Some(_)) => {
                return Err(AmpereError::InvalidComponent(
                    "a resistor has no voltage; set its resistance".to_string(),
                ));
            }
            (ComponentKind::VoltageSource { .. }, Some(_), _) => {
                return Err(AmpereError::InvalidComponent(
                    "a cell has no resistance; set its voltage".to_string(),
                ));
            }
            (ComponentKind::Resistor { resistance }, Some(value), None) => *resistance = value,
            (ComponentKind::VoltageSource { voltage }, None, Some(value)) => *voltage = value,
            _ => {}
        }
        if let Some(orientation) = self.orientation {
            edited.orientation = orientation;
        }
        if let Some(position) = self.position {
            edited.position = position;
        }
        edited.validate()?;
        Ok(edited)
    }
}

// =============================================================================
// CONNECTIONS
// =============================================================================

/// A directed connection between two component ports.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Connection {
    pub from: ComponentId,
    pub to: ComponentId,
    #[serde(default)]
    pub from_index: u32,
    #[serde(default)]
    pub to_index: u32,
}

impl Connection {
    /// Create a connection between port 0 of both components.
    #[must_use]
    pub fn new(from: ComponentId, to: ComponentId) -> Self {
        Self {
            from,
            to,
            from_index: 0,
            to_index: 0,
        }
    }
}

// =============================================================================
// ERROR TYPES
// =============================================================================

/// Errors that can occur in the Ampere system.
///
/// - Schematic edits return these directly
/// - Compilation catches them at the facade and reports `compiled = false`
/// - The CORE never panics; all errors are recoverable
#[derive(Debug, Error)]
pub enum AmpereError {
    /// The schematic has no head component to compile from.
    #[error("Schematic has no head")]
    NoHead,

    /// A referenced component does not exist in the schematic.
    #[error("Component not found: {0}")]
    UnknownComponent(ComponentId),

    /// A component with this identifier already exists.
    #[error("Duplicate component: {0}")]
    DuplicateComponent(ComponentId),

    /// A component carries a value the solver cannot use.
    #[error("Invalid component: {0}")]
    InvalidComponent(String),

    /// A connection points at a component that does not exist.
    #[error("Dangling connection: {from} -> {to}")]
    DanglingConnection { from: ComponentId, to: ComponentId },

    /// A component reachable from the head has no outgoing connection.
    #[error("Open circuit at {0}: no outgoing connection")]
    OpenCircuit(ComponentId),

    /// A component reachable from the head has no path back to the head.
    #[error("Unclosed loop at {0}: no path back to the head")]
    UnclosedLoop(ComponentId),

    /// A parallel branch walk revisited a component before reaching the head.
    #[error("Cyclic branch through {0}")]
    CyclicBranch(ComponentId),

    /// The branches of a parallel group never meet again.
    #[error("No reconvergence point for parallel group at {0}")]
    NoReconvergence(ComponentId),

    /// The compiled hierarchy is not a tree (missing node or revisited node).
    #[error("Malformed hierarchy at {0}")]
    MalformedHierarchy(String),

    /// A component was resolved but never reached by the solver, which means
    /// the network does not reduce to series and parallel blocks.
    #[error("Component {0} is not reducible to series/parallel blocks")]
    Unsolved(ComponentId),

    /// A compile reported `compiled = false`; carries the reported reason.
    #[error("Compilation failed: {0}")]
    CompileFailed(String),

    /// A size limit was exceeded.
    #[error("Limit exceeded: {0}")]
    LimitExceeded(String),

    /// A serialization error occurred.
    #[error("Serialization error: {0}")]
    SerializationError(String),

    /// A deserialization error occurred.
    #[error("Deserialization error: {0}")]
    DeserializationError(String),

    /// An I/O error occurred.
    #[error("I/O error: {0}")]
    IoError(String),
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn voltage_source_has_no_resistance() {
        let cell = ComponentKind::VoltageSource { voltage: 9.0 };
        assert_eq!(cell.resistance(), 0.0);
        assert_eq!(cell.supplied_voltage(), Some(9.0));
    }

    #[test]
    fn resistor_supplies_no_voltage() {
        let r = ComponentKind::Resistor { resistance: 4.7 };
        assert_eq!(r.resistance(), 4.7);
        assert_eq!(r.supplied_voltage(), None);
    }

    #[test]
    fn component_json_uses_name_tag() {
        let json = serde_json::to_string(&Component::resistor(2.0).at(5, 8)).expect("serialize");
        assert!(json.contains("\"name\":\"resistor\""));
        assert!(json.contains("\"resistance\":2.0"));
        assert!(json.contains("\"position\":[5,8]"));

        let cell: Component =
            serde_json::from_str(r#"{"name":"cell","voltage":3,"orientation":"E"}"#)
                .expect("deserialize");
        assert_eq!(cell.kind, ComponentKind::VoltageSource { voltage: 3.0 });
        assert_eq!(cell.orientation, Orientation::E);
        assert_eq!(cell.position, Position(0, 0));
    }

    #[test]
    fn negative_resistance_rejected() {
        assert!(matches!(
            Component::resistor(-1.0).validate(),
            Err(AmpereError::InvalidComponent(_))
        ));
        assert!(Component::resistor(0.0).validate().is_ok());
        assert!(Component::cell(f64::NAN).validate().is_err());
    }

    #[test]
    fn connection_ports_default_to_zero() {
        let conn: Connection =
            serde_json::from_str(r#"{"from":"a","to":"b"}"#).expect("deserialize");
        assert_eq!(conn, Connection::new("a".into(), "b".into()));
    }

    #[test]
    fn orientation_parses_case_insensitively() {
        assert_eq!("w".parse::<Orientation>().expect("parse"), Orientation::W);
        assert_eq!(" N ".parse::<Orientation>().expect("parse"), Orientation::N);
        assert!("up".parse::<Orientation>().is_err());
    }

    #[test]
    fn update_changes_value_and_keeps_the_rest() {
        let original = Component::resistor(2.0).at(5, 8).facing(Orientation::W);
        let edited = ComponentUpdate {
            resistance: Some(6.5),
            ..ComponentUpdate::default()
        }
        .apply(&original)
        .expect("apply");
        assert_eq!(edited.kind, ComponentKind::Resistor { resistance: 6.5 });
        assert_eq!(edited.position, Position(5, 8));
        assert_eq!(edited.orientation, Orientation::W);

        let rotated = ComponentUpdate {
            orientation: Some(Orientation::S),
            ..ComponentUpdate::default()
        }
        .apply(&Component::cell(3.0))
        .expect("apply");
        assert_eq!(rotated.kind, ComponentKind::VoltageSource { voltage: 3.0 });
        assert_eq!(rotated.orientation, Orientation::S);
    }

    #[test]
    fn update_rejects_value_of_the_other_kind() {
        let to_resistor = ComponentUpdate {
            voltage: Some(9.0),
            ..ComponentUpdate::default()
        };
        assert!(matches!(
            to_resistor.apply(&Component::resistor(1.0)),
            Err(AmpereError::InvalidComponent(_))
        ));
        let to_cell = ComponentUpdate {
            resistance: Some(1.0),
            ..ComponentUpdate::default()
        };
        assert!(to_cell.apply(&Component::cell(1.0)).is_err());
        let negative = ComponentUpdate {
            resistance: Some(-3.0),
            ..ComponentUpdate::default()
        };
        assert!(negative.apply(&Component::resistor(1.0)).is_err());
        assert!(ComponentUpdate::default().is_empty());
    }
}
