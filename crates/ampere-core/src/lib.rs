//! # ampere-core
//!
//! The deterministic network compiler for Ampere - THE LOGIC.
//!
//! This crate turns a planar schematic of resistors and voltage sources
//! into a hierarchy of series and parallel blocks, then solves that
//! hierarchy for equivalent resistance, branch currents and voltage drops.
//!
//! ## Layout
//!
//! - `types` → identifiers, leaf components, connections, errors
//! - `schematic` → the editable input (components, connections, head)
//! - `network` → topology check, hierarchy resolver, solver, facade
//!
//! ## Architectural Constraints
//!
//! The CORE:
//! - Is pure: no async, no network, no filesystem access
//! - Is deterministic: every map is a `BTreeMap`, every compile starts from
//!   a fresh arena
//! - Never panics: edits return `AmpereError`, compiles report failure in
//!   their result

// =============================================================================
// MODULES
// =============================================================================

pub mod network;
pub mod primitives;
pub mod schematic;
pub mod types;

// =============================================================================
// RE-EXPORTS: Core Types (from types module)
// =============================================================================

pub use types::{
    AmpereError, Component, ComponentId, ComponentKind, ComponentUpdate, Connection, Orientation,
    Position,
};

// =============================================================================
// RE-EXPORTS: Schematic and Compiler
// =============================================================================

pub use network::{
    CompiledNetwork, CompiledNode, NodeArena, NodeKey, NodeKind, NodeReport, ReportKind, compile,
};
pub use schematic::Schematic;
