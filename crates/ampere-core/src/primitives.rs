//! # Primitives
//!
//! Hardcoded constants for the Ampere CORE.
//!
//! These values are compiled into the binary and are immutable at runtime.
//!
//! ## Primitives
//!
//! 1. **Key prefixes**: How wrapper nodes are named in compiled output.
//! 2. **Defaults**: Values used when a component is created without one.
//! 3. **Limits**: Size bounds that keep every compile computationally bounded.

/// Prefix of series wrapper keys (`s-<component>`).
pub const SERIES_PREFIX: &str = "s-";

/// Prefix of parallel keys (`p<depth>-<first branch head>`).
pub const PARALLEL_PREFIX: &str = "p";

/// Prefix of nested parallel branch keys (`pb<depth>-<first branch head>`).
pub const PARALLEL_BRANCH_PREFIX: &str = "pb";

/// Resistance given to a resistor created without an explicit value (ohms).
pub const DEFAULT_RESISTANCE: f64 = 10.0;

/// Voltage given to a cell created without an explicit value (volts).
pub const DEFAULT_VOLTAGE: f64 = 6.0;

// =============================================================================
// INPUT VALIDATION LIMITS
// =============================================================================

/// Maximum number of components in a schematic.
///
/// Together with `MAX_CONNECTIONS` this bounds the work of every compile.
pub const MAX_COMPONENTS: usize = 4096;

/// Maximum number of connections in a schematic.
pub const MAX_CONNECTIONS: usize = 16384;

/// Maximum size of a schematic file accepted by loaders (16 MiB).
pub const MAX_SCHEMATIC_FILE_SIZE: u64 = 16 * 1024 * 1024;

/// Absolute tolerance used when comparing solved values.
pub const EPSILON: f64 = 1e-9;
