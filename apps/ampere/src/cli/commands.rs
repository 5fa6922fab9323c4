//! # CLI Command Implementations
//!
//! Every editing command loads the schematic file, applies one change and
//! writes the file back. A missing file reads as an empty schematic.

use crate::api;
use crate::config::Config;
use ampere_core::{
    AmpereError, CompiledNetwork, Component, ComponentId, ComponentUpdate, Schematic, compile,
    primitives::MAX_SCHEMATIC_FILE_SIZE,
};
use serde_json::json;
use std::path::Path;

// =============================================================================
// FILE HELPERS
// =============================================================================

/// Reject files over `max_size` before reading them.
fn validate_file_size(path: &Path, max_size: u64) -> Result<(), AmpereError> {
    let metadata = std::fs::metadata(path)
        .map_err(|e| AmpereError::IoError(format!("Cannot read file metadata: {}", e)))?;

    if metadata.len() > max_size {
        return Err(AmpereError::LimitExceeded(format!(
            "File size {} bytes exceeds maximum allowed {} bytes",
            metadata.len(),
            max_size
        )));
    }
    Ok(())
}

/// Load a schematic file, or an empty schematic if the file is absent.
pub fn load_schematic(path: &Path) -> Result<Schematic, AmpereError> {
    if !path.exists() {
        return Ok(Schematic::new());
    }
    if !path.is_file() {
        return Err(AmpereError::IoError(format!(
            "Path '{}' is not a regular file",
            path.display()
        )));
    }
    validate_file_size(path, MAX_SCHEMATIC_FILE_SIZE)?;

    let text = std::fs::read_to_string(path)
        .map_err(|e| AmpereError::IoError(format!("Read schematic: {}", e)))?;
    Schematic::from_json(&text)
}

/// Write a schematic file as pretty JSON.
pub fn save_schematic(schematic: &Schematic, path: &Path) -> Result<(), AmpereError> {
    let text = schematic.to_json()?;
    std::fs::write(path, text)
        .map_err(|e| AmpereError::IoError(format!("Write schematic: {}", e)))
}

fn print_json(value: &serde_json::Value) {
    println!("{}", serde_json::to_string_pretty(value).unwrap_or_default());
}

// =============================================================================
// SERVER COMMAND
// =============================================================================

/// Serve the schematic file over HTTP; the demo network is served when the
/// file does not exist.
pub async fn cmd_server(config: &Config) -> Result<(), AmpereError> {
    let path = config.schematic.path.as_path();
    let schematic = if path.exists() {
        load_schematic(path)?
    } else {
        tracing::info!(path = %path.display(), "schematic file not found, serving demo network");
        Schematic::demo()
    };

    let addr = config.bind_address();
    println!("Ampere Network Server Starting...");
    println!();
    println!("Configuration:");
    println!("  Address:    {}", addr);
    println!("  Schematic:  {}", path.display());
    println!("  Components: {}", schematic.component_count());
    println!();
    println!("Endpoints:");
    println!("  GET    /schematic           - Live schematic");
    println!("  PUT    /schematic           - Replace schematic");
    println!("  POST   /components          - Add component");
    println!("  DELETE /components/{{id}}     - Remove component");
    println!("  POST   /connections         - Add connection");
    println!("  POST   /connections/remove  - Remove connection");
    println!("  PUT    /head                - Set head");
    println!("  GET    /network             - Compile live schematic");
    println!("  POST   /compile             - Compile posted schematic");
    println!("  GET    /health              - Health check");
    println!();
    println!("Press Ctrl+C to stop");
    println!();

    api::run_server(&addr, schematic).await
}

// =============================================================================
// INIT COMMAND
// =============================================================================

/// Write the demo schematic.
pub fn cmd_init(path: &Path, force: bool, json_mode: bool) -> Result<(), AmpereError> {
    if path.exists() && !force {
        return Err(AmpereError::IoError(format!(
            "{} already exists. Use --force to overwrite.",
            path.display()
        )));
    }

    let schematic = Schematic::demo();
    save_schematic(&schematic, path)?;

    if json_mode {
        print_json(&json!({
            "schematic": path.to_string_lossy(),
            "components": schematic.component_count(),
            "connections": schematic.connection_count(),
        }));
    } else {
        println!("Wrote demo schematic to {}", path.display());
    }
    Ok(())
}

// =============================================================================
// STATUS COMMAND
// =============================================================================

/// Summarize the schematic and whether it compiles.
pub fn cmd_status(path: &Path, json_mode: bool, verbose: bool) -> Result<(), AmpereError> {
    let schematic = load_schematic(path)?;
    let network = compile(&schematic);

    if json_mode {
        print_json(&json!({
            "schematic": path.to_string_lossy(),
            "components": schematic.component_count(),
            "connections": schematic.connection_count(),
            "head": schematic.head(),
            "compiled": network.compiled,
            "error": network.error,
        }));
        return Ok(());
    }

    println!("Ampere Schematic Status");
    println!("=======================");
    println!("Schematic:   {}", path.display());
    println!();
    println!("Components:  {}", schematic.component_count());
    println!("Connections: {}", schematic.connection_count());
    match schematic.head() {
        Some(head) => println!("Head:        {}", head),
        None => println!("Head:        (none)"),
    }
    match &network.error {
        None => println!("Compiles:    yes"),
        Some(e) => println!("Compiles:    no ({})", e),
    }

    if verbose {
        println!();
        for (id, component) in schematic.components() {
            let targets: Vec<String> = schematic
                .outgoing(id)
                .iter()
                .map(|c| c.to.to_string())
                .collect();
            println!(
                "  {:<12} {:<9} -> [{}]",
                id,
                component.kind.label(),
                targets.join(", ")
            );
        }
    }
    Ok(())
}

// =============================================================================
// COMPILE COMMAND
// =============================================================================

/// Compile and print the solved network. Fails when the network does not
/// compile, after printing what was resolved.
pub fn cmd_compile(path: &Path, json_mode: bool) -> Result<(), AmpereError> {
    let schematic = load_schematic(path)?;
    let network = compile(&schematic);

    if json_mode {
        let value = serde_json::to_value(&network)
            .map_err(|e| AmpereError::SerializationError(e.to_string()))?;
        print_json(&value);
    } else {
        print_network(&schematic, &network);
    }

    match network.error {
        Some(reason) if !network.compiled => Err(AmpereError::CompileFailed(reason)),
        _ => Ok(()),
    }
}

fn print_network(schematic: &Schematic, network: &CompiledNetwork) {
    println!("Ampere Network");
    println!("==============");
    if let Some(head) = &network.head {
        println!("Head:       {}", head);
    }
    if !network.compiled {
        println!(
            "Not compiled: {}",
            network.error.as_deref().unwrap_or("unknown error")
        );
        return;
    }
    println!("Resistance: {:.6} Ω", network.resistance);
    println!("Voltage:    {:.6} V", network.voltage);
    println!("Current:    {:.6} A", network.current);
    println!();
    println!(
        "  {:<12} {:<9} {:>14} {:>14} {:>14}",
        "component", "kind", "ohms", "volts", "amps"
    );
    for (key, leaf) in network.leaves() {
        let label = schematic
            .component(&ComponentId::new(key.as_str()))
            .map(|c| c.kind.label())
            .unwrap_or("?");
        println!(
            "  {:<12} {:<9} {:>14.6} {:>14.6} {:>14.6}",
            key, label, leaf.resistance, leaf.voltage, leaf.current
        );
    }
}

// =============================================================================
// EDIT COMMANDS
// =============================================================================

/// Add a component, generating an id unless one is given.
pub fn cmd_add(
    path: &Path,
    json_mode: bool,
    component: Component,
    id: Option<String>,
) -> Result<(), AmpereError> {
    let mut schematic = load_schematic(path)?;
    let label = component.kind.label();
    let id = match id {
        Some(id) => {
            let id = ComponentId::new(id);
            schematic.insert_component(id.clone(), component)?;
            id
        }
        None => schematic.add_component(component)?,
    };
    save_schematic(&schematic, path)?;

    if json_mode {
        print_json(&json!({ "success": true, "id": id, "kind": label }));
    } else {
        println!("Added {} {}", label, id);
    }
    Ok(())
}

/// Connect `from` to `to`.
pub fn cmd_connect(path: &Path, json_mode: bool, from: &str, to: &str) -> Result<(), AmpereError> {
    let mut schematic = load_schematic(path)?;
    let changed = schematic.add_connection(&ComponentId::from(from), &ComponentId::from(to))?;
    if changed {
        save_schematic(&schematic, path)?;
    }

    if json_mode {
        print_json(&json!({ "success": true, "changed": changed }));
    } else if changed {
        println!("Connected {} -> {}", from, to);
    } else {
        println!("{} -> {} already connected", from, to);
    }
    Ok(())
}

/// Remove the connection `from -> to`.
pub fn cmd_disconnect(
    path: &Path,
    json_mode: bool,
    from: &str,
    to: &str,
) -> Result<(), AmpereError> {
    let mut schematic = load_schematic(path)?;
    let changed = schematic.remove_connection(&ComponentId::from(from), &ComponentId::from(to));
    if changed {
        save_schematic(&schematic, path)?;
    }

    if json_mode {
        print_json(&json!({ "success": true, "changed": changed }));
    } else if changed {
        println!("Disconnected {} -> {}", from, to);
    } else {
        println!("No connection {} -> {}", from, to);
    }
    Ok(())
}

/// Remove a component and its connections.
pub fn cmd_remove(path: &Path, json_mode: bool, id: &str) -> Result<(), AmpereError> {
    let mut schematic = load_schematic(path)?;
    let removed = schematic.remove_component(&ComponentId::from(id))?;
    save_schematic(&schematic, path)?;

    if json_mode {
        print_json(&json!({ "success": true, "id": id, "kind": removed.kind.label() }));
    } else {
        println!("Removed {} {}", removed.kind.label(), id);
    }
    Ok(())
}

/// Change the value or facing of an existing component, then recompile.
pub fn cmd_set(
    path: &Path,
    json_mode: bool,
    id: &str,
    update: &ComponentUpdate,
) -> Result<(), AmpereError> {
    if update.is_empty() {
        return Err(AmpereError::InvalidComponent(
            "nothing to change: pass --ohms, --volts or --orientation".to_string(),
        ));
    }
    let mut schematic = load_schematic(path)?;
    let edited = schematic.edit_component(&ComponentId::from(id), update)?;
    save_schematic(&schematic, path)?;

    let network = compile(&schematic);
    if json_mode {
        print_json(&json!({
            "success": true,
            "id": id,
            "component": edited,
            "compiled": network.compiled,
        }));
    } else {
        println!("Updated {} {}", edited.kind.label(), id);
        if network.compiled {
            println!(
                "Network: {:.6} Ω, {:.6} A",
                network.resistance, network.current
            );
        }
    }
    Ok(())
}

/// Designate the head component.
pub fn cmd_head(path: &Path, json_mode: bool, id: &str) -> Result<(), AmpereError> {
    let mut schematic = load_schematic(path)?;
    schematic.set_head(&ComponentId::from(id))?;
    save_schematic(&schematic, path)?;

    if json_mode {
        print_json(&json!({ "success": true, "head": id }));
    } else {
        println!("Head set to {}", id);
    }
    Ok(())
}

// =============================================================================
// TESTS
// =============================================================================

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_file_loads_empty() {
        let dir = tempfile::tempdir().expect("tempdir");
        let schematic = load_schematic(&dir.path().join("none.json")).expect("load");
        assert_eq!(schematic.component_count(), 0);
    }

    #[test]
    fn init_refuses_to_overwrite() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schematic.json");
        cmd_init(&path, false, true).expect("first init");
        assert!(cmd_init(&path, false, true).is_err());
        cmd_init(&path, true, true).expect("forced init");
    }

    #[test]
    fn edits_round_trip_through_file() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schematic.json");

        cmd_add(&path, true, Component::cell(6.0), Some("cell".into())).expect("cell");
        cmd_add(&path, true, Component::resistor(3.0), Some("r".into())).expect("resistor");
        cmd_connect(&path, true, "cell", "r").expect("connect");
        cmd_connect(&path, true, "r", "cell").expect("connect");
        cmd_head(&path, true, "cell").expect("head");

        let network = compile(&load_schematic(&path).expect("load"));
        assert!(network.compiled);
        assert!((network.current - 2.0).abs() < 1e-9);

        cmd_disconnect(&path, true, "r", "cell").expect("disconnect");
        assert!(cmd_compile(&path, true).is_err());
    }

    #[test]
    fn remove_unknown_component_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schematic.json");
        assert!(matches!(
            cmd_remove(&path, true, "ghost"),
            Err(AmpereError::UnknownComponent(_))
        ));
    }

    #[test]
    fn oversized_file_rejected() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("big.json");
        std::fs::write(&path, "x".repeat(64)).expect("write");
        assert!(matches!(
            validate_file_size(&path, 16),
            Err(AmpereError::LimitExceeded(_))
        ));
    }

    #[test]
    fn set_changes_recompiled_values() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schematic.json");
        cmd_init(&path, false, true).expect("init");
        let before = compile(&load_schematic(&path).expect("load"));
        assert!((before.current - 1.75).abs() < 1e-9);

        // resistor3 from 3 to 4 Ω: 4 || 4 = 2 Ω.
        let update = ComponentUpdate {
            resistance: Some(4.0),
            orientation: Some(ampere_core::Orientation::N),
            ..ComponentUpdate::default()
        };
        cmd_set(&path, true, "resistor3", &update).expect("set resistor");
        let cell = ComponentUpdate {
            voltage: Some(6.0),
            ..ComponentUpdate::default()
        };
        cmd_set(&path, true, "cell1", &cell).expect("set cell");

        let schematic = load_schematic(&path).expect("load");
        let after = compile(&schematic);
        assert!((after.resistance - 2.0).abs() < 1e-9);
        assert!((after.current - 3.0).abs() < 1e-9);
        assert_eq!(
            schematic
                .component(&ComponentId::from("resistor3"))
                .map(|c| c.orientation),
            Some(ampere_core::Orientation::N)
        );
    }

    #[test]
    fn set_rejects_empty_and_mismatched_edits() {
        let dir = tempfile::tempdir().expect("tempdir");
        let path = dir.path().join("schematic.json");
        cmd_init(&path, false, true).expect("init");

        assert!(matches!(
            cmd_set(&path, true, "resistor1", &ComponentUpdate::default()),
            Err(AmpereError::InvalidComponent(_))
        ));
        let volts_on_resistor = ComponentUpdate {
            voltage: Some(1.0),
            ..ComponentUpdate::default()
        };
        assert!(cmd_set(&path, true, "resistor1", &volts_on_resistor).is_err());
        assert!(matches!(
            cmd_set(&path, true, "ghost", &volts_on_resistor),
            Err(AmpereError::UnknownComponent(_))
        ));
    }
}
