//! # API Request/Response Types
//!
//! JSON bodies of the HTTP API. Schematics and compiled networks are sent
//! in their core serde form; these types cover the edit endpoints.

use ampere_core::{AmpereError, Component, ComponentId, Connection};
use serde::{Deserialize, Serialize};

// =============================================================================
// HEALTH RESPONSE
// =============================================================================

/// Health check response.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
}

impl Default for HealthResponse {
    fn default() -> Self {
        Self {
            status: "ok".to_string(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }
}

// =============================================================================
// COMPONENT REQUEST
// =============================================================================

/// Body of `POST /components`.
///
/// The component fields sit at the top level next to an optional `id`:
/// `{"id": "r9", "name": "resistor", "resistance": 4.7}`. Without an `id`
/// the server generates one.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ComponentRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    #[serde(flatten)]
    pub component: Component,
}

// =============================================================================
// CONNECTION REQUEST
// =============================================================================

/// Body of `POST /connections` and `POST /connections/remove`.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConnectionRequest {
    pub from: String,
    pub to: String,
    #[serde(default)]
    pub from_index: u32,
    #[serde(default)]
    pub to_index: u32,
}

impl ConnectionRequest {
    /// Convert to a core connection, rejecting empty endpoints.
    pub fn to_connection(&self) -> Result<Connection, AmpereError> {
        if self.from.is_empty() || self.to.is_empty() {
            return Err(AmpereError::InvalidComponent(
                "connection endpoints must be non-empty".to_string(),
            ));
        }
        Ok(Connection {
            from: ComponentId::new(self.from.as_str()),
            to: ComponentId::new(self.to.as_str()),
            from_index: self.from_index,
            to_index: self.to_index,
        })
    }
}

// =============================================================================
// HEAD REQUEST
// =============================================================================

/// Body of `PUT /head`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeadRequest {
    pub id: String,
}

// =============================================================================
// EDIT RESPONSE
// =============================================================================

/// Outcome of an edit to the live schematic.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EditResponse {
    pub success: bool,
    /// Component the edit created or touched.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub id: Option<String>,
    /// Whether the schematic actually changed (false for a repeated edit).
    #[serde(default)]
    pub changed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
}

impl EditResponse {
    /// A successful edit.
    #[must_use]
    pub fn success(id: Option<&ComponentId>, changed: bool) -> Self {
        Self {
            success: true,
            id: id.map(ToString::to_string),
            changed,
            error: None,
        }
    }

    /// A rejected edit.
    #[must_use]
    pub fn error(message: impl Into<String>) -> Self {
        Self {
            success: false,
            id: None,
            changed: false,
            error: Some(message.into()),
        }
    }
}
