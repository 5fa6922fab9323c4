//! # API Endpoint Handlers
//!
//! Edits take the write lock on the live schematic; reads and compiles take
//! the read lock. Every compile builds its own arena, so concurrent reads
//! never share compiler state.

use super::{
    AppState,
    types::{ComponentRequest, ConnectionRequest, EditResponse, HeadRequest, HealthResponse},
};
use ampere_core::{
    AmpereError, CompiledNetwork, ComponentId, ComponentUpdate, Schematic, compile,
};
use axum::{
    Json,
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
};

/// HTTP status for an edit that the store rejected.
fn status_for(error: &AmpereError) -> StatusCode {
    match error {
        AmpereError::UnknownComponent(_) => StatusCode::NOT_FOUND,
        AmpereError::DuplicateComponent(_) => StatusCode::CONFLICT,
        AmpereError::LimitExceeded(_) => StatusCode::PAYLOAD_TOO_LARGE,
        AmpereError::InvalidComponent(_) | AmpereError::DeserializationError(_) => {
            StatusCode::BAD_REQUEST
        }
        _ => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

fn rejected(error: &AmpereError) -> (StatusCode, Json<EditResponse>) {
    tracing::debug!(error = %error, "edit rejected");
    (status_for(error), Json(EditResponse::error(error.to_string())))
}

// =============================================================================
// HEALTH HANDLER
// =============================================================================

/// Health check endpoint.
pub async fn health_handler() -> impl IntoResponse {
    Json(HealthResponse::default())
}

// =============================================================================
// SCHEMATIC HANDLERS
// =============================================================================

/// Return the live schematic.
pub async fn get_schematic_handler(State(state): State<AppState>) -> impl IntoResponse {
    let schematic = state.schematic.read().await;
    Json(schematic.clone())
}

/// Replace the live schematic.
///
/// The body goes through the same loader as schematic files, so limits and
/// component values are validated and the reverse index is rebuilt.
pub async fn put_schematic_handler(
    State(state): State<AppState>,
    Json(body): Json<serde_json::Value>,
) -> impl IntoResponse {
    let replacement = match Schematic::from_json(&body.to_string()) {
        Ok(s) => s,
        Err(e) => return rejected(&e),
    };

    let mut schematic = state.schematic.write().await;
    *schematic = replacement;
    tracing::info!(
        components = schematic.component_count(),
        connections = schematic.connection_count(),
        "schematic replaced"
    );
    (
        StatusCode::OK,
        Json(EditResponse::success(schematic.head(), true)),
    )
}

// =============================================================================
// COMPONENT HANDLERS
// =============================================================================

/// Add a component.
pub async fn add_component_handler(
    State(state): State<AppState>,
    Json(request): Json<ComponentRequest>,
) -> impl IntoResponse {
    let mut schematic = state.schematic.write().await;
    let result = match request.id {
        Some(id) if id.is_empty() => Err(AmpereError::InvalidComponent(
            "component id must be non-empty".to_string(),
        )),
        Some(id) => {
            let id = ComponentId::new(id);
            schematic
                .insert_component(id.clone(), request.component)
                .map(|()| id)
        }
        None => schematic.add_component(request.component),
    };

    match result {
        Ok(id) => (
            StatusCode::CREATED,
            Json(EditResponse::success(Some(&id), true)),
        ),
        Err(e) => rejected(&e),
    }
}

/// Change the value, facing or position of an existing component.
///
/// Absent fields are left alone; `changed` is false when the edit leaves the
/// component as it was.
pub async fn update_component_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(update): Json<ComponentUpdate>,
) -> impl IntoResponse {
    let id = ComponentId::new(id);
    let mut schematic = state.schematic.write().await;
    let before = schematic.component(&id).cloned();
    match schematic.edit_component(&id, &update) {
        Ok(edited) => {
            let changed = before.as_ref() != Some(&edited);
            tracing::debug!(component = %id, changed, "component updated");
            (
                StatusCode::OK,
                Json(EditResponse::success(Some(&id), changed)),
            )
        }
        Err(e) => rejected(&e),
    }
}

/// Remove a component together with its connections.
pub async fn remove_component_handler(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> impl IntoResponse {
    let id = ComponentId::new(id);
    let mut schematic = state.schematic.write().await;
    match schematic.remove_component(&id) {
        Ok(_) => (
            StatusCode::OK,
            Json(EditResponse::success(Some(&id), true)),
        ),
        Err(e) => rejected(&e),
    }
}

// =============================================================================
// CONNECTION HANDLERS
// =============================================================================

/// Add a connection. Repeating an existing connection is not an error.
pub async fn add_connection_handler(
    State(state): State<AppState>,
    Json(request): Json<ConnectionRequest>,
) -> impl IntoResponse {
    let connection = match request.to_connection() {
        Ok(c) => c,
        Err(e) => return rejected(&e),
    };

    let mut schematic = state.schematic.write().await;
    match schematic.connect(connection) {
        Ok(changed) => (StatusCode::OK, Json(EditResponse::success(None, changed))),
        Err(e) => rejected(&e),
    }
}

/// Remove a connection.
pub async fn remove_connection_handler(
    State(state): State<AppState>,
    Json(request): Json<ConnectionRequest>,
) -> impl IntoResponse {
    let connection = match request.to_connection() {
        Ok(c) => c,
        Err(e) => return rejected(&e),
    };

    let mut schematic = state.schematic.write().await;
    if schematic.remove_connection(&connection.from, &connection.to) {
        (StatusCode::OK, Json(EditResponse::success(None, true)))
    } else {
        (
            StatusCode::NOT_FOUND,
            Json(EditResponse::error(format!(
                "No connection {} -> {}",
                connection.from, connection.to
            ))),
        )
    }
}

// =============================================================================
// HEAD HANDLER
// =============================================================================

/// Designate the head component.
pub async fn set_head_handler(
    State(state): State<AppState>,
    Json(request): Json<HeadRequest>,
) -> impl IntoResponse {
    let id = ComponentId::new(request.id);
    let mut schematic = state.schematic.write().await;
    match schematic.set_head(&id) {
        Ok(()) => (
            StatusCode::OK,
            Json(EditResponse::success(Some(&id), true)),
        ),
        Err(e) => rejected(&e),
    }
}

// =============================================================================
// COMPILE HANDLERS
// =============================================================================

/// Compile the live schematic.
///
/// Always 200: a network that does not compile is reported through
/// `compiled = false` and `error`.
pub async fn network_handler(State(state): State<AppState>) -> impl IntoResponse {
    let schematic = state.schematic.read().await;
    Json(compile(&schematic))
}

/// Compile a posted schematic without storing it.
pub async fn compile_handler(Json(body): Json<serde_json::Value>) -> impl IntoResponse {
    match Schematic::from_json(&body.to_string()) {
        Ok(schematic) => (StatusCode::OK, Json(compile(&schematic))),
        Err(e) => (
            status_for(&e),
            Json(CompiledNetwork {
                error: Some(e.to_string()),
                ..CompiledNetwork::default()
            }),
        ),
    }
}
