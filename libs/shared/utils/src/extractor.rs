use std::sync::Arc;

use axum::{
    body::Body,
    extract::State,
    http::Request,
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use shared_models::auth::{Principal, Role};
use shared_models::error::AppError;

use crate::state::AppState;

/// Middleware resolving the trusted identity headers into a `Principal`.
/// Authentication itself is terminated upstream; requests reaching this core
/// carry the resolved tenant and role.
pub async fn auth_middleware(
    State(_state): State<Arc<AppState>>,
    mut request: Request<Body>,
    next: Next,
) -> Result<Response, AppError> {
    let tenant_id = header_value(&request, "x-tenant-id")?
        .parse::<Uuid>()
        .map_err(|_| AppError::Auth("Invalid x-tenant-id header".to_string()))?;

    let role = Role::parse(&header_value(&request, "x-role")?)
        .ok_or_else(|| AppError::Auth("Unknown role".to_string()))?;

    let actor_id = match request.headers().get("x-actor-id") {
        Some(value) => {
            let raw = value
                .to_str()
                .map_err(|_| AppError::Auth("Invalid x-actor-id header".to_string()))?;
            Some(
                raw.parse::<Uuid>()
                    .map_err(|_| AppError::Auth("Invalid x-actor-id header".to_string()))?,
            )
        }
        None => None,
    };

    let principal = Principal {
        tenant_id,
        actor_id,
        role,
    };
    request.extensions_mut().insert(principal);

    Ok(next.run(request).await)
}

fn header_value(request: &Request<Body>, name: &str) -> Result<String, AppError> {
    request
        .headers()
        .get(name)
        .ok_or_else(|| AppError::Auth(format!("Missing {} header", name)))?
        .to_str()
        .map(|v| v.to_string())
        .map_err(|_| AppError::Auth(format!("Invalid {} header", name)))
}
