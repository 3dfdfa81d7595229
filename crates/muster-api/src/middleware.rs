use axum::{
    extract::FromRequestParts,
    http::{header, request::Parts, StatusCode},
};
use muster_core::auth::Claims;
use muster_core::AppState;

fn bearer_claims(parts: &Parts, state: &AppState) -> Result<Claims, (StatusCode, &'static str)> {
    let auth_header = parts
        .headers
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or((StatusCode::UNAUTHORIZED, "Missing authorization header"))?;

    let token = auth_header
        .strip_prefix("Bearer ")
        .ok_or((StatusCode::UNAUTHORIZED, "Invalid authorization format"))?;

    muster_core::auth::validate_token(token, &state.config.jwt_secret)
        .map_err(|_| (StatusCode::UNAUTHORIZED, "Invalid or expired token"))
}

/// Extractor that requires the authenticated principal to be a platform admin.
pub struct AdminUser {
    pub actor_id: String,
}

impl FromRequestParts<AppState> for AdminUser {
    type Rejection = (StatusCode, &'static str);

    async fn from_request_parts(
        parts: &mut Parts,
        state: &AppState,
    ) -> Result<Self, Self::Rejection> {
        let claims = bearer_claims(parts, state)?;
        if !muster_core::is_admin(claims.flags) {
            return Err((StatusCode::FORBIDDEN, "Admin access required"));
        }
        Ok(AdminUser {
            actor_id: claims.sub,
        })
    }
}
