use axum::{
    extract::{Request, State},
    http::header,
    middleware::Next,
    response::Response,
};

use crate::auth::token;
use crate::error::AppError;
use crate::models::{User, ROLE_ADMIN};
use crate::routes::AppState;

/// Verified token payload attached to the request. `token` keeps the
/// original `Bearer ...` value so handlers can echo it back unchanged.
#[derive(Debug, Clone)]
pub struct TokenData {
    pub email: String,
    pub role: String,
    pub token: String,
}

pub async fn require_auth(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let header_value = request
        .headers()
        .get(header::AUTHORIZATION)
        .and_then(|v| v.to_str().ok())
        .ok_or_else(|| AppError::Unauthorized("Reikalingas prisijungimas".to_string()))?;

    let raw_token = header_value
        .split_whitespace()
        .nth(1)
        .map(str::to_owned)
        .ok_or_else(|| {
            AppError::Unauthorized("Klaidingi vartotojo atpažinimo duomenys".to_string())
        })?;

    let claims = token::verify(&raw_token, &state.config.token_secret).map_err(|_| {
        AppError::Unauthorized("Klaidingi vartotojo atpažinimo duomenys".to_string())
    })?;

    request.extensions_mut().insert(TokenData {
        email: claims.email,
        role: claims.role,
        token: format!("Bearer {raw_token}"),
    });
    Ok(next.run(request).await)
}

/// Loads the full user row for the verified email. Runs after
/// `require_auth` on cart routes.
pub async fn require_user(
    State(state): State<AppState>,
    mut request: Request,
    next: Next,
) -> Result<Response, AppError> {
    let token_data = request
        .extensions()
        .get::<TokenData>()
        .cloned()
        .ok_or_else(|| AppError::Unauthorized("Reikalingas Prisijungimas".to_string()))?;

    let conn = state.db.get()?;
    let user = User::find_by_email(&conn, &token_data.email)?.ok_or_else(|| {
        AppError::NotFound("Autentifikuojamas vartotojas nerastas".to_string())
    })?;

    request.extensions_mut().insert(user);
    Ok(next.run(request).await)
}

pub async fn require_admin(request: Request, next: Next) -> Result<Response, AppError> {
    let token_data = request
        .extensions()
        .get::<TokenData>()
        .ok_or_else(|| AppError::Unauthorized("Reikalingas Prisijungimas".to_string()))?;

    if token_data.role != ROLE_ADMIN {
        return Err(AppError::Unauthorized(
            "Veiksmas leidžiamas tik adminui".to_string(),
        ));
    }

    Ok(next.run(request).await)
}
