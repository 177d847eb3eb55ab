use axum::{
    extract::{Multipart, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::auth::middleware::TokenData;
use crate::auth::{password, token};
use crate::error::{AppError, AppResult};
use crate::models::{now_iso, CartItem, User};
use crate::routes::AppState;
use crate::upload;
use crate::views::user_view;

#[derive(Debug, Deserialize)]
pub struct CheckEmailQuery {
    pub email: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct CredentialsRequest {
    pub email: Option<String>,
    pub password: Option<String>,
}

pub async fn check_email(
    State(state): State<AppState>,
    Query(query): Query<CheckEmailQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let email = query
        .email
        .ok_or_else(|| AppError::BadRequest("Reikalingas paštas patikrinimui".to_string()))?;

    let conn = state.db.get()?;
    let taken: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM users WHERE email = ?1)",
        rusqlite::params![email],
        |row| row.get(0),
    )?;

    if taken {
        return Err(AppError::Conflict("Paštas užimtas".to_string()));
    }

    Ok(Json(json!({ "valid": true })))
}

pub async fn login(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let email = body
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Privalomas el. paštas".to_string()))?;
    let plain_password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Privalomas slaptažodis".to_string()))?;

    let conn = state.db.get()?;
    let user = User::find_by_email(&conn, &email)?.ok_or_else(|| {
        AppError::BadRequest(format!("Vartotojas su paštu '{email}' nerastas"))
    })?;

    if !password::verify_password(&plain_password, &user.password_hash)? {
        return Err(AppError::BadRequest("Slaptažodis neteisingas".to_string()));
    }

    let jwt = token::sign(&user.email, &user.role, &state.config.token_secret)
        .map_err(|e| AppError::Internal(format!("token sign: {e}")))?;
    let cart_items = CartItem::for_user(&conn, &user.id)?;

    Ok(Json(json!({
        "user": user_view(&user, &cart_items, &state.config),
        "token": format!("Bearer {jwt}"),
    })))
}

pub async fn register(
    State(state): State<AppState>,
    Json(body): Json<CredentialsRequest>,
) -> AppResult<impl IntoResponse> {
    let email = body
        .email
        .filter(|e| !e.is_empty())
        .ok_or_else(|| AppError::BadRequest("Privalomas el. paštas".to_string()))?;
    let plain_password = body
        .password
        .filter(|p| !p.is_empty())
        .ok_or_else(|| AppError::BadRequest("Privalomas slaptažodis".to_string()))?;

    let password_hash = password::hash_password(&plain_password)?;
    let user_id = Uuid::new_v4().to_string();
    let now = now_iso();

    let conn = state.db.get()?;
    let result = conn.execute(
        "INSERT INTO users (id, email, password_hash, role, created_at, updated_at)
         VALUES (?1, ?2, ?3, 'user', ?4, ?5)",
        rusqlite::params![user_id, email, password_hash, now, now],
    );

    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::Conflict("Toks paštas jau yra".to_string()));
        }
        Err(e) => return Err(AppError::Database(e)),
    }

    let user = User {
        id: user_id,
        email,
        password_hash,
        role: "user".to_string(),
        name: None,
        surname: None,
        img: None,
        created_at: now.clone(),
        updated_at: now,
    };

    let jwt = token::sign(&user.email, &user.role, &state.config.token_secret)
        .map_err(|e| AppError::Internal(format!("token sign: {e}")))?;

    Ok((
        StatusCode::CREATED,
        Json(json!({
            "user": user_view(&user, &[], &state.config),
            "token": format!("Bearer {jwt}"),
        })),
    ))
}

/// Re-validates that the token's subject still exists and echoes the
/// presented token back unchanged. No rotation happens here on purpose.
pub async fn authenticate(
    State(state): State<AppState>,
    Extension(token_data): Extension<TokenData>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let user = User::find_by_email(&conn, &token_data.email)?.ok_or_else(|| {
        AppError::BadRequest(format!(
            "Vartotojas nerastas su tokiu paštu '{}'",
            token_data.email
        ))
    })?;

    let cart_items = CartItem::for_user(&conn, &user.id)?;

    Ok(Json(json!({
        "user": user_view(&user, &cart_items, &state.config),
        "token": token_data.token,
    })))
}

pub async fn update_user(
    State(state): State<AppState>,
    Extension(token_data): Extension<TokenData>,
    mut multipart: Multipart,
) -> AppResult<Json<serde_json::Value>> {
    let mut name: Option<String> = None;
    let mut surname: Option<String> = None;
    let mut email: Option<String> = None;
    let mut img: Option<String> = None;

    while let Some(field) = multipart.next_field().await.map_err(|_| {
        AppError::BadRequest("Serverio klaida atpažįstant vartotoją".to_string())
    })? {
        let field_name = field.name().map(|n| n.to_string());
        match field_name.as_deref() {
            Some("name") => name = Some(read_text(field).await?),
            Some("surname") => surname = Some(read_text(field).await?),
            Some("email") => email = Some(read_text(field).await?),
            Some("img") => {
                let original_name = field
                    .file_name()
                    .map(|n| n.to_string())
                    .unwrap_or_else(|| "img".to_string());
                let data = field.bytes().await.map_err(|_| {
                    AppError::BadRequest("Serverio klaida atpažįstant vartotoją".to_string())
                })?;
                img = Some(upload::store_image(
                    &state.config.upload_dir,
                    &token_data.email,
                    "img",
                    &original_name,
                    &data,
                )?);
            }
            _ => {}
        }
    }

    let conn = state.db.get()?;
    let mut user = User::find_by_email(&conn, &token_data.email)?.ok_or_else(|| {
        AppError::BadRequest(format!(
            "Vartotojas nerastas su tokiu paštu '{}'",
            token_data.email
        ))
    })?;

    if let Some(name) = name.filter(|v| !v.is_empty()) {
        user.name = Some(name);
    }
    if let Some(surname) = surname.filter(|v| !v.is_empty()) {
        user.surname = Some(surname);
    }
    if let Some(email) = email.filter(|v| !v.is_empty()) {
        user.email = email;
    }
    if let Some(img) = img {
        user.img = Some(img);
    }
    user.updated_at = now_iso();

    let result = conn.execute(
        "UPDATE users SET email = ?1, name = ?2, surname = ?3, img = ?4, updated_at = ?5
         WHERE id = ?6",
        rusqlite::params![user.email, user.name, user.surname, user.img, user.updated_at, user.id],
    );
    match result {
        Ok(_) => {}
        Err(rusqlite::Error::SqliteFailure(err, _))
            if err.code == rusqlite::ErrorCode::ConstraintViolation =>
        {
            return Err(AppError::Conflict("Toks paštas jau yra".to_string()));
        }
        Err(e) => return Err(AppError::Database(e)),
    }

    // The email may have changed, so the client gets a fresh token
    let jwt = token::sign(&user.email, &user.role, &state.config.token_secret)
        .map_err(|e| AppError::Internal(format!("token sign: {e}")))?;
    let cart_items = CartItem::for_user(&conn, &user.id)?;

    Ok(Json(json!({
        "user": user_view(&user, &cart_items, &state.config),
        "token": format!("Bearer {jwt}"),
    })))
}

async fn read_text(field: axum::extract::multipart::Field<'_>) -> AppResult<String> {
    field.text().await.map_err(|_| {
        AppError::BadRequest("Serverio klaida atpažįstant vartotoją".to_string())
    })
}
