use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{now_iso, Category};
use crate::routes::AppState;
use crate::views::category_view;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryPayload {
    pub title: Option<String>,
    pub img_src: Option<String>,
}

pub async fn list(State(state): State<AppState>) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let mut stmt = conn.prepare(
        "SELECT id, title, img_src, created_at, updated_at FROM categories ORDER BY created_at",
    )?;
    let rows = stmt.query_map([], Category::from_row)?;
    let categories: Result<Vec<_>, _> = rows.collect();
    let views: Vec<_> = categories?.iter().map(category_view).collect();

    Ok(Json(json!({ "categories": views })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let category = Category::find(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("Kategorija su id '{id}' nerasta")))?;

    Ok(Json(json!({ "category": category_view(&category) })))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<CategoryPayload>,
) -> AppResult<impl IntoResponse> {
    let title = body.title.filter(|t| !t.is_empty()).ok_or_else(|| {
        AppError::BadRequest("Serverio klaida kuriant kategoriją".to_string())
    })?;

    let category = Category {
        id: Uuid::new_v4().to_string(),
        title,
        img_src: body.img_src,
        created_at: now_iso(),
        updated_at: now_iso(),
    };
    let conn = state.db.get()?;
    conn.execute(
        "INSERT INTO categories (id, title, img_src, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5)",
        rusqlite::params![
            category.id,
            category.title,
            category.img_src,
            category.created_at,
            category.updated_at
        ],
    )?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "category": category_view(&category) })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<CategoryPayload>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let mut category = Category::find(&conn, &id)?.ok_or_else(|| {
        AppError::NotFound(format!("Kategorija su id '{id}' nerasta atliekant atnaujinimą"))
    })?;

    if let Some(title) = body.title.filter(|t| !t.is_empty()) {
        category.title = title;
    }
    if let Some(img_src) = body.img_src {
        category.img_src = Some(img_src);
    }
    category.updated_at = now_iso();

    conn.execute(
        "UPDATE categories SET title = ?1, img_src = ?2, updated_at = ?3 WHERE id = ?4",
        rusqlite::params![category.title, category.img_src, category.updated_at, category.id],
    )?;

    Ok(Json(json!({ "category": category_view(&category) })))
}

/// Deleting a category does not touch products that reference it; their
/// references are left dangling.
pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let category = Category::find(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("Kategorija su id '{id}' nerastas")))?;

    conn.execute(
        "DELETE FROM categories WHERE id = ?1",
        rusqlite::params![id],
    )?;

    Ok(Json(json!({ "category": category_view(&category) })))
}
