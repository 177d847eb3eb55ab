use std::collections::HashSet;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use rusqlite::Connection;
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{now_iso, Product};
use crate::routes::AppState;
use crate::views::{product_populated_view, product_view};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductsQuery {
    pub populate: Option<String>,
    pub category_id: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct PopulateQuery {
    pub populate: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct ProductPayload {
    pub title: Option<String>,
    pub price: Option<f64>,
    pub images: Option<Vec<String>>,
    pub categories: Option<Vec<String>>,
}

/// Deduplicates the supplied category ids (order preserved) and checks
/// that every one of them exists. Returns the empty set when no ids
/// were supplied.
fn validate_category_ids(
    conn: &Connection,
    category_ids: Option<Vec<String>>,
) -> AppResult<Vec<String>> {
    let Some(ids) = category_ids.filter(|ids| !ids.is_empty()) else {
        return Ok(Vec::new());
    };

    let mut seen = HashSet::new();
    let uniq: Vec<String> = ids.into_iter().filter(|id| seen.insert(id.clone())).collect();

    let placeholders = vec!["?"; uniq.len()].join(",");
    let sql = format!("SELECT COUNT(*) FROM categories WHERE id IN ({placeholders})");
    let found: i64 = conn.query_row(&sql, rusqlite::params_from_iter(uniq.iter()), |row| {
        row.get(0)
    })?;

    if found as usize != uniq.len() {
        return Err(AppError::BadRequest(
            "Dalis kategorijų neegzistuoja".to_string(),
        ));
    }

    Ok(uniq)
}

fn load_products(conn: &Connection, category_id: Option<&str>) -> AppResult<Vec<Product>> {
    let mut products = Vec::new();
    match category_id {
        Some(category_id) => {
            let mut stmt = conn.prepare(
                "SELECT p.id, p.title, p.price, p.images, p.created_at, p.updated_at
                 FROM products p
                 JOIN product_categories pc ON pc.product_id = p.id
                 WHERE pc.category_id = ?1
                 ORDER BY p.created_at",
            )?;
            let rows = stmt.query_map(rusqlite::params![category_id], Product::from_row)?;
            for row in rows {
                products.push(row?);
            }
        }
        None => {
            let mut stmt = conn.prepare(
                "SELECT id, title, price, images, created_at, updated_at
                 FROM products ORDER BY created_at",
            )?;
            let rows = stmt.query_map([], Product::from_row)?;
            for row in rows {
                products.push(row?);
            }
        }
    }
    Ok(products)
}

pub async fn list(
    State(state): State<AppState>,
    Query(query): Query<ProductsQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let products = load_products(&conn, query.category_id.as_deref())?;

    let populate_categories = query.populate.as_deref() == Some("categories");
    let views = if populate_categories {
        let mut views = Vec::with_capacity(products.len());
        for product in &products {
            let titles = Product::category_titles(&conn, &product.id)?;
            views.push(serde_json::to_value(product_populated_view(product, titles))?);
        }
        views
    } else {
        let mut views = Vec::with_capacity(products.len());
        for product in &products {
            let ids = Product::category_ids(&conn, &product.id)?;
            views.push(serde_json::to_value(product_view(product, ids))?);
        }
        views
    };

    Ok(Json(json!({ "products": views })))
}

pub async fn get(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Query(query): Query<PopulateQuery>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let product = Product::find(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("Produktas su id '{id}' nerastas")))?;

    let view = if query.populate.as_deref() == Some("categories") {
        let titles = Product::category_titles(&conn, &product.id)?;
        serde_json::to_value(product_populated_view(&product, titles))?
    } else {
        let ids = Product::category_ids(&conn, &product.id)?;
        serde_json::to_value(product_view(&product, ids))?
    };

    Ok(Json(json!({ "product": view })))
}

pub async fn create(
    State(state): State<AppState>,
    Json(body): Json<ProductPayload>,
) -> AppResult<impl IntoResponse> {
    let title = body
        .title
        .filter(|t| !t.is_empty())
        .ok_or_else(|| AppError::BadRequest("Trūksta produkto pavadinimo".to_string()))?;
    let price = body
        .price
        .ok_or_else(|| AppError::BadRequest("Trūksta produkto kainos".to_string()))?;

    let conn = state.db.get()?;
    // Nothing is persisted unless every supplied category id exists
    let category_ids = validate_category_ids(&conn, body.categories)?;

    let product = Product {
        id: Uuid::new_v4().to_string(),
        title,
        price,
        images: body.images.unwrap_or_default(),
        created_at: now_iso(),
        updated_at: now_iso(),
    };
    conn.execute(
        "INSERT INTO products (id, title, price, images, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            product.id,
            product.title,
            product.price,
            serde_json::to_string(&product.images)?,
            product.created_at,
            product.updated_at
        ],
    )?;
    replace_category_links(&conn, &product.id, &category_ids)?;

    Ok((
        StatusCode::CREATED,
        Json(json!({ "product": product_view(&product, category_ids) })),
    ))
}

pub async fn update(
    State(state): State<AppState>,
    Path(id): Path<String>,
    Json(body): Json<ProductPayload>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let mut product = Product::find(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("Produktas su id '{id}' nerastas")))?;

    // An update without categories clears the set
    let category_ids = validate_category_ids(&conn, body.categories)?;

    if let Some(title) = body.title.filter(|t| !t.is_empty()) {
        product.title = title;
    }
    if let Some(price) = body.price {
        product.price = price;
    }
    if let Some(images) = body.images {
        product.images = images;
    }
    product.updated_at = now_iso();

    conn.execute(
        "UPDATE products SET title = ?1, price = ?2, images = ?3, updated_at = ?4 WHERE id = ?5",
        rusqlite::params![
            product.title,
            product.price,
            serde_json::to_string(&product.images)?,
            product.updated_at,
            product.id
        ],
    )?;
    replace_category_links(&conn, &product.id, &category_ids)?;

    Ok(Json(json!({ "product": product_view(&product, category_ids) })))
}

pub async fn delete(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let product = Product::find(&conn, &id)?
        .ok_or_else(|| AppError::NotFound(format!("Produktas su id '{id}' nerastas")))?;
    let category_ids = Product::category_ids(&conn, &id)?;

    conn.execute("DELETE FROM products WHERE id = ?1", rusqlite::params![id])?;

    Ok(Json(json!({ "product": product_view(&product, category_ids) })))
}

fn replace_category_links(
    conn: &Connection,
    product_id: &str,
    category_ids: &[String],
) -> AppResult<()> {
    conn.execute(
        "DELETE FROM product_categories WHERE product_id = ?1",
        rusqlite::params![product_id],
    )?;
    for category_id in category_ids {
        conn.execute(
            "INSERT INTO product_categories (product_id, category_id) VALUES (?1, ?2)",
            rusqlite::params![product_id, category_id],
        )?;
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_conn() -> Connection {
        let conn = Connection::open_in_memory().unwrap();
        conn.execute_batch(include_str!("../db/schema.sql")).unwrap();
        conn
    }

    fn insert_category(conn: &Connection, id: &str, title: &str) {
        conn.execute(
            "INSERT INTO categories (id, title, created_at, updated_at)
             VALUES (?1, ?2, '2024-01-01T00:00:00.000Z', '2024-01-01T00:00:00.000Z')",
            rusqlite::params![id, title],
        )
        .unwrap();
    }

    #[test]
    fn no_categories_validates_to_empty_set() {
        let conn = test_conn();
        assert!(validate_category_ids(&conn, None).unwrap().is_empty());
        assert!(validate_category_ids(&conn, Some(vec![])).unwrap().is_empty());
    }

    #[test]
    fn duplicates_are_removed_order_preserved() {
        let conn = test_conn();
        insert_category(&conn, "c1", "Baldai");
        insert_category(&conn, "c2", "Stalai");

        let ids = vec![
            "c2".to_string(),
            "c1".to_string(),
            "c2".to_string(),
            "c1".to_string(),
        ];
        let validated = validate_category_ids(&conn, Some(ids)).unwrap();
        assert_eq!(validated, vec!["c2".to_string(), "c1".to_string()]);
    }

    #[test]
    fn missing_category_id_is_rejected() {
        let conn = test_conn();
        insert_category(&conn, "c1", "Baldai");

        let err = validate_category_ids(
            &conn,
            Some(vec!["c1".to_string(), "nesamas".to_string()]),
        )
        .unwrap_err();
        assert!(matches!(err, AppError::BadRequest(msg) if msg == "Dalis kategorijų neegzistuoja"));
    }
}
