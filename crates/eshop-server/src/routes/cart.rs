use axum::{
    extract::{Path, State},
    Extension, Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::error::{AppError, AppResult};
use crate::models::{now_iso, CartItem, Product, User};
use crate::routes::AppState;
use crate::views::{cart_item_populated_view, cart_item_view, product_view};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddItemRequest {
    pub product_id: Option<String>,
    pub amount: Option<i64>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateItemRequest {
    pub amount: Option<i64>,
}

/// Returns the cart with every product reference resolved into full
/// product data.
pub async fn get_cart(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let items = CartItem::for_user(&conn, &user.id)?;

    let mut cart_items = Vec::with_capacity(items.len());
    for item in &items {
        let product = Product::find(&conn, &item.product_id)?.ok_or_else(|| {
            AppError::NotFound(format!("Produktas su id '{}' nerastas", item.product_id))
        })?;
        let category_ids = Product::category_ids(&conn, &product.id)?;
        cart_items.push(cart_item_populated_view(
            item,
            product_view(&product, category_ids),
        ));
    }

    Ok(Json(json!({ "cartItems": cart_items })))
}

pub async fn add_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Json(body): Json<AddItemRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let product_id = body.product_id.filter(|id| !id.is_empty()).ok_or_else(|| {
        AppError::BadRequest("Neteisingi pridedamo produkto duomenys".to_string())
    })?;
    let amount = body.amount.ok_or_else(|| {
        AppError::BadRequest("Neteisingi pridedamo produkto duomenys".to_string())
    })?;

    let conn = state.db.get()?;
    let already_in_cart: bool = conn.query_row(
        "SELECT EXISTS(SELECT 1 FROM cart_items WHERE user_id = ?1 AND product_id = ?2)",
        rusqlite::params![user.id, product_id],
        |row| row.get(0),
    )?;
    if already_in_cart {
        return Err(AppError::Conflict(
            "Toks daiktas jau yra krepšelyje".to_string(),
        ));
    }

    let item = CartItem {
        id: Uuid::new_v4().to_string(),
        user_id: user.id,
        product_id,
        amount,
        created_at: now_iso(),
        updated_at: now_iso(),
    };
    conn.execute(
        "INSERT INTO cart_items (id, user_id, product_id, amount, created_at, updated_at)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        rusqlite::params![
            item.id,
            item.user_id,
            item.product_id,
            item.amount,
            item.created_at,
            item.updated_at
        ],
    )?;

    Ok(Json(json!({ "cartItem": cart_item_view(&item) })))
}

pub async fn update_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
    Json(body): Json<UpdateItemRequest>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let mut item = find_item(&conn, &user.id, &item_id)?.ok_or_else(|| {
        AppError::NotFound(format!("Nerastas krepšelio daiktas su tokiu id: '{item_id}'"))
    })?;

    if let Some(amount) = body.amount {
        item.amount = amount;
        item.updated_at = now_iso();
        conn.execute(
            "UPDATE cart_items SET amount = ?1, updated_at = ?2 WHERE id = ?3",
            rusqlite::params![item.amount, item.updated_at, item.id],
        )?;
    }

    Ok(Json(json!({ "cartItem": cart_item_view(&item) })))
}

pub async fn delete_item(
    State(state): State<AppState>,
    Extension(user): Extension<User>,
    Path(item_id): Path<String>,
) -> AppResult<Json<serde_json::Value>> {
    let conn = state.db.get()?;
    let item = find_item(&conn, &user.id, &item_id)?.ok_or_else(|| {
        AppError::NotFound("Nerastas pirkinių krepšelio daiktas".to_string())
    })?;

    conn.execute(
        "DELETE FROM cart_items WHERE id = ?1",
        rusqlite::params![item.id],
    )?;

    Ok(Json(json!({ "cartItem": cart_item_view(&item) })))
}

// Lookups are scoped to the authenticated user's own rows
fn find_item(
    conn: &rusqlite::Connection,
    user_id: &str,
    item_id: &str,
) -> AppResult<Option<CartItem>> {
    let result = conn.query_row(
        "SELECT id, user_id, product_id, amount, created_at, updated_at
         FROM cart_items WHERE id = ?1 AND user_id = ?2",
        rusqlite::params![item_id, user_id],
        CartItem::from_row,
    );
    match result {
        Ok(item) => Ok(Some(item)),
        Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
        Err(e) => Err(AppError::Database(e)),
    }
}
