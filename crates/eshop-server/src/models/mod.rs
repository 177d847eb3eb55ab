use rusqlite::{Connection, Row};
use serde::{Deserialize, Serialize};

use crate::error::{AppError, AppResult};

pub const ROLE_ADMIN: &str = "admin";

/// Timestamp format shared by every table.
pub fn now_iso() -> String {
    chrono::Utc::now().format("%Y-%m-%dT%H:%M:%S%.3fZ").to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: String,
    pub email: String,
    #[serde(skip_serializing)]
    pub password_hash: String,
    pub role: String,
    pub name: Option<String>,
    pub surname: Option<String>,
    pub img: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl User {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            email: row.get(1)?,
            password_hash: row.get(2)?,
            role: row.get(3)?,
            name: row.get(4)?,
            surname: row.get(5)?,
            img: row.get(6)?,
            created_at: row.get(7)?,
            updated_at: row.get(8)?,
        })
    }

    pub fn find_by_email(conn: &Connection, email: &str) -> AppResult<Option<User>> {
        let result = conn.query_row(
            "SELECT id, email, password_hash, role, name, surname, img, created_at, updated_at
             FROM users WHERE email = ?1",
            rusqlite::params![email],
            User::from_row,
        );
        match result {
            Ok(user) => Ok(Some(user)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CartItem {
    pub id: String,
    pub user_id: String,
    pub product_id: String,
    pub amount: i64,
    pub created_at: String,
    pub updated_at: String,
}

impl CartItem {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            user_id: row.get(1)?,
            product_id: row.get(2)?,
            amount: row.get(3)?,
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    /// All cart rows of one user, oldest first.
    pub fn for_user(conn: &Connection, user_id: &str) -> AppResult<Vec<CartItem>> {
        let mut stmt = conn.prepare(
            "SELECT id, user_id, product_id, amount, created_at, updated_at
             FROM cart_items WHERE user_id = ?1 ORDER BY created_at",
        )?;
        let rows = stmt.query_map(rusqlite::params![user_id], CartItem::from_row)?;
        let items: Result<Vec<_>, _> = rows.collect();
        Ok(items?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub images: Vec<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Product {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        let images_json: String = row.get(3)?;
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            price: row.get(2)?,
            images: serde_json::from_str(&images_json).unwrap_or_default(),
            created_at: row.get(4)?,
            updated_at: row.get(5)?,
        })
    }

    pub fn find(conn: &Connection, id: &str) -> AppResult<Option<Product>> {
        let result = conn.query_row(
            "SELECT id, title, price, images, created_at, updated_at
             FROM products WHERE id = ?1",
            rusqlite::params![id],
            Product::from_row,
        );
        match result {
            Ok(product) => Ok(Some(product)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }

    /// Category ids referenced by this product, in insertion order.
    pub fn category_ids(conn: &Connection, product_id: &str) -> AppResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT category_id FROM product_categories WHERE product_id = ?1 ORDER BY rowid",
        )?;
        let rows = stmt.query_map(rusqlite::params![product_id], |row| row.get(0))?;
        let ids: Result<Vec<String>, _> = rows.collect();
        Ok(ids?)
    }

    /// Titles of the categories that still resolve; dangling references
    /// are silently dropped from the result.
    pub fn category_titles(conn: &Connection, product_id: &str) -> AppResult<Vec<String>> {
        let mut stmt = conn.prepare(
            "SELECT c.title FROM categories c
             JOIN product_categories pc ON pc.category_id = c.id
             WHERE pc.product_id = ?1 ORDER BY pc.rowid",
        )?;
        let rows = stmt.query_map(rusqlite::params![product_id], |row| row.get(0))?;
        let titles: Result<Vec<String>, _> = rows.collect();
        Ok(titles?)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Category {
    pub id: String,
    pub title: String,
    pub img_src: Option<String>,
    pub created_at: String,
    pub updated_at: String,
}

impl Category {
    pub fn from_row(row: &Row) -> rusqlite::Result<Self> {
        Ok(Self {
            id: row.get(0)?,
            title: row.get(1)?,
            img_src: row.get(2)?,
            created_at: row.get(3)?,
            updated_at: row.get(4)?,
        })
    }

    pub fn find(conn: &Connection, id: &str) -> AppResult<Option<Category>> {
        let result = conn.query_row(
            "SELECT id, title, img_src, created_at, updated_at FROM categories WHERE id = ?1",
            rusqlite::params![id],
            Category::from_row,
        );
        match result {
            Ok(category) => Ok(Some(category)),
            Err(rusqlite::Error::QueryReturnedNoRows) => Ok(None),
            Err(e) => Err(AppError::Database(e)),
        }
    }
}
