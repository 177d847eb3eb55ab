//! View-model creators: pure projections from stored rows to the public
//! API shapes. The password hash never passes through this layer.

use serde::Serialize;

use crate::config::Config;
use crate::models::{CartItem, Category, Product, User};

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub email: String,
    pub role: String,
    pub cart_items: Vec<CartItemView>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub surname: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img: Option<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemView {
    pub id: String,
    pub product_id: String,
    pub amount: i64,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CartItemPopulatedView {
    pub id: String,
    pub product: ProductView,
    pub amount: i64,
    pub updated_at: String,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductView {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub updated_at: String,
    pub category_ids: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ProductPopulatedView {
    pub id: String,
    pub title: String,
    pub price: f64,
    pub updated_at: String,
    pub categories: Vec<String>,
    pub images: Vec<String>,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CategoryView {
    pub id: String,
    pub title: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub img_src: Option<String>,
    pub updated_at: String,
}

pub fn user_view(user: &User, cart_items: &[CartItem], config: &Config) -> UserView {
    UserView {
        id: user.id.clone(),
        email: user.email.clone(),
        role: user.role.clone(),
        cart_items: cart_items.iter().map(cart_item_view).collect(),
        name: user.name.clone(),
        surname: user.surname.clone(),
        // Stored paths are relative; clients get an absolute URL
        img: user.img.as_ref().map(|img| {
            format!("{}/{}", config.server_domain, img).replace('\\', "/")
        }),
    }
}

pub fn cart_item_view(item: &CartItem) -> CartItemView {
    CartItemView {
        id: item.id.clone(),
        product_id: item.product_id.clone(),
        amount: item.amount,
        updated_at: item.updated_at.clone(),
    }
}

pub fn cart_item_populated_view(item: &CartItem, product: ProductView) -> CartItemPopulatedView {
    CartItemPopulatedView {
        id: item.id.clone(),
        product,
        amount: item.amount,
        updated_at: item.updated_at.clone(),
    }
}

pub fn product_view(product: &Product, category_ids: Vec<String>) -> ProductView {
    ProductView {
        id: product.id.clone(),
        title: product.title.clone(),
        price: product.price,
        updated_at: product.updated_at.clone(),
        category_ids,
        images: product.images.clone(),
    }
}

pub fn product_populated_view(product: &Product, categories: Vec<String>) -> ProductPopulatedView {
    ProductPopulatedView {
        id: product.id.clone(),
        title: product.title.clone(),
        price: product.price,
        updated_at: product.updated_at.clone(),
        categories,
        images: product.images.clone(),
    }
}

pub fn category_view(category: &Category) -> CategoryView {
    CategoryView {
        id: category.id.clone(),
        title: category.title.clone(),
        img_src: category.img_src.clone(),
        updated_at: category.updated_at.clone(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn test_config() -> Config {
        Config {
            server_port: 1337,
            sqlite_path: ":memory:".to_string(),
            token_secret: "secret".to_string(),
            server_domain: "http://localhost:1337".to_string(),
            upload_dir: "./public/images".to_string(),
            cors_origin: "*".to_string(),
        }
    }

    fn test_user() -> User {
        User {
            id: "u1".to_string(),
            email: "a@b.lt".to_string(),
            password_hash: "$argon2id$secret".to_string(),
            role: "user".to_string(),
            name: Some("Jonas".to_string()),
            surname: None,
            img: Some("images\\jonas-img-1.png".to_string()),
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        }
    }

    #[test]
    fn user_view_never_serializes_password_hash() {
        let view = user_view(&test_user(), &[], &test_config());
        let json = serde_json::to_value(&view).unwrap();
        assert!(json.get("passwordHash").is_none());
        assert!(json.get("password_hash").is_none());
        assert_eq!(json["email"], "a@b.lt");
    }

    #[test]
    fn user_view_builds_absolute_img_url_with_forward_slashes() {
        let view = user_view(&test_user(), &[], &test_config());
        assert_eq!(
            view.img.as_deref(),
            Some("http://localhost:1337/images/jonas-img-1.png")
        );
    }

    #[test]
    fn user_view_omits_missing_optional_fields() {
        let mut user = test_user();
        user.img = None;
        user.name = None;
        let json = serde_json::to_value(user_view(&user, &[], &test_config())).unwrap();
        assert!(json.get("img").is_none());
        assert!(json.get("name").is_none());
        assert!(json.get("surname").is_none());
    }

    #[test]
    fn cart_item_view_uses_camel_case_keys() {
        let item = CartItem {
            id: "c1".to_string(),
            user_id: "u1".to_string(),
            product_id: "p1".to_string(),
            amount: 2,
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-02T00:00:00.000Z".to_string(),
        };
        let json = serde_json::to_value(cart_item_view(&item)).unwrap();
        assert_eq!(json["productId"], "p1");
        assert_eq!(json["updatedAt"], "2024-01-02T00:00:00.000Z");
        assert_eq!(json["amount"], 2);
    }

    #[test]
    fn populated_product_view_carries_titles_not_ids() {
        let product = Product {
            id: "p1".to_string(),
            title: "Stalas".to_string(),
            price: 99.5,
            images: vec!["images/stalas.png".to_string()],
            created_at: "2024-01-01T00:00:00.000Z".to_string(),
            updated_at: "2024-01-01T00:00:00.000Z".to_string(),
        };
        let view = product_populated_view(&product, vec!["Baldai".to_string()]);
        let json = serde_json::to_value(&view).unwrap();
        assert_eq!(json["categories"][0], "Baldai");
        assert!(json.get("categoryIds").is_none());
    }
}
