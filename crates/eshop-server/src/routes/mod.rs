mod auth;
mod cart;
mod categories;
mod products;

use axum::{
    middleware,
    routing::{delete, get, patch, post},
    Router,
};
use tower_http::services::ServeDir;

use crate::auth::middleware::{require_admin, require_auth, require_user};
use crate::config::Config;
use crate::db::DbPool;

#[derive(Clone)]
pub struct AppState {
    pub db: DbPool,
    pub config: Config,
}

async fn health() -> &'static str {
    "ok"
}

pub fn create_router(state: AppState) -> Router {
    let public = Router::new()
        .route("/health", get(health))
        .route("/api/auth/check-email", get(auth::check_email))
        .route("/api/auth/login", post(auth::login))
        .route("/api/auth/register", post(auth::register))
        .route("/api/categories", get(categories::list))
        .route("/api/categories/{id}", get(categories::get))
        .route("/api/products", get(products::list))
        .route("/api/products/{id}", get(products::get));

    // Token-gated account endpoints
    let authed = Router::new()
        .route("/api/auth/authenticate", post(auth::authenticate))
        .route("/api/auth/update-user", patch(auth::update_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Cart endpoints additionally load the authenticated user's row
    let cart = Router::new()
        .route("/api/cart", get(cart::get_cart))
        .route("/api/cart/add-item", post(cart::add_item))
        .route("/api/cart/update-item/{item_id}", patch(cart::update_item))
        .route("/api/cart/delete-item/{item_id}", delete(cart::delete_item))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_user))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    // Catalog writes are admin-only
    let admin = Router::new()
        .route("/api/categories", post(categories::create))
        .route(
            "/api/categories/{id}",
            patch(categories::update).delete(categories::delete),
        )
        .route("/api/products", post(products::create))
        .route(
            "/api/products/{id}",
            patch(products::update).delete(products::delete),
        )
        .route_layer(middleware::from_fn(require_admin))
        .route_layer(middleware::from_fn_with_state(state.clone(), require_auth));

    Router::new()
        .merge(public)
        .merge(authed)
        .merge(cart)
        .merge(admin)
        .nest_service("/images", ServeDir::new(&state.config.upload_dir))
        .with_state(state)
}
