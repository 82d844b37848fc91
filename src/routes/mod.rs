use axum::Router;

use crate::state::AppState;

pub mod admin;
pub mod categories;
pub mod checkout;
pub mod crafters;
pub mod doc;
pub mod health;
pub mod orders;
pub mod params;
pub mod products;
pub mod search;
pub mod webhooks;

// Build the API router without binding state; it will be provided at the top level.
pub fn create_api_router() -> Router<AppState> {
    Router::new()
        .nest("/products", products::router())
        .nest("/crafters", crafters::router())
        .nest("/categories", categories::router())
        .nest("/search", search::router())
        .nest("/checkout", checkout::router())
        .nest("/orders", orders::router())
        .nest("/admin", admin::router())
        .nest("/webhooks", webhooks::router())
}
