mod form_sessions;
mod health;
mod products;

use axum::{
    Router,
    routing::{delete, get, post, put},
};

use crate::AppState;

pub fn create_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health::health_check))
        .route("/health/ready", get(health::readiness_check))
        .route("/products", get(products::list_products))
        .nest("/admin/products", product_routes())
}

fn product_routes() -> Router<AppState> {
    Router::new()
        .route(
            "/",
            get(products::list_products).post(products::create_product),
        )
        .route("/resource", get(products::get_resource))
        .route("/bulk-delete", post(products::bulk_delete_products))
        .route("/reorder", post(products::reorder_products))
        .route(
            "/{id}",
            get(products::get_product)
                .put(products::update_product)
                .delete(products::delete_product),
        )
        .route("/{id}/images", post(products::upload_product_images))
        .route("/{id}/images/{file}", delete(products::delete_product_image))
        .route("/form-sessions", post(form_sessions::open_form_session))
        .route(
            "/form-sessions/{id}",
            get(form_sessions::get_form_session).delete(form_sessions::close_form_session),
        )
        .route(
            "/form-sessions/{id}/search-query",
            put(form_sessions::update_search_query),
        )
}
