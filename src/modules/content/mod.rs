use axum::Router;
use axum::routing::{get, post, put};
use crate::state::AppState;
use axum::middleware;

pub mod handler;
pub mod dto;
pub mod error;
pub mod model;
pub mod ordering;
pub mod repository;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    let member_routes = Router::new()
        .route("/courses/{course_id}/sections", get(handler::list_sections))
        .route("/sections/{section_id}/items", get(handler::list_items))
        .route("/items/{item_id}", get(handler::get_item));

    let staff_routes = Router::new()
        .route("/courses/{course_id}/sections", post(handler::create_section))
        .route("/sections/{section_id}/items/order", put(handler::reorder_items))
        .route("/items/{item_id}", axum::routing::delete(handler::delete_item))
        .route_layer(middleware::from_fn(crate::middleware::role::staff_guard));

    member_routes
        .merge(staff_routes)
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware
        ))
}
