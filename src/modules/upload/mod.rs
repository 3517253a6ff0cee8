use axum::Router;
use axum::routing::{get, post};
use crate::state::AppState;
use axum::middleware;

pub mod coordinator;
pub mod dto;
pub mod error;
pub mod handler;
pub mod model;
pub mod poller;
pub mod ports;
pub mod progress;
pub mod registry;
pub mod service;

pub fn router(state: AppState) -> axum::Router<AppState> {
    Router::new()
        .route(
            "/courses/{course_id}/sections/{section_id}/uploads",
            post(handler::start_upload),
        )
        .route(
            "/uploads/{upload_id}",
            get(handler::get_upload).delete(handler::cancel_upload),
        )
        .route_layer(middleware::from_fn(crate::middleware::role::staff_guard))
        .route_layer(middleware::from_fn_with_state(
            state,
            crate::middleware::auth::auth_middleware
        ))
}
