use std::sync::Arc;

use axum::{
    routing::{get, post},
    Router,
};

use shared_config::AppConfig;

use crate::handlers;

pub fn booking_routes(state: Arc<AppConfig>) -> Router {
    Router::new()
        .route(
            "/{preparer_id}/available-slots",
            get(handlers::get_available_slots),
        )
        .route("/{preparer_id}/conflicts", get(handlers::check_conflicts))
        .route(
            "/{preparer_id}/validate-slot",
            post(handlers::validate_booking_slot),
        )
        .route(
            "/{preparer_id}/next-available",
            get(handlers::get_next_available_slot),
        )
        .route(
            "/{preparer_id}/schedule",
            get(handlers::get_preparer_schedule),
        )
        .with_state(state)
}
