pub mod claim;
pub mod dto;
pub mod expiry;
pub mod handlers;
pub mod lifecycle;
pub mod memory;
pub mod query;
pub mod repo;
pub mod repo_types;
pub mod services;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::read_routes())
        .merge(handlers::write_routes())
}
