pub mod handlers;
pub mod repo;
pub mod services;
pub mod trends;

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::routes()
}
