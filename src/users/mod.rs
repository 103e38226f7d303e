use crate::state::AppState;
use axum::Router;

mod dto;
mod error;
pub mod handlers;
mod memory;
mod model;
mod repo;
pub mod services;

pub use error::UserError;
pub use memory::MemoryUserStore;
pub use model::UserProfile;
pub use repo::{NewUser, PgUserStore, UserStore};

pub fn router() -> Router<AppState> {
    handlers::user_routes()
}
