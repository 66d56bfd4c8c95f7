use crate::state::AppState;
use axum::Router;

mod claims;
pub mod credentials;
mod dto;
pub(crate) mod extractors;
pub mod gate;
pub mod handlers;
pub mod jwt;
pub mod password;
pub mod refresh;
pub mod session;

pub use dto::PublicUser;

pub fn router() -> Router<AppState> {
    Router::new().merge(handlers::auth_routes())
}
