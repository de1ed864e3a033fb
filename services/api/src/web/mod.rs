pub mod assist;
pub mod auth;
pub mod errors;
pub mod images;
pub mod middleware;
pub mod rescue;
pub mod rest;
pub mod state;

pub use middleware::require_auth;
pub use state::AppState;
