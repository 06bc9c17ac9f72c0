mod auth;
mod health_check;

pub use auth::{login, refresh, register, revoke, update_user};
pub use health_check::health_check;
