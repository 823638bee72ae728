pub mod auth_user;
pub mod handlers;
pub mod middleware;
