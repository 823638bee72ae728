pub mod config;
pub mod errors;
pub mod repository;
pub mod result;
pub mod util;

pub use repository::*;

pub type AppResult<T> = Result<T, errors::AppError>;
