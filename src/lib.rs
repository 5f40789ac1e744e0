pub mod config;
pub mod error;
pub mod routes;
pub mod server;
pub mod storage;
pub mod utils;
pub mod verification;

pub use config::Config;
pub use error::{AppError, Result};
