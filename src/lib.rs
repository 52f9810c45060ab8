pub mod completion;
pub mod config;
pub mod db;
pub mod envelope;
pub mod error;
pub mod http_client;
pub mod models;
pub mod server;
pub mod services;

pub use config::Config;
pub use error::{AppError, AppResult};
