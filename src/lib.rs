pub mod commands;
pub mod compose;
pub mod config;
pub mod discovery;
pub mod document;
pub mod error;
pub mod geoip;
pub mod output;
pub mod probe;
pub mod provision;
pub mod retry;
pub mod secret;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
