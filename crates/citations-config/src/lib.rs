//! Citations Config - Persisted configuration and scan watermark.

mod config;
mod error;
mod paths;
mod store;

pub use config::*;
pub use error::{ConfigError, ConfigResult};
pub use paths::AppPaths;
pub use store::ConfigStore;
