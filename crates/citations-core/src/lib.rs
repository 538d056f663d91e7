//! Citations Core - Core types shared by the scanning pipeline and the index.

mod error;
mod types;

pub use error::{Error, Result};
pub use types::*;
