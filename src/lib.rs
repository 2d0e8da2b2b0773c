pub mod app;
pub mod commands;
pub mod error;
pub mod models;
pub mod services;

pub use app::App;
pub use error::{Error, Result};

/// Version string shown in the welcome notice and status output
pub const APP_VERSION: &str = concat!("v", env!("CARGO_PKG_VERSION"));
