pub mod analysis;
pub mod chart;
pub mod config;
pub mod dataset;
pub mod loader;

/// Export file extensions we can read
pub const SUPPORTED_FORMATS: &[&str] = &["csv", "json"];

/// Application name for XDG paths
pub const APP_NAME: &str = "tastemap";
