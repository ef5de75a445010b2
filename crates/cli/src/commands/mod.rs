pub mod ask;
pub mod config_cmd;
pub mod corpus;
pub mod doctor;
pub mod serve;

use std::path::Path;

use askbook_config::AppConfig;

/// Load the config from `path` if given, else from the default location.
pub fn load_config(path: Option<&Path>) -> Result<AppConfig, String> {
    match path {
        Some(path) => AppConfig::load_at(path),
        None => AppConfig::load(),
    }
    .map_err(|e| format!("Failed to load config: {e}"))
}
