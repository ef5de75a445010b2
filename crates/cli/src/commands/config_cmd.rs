//! `askbook config`: Print the default configuration.

use askbook_config::AppConfig;

pub fn show() {
    println!("# Default config — save as {}", AppConfig::config_dir().join("config.toml").display());
    println!();
    print!("{}", AppConfig::default_toml());
}
