/// TOML configuration file parsing and validation.
pub mod toml_config;
