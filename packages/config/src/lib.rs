// ABOUTME: Configuration and environment variable management for sdlcgen
// ABOUTME: Environment names plus typed settings with defaults and validation

pub mod constants;
mod settings;

pub use settings::{check_probability, ConfigError, Settings};
