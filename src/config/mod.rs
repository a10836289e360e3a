//! Configuration module
//!
//! Flat settings record supplied wholesale by the host, plus the built-in
//! mode presets.

pub mod settings;

pub use settings::Settings;
