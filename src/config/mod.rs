// src/config/mod.rs

//! Configuration loading and validation for bashq.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load a config file from disk (`loader.rs`).
//! - Validate values and turn them into typed settings (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, resolve_config_path};
pub use model::{
    ConfigFile, RawConfigFile, ServiceSection, ServiceSettings, StoreMode, StoreSection,
    TimingSection,
};
pub use validate::parse_duration;
