// src/config/mod.rs

//! Configuration loading and validation for taskshim.
//!
//! Responsibilities:
//! - Define the TOML-backed data model (`model.rs`).
//! - Load an optional config file from disk (`loader.rs`).
//! - Apply defaults and check limits (`validate.rs`).

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{load_and_validate, load_from_path, load_optional};
pub use model::{
    ConfigFile, InterruptionConfig, RawConfigFile, RawInterruptionSection, RawTaskSection,
    TaskDefinition,
};
