//! Shared types, error model, and configuration for Vendorwatch.
//!
//! This crate is the foundation depended on by all other Vendorwatch crates.
//! It provides:
//! - [`VendorWatchError`] — the unified error type
//! - Domain types ([`VendorProfile`], [`NotesBundle`], [`ImageData`],
//!   [`SectionSpec`])
//! - Configuration ([`AppConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DefaultsConfig, OpenRouterConfig, TranscriptsConfig, UploadConfig, config_dir,
    config_file_path, db_path, expand_home, init_config, load_config, load_config_from,
    validate_api_key,
};
pub use error::{Result, VendorWatchError};
pub use types::{
    ImageData, NotesBundle, SectionSpec, SynthesisDepth, VendorProfile, sections_for,
};
