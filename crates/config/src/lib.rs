//! Configuration loading, validation, env substitution, and live reload.
//!
//! Config files: `switchboard.toml`, `switchboard.yaml`, or `switchboard.json`
//! Searched in `./` then `~/.config/switchboard/`.
//!
//! Supports `${ENV_VAR}` substitution in all string values.

pub mod env_subst;
pub mod error;
pub mod handle;
pub mod loader;
pub mod schema;
pub mod validate;

pub use {
    error::{Error, Result},
    handle::ConfigHandle,
    loader::{config_dir, data_dir, discover_and_load, find_config_file, load_config},
    schema::{
        DispatchConfig, MenuEntry, MenuTitle, MetricsConfig, RouterConfig, StoreBackend,
        StoreConfig, SwitchboardConfig,
    },
    validate::{Diagnostic, Severity, ValidationResult},
};
