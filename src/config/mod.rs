//! Configuration module for Plan-Ville
//!
//! This module handles loading, parsing, and validating TOML configuration
//! files, and reading the provider credential from the environment.
//!
//! # Example
//!
//! ```no_run
//! use plan_ville::config::load_config;
//! use std::path::Path;
//!
//! let config = load_config(Path::new("config.toml")).unwrap();
//! println!("Batch size: {}", config.search.batch_size);
//! ```

mod parser;
mod types;
mod validation;

// Re-export types
pub use types::{AreaConfig, Config, CostConfig, GridConfig, OutputConfig, SearchConfig};

// Re-export parser functions
pub use parser::{
    compute_config_hash, load_api_key, load_config, load_config_with_hash, parse_config,
};
