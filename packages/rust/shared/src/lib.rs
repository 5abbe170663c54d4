//! Shared types, error model, and configuration for castgraph.
//!
//! This crate is the foundation depended on by all other castgraph crates.
//! It provides:
//! - [`CastGraphError`]: the unified error type
//! - Table row types ([`CharacterRecord`], [`RelationshipRecord`], [`EnrichedRelationshipRecord`])
//! - Configuration ([`AppConfig`], [`ScrapeConfig`], [`GraphConfig`], config loading)

pub mod config;
pub mod error;
pub mod types;

// Re-export public API at crate root for ergonomic imports.
pub use config::{
    AppConfig, DocumentConfig, FailurePolicy, FilesConfig, GraphConfig, GraphSettings,
    LayoutPolicy, PhysicsConfig, ScrapeConfig, ScrapeSettings, StressSettings, config_file_path,
    init_config, load_config, load_config_from,
};
pub use error::{CastGraphError, Result};
pub use types::{
    CharacterRecord, CharacterTable, EnrichedRelationshipRecord, MergedTable, Passthrough,
    RelationshipRecord, RelationshipTable, columns,
};
