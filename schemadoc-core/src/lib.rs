//! Core library for schemadoc.
//!
//! Generates HTML documentation for one database schema, or for every
//! populated schema of a connection that matches an inclusion pattern,
//! linked together by a landing page.
//!
//! # Architecture
//! A multi-schema run is a strictly sequential pipeline:
//! - [`discovery`] resolves which schemas to document
//! - [`jobs`] derives each schema's arguments from the run's own
//! - [`orchestrator`] dispatches one [`SchemaAnalyzer`] call per schema
//! - [`index`] writes the landing page through an [`IndexRenderer`]
//! - [`report`] times the run and prints the summary
//!
//! The database is reached only through a [`MetadataSource`], created from
//! the connection URL by [`create_metadata_source`].

pub mod analyzer;
pub mod config;
pub mod discovery;
pub mod error;
pub mod index;
pub mod jobs;
pub mod logging;
pub mod metadata;
pub mod orchestrator;
pub mod output;
pub mod render;
pub mod report;

// Re-export commonly used types
pub use analyzer::{AnalyzedSchema, HtmlSchemaAnalyzer, SchemaAnalyzer};
pub use config::Config;
pub use discovery::{InclusionPattern, discover};
pub use error::{Result, SchemaDocError};
pub use index::write_index;
pub use jobs::{PerSchemaJob, RunArgumentTemplate, derive_template};
pub use metadata::{
    DatabaseType, MetadataSource, ProductInfo, TableKind, TableSummary, create_metadata_source,
};
pub use orchestrator::{MultiSchemaAnalyzer, RunContext, SchemaOutcome, run_jobs};
pub use output::LineWriter;
pub use render::{HtmlIndexRenderer, IndexRenderer};
pub use report::{RunSummary, RunTimer};
