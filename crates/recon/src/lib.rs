//! `orderqa-recon`: data-quality and reconciliation engine for order extracts.
//!
//! Pure engine crate: receives raw tables through a [`SourceLoader`], returns
//! the issue report, the cleaned and review partitions, and the data marts.
//! No CLI or file-format dependencies.

pub mod config;
pub mod error;
pub mod identity;
pub mod marts;
pub mod model;
pub mod naming;
pub mod pipeline;
pub mod price;
pub mod quality;
pub mod reconcile;
pub mod report;
pub mod schema;

pub use config::PipelineConfig;
pub use error::ReconError;
pub use model::{RawTable, RecordSet, Value};
pub use pipeline::{run, FileState, PipelineOutput, RunSummary, SourceLoader};
pub use report::{IssueCategory, IssueExamples, IssueReport};
pub use schema::Schema;
