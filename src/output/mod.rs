//! Everything written to disk at the end of a run: assembled deliverable
//! documents, the persisted pipeline state, and the run summary pair.

pub mod document;
pub mod summary;

pub use document::{DocumentArtifact, Fragment};
pub use summary::{build_summary, write_summary, RunSummary};
