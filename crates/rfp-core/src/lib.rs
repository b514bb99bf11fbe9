/// Core library for the RFP/RFI response generation pipeline.
///
/// This crate contains the document parser set, chunker, structured
/// extractors, spreadsheet questionnaire engine, RAG answer generator,
/// compliance scorer, artifact builders, persistence layer, and the
/// pipeline orchestrator that ties them together. The HTTP surface,
/// authentication, and schema migrations are intentionally kept outside
/// this crate; it is consumed by a thin server/CLI that owns those
/// concerns.
pub mod artifacts;
pub mod blob;
pub mod chunking;
pub mod classifier;
pub mod config;
pub mod dedupe;
pub mod embedding;
pub mod error;
pub mod extraction;
pub mod generator;
pub mod llm;
pub mod models;
pub mod parsers;
pub mod pipeline;
pub mod plan;
pub mod retrieval;
pub mod scoring;
pub mod spreadsheet;
pub mod storage;

pub use error::*;

/// Returns the version of the rfp-core library.
pub fn version() -> &'static str {
    env!("CARGO_PKG_VERSION")
}
