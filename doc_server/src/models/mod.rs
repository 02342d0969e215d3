//! Data models for the document processor.

pub mod job;
pub mod output_file;
