//! Error types for the scan pipeline

use std::io;
use std::path::PathBuf;
use thiserror::Error;

/// Scan pipeline error type
#[derive(Error, Debug)]
pub enum ScanError {
    #[error("IO error: {0}")]
    Io(#[from] io::Error),

    #[error("failed to run {program}: {source}")]
    Spawn {
        program: &'static str,
        source: io::Error,
    },

    #[error("scanning page {page} failed: {detail}")]
    Capture { page: u32, detail: String },

    #[error("scanner produced no output for page {page}")]
    NoOutput { page: u32 },

    #[error("no page images found in {}", .0.display())]
    NoImages(PathBuf),

    #[error("PDF generation failed: {0}")]
    Convert(String),
}

/// Result type alias
pub type Result<T> = std::result::Result<T, ScanError>;
