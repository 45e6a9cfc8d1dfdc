//! Error types for shale operations.

use std::path::PathBuf;

use thiserror::Error;

/// Errors that can occur while parsing sources or building a site.
#[derive(Error, Debug)]
pub enum Error {
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("invalid frontmatter YAML: {0}")]
    Frontmatter(String),

    #[error("frontmatter validation failed:\n{}", .0.join("\n"))]
    FrontmatterInvalid(Vec<String>),

    #[error("no index.md found in {0}")]
    MissingIndex(PathBuf),

    #[error("category '{category}': {reason}")]
    InvalidCategory { category: String, reason: String },

    #[error("template not found: {0}")]
    MissingTemplate(PathBuf),

    #[error("HTML output requires a template (-T/--template)")]
    TemplateRequired,

    #[error("output file {0} does not exist (use 'page' to create it)")]
    OutputMissing(PathBuf),

    #[error("unsupported format: {0}")]
    UnsupportedFormat(String),

    #[error("no build metadata found in {0} (specify the input file)")]
    MissingMetadata(PathBuf),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),
}

pub type Result<T> = std::result::Result<T, Error>;
