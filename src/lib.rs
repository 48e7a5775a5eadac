//! # Notebook Image Uploader
//!
//! Finds base64 images embedded in notebook files, uploads each distinct
//! image to a GitHub repository and rewrites the notebook to reference the
//! uploaded copy instead of the inline payload.
//!
//! ## Example Usage
//!
//! ```rust,no_run
//! use notebook_image_uploader::{GitHubUploader, NotebookPipeline, PipelineConfig, UploaderConfig};
//! use std::path::Path;
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let uploader = GitHubUploader::new(UploaderConfig {
//!         api_base: "https://api.github.com".to_string(),
//!         owner: "me".to_string(),
//!         repo: "notebook-assets".to_string(),
//!         branch: "main".to_string(),
//!         token: GitHubUploader::token_from_env("GITHUB_TOKEN")?,
//!     })?;
//!
//!     let pipeline = NotebookPipeline::new(uploader, PipelineConfig::default())?;
//!     let summary = pipeline.process_all(Path::new(".")).await?;
//!
//!     println!("{} images uploaded", summary.images_uploaded);
//!     Ok(())
//! }
//! ```

pub mod error;
pub mod services;
pub mod types;

pub use error::{NotebookImageError, Result};
pub use services::{
    scan_tree, ContentAddresser, DocumentFinder, GitHubUploader, ImageUploader, NotebookPipeline,
    PayloadScanner, Substituter,
};
pub use types::{
    DocumentOutcome, DocumentReport, DocumentScan, EncodingForm, PayloadOccurrence, PayloadSpan,
    PayloadSummary, PipelineConfig, RunSummary, UploaderConfig,
};

/// Version information
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
