use crate::services::scanner::DEFAULT_MIN_PAYLOAD_LEN;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use std::time::Duration;

/// How a payload is written inside the document text.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum EncodingForm {
    /// `data:image/<type>;base64,<payload>`
    DataUri,
    /// `"<payload>"`
    RawQuoted,
}

/// One place in the text where a payload was matched.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadSpan {
    pub start: usize,
    pub end: usize,
    /// Only set for the data-URI form (`png`, `jpeg`, `jpg`).
    pub image_type: Option<String>,
}

/// A distinct payload and every span it occupies in the scanned text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PayloadOccurrence {
    pub form: EncodingForm,
    pub payload: String,
    pub spans: Vec<PayloadSpan>,
}

impl PayloadOccurrence {
    /// The exact text the scanner matched at `span`.
    pub fn matched_text(&self, span: &PayloadSpan) -> String {
        match self.form {
            EncodingForm::DataUri => format!(
                "data:image/{};base64,{}",
                span.image_type.as_deref().unwrap_or("png"),
                self.payload
            ),
            EncodingForm::RawQuoted => format!("\"{}\"", self.payload),
        }
    }

    /// Text that takes the place of a matched span once the payload lives at `url`.
    ///
    /// Data URIs collapse to the bare URL; quoted payloads keep their quotes.
    pub fn replacement(&self, url: &str) -> String {
        match self.form {
            EncodingForm::DataUri => url.to_string(),
            EncodingForm::RawQuoted => format!("\"{}\"", url),
        }
    }

    pub fn image_types(&self) -> Vec<String> {
        let mut types: Vec<String> = self
            .spans
            .iter()
            .filter_map(|s| s.image_type.clone())
            .collect();
        types.sort();
        types.dedup();
        types
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum DocumentOutcome {
    /// At least one payload was substituted and the file was rewritten.
    Persisted,
    /// Nothing was substituted; the file on disk is untouched.
    Unchanged,
    /// The document could not be read or written.
    Errored,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentReport {
    pub path: PathBuf,
    pub outcome: DocumentOutcome,
    /// Distinct payloads uploaded while processing this document.
    pub uploaded: usize,
    /// Payloads substituted with a URL already uploaded in an earlier pass.
    pub reused: usize,
    /// Failed uploads plus a document-level failure, if any.
    pub errors: usize,
}

impl DocumentReport {
    pub fn new(path: PathBuf) -> Self {
        Self {
            path,
            outcome: DocumentOutcome::Unchanged,
            uploaded: 0,
            reused: 0,
            errors: 0,
        }
    }
}

/// Totals for one run over a directory tree.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub documents_found: usize,
    pub documents_modified: usize,
    pub images_uploaded: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn absorb(&mut self, report: &DocumentReport) {
        if report.outcome == DocumentOutcome::Persisted {
            self.documents_modified += 1;
        }
        self.images_uploaded += report.uploaded;
        self.errors += report.errors;
    }
}

/// Remote repository the images are committed to.
#[derive(Debug, Clone)]
pub struct UploaderConfig {
    pub api_base: String,
    pub owner: String,
    pub repo: String,
    pub branch: String,
    pub token: String,
}

#[derive(Debug, Clone)]
pub struct PipelineConfig {
    /// Remote folder that receives the uploaded images.
    pub image_folder: String,
    /// Pause after every successful upload.
    pub throttle: Duration,
    pub min_payload_len: usize,
    /// Document file extension, without the dot.
    pub extension: String,
    /// Directory name skipped at any depth during traversal.
    pub excluded_dir: String,
}

impl Default for PipelineConfig {
    fn default() -> Self {
        Self {
            image_folder: "notebook_images".to_string(),
            throttle: Duration::from_millis(500),
            min_payload_len: DEFAULT_MIN_PAYLOAD_LEN,
            extension: "ipynb".to_string(),
            excluded_dir: ".ipynb_checkpoints".to_string(),
        }
    }
}

/// Dry-run view of a single payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PayloadSummary {
    pub form: EncodingForm,
    pub image_types: Vec<String>,
    pub payload_len: usize,
    pub filename: String,
    pub occurrences: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DocumentScan {
    pub path: PathBuf,
    pub payloads: Vec<PayloadSummary>,
    /// Set when the document could not be read.
    pub error: Option<String>,
}
