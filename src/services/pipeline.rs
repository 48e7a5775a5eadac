use crate::error::Result;
use crate::services::addresser::ContentAddresser;
use crate::services::finder::DocumentFinder;
use crate::services::scanner::PayloadScanner;
use crate::services::substituter::Substituter;
use crate::services::uploader::ImageUploader;
use crate::types::{
    DocumentOutcome, DocumentReport, DocumentScan, PayloadOccurrence, PayloadSummary,
    PipelineConfig, RunSummary,
};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tokio::fs;
use tracing::{debug, error, info, warn};

/// Per-document bookkeeping, shared by the data-URI and quoted passes.
#[derive(Default)]
struct PassState {
    /// Payload text -> URL it was uploaded to.
    uploaded: HashMap<String, String>,
    /// Payloads whose upload failed. A payload that failed as a data URI is
    /// not tried again when its quoted form comes up in the second pass.
    failed: HashSet<String>,
}

/// Finds documents, uploads their inline images one at a time and rewrites
/// each document to point at the uploaded copies.
pub struct NotebookPipeline<U: ImageUploader> {
    uploader: U,
    scanner: PayloadScanner,
    config: PipelineConfig,
}

impl<U: ImageUploader> NotebookPipeline<U> {
    pub fn new(uploader: U, config: PipelineConfig) -> Result<Self> {
        let scanner = PayloadScanner::new(config.min_payload_len)?;
        Ok(Self {
            uploader,
            scanner,
            config,
        })
    }

    pub fn uploader(&self) -> &U {
        &self.uploader
    }

    /// Process every document under `root` sequentially.
    ///
    /// Only a missing root aborts the run; per-document failures are folded
    /// into the returned summary.
    pub async fn process_all(&self, root: &Path) -> Result<RunSummary> {
        let discovery =
            DocumentFinder::find_documents(root, &self.config.extension, &self.config.excluded_dir)?;

        let mut summary = RunSummary {
            documents_found: discovery.documents.len(),
            errors: discovery.walk_errors,
            ..RunSummary::default()
        };

        if discovery.documents.is_empty() {
            info!("No .{} files found under {}", self.config.extension, root.display());
            return Ok(summary);
        }

        info!("Found {} documents under {}", summary.documents_found, root.display());

        for (idx, path) in discovery.documents.iter().enumerate() {
            info!("Processing document {}/{}: {}", idx + 1, summary.documents_found, path.display());
            let report = self.process_document(path).await;
            summary.absorb(&report);
        }

        info!(
            "Finished: {} documents modified, {} images uploaded, {} errors",
            summary.documents_modified, summary.images_uploaded, summary.errors
        );
        Ok(summary)
    }

    /// Process a single document. Never fails; failures are recorded in the report.
    pub async fn process_document(&self, path: &Path) -> DocumentReport {
        let mut report = DocumentReport::new(path.to_path_buf());

        if let Err(e) = self.rewrite_document(path, &mut report).await {
            error!("Failed to process {}: {}", path.display(), e);
            report.outcome = DocumentOutcome::Errored;
            report.errors += 1;
        }

        report
    }

    async fn rewrite_document(&self, path: &Path, report: &mut DocumentReport) -> Result<()> {
        let original = fs::read_to_string(path).await?;
        let mut state = PassState::default();

        let data_uris = self.scanner.scan_data_uris(&original);
        let (text, from_data_uris) = self.run_pass(&original, &data_uris, &mut state, report).await?;

        let quoted = self.scanner.scan_raw_quoted(&text);
        let (text, from_quoted) = self.run_pass(&text, &quoted, &mut state, report).await?;

        if data_uris.is_empty() && quoted.is_empty() {
            info!("  No embedded images");
            return Ok(());
        }

        if from_data_uris + from_quoted == 0 {
            warn!("  No payload could be replaced; leaving {} untouched", path.display());
            return Ok(());
        }

        fs::write(path, text).await?;
        report.outcome = DocumentOutcome::Persisted;
        info!(
            "  Rewrote {} ({} uploaded, {} reused)",
            path.display(),
            report.uploaded,
            report.reused
        );
        Ok(())
    }

    /// Upload what still needs a URL, then substitute every resolved
    /// occurrence. Returns the new text and how many occurrences were replaced.
    async fn run_pass(
        &self,
        text: &str,
        occurrences: &[PayloadOccurrence],
        state: &mut PassState,
        report: &mut DocumentReport,
    ) -> Result<(String, usize)> {
        let total = occurrences.len();
        let mut resolved: Vec<(&PayloadOccurrence, String)> = Vec::new();

        for (idx, occurrence) in occurrences.iter().enumerate() {
            if let Some(url) = state.uploaded.get(&occurrence.payload) {
                debug!("  [{}/{}] Reusing {}", idx + 1, total, url);
                report.reused += 1;
                resolved.push((occurrence, url.clone()));
                continue;
            }
            if state.failed.contains(&occurrence.payload) {
                continue;
            }

            let destination =
                ContentAddresser::destination_for(&self.config.image_folder, &occurrence.payload);
            info!("  [{}/{}] Uploading {}", idx + 1, total, destination);

            match self.uploader.upload(&occurrence.payload, &destination).await {
                Ok(url) => {
                    report.uploaded += 1;
                    state.uploaded.insert(occurrence.payload.clone(), url.clone());
                    resolved.push((occurrence, url));
                    if !self.config.throttle.is_zero() {
                        tokio::time::sleep(self.config.throttle).await;
                    }
                }
                Err(e) => {
                    warn!("  [{}/{}] Upload of {} failed: {}", idx + 1, total, destination, e);
                    report.errors += 1;
                    state.failed.insert(occurrence.payload.clone());
                }
            }
        }

        let pairs: Vec<(&PayloadOccurrence, &str)> =
            resolved.iter().map(|(o, url)| (*o, url.as_str())).collect();
        let text = Substituter::substitute_all(text, &pairs)?;
        Ok((text, resolved.len()))
    }
}

/// Dry run: report the payloads of every document under `root` without
/// uploading or writing anything. Unreadable documents are reported with
/// their error and no payloads.
pub async fn scan_tree(root: &Path, config: &PipelineConfig) -> Result<Vec<DocumentScan>> {
    let scanner = PayloadScanner::new(config.min_payload_len)?;
    let discovery = DocumentFinder::find_documents(root, &config.extension, &config.excluded_dir)?;
    let mut scans = Vec::new();

    for path in discovery.documents {
        let text = match fs::read_to_string(&path).await {
            Ok(text) => text,
            Err(e) => {
                warn!("Cannot read {}: {}", path.display(), e);
                scans.push(DocumentScan {
                    path,
                    payloads: Vec::new(),
                    error: Some(e.to_string()),
                });
                continue;
            }
        };

        let payloads = scanner
            .scan(&text)
            .iter()
            .map(|occurrence| PayloadSummary {
                form: occurrence.form,
                image_types: occurrence.image_types(),
                payload_len: occurrence.payload.len(),
                filename: ContentAddresser::filename_for(&occurrence.payload),
                occurrences: occurrence.spans.len(),
            })
            .collect();

        scans.push(DocumentScan {
            path,
            payloads,
            error: None,
        });
    }

    Ok(scans)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::NotebookImageError;
    use async_trait::async_trait;
    use std::sync::Mutex;
    use std::time::Duration;
    use tempfile::TempDir;

    struct CountingUploader {
        calls: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl ImageUploader for CountingUploader {
        async fn upload(&self, _payload: &str, destination: &str) -> Result<String> {
            self.calls.lock().unwrap().push(destination.to_string());
            if destination.contains("fail") {
                return Err(NotebookImageError::UploadRejected {
                    status: 500,
                    body: "boom".to_string(),
                });
            }
            Ok(format!("https://cdn.example/{}", destination))
        }
    }

    fn config() -> PipelineConfig {
        PipelineConfig {
            throttle: Duration::ZERO,
            ..PipelineConfig::default()
        }
    }

    #[tokio::test]
    async fn test_unreadable_document_is_counted() {
        let dir = TempDir::new().unwrap();
        let pipeline = NotebookPipeline::new(
            CountingUploader {
                calls: Mutex::new(Vec::new()),
            },
            config(),
        )
        .unwrap();

        let report = pipeline.process_document(&dir.path().join("missing.ipynb")).await;
        assert_eq!(report.outcome, DocumentOutcome::Errored);
        assert_eq!(report.errors, 1);
        assert!(pipeline.uploader().calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_destination_uses_image_folder() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nb.ipynb");
        let payload = "QUJD".repeat(60);
        std::fs::write(&path, format!("[\"{}\"]", payload)).unwrap();

        let pipeline = NotebookPipeline::new(
            CountingUploader {
                calls: Mutex::new(Vec::new()),
            },
            PipelineConfig {
                image_folder: "assets/img".to_string(),
                ..config()
            },
        )
        .unwrap();

        let report = pipeline.process_document(&path).await;
        assert_eq!(report.outcome, DocumentOutcome::Persisted);
        let calls = pipeline.uploader().calls.lock().unwrap().clone();
        assert_eq!(
            calls,
            vec![format!("assets/img/{}", ContentAddresser::filename_for(&payload))]
        );
    }

    #[tokio::test]
    async fn test_scan_tree_reports_without_writing() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nb.ipynb");
        let payload = "QUJD".repeat(60);
        let content = format!(
            "[\"data:image/jpeg;base64,{p}\", \"{p}\", \"{p}\"]",
            p = payload
        );
        std::fs::write(&path, &content).unwrap();

        let scans = scan_tree(dir.path(), &config()).await.unwrap();
        assert_eq!(scans.len(), 1);
        let payloads = &scans[0].payloads;
        assert_eq!(payloads.len(), 2);
        assert_eq!(payloads[0].image_types, vec!["jpeg".to_string()]);
        assert_eq!(payloads[1].occurrences, 2);
        assert_eq!(payloads[0].filename, payloads[1].filename);
        assert!(scans[0].error.is_none());
        assert_eq!(std::fs::read_to_string(&path).unwrap(), content);
    }

    #[tokio::test]
    async fn test_scan_tree_reports_unreadable_document() {
        let dir = TempDir::new().unwrap();
        std::fs::write(dir.path().join("a.ipynb"), "{}").unwrap();
        std::fs::write(dir.path().join("b.ipynb"), [0xff, 0xfe, 0x00, 0x80]).unwrap();

        let scans = scan_tree(dir.path(), &config()).await.unwrap();
        assert_eq!(scans.len(), 2);
        assert!(scans[0].error.is_none());
        assert_eq!(scans[1].path, dir.path().join("b.ipynb"));
        assert!(scans[1].error.is_some());
        assert!(scans[1].payloads.is_empty());
    }
}
