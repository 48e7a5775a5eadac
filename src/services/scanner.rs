use crate::error::{NotebookImageError, Result};
use crate::types::{EncodingForm, PayloadOccurrence, PayloadSpan};
use regex::{Captures, Regex};
use std::collections::HashMap;
use tracing::debug;

/// Shortest base64 run treated as an image. Shorter runs are usually ids or hashes.
pub const DEFAULT_MIN_PAYLOAD_LEN: usize = 200;

pub struct PayloadScanner {
    data_uri_pattern: Regex,
    raw_quoted_pattern: Regex,
}

impl PayloadScanner {
    pub fn new(min_payload_len: usize) -> Result<Self> {
        if min_payload_len == 0 {
            return Err(NotebookImageError::Pattern {
                reason: "Minimum payload length must be greater than 0".to_string(),
            });
        }

        let run = format!(r"[A-Za-z0-9+/]{{{},}}={{0,2}}", min_payload_len);
        let data_uri_pattern = Self::compile(&format!(
            r"data:image/(png|jpeg|jpg);base64,({})",
            run
        ))?;
        let raw_quoted_pattern = Self::compile(&format!(r#""({})""#, run))?;

        Ok(Self {
            data_uri_pattern,
            raw_quoted_pattern,
        })
    }

    fn compile(pattern: &str) -> Result<Regex> {
        Regex::new(pattern).map_err(|e| NotebookImageError::Pattern {
            reason: format!("Failed to compile '{}': {}", pattern, e),
        })
    }

    /// Distinct `data:image/...;base64,...` payloads, in order of first appearance.
    pub fn scan_data_uris(&self, text: &str) -> Vec<PayloadOccurrence> {
        let occurrences = Self::collect(&self.data_uri_pattern, EncodingForm::DataUri, text, |caps| {
            let image_type = caps.get(1).map(|m| m.as_str().to_string());
            caps.get(2).map(|m| (m.as_str(), image_type))
        });
        debug!("Found {} distinct data-URI payloads", occurrences.len());
        occurrences
    }

    /// Distinct `"<base64>"` payloads, in order of first appearance.
    pub fn scan_raw_quoted(&self, text: &str) -> Vec<PayloadOccurrence> {
        let occurrences = Self::collect(&self.raw_quoted_pattern, EncodingForm::RawQuoted, text, |caps| {
            caps.get(1).map(|m| (m.as_str(), None))
        });
        debug!("Found {} distinct quoted payloads", occurrences.len());
        occurrences
    }

    /// Both forms over the same text: data URIs first, then quoted payloads.
    pub fn scan(&self, text: &str) -> Vec<PayloadOccurrence> {
        let mut occurrences = self.scan_data_uris(text);
        occurrences.extend(self.scan_raw_quoted(text));
        occurrences
    }

    fn collect<'t, F>(
        pattern: &Regex,
        form: EncodingForm,
        text: &'t str,
        extract: F,
    ) -> Vec<PayloadOccurrence>
    where
        F: Fn(&Captures<'t>) -> Option<(&'t str, Option<String>)>,
    {
        let mut occurrences: Vec<PayloadOccurrence> = Vec::new();
        let mut index: HashMap<&'t str, usize> = HashMap::new();

        for caps in pattern.captures_iter(text) {
            let (Some(whole), Some((payload, image_type))) = (caps.get(0), extract(&caps)) else {
                continue;
            };
            let span = PayloadSpan {
                start: whole.start(),
                end: whole.end(),
                image_type,
            };

            match index.get(payload) {
                Some(&idx) => occurrences[idx].spans.push(span),
                None => {
                    index.insert(payload, occurrences.len());
                    occurrences.push(PayloadOccurrence {
                        form,
                        payload: payload.to_string(),
                        spans: vec![span],
                    });
                }
            }
        }

        occurrences
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn scanner() -> PayloadScanner {
        PayloadScanner::new(DEFAULT_MIN_PAYLOAD_LEN).unwrap()
    }

    fn run(len: usize) -> String {
        "QUJD".repeat(len / 4 + 1)[..len].to_string()
    }

    #[test]
    fn test_data_uri_match() {
        let payload = run(240);
        let text = format!(r#"{{"src": "data:image/png;base64,{}"}}"#, payload);
        let scanner = scanner();

        let found = scanner.scan_data_uris(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].form, EncodingForm::DataUri);
        assert_eq!(found[0].payload, payload);
        let span = &found[0].spans[0];
        assert_eq!(span.image_type.as_deref(), Some("png"));
        assert_eq!(&text[span.start..span.end], found[0].matched_text(span));
    }

    #[test]
    fn test_minimum_length_boundary() {
        let scanner = scanner();

        let short = format!("\"{}\" data:image/jpeg;base64,{}", run(199), run(199));
        assert!(scanner.scan(&short).is_empty());

        let exact = format!("\"{}\" data:image/jpeg;base64,{}", run(200), run(200));
        let found = scanner.scan(&exact);
        assert_eq!(found.len(), 2);
        assert!(found.iter().all(|o| o.payload.len() == 200));
    }

    #[test]
    fn test_padding_is_part_of_payload() {
        let payload = format!("{}==", run(220));
        let text = format!("\"{}\"", payload);
        let found = scanner().scan_raw_quoted(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].payload, payload);
    }

    #[test]
    fn test_duplicates_are_grouped() {
        let payload = run(300);
        let text = format!("[\"{p}\", \"{p}\", \"{q}\"]", p = payload, q = run(260));
        let found = scanner().scan_raw_quoted(&text);
        assert_eq!(found.len(), 2);
        assert_eq!(found[0].payload, payload);
        assert_eq!(found[0].spans.len(), 2);
        assert_eq!(found[1].spans.len(), 1);
    }

    #[test]
    fn test_type_variants_share_one_occurrence() {
        let payload = run(256);
        let text = format!(
            "data:image/png;base64,{p} and data:image/jpg;base64,{p}",
            p = payload
        );
        let found = scanner().scan_data_uris(&text);
        assert_eq!(found.len(), 1);
        assert_eq!(found[0].image_types(), vec!["jpg".to_string(), "png".to_string()]);
        for span in &found[0].spans {
            assert_eq!(&text[span.start..span.end], found[0].matched_text(span));
        }
    }

    #[test]
    fn test_data_uri_is_not_a_quoted_payload() {
        let text = format!("\"data:image/png;base64,{}\"", run(300));
        let scanner = scanner();
        assert!(scanner.scan_raw_quoted(&text).is_empty());
        assert_eq!(scanner.scan_data_uris(&text).len(), 1);
    }

    #[test]
    fn test_unsupported_image_type_ignored() {
        let text = format!("data:image/gif;base64,{}", run(300));
        assert!(scanner().scan_data_uris(&text).is_empty());
    }

    #[test]
    fn test_zero_minimum_rejected() {
        assert!(PayloadScanner::new(0).is_err());
    }
}
