use crate::error::{NotebookImageError, Result};
use crate::types::PayloadOccurrence;
use tracing::debug;

/// Replaces scanned spans by byte position, last span first, so earlier
/// offsets stay valid while the text shrinks.
pub struct Substituter;

impl Substituter {
    /// Replace every span of `occurrence` in `text` with the form-specific
    /// replacement for `url`.
    pub fn substitute(text: &str, occurrence: &PayloadOccurrence, url: &str) -> Result<String> {
        Self::substitute_all(text, &[(occurrence, url)])
    }

    /// Apply several occurrences scanned from the same `text` in one pass.
    pub fn substitute_all(text: &str, resolved: &[(&PayloadOccurrence, &str)]) -> Result<String> {
        let mut edits: Vec<(usize, usize, String)> = Vec::new();

        for (occurrence, url) in resolved {
            let replacement = occurrence.replacement(url);
            for span in &occurrence.spans {
                let current = text.get(span.start..span.end);
                if current != Some(occurrence.matched_text(span).as_str()) {
                    return Err(NotebookImageError::StaleSpan {
                        start: span.start,
                        end: span.end,
                    });
                }
                edits.push((span.start, span.end, replacement.clone()));
            }
        }

        edits.sort_by(|a, b| b.0.cmp(&a.0));
        for pair in edits.windows(2) {
            // Sorted descending: the earlier edit must end before the later one starts.
            if pair[1].1 > pair[0].0 {
                return Err(NotebookImageError::StaleSpan {
                    start: pair[1].0,
                    end: pair[1].1,
                });
            }
        }

        let mut result = text.to_string();
        for (start, end, replacement) in &edits {
            result.replace_range(*start..*end, replacement);
        }

        debug!("Applied {} replacements", edits.len());
        Ok(result)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{EncodingForm, PayloadSpan};

    fn quoted(payload: &str, text: &str) -> PayloadOccurrence {
        let needle = format!("\"{}\"", payload);
        let spans = text
            .match_indices(&needle)
            .map(|(start, m)| PayloadSpan {
                start,
                end: start + m.len(),
                image_type: None,
            })
            .collect();
        PayloadOccurrence {
            form: EncodingForm::RawQuoted,
            payload: payload.to_string(),
            spans,
        }
    }

    #[test]
    fn test_quoted_replacement_keeps_quotes_and_hits_every_span() {
        let text = r#"{"a": "AAAA", "b": "AAAA", "c": "BBBB"}"#;
        let occurrence = quoted("AAAA", text);
        assert_eq!(occurrence.spans.len(), 2);

        let out = Substituter::substitute(text, &occurrence, "https://example/x.png").unwrap();
        assert_eq!(
            out,
            r#"{"a": "https://example/x.png", "b": "https://example/x.png", "c": "BBBB"}"#
        );
    }

    #[test]
    fn test_data_uri_replacement_drops_prefix() {
        let text = "<img src=\"data:image/png;base64,QUJD\">";
        let start = text.find("data:").unwrap();
        let end = text.rfind('"').unwrap();
        let occurrence = PayloadOccurrence {
            form: EncodingForm::DataUri,
            payload: "QUJD".to_string(),
            spans: vec![PayloadSpan {
                start,
                end,
                image_type: Some("png".to_string()),
            }],
        };

        let out = Substituter::substitute(text, &occurrence, "https://example/x.png").unwrap();
        assert_eq!(out, "<img src=\"https://example/x.png\">");
    }

    #[test]
    fn test_multiple_occurrences_in_one_pass() {
        let text = r#"["AAAA", "BBBB", "AAAA"]"#;
        let a = quoted("AAAA", text);
        let b = quoted("BBBB", text);

        let out = Substituter::substitute_all(text, &[(&a, "u1"), (&b, "longer-url-2")]).unwrap();
        assert_eq!(out, r#"["u1", "longer-url-2", "u1"]"#);
    }

    #[test]
    fn test_stale_span_rejected() {
        let text = r#"["AAAA"]"#;
        let occurrence = quoted("AAAA", text);
        let edited = r#"["AAAB"]"#;
        assert!(matches!(
            Substituter::substitute(edited, &occurrence, "u"),
            Err(NotebookImageError::StaleSpan { .. })
        ));
    }

    #[test]
    fn test_empty_resolution_is_identity() {
        let text = "unchanged";
        assert_eq!(Substituter::substitute_all(text, &[]).unwrap(), text);
    }
}
