//! Corpus ingestion.
//!
//! Every sentence a loader returns is assumed to contain at least one error.

use std::fs;
use std::path::Path;

use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info};

use crate::error::{EvalError, Result};

/// Label that marks erroneous sentences in labelled JSONL corpora.
pub const DEFAULT_LABEL_FILTER: &str = "negative";

#[derive(Debug, Deserialize)]
struct SentenceFile {
    sentences: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct LabelledRecord {
    source: String,
    #[serde(rename = "type")]
    label: Option<String>,
}

#[derive(Debug, Clone)]
pub struct CorpusLoader {
    label_filter: String,
}

impl Default for CorpusLoader {
    fn default() -> Self {
        Self {
            label_filter: DEFAULT_LABEL_FILTER.to_string(),
        }
    }
}

impl CorpusLoader {
    pub fn new() -> Self {
        Self::default()
    }

    /// Keep only labelled JSONL records whose `type` equals `label`.
    pub fn with_label_filter(mut self, label: impl Into<String>) -> Self {
        self.label_filter = label.into();
        self
    }

    pub fn label_filter(&self) -> &str {
        &self.label_filter
    }

    /// Load sentences from a `.txt`, `.json` or `.jsonl` file.
    pub fn load_from_file(&self, path: impl AsRef<Path>) -> Result<Vec<String>> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(EvalError::Configuration(format!(
                "Corpus file not found: {}",
                path.display()
            )));
        }

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_ascii_lowercase())
            .unwrap_or_default();

        let contents = match extension.as_str() {
            "txt" | "json" | "jsonl" => fs::read_to_string(path)?,
            _ => {
                return Err(EvalError::UnsupportedFormat {
                    path: path.to_path_buf(),
                    extension,
                })
            }
        };

        let sentences = match extension.as_str() {
            "txt" => Self::parse_lines(&contents),
            "json" => Self::parse_json(&contents, path)?,
            _ => self.parse_jsonl(&contents, path)?,
        };

        info!("Loaded {} sentences from {}", sentences.len(), path.display());
        Ok(sentences)
    }

    /// Build a corpus from in-memory sentences, dropping blank entries.
    pub fn load_from_list<I, S>(&self, sentences: I) -> Vec<String>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        sentences
            .into_iter()
            .filter_map(|sentence| Self::clean(sentence.as_ref()))
            .collect()
    }

    fn clean(sentence: &str) -> Option<String> {
        let trimmed = sentence.trim();
        if trimmed.is_empty() {
            None
        } else {
            Some(trimmed.to_string())
        }
    }

    fn parse_lines(contents: &str) -> Vec<String> {
        contents.lines().filter_map(Self::clean).collect()
    }

    fn parse_json(contents: &str, path: &Path) -> Result<Vec<String>> {
        let value: Value = serde_json::from_str(contents)?;
        let sentences: Vec<String> = match value {
            Value::Array(_) => serde_json::from_value(value)?,
            Value::Object(_) => serde_json::from_value::<SentenceFile>(value)?.sentences,
            _ => {
                return Err(EvalError::Configuration(format!(
                    "{} must hold an array of sentences or an object with a 'sentences' array",
                    path.display()
                )))
            }
        };
        Ok(sentences.iter().filter_map(|s| Self::clean(s)).collect())
    }

    fn parse_jsonl(&self, contents: &str, path: &Path) -> Result<Vec<String>> {
        let mut sentences = Vec::new();

        for (line_no, line) in contents.lines().enumerate() {
            let line = line.trim();
            if line.is_empty() {
                continue;
            }

            let invalid = |details: String| {
                EvalError::Configuration(format!(
                    "{} line {}: {}",
                    path.display(),
                    line_no + 1,
                    details
                ))
            };

            let value: Value = serde_json::from_str(line).map_err(|e| invalid(e.to_string()))?;
            let sentence = match value {
                Value::String(sentence) => Some(sentence),
                Value::Object(_) => {
                    let record: LabelledRecord =
                        serde_json::from_value(value).map_err(|e| invalid(e.to_string()))?;
                    match record.label {
                        Some(label) if label != self.label_filter => {
                            debug!("Skipping record labelled '{}'", label);
                            None
                        }
                        _ => Some(record.source),
                    }
                }
                _ => return Err(invalid("expected a string or an object".to_string())),
            };

            if let Some(sentence) = sentence.as_deref().and_then(Self::clean) {
                sentences.push(sentence);
            }
        }

        Ok(sentences)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn write(dir: &TempDir, name: &str, contents: &str) -> std::path::PathBuf {
        let path = dir.path().join(name);
        fs::write(&path, contents).unwrap();
        path
    }

    #[test]
    fn test_load_txt_skips_blank_lines() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "corpus.txt", "今天天汽很好\n\n   \n  我门去公园  \n");

        let sentences = CorpusLoader::new().load_from_file(&path).unwrap();
        assert_eq!(sentences, vec!["今天天汽很好", "我门去公园"]);
    }

    #[test]
    fn test_load_json_array_and_object() {
        let dir = TempDir::new().unwrap();
        let array = write(&dir, "array.json", r#"["今天天汽很好", "", "我门去公园"]"#);
        let object = write(&dir, "object.json", r#"{"sentences": ["这个问提很难"]}"#);

        let loader = CorpusLoader::new();
        assert_eq!(
            loader.load_from_file(&array).unwrap(),
            vec!["今天天汽很好", "我门去公园"]
        );
        assert_eq!(loader.load_from_file(&object).unwrap(), vec!["这个问提很难"]);
    }

    #[test]
    fn test_load_json_rejects_scalar() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "scalar.json", "42");

        let result = CorpusLoader::new().load_from_file(&path);
        assert!(matches!(result, Err(EvalError::Configuration(_))));
    }

    #[test]
    fn test_load_jsonl_filters_by_label() {
        let dir = TempDir::new().unwrap();
        let path = write(
            &dir,
            "corpus.jsonl",
            concat!(
                "{\"source\": \"今天天汽很好\", \"type\": \"negative\"}\n",
                "{\"source\": \"今天天气很好\", \"type\": \"positive\"}\n",
                "\"我门去公园\"\n",
                "\n",
                "{\"source\": \"这个问提很难\"}\n",
            ),
        );

        let sentences = CorpusLoader::new().load_from_file(&path).unwrap();
        assert_eq!(sentences, vec!["今天天汽很好", "我门去公园", "这个问提很难"]);

        let positives = CorpusLoader::new()
            .with_label_filter("positive")
            .load_from_file(&path)
            .unwrap();
        assert_eq!(positives, vec!["今天天气很好", "我门去公园", "这个问提很难"]);
    }

    #[test]
    fn test_load_jsonl_reports_bad_line() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "broken.jsonl", "\"ok\"\n{not json\n");

        match CorpusLoader::new().load_from_file(&path) {
            Err(EvalError::Configuration(message)) => assert!(message.contains("line 2")),
            other => panic!("Expected configuration error, got {:?}", other),
        }
    }

    #[test]
    fn test_unsupported_extension() {
        let dir = TempDir::new().unwrap();
        let path = write(&dir, "corpus.csv", "a,b");

        let result = CorpusLoader::new().load_from_file(&path);
        assert!(matches!(
            result,
            Err(EvalError::UnsupportedFormat { ref extension, .. }) if extension == "csv"
        ));
    }

    #[test]
    fn test_missing_file_is_configuration_error() {
        let dir = TempDir::new().unwrap();
        let result = CorpusLoader::new().load_from_file(dir.path().join("absent.txt"));
        assert!(matches!(result, Err(EvalError::Configuration(_))));
    }

    #[test]
    fn test_load_from_list_drops_blank_entries() {
        let sentences = CorpusLoader::new().load_from_list(["今天天汽很好", " ", "", " 我门 "]);
        assert_eq!(sentences, vec!["今天天汽很好", "我门"]);
    }
}
