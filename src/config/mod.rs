use std::collections::BTreeMap;
use std::fs;
use std::path::{Path, PathBuf};

use toml_edit::{value, DocumentMut, Item, Table};
use tracing::{debug, info};

use crate::error::{EvalError, Result};
use crate::evaluation::DEFAULT_PROGRESS_INTERVAL;
use crate::spell_check::{ollama, ConfusionCorrector, Corrector, OllamaCorrector};

pub const DEFAULT_CONFIG_FILE: &str = "csc-eval.toml";
pub const DEFAULT_MODEL: &str = "confusion";

/// How a registered model is served.
#[derive(Clone, Debug, PartialEq, Eq)]
pub enum BackendKind {
    /// Dictionary lookup; the built-in table when `dictionary` is `None`.
    Confusion { dictionary: Option<PathBuf> },
    Ollama { base_url: String, model: String },
}

#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ModelSpec {
    pub name: String,
    pub description: String,
    pub backend: BackendKind,
}

/// Evaluation settings, stored as TOML.
///
/// Missing keys keep their defaults. Models declared in the file are added to
/// the built-in registry, replacing a built-in entry with the same id.
#[derive(Clone, Debug, PartialEq)]
pub struct Config {
    pub config_path: PathBuf,
    pub output_dir: PathBuf,
    pub results_dir: PathBuf,
    pub progress_interval: usize,
    pub false_positives: usize,
    pub default_model: String,
    pub models: BTreeMap<String, ModelSpec>,
}

impl Default for Config {
    fn default() -> Self {
        let output_dir = PathBuf::from("output");
        Self {
            config_path: PathBuf::from(DEFAULT_CONFIG_FILE),
            results_dir: output_dir.join("results"),
            output_dir,
            progress_interval: DEFAULT_PROGRESS_INTERVAL,
            false_positives: 0,
            default_model: DEFAULT_MODEL.to_string(),
            models: builtin_models(),
        }
    }
}

fn builtin_models() -> BTreeMap<String, ModelSpec> {
    let mut models = BTreeMap::new();
    models.insert(
        "confusion".to_string(),
        ModelSpec {
            name: "Confusion-Dictionary".to_string(),
            description: "Built-in Chinese confusion pairs".to_string(),
            backend: BackendKind::Confusion { dictionary: None },
        },
    );
    models.insert(
        "qwen-ollama".to_string(),
        ModelSpec {
            name: "Qwen2.5-7B".to_string(),
            description: "Qwen2.5 7B served by a local Ollama".to_string(),
            backend: BackendKind::Ollama {
                base_url: ollama::DEFAULT_BASE_URL.to_string(),
                model: "qwen2.5:7b".to_string(),
            },
        },
    );
    models
}

impl Config {
    /// Read `path`, or return defaults pointing at it when it does not exist.
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let mut config = Config {
            config_path: path.to_path_buf(),
            ..Config::default()
        };

        if !path.exists() {
            debug!("No config at {}, using defaults", path.display());
            return Ok(config);
        }

        let contents = fs::read_to_string(path)?;
        let doc = contents.parse::<DocumentMut>()?;
        config.apply(&doc)?;

        info!("Loaded config from {}", path.display());
        Ok(config)
    }

    fn apply(&mut self, doc: &DocumentMut) -> Result<()> {
        if let Some(dir) = get_str(doc.as_table(), "output_dir")? {
            self.output_dir = PathBuf::from(dir);
            self.results_dir = self.output_dir.join("results");
        }
        if let Some(dir) = get_str(doc.as_table(), "results_dir")? {
            self.results_dir = PathBuf::from(dir);
        }
        if let Some(interval) = get_count(doc.as_table(), "progress_interval")? {
            if interval == 0 {
                return Err(EvalError::Configuration(
                    "progress_interval must be at least 1".to_string(),
                ));
            }
            self.progress_interval = interval;
        }
        if let Some(false_positives) = get_count(doc.as_table(), "false_positives")? {
            self.false_positives = false_positives;
        }
        if let Some(model) = get_str(doc.as_table(), "default_model")? {
            self.default_model = model.to_string();
        }

        if let Some(models) = doc.get("models") {
            let models = models.as_table().ok_or_else(|| {
                EvalError::Configuration("'models' must be a table".to_string())
            })?;
            for (id, item) in models.iter() {
                let table = item.as_table().ok_or_else(|| {
                    EvalError::Configuration(format!("models.{} must be a table", id))
                })?;
                self.models.insert(id.to_string(), parse_model(id, table)?);
            }
        }

        Ok(())
    }

    pub fn save(&self) -> Result<()> {
        if let Some(parent) = self.config_path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent)?;
            }
        }
        fs::write(&self.config_path, self.to_document().to_string())?;
        info!("Config saved to {}", self.config_path.display());
        Ok(())
    }

    fn to_document(&self) -> DocumentMut {
        let mut doc = DocumentMut::new();
        doc["output_dir"] = value(self.output_dir.to_string_lossy().to_string());
        doc["results_dir"] = value(self.results_dir.to_string_lossy().to_string());
        doc["progress_interval"] = value(self.progress_interval as i64);
        doc["false_positives"] = value(self.false_positives as i64);
        doc["default_model"] = value(self.default_model.as_str());

        if let Some(mut key) = doc.as_table_mut().key_mut("output_dir") {
            key.leaf_decor_mut()
                .set_prefix("# csc-eval configuration\n# Model backends are listed under [models.<id>].\n");
        }

        let mut models = Table::new();
        models.set_implicit(true);
        for (id, spec) in &self.models {
            let mut table = Table::new();
            table["name"] = value(spec.name.as_str());
            table["description"] = value(spec.description.as_str());
            match &spec.backend {
                BackendKind::Confusion { dictionary } => {
                    table["backend"] = value("confusion");
                    if let Some(dictionary) = dictionary {
                        table["dictionary"] = value(dictionary.to_string_lossy().to_string());
                    }
                }
                BackendKind::Ollama { base_url, model } => {
                    table["backend"] = value("ollama");
                    table["base_url"] = value(base_url.as_str());
                    table["model"] = value(model.as_str());
                }
            }
            models.insert(id, Item::Table(table));
        }
        doc.insert("models", Item::Table(models));
        doc
    }

    /// Create the output and results directories.
    pub fn ensure_output_dirs(&self) -> Result<()> {
        fs::create_dir_all(&self.output_dir)?;
        fs::create_dir_all(&self.results_dir)?;
        Ok(())
    }

    pub fn model(&self, model_id: &str) -> Result<&ModelSpec> {
        self.models
            .get(model_id)
            .ok_or_else(|| EvalError::UnknownModel {
                model: model_id.to_string(),
                available: self.available_models(),
            })
    }

    /// Registered ids, comma separated.
    pub fn available_models(&self) -> String {
        self.models.keys().cloned().collect::<Vec<_>>().join(", ")
    }

    /// Instantiate the corrector registered under `model_id`. Nothing is
    /// loaded yet.
    pub fn build_corrector(&self, model_id: &str) -> Result<Box<dyn Corrector>> {
        let spec = self.model(model_id)?;
        let corrector: Box<dyn Corrector> = match &spec.backend {
            BackendKind::Confusion { dictionary: None } => {
                Box::new(ConfusionCorrector::builtin().with_name(spec.name.clone()))
            }
            BackendKind::Confusion {
                dictionary: Some(path),
            } => Box::new(ConfusionCorrector::from_file(path.clone()).with_name(spec.name.clone())),
            BackendKind::Ollama { base_url, model } => Box::new(
                OllamaCorrector::new(base_url.clone(), model.clone()).with_name(spec.name.clone()),
            ),
        };
        debug!(model = model_id, "Built corrector {}", corrector.name());
        Ok(corrector)
    }
}

fn get_str<'a>(table: &'a Table, key: &str) -> Result<Option<&'a str>> {
    match table.get(key) {
        None => Ok(None),
        Some(item) => item
            .as_str()
            .map(Some)
            .ok_or_else(|| EvalError::Configuration(format!("'{}' must be a string", key))),
    }
}

fn get_count(table: &Table, key: &str) -> Result<Option<usize>> {
    match table.get(key) {
        None => Ok(None),
        Some(item) => item
            .as_integer()
            .and_then(|n| usize::try_from(n).ok())
            .map(Some)
            .ok_or_else(|| {
                EvalError::Configuration(format!("'{}' must be a non-negative integer", key))
            }),
    }
}

fn parse_model(id: &str, table: &Table) -> Result<ModelSpec> {
    let required = |key: &str| -> Result<String> {
        get_str(table, key)?.map(str::to_string).ok_or_else(|| {
            EvalError::Configuration(format!("models.{} is missing '{}'", id, key))
        })
    };

    let backend = match required("backend")?.as_str() {
        "confusion" => BackendKind::Confusion {
            dictionary: get_str(table, "dictionary")?.map(PathBuf::from),
        },
        "ollama" => BackendKind::Ollama {
            base_url: get_str(table, "base_url")?
                .unwrap_or(ollama::DEFAULT_BASE_URL)
                .to_string(),
            model: required("model")?,
        },
        other => {
            return Err(EvalError::Configuration(format!(
                "models.{}: unknown backend '{}' (expected 'confusion' or 'ollama')",
                id, other
            )))
        }
    };

    Ok(ModelSpec {
        name: get_str(table, "name")?.unwrap_or(id).to_string(),
        description: get_str(table, "description")?.unwrap_or_default().to_string(),
        backend,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.progress_interval, 100);
        assert_eq!(config.false_positives, 0);
        assert_eq!(config.default_model, "confusion");
        assert_eq!(config.results_dir, PathBuf::from("output/results"));
        assert!(config.models.contains_key("confusion"));
        assert!(config.models.contains_key("qwen-ollama"));
    }

    #[test]
    fn test_load_missing_file_returns_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("absent.toml");

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.config_path, config_path);
        assert_eq!(config.models, Config::default().models);
        assert!(!config_path.exists());
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested").join("csc-eval.toml");

        let mut config = Config::default();
        config.config_path = config_path.clone();
        config.false_positives = 3;
        config.progress_interval = 10;
        config.models.insert(
            "custom".to_string(),
            ModelSpec {
                name: "Custom dictionary".to_string(),
                description: String::new(),
                backend: BackendKind::Confusion {
                    dictionary: Some(PathBuf::from("pairs.txt")),
                },
            },
        );

        config.save().unwrap();
        assert!(config_path.exists());
        let written = fs::read_to_string(&config_path).unwrap();
        assert!(written.starts_with("# csc-eval configuration"));

        let loaded = Config::load(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_partial_file_keeps_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("csc-eval.toml");
        fs::write(
            &config_path,
            r#"
output_dir = "runs"
false_positives = 2

[models.qwen-ollama]
backend = "ollama"
model = "qwen2.5:14b"
"#,
        )
        .unwrap();

        let config = Config::load(&config_path).unwrap();
        assert_eq!(config.output_dir, PathBuf::from("runs"));
        assert_eq!(config.results_dir, PathBuf::from("runs").join("results"));
        assert_eq!(config.false_positives, 2);
        assert_eq!(config.progress_interval, 100);
        assert_eq!(
            config.models["qwen-ollama"].backend,
            BackendKind::Ollama {
                base_url: ollama::DEFAULT_BASE_URL.to_string(),
                model: "qwen2.5:14b".to_string(),
            }
        );
        assert!(config.models.contains_key("confusion"));
    }

    #[test]
    fn test_invalid_values_are_configuration_errors() {
        let temp_dir = TempDir::new().unwrap();
        let cases = [
            "progress_interval = 0",
            "false_positives = -1",
            "default_model = 7",
            "[models.bert]\nbackend = \"onnx\"",
            "[models.remote]\nbackend = \"ollama\"",
        ];

        for (i, contents) in cases.iter().enumerate() {
            let config_path = temp_dir.path().join(format!("case{}.toml", i));
            fs::write(&config_path, contents).unwrap();
            let result = Config::load(&config_path);
            assert!(
                matches!(result, Err(EvalError::Configuration(_))),
                "{:?} should be rejected, got {:?}",
                contents,
                result
            );
        }
    }

    #[test]
    fn test_malformed_toml() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("broken.toml");
        fs::write(&config_path, "output_dir = ").unwrap();

        assert!(matches!(Config::load(&config_path), Err(EvalError::Toml(_))));
    }

    #[test]
    fn test_build_corrector_resolves_registry() {
        let config = Config::default();

        let corrector = config.build_corrector("confusion").unwrap();
        assert_eq!(corrector.name(), "Confusion-Dictionary");
        assert!(!corrector.is_loaded());

        let corrector = config.build_corrector("qwen-ollama").unwrap();
        assert_eq!(corrector.name(), "Qwen2.5-7B");
        assert!(!corrector.is_loaded());
    }

    #[test]
    fn test_build_corrector_unknown_model() {
        let config = Config::default();

        match config.build_corrector("bert") {
            Err(EvalError::UnknownModel { model, available }) => {
                assert_eq!(model, "bert");
                assert_eq!(available, "confusion, qwen-ollama");
            }
            Err(other) => panic!("Expected UnknownModel, got {:?}", other),
            Ok(_) => panic!("Expected UnknownModel"),
        }
    }

    #[test]
    fn test_ensure_output_dirs() {
        let temp_dir = TempDir::new().unwrap();
        let config = Config {
            output_dir: temp_dir.path().join("output"),
            results_dir: temp_dir.path().join("output").join("results"),
            ..Config::default()
        };

        config.ensure_output_dirs().unwrap();
        assert!(config.results_dir.is_dir());
    }
}
