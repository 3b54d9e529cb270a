use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use toml_edit::DocumentMut;
use tracing::info;

use crate::error::{AppError, Result};
use crate::spell_check::onnx::text_utils::{AnnotationStrategy, Markers};
use crate::spell_check::onnx::typo_index::TYPO_LABEL;
use crate::spell_check::onnx::word_map::CONTINUATION_PREFIX;
use crate::spell_check::onnx::InferenceMode;
use crate::spell_check::DetectorOptions;

const HEADER: &str = "# typo-detector configuration file.\n";

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Directory holding `model.onnx` and `tokenizer.json`
    pub model_dir: PathBuf,
    pub inference_mode: InferenceMode,
    /// Static sequence length the compiled path is pinned to
    pub max_sequence_length: usize,
    /// Where converted NNEF archives are cached; defaults to `<model_dir>/ir`
    #[serde(skip_serializing_if = "Option::is_none")]
    pub ir_cache_dir: Option<PathBuf>,
    pub typo_label: usize,
    pub continuation_prefix: String,
    pub open_marker: String,
    pub close_marker: String,
    pub annotation: AnnotationStrategy,
}

impl Default for Config {
    fn default() -> Self {
        let markers = Markers::default();
        Self {
            model_dir: PathBuf::from("models/typo-detector"),
            inference_mode: InferenceMode::default(),
            max_sequence_length: 128,
            ir_cache_dir: None,
            typo_label: TYPO_LABEL,
            continuation_prefix: CONTINUATION_PREFIX.to_string(),
            open_marker: markers.open,
            close_marker: markers.close,
            annotation: AnnotationStrategy::default(),
        }
    }
}

impl Config {
    /// `$HOME/.config/typo-detector/config.toml`
    pub fn default_path() -> PathBuf {
        let home = std::env::var("HOME").unwrap_or_else(|_| ".".to_string());
        PathBuf::from(home).join(".config/typo-detector/config.toml")
    }

    pub fn load() -> Result<Self> {
        Self::load_from(&Self::default_path())
    }

    /// Read the config at `path`, writing the defaults there first if it is missing
    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            info!("📝 No config at {}, writing defaults", path.display());
            let config = Config::default();
            config.save(path)?;
            return Ok(config);
        }

        let text = fs::read_to_string(path)?;
        let config: Config = toml_edit::de::from_str(&text)
            .map_err(|e| AppError::Config(format!("{}: {}", path.display(), e)))?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        let doc: DocumentMut =
            toml_edit::ser::to_document(self).map_err(|e| AppError::Config(e.to_string()))?;

        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }

        fs::write(path, format!("{}{}", HEADER, doc))?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if self.max_sequence_length < 3 {
            return Err(AppError::Config(format!(
                "max_sequence_length must leave room for two sentinels, got {}",
                self.max_sequence_length
            )));
        }
        if self.open_marker.is_empty() && self.close_marker.is_empty() {
            return Err(AppError::Config("open_marker and close_marker are both empty".to_string()));
        }
        Ok(())
    }

    pub fn markers(&self) -> Markers {
        Markers {
            open: self.open_marker.clone(),
            close: self.close_marker.clone(),
        }
    }

    pub fn detector_options(&self) -> DetectorOptions {
        DetectorOptions {
            continuation_prefix: self.continuation_prefix.clone(),
            typo_label: self.typo_label,
            markers: self.markers(),
            annotation: self.annotation,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.inference_mode, InferenceMode::Optimized);
        assert_eq!(config.max_sequence_length, 128);
        assert_eq!(config.typo_label, 1);
        assert_eq!(config.continuation_prefix, "##");
        assert_eq!(config.annotation, AnnotationStrategy::Positional);
        assert!(Config::default_path().to_string_lossy().contains("config.toml"));
    }

    #[test]
    fn test_config_save_and_load() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("nested/config.toml");

        let mut config = Config::default();
        config.inference_mode = InferenceMode::Compiled;
        config.ir_cache_dir = Some(temp_dir.path().join("ir"));
        config.annotation = AnnotationStrategy::Literal;

        config.save(&config_path).unwrap();
        assert!(config_path.exists());

        let written = fs::read_to_string(&config_path).unwrap();
        assert!(written.starts_with("# typo-detector"));
        assert!(written.contains("inference_mode = \"compiled\""));

        let loaded = Config::load_from(&config_path).unwrap();
        assert_eq!(loaded, config);
    }

    #[test]
    fn test_load_writes_defaults_when_missing() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config, Config::default());
        assert!(config_path.exists());
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "open_marker = \"**\"\nclose_marker = \"**\"\n").unwrap();

        let config = Config::load_from(&config_path).unwrap();
        assert_eq!(config.markers().wrap("teh"), "**teh**");
        assert_eq!(config.max_sequence_length, 128);
    }

    #[test]
    fn test_invalid_file_is_config_error() {
        let temp_dir = TempDir::new().unwrap();
        let config_path = temp_dir.path().join("config.toml");
        fs::write(&config_path, "inference_mode = \"gpu\"\n").unwrap();

        let result = Config::load_from(&config_path);
        assert!(matches!(result, Err(AppError::Config(_))));
    }

    #[test]
    fn test_validate_rejects_tiny_static_shape() {
        let config = Config {
            max_sequence_length: 2,
            ..Config::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_detector_options_follow_config() {
        let config = Config {
            continuation_prefix: "@@".to_string(),
            typo_label: 0,
            ..Config::default()
        };
        let options = config.detector_options();
        assert_eq!(options.continuation_prefix, "@@");
        assert_eq!(options.typo_label, 0);
        assert_eq!(options.markers, Markers::default());
    }
}
