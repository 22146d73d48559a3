//! Batch configuration: file formats, schema defaults and validation.

use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Default per-page multiplier of the image ordering key.
pub const DEFAULT_PAGE_STRIDE: usize = 1000;

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config {path}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("unrecognized config file type: {0} (expected json, yaml or toml)")]
    UnrecognizedFormat(String),
    #[error("invalid JSON config: {0}")]
    Json(#[from] serde_json::Error),
    #[error("invalid YAML config: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("invalid TOML config: {0}")]
    Toml(#[from] toml::de::Error),
    #[error("invalid config: {0}")]
    Invalid(String),
}

/// Serialization format of a config file, chosen by extension.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfigFormat {
    Json,
    Yaml,
    Toml,
}

impl ConfigFormat {
    pub fn from_path(path: &Path) -> Result<Self, ConfigError> {
        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(str::to_ascii_lowercase)
            .unwrap_or_default();
        match ext.as_str() {
            "json" => Ok(ConfigFormat::Json),
            "yaml" | "yml" => Ok(ConfigFormat::Yaml),
            "toml" => Ok(ConfigFormat::Toml),
            _ => Err(ConfigError::UnrecognizedFormat(path.display().to_string())),
        }
    }
}

/// Direction in which page images are stacked.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Layout {
    #[default]
    Vertical,
    Horizontal,
}

/// Where the inputs of a batch come from.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct DataSpec {
    #[serde(default)]
    pub files: Vec<PathBuf>,
    #[serde(default)]
    pub directories: Vec<PathBuf>,
    /// Extension filter for directory entries; explicit files are never filtered.
    #[serde(default)]
    pub filetypes: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    pub data: DataSpec,
    #[serde(default = "default_workspace")]
    pub workspace: PathBuf,
    #[serde(default = "default_ext")]
    pub default_ext: String,
    #[serde(default = "yes")]
    pub force_convert: bool,
    #[serde(default = "yes")]
    pub text_first: bool,
    #[serde(default = "default_min_text_chars")]
    pub min_text_chars: usize,
    #[serde(default)]
    pub layout: Layout,
    #[serde(default = "default_page_stride")]
    pub page_stride: usize,
    #[serde(default)]
    pub audit: bool,
}

fn default_workspace() -> PathBuf {
    PathBuf::from(".")
}

fn default_ext() -> String {
    "pdf".to_string()
}

fn yes() -> bool {
    true
}

fn default_min_text_chars() -> usize {
    50
}

fn default_page_stride() -> usize {
    DEFAULT_PAGE_STRIDE
}

impl Config {
    /// Check constraints serde cannot express.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.data.files.is_empty() && self.data.directories.is_empty() {
            return Err(ConfigError::Invalid(
                "need at least one input file or directory".into(),
            ));
        }
        if self.page_stride == 0 {
            return Err(ConfigError::Invalid("page_stride must be positive".into()));
        }
        if self.default_ext.trim_start_matches('.').is_empty() {
            return Err(ConfigError::Invalid("default_ext must not be empty".into()));
        }
        Ok(())
    }
}

/// Deserialize and validate a config held in memory.
pub fn parse_config(text: &str, format: ConfigFormat) -> Result<Config, ConfigError> {
    let config: Config = match format {
        ConfigFormat::Json => serde_json::from_str(text)?,
        ConfigFormat::Yaml => serde_yaml::from_str(text)?,
        ConfigFormat::Toml => toml::from_str(text)?,
    };
    config.validate()?;
    Ok(config)
}

/// Read, deserialize and validate a config file.
pub fn load_config(path: &Path) -> Result<Config, ConfigError> {
    let format = ConfigFormat::from_path(path)?;
    let text = fs::read_to_string(path).map_err(|source| ConfigError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    parse_config(&text, format)
}

#[cfg(test)]
mod tests {
    use super::*;

    // ============================================================================
    // ConfigFormat tests
    // ============================================================================

    #[test]
    fn test_format_from_extension() {
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.json")).unwrap(),
            ConfigFormat::Json
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.yaml")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.YML")).unwrap(),
            ConfigFormat::Yaml
        );
        assert_eq!(
            ConfigFormat::from_path(Path::new("a.toml")).unwrap(),
            ConfigFormat::Toml
        );
    }

    #[test]
    fn test_format_unrecognized() {
        let err = ConfigFormat::from_path(Path::new("config.ini")).unwrap_err();
        assert!(err.to_string().contains("unrecognized config file type"));
        assert!(ConfigFormat::from_path(Path::new("config")).is_err());
    }

    // ============================================================================
    // parse_config tests
    // ============================================================================

    #[test]
    fn test_parse_json_applies_defaults() {
        let config = parse_config(r#"{"data": {"files": ["a.pdf"]}}"#, ConfigFormat::Json).unwrap();
        assert_eq!(config.data.files, vec![PathBuf::from("a.pdf")]);
        assert_eq!(config.workspace, PathBuf::from("."));
        assert_eq!(config.default_ext, "pdf");
        assert!(config.force_convert);
        assert!(config.text_first);
        assert_eq!(config.min_text_chars, 50);
        assert_eq!(config.layout, Layout::Vertical);
        assert_eq!(config.page_stride, 1000);
        assert!(!config.audit);
    }

    #[test]
    fn test_parse_yaml() {
        let text = "\
data:
  directories: [scans]
  filetypes: [.pdf, png]
workspace: out
force_convert: false
layout: horizontal
";
        let config = parse_config(text, ConfigFormat::Yaml).unwrap();
        assert_eq!(config.data.directories, vec![PathBuf::from("scans")]);
        assert_eq!(config.data.filetypes, vec![".pdf", "png"]);
        assert_eq!(config.workspace, PathBuf::from("out"));
        assert!(!config.force_convert);
        assert_eq!(config.layout, Layout::Horizontal);
    }

    #[test]
    fn test_parse_toml() {
        let text = "\
workspace = \"work\"
page_stride = 5000
audit = true

[data]
files = [\"one.pdf\", \"two.tif\"]
";
        let config = parse_config(text, ConfigFormat::Toml).unwrap();
        assert_eq!(config.data.files.len(), 2);
        assert_eq!(config.page_stride, 5000);
        assert!(config.audit);
    }

    #[test]
    fn test_parse_rejects_unknown_keys() {
        let err = parse_config(
            r#"{"data": {"files": ["a.pdf"]}, "colour": "red"}"#,
            ConfigFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Json(_)));
    }

    #[test]
    fn test_parse_requires_data() {
        assert!(parse_config(r#"{"workspace": "."}"#, ConfigFormat::Json).is_err());
    }

    #[test]
    fn test_parse_requires_some_input() {
        let err = parse_config(r#"{"data": {"filetypes": ["pdf"]}}"#, ConfigFormat::Json)
            .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_zero_stride() {
        let err = parse_config(
            r#"{"data": {"files": ["a.pdf"]}, "page_stride": 0}"#,
            ConfigFormat::Json,
        )
        .unwrap_err();
        assert!(matches!(err, ConfigError::Invalid(_)));
    }

    #[test]
    fn test_parse_rejects_bad_layout() {
        assert!(parse_config(
            r#"{"data": {"files": ["a.pdf"]}, "layout": "diagonal"}"#,
            ConfigFormat::Json
        )
        .is_err());
    }

    // ============================================================================
    // load_config tests
    // ============================================================================

    #[test]
    fn test_load_config_from_file() {
        let dir = tempfile::TempDir::new().unwrap();
        let path = dir.path().join("batch.json");
        fs::write(&path, r#"{"data": {"files": ["x.pdf"]}, "min_text_chars": 10}"#).unwrap();

        let config = load_config(&path).unwrap();
        assert_eq!(config.min_text_chars, 10);
    }

    #[test]
    fn test_load_config_missing_file() {
        let err = load_config(Path::new("/nonexistent/batch.yaml")).unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn test_load_config_checks_extension_first() {
        let err = load_config(Path::new("/nonexistent/batch.cfg")).unwrap_err();
        assert!(matches!(err, ConfigError::UnrecognizedFormat(_)));
    }
}
