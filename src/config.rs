use crate::scanner::{Scanner, DEFAULT_CONFIDENCE_THRESHOLD};
use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

/// 引擎配置，支持 JSON 与 YAML 两种格式
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    pub scanner: ScannerConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default, rename_all = "camelCase")]
pub struct ScannerConfig {
    pub parallel: bool,
    pub incremental: bool,
    pub confidence_threshold: f64,
    pub exclude_patterns: Vec<String>,
}

impl Default for ScannerConfig {
    fn default() -> Self {
        Self {
            parallel: false,
            incremental: false,
            confidence_threshold: DEFAULT_CONFIDENCE_THRESHOLD,
            exclude_patterns: Vec::new(),
        }
    }
}

impl Config {
    /// 根据扩展名解析配置文件
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            bail!("config file does not exist: {:?}", path);
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file: {:?}", path))?;

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let config = match ext.as_str() {
            "json" => serde_json::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?,
            "yaml" | "yml" => serde_yaml::from_str(&content)
                .with_context(|| format!("Failed to parse config file: {:?}", path))?,
            _ => bail!("unsupported config format: {:?}", path),
        };

        Ok(config)
    }

    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create config directory: {:?}", parent))?;
        }

        let ext = path
            .extension()
            .and_then(|e| e.to_str())
            .map(|e| e.to_lowercase())
            .unwrap_or_default();

        let data = match ext.as_str() {
            "json" => serde_json::to_string_pretty(self)?,
            "yaml" | "yml" => serde_yaml::to_string(self)?,
            _ => bail!("unsupported config format: {:?}", path),
        };

        fs::write(path, data).with_context(|| format!("Failed to write config file: {:?}", path))
    }

    pub fn apply_to_scanner(&self, scanner: &mut Scanner) {
        scanner.set_parallel(self.scanner.parallel);
        scanner.set_incremental(self.scanner.incremental);
        scanner.set_confidence_threshold(self.scanner.confidence_threshold);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_match_scanner_defaults() {
        let config = Config::default();
        assert!(!config.scanner.parallel);
        assert!(!config.scanner.incremental);
        assert_eq!(config.scanner.confidence_threshold, DEFAULT_CONFIDENCE_THRESHOLD);
    }

    #[test]
    fn loads_yaml_config() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.yaml");
        fs::write(
            &path,
            "scanner:\n  parallel: true\n  confidenceThreshold: 0.9\n",
        )
        .unwrap();

        let config = Config::load(&path).unwrap();
        assert!(config.scanner.parallel);
        assert!(!config.scanner.incremental);
        assert_eq!(config.scanner.confidence_threshold, 0.9);
    }

    #[test]
    fn load_save_round_trips_json() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.json");

        let mut config = Config::default();
        config.scanner.incremental = true;
        config.scanner.exclude_patterns = vec!["node_modules".to_string()];
        config.save(&path).unwrap();

        let loaded = Config::load(&path).unwrap();
        assert!(loaded.scanner.incremental);
        assert_eq!(loaded.scanner.exclude_patterns, vec!["node_modules"]);
    }

    #[test]
    fn unsupported_extension_is_rejected() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "").unwrap();
        assert!(Config::load(&path).is_err());
    }
}
