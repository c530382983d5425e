use anyhow::Context;
use designkit_model::SchemaCatalog;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

pub const DEFAULT_CONFIG_NAME: &str = "designkit.config.json";

/// DesignKit configuration file format
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Config {
    /// Component catalog JSON (built-in catalog when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub catalog: Option<String>,

    /// Where migrated and edited documents are written (in place when absent)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub out_dir: Option<String>,

    /// Pretty-print written documents
    #[serde(default = "default_pretty")]
    pub pretty: bool,

    /// Treat lint warnings as failures in `validate`
    #[serde(default)]
    pub fail_on_warnings: bool,
}

fn default_pretty() -> bool {
    true
}

impl Config {
    /// Load config from a directory
    pub fn load(cwd: &str) -> anyhow::Result<Self> {
        let config_path = PathBuf::from(cwd).join(DEFAULT_CONFIG_NAME);

        if config_path.exists() {
            let content = std::fs::read_to_string(&config_path)?;
            let config: Config = serde_json::from_str(&content)
                .with_context(|| format!("Invalid {}", config_path.display()))?;
            Ok(config)
        } else {
            // Return default config if none exists
            Ok(Config::default())
        }
    }

    pub fn load_catalog(&self, cwd: &str) -> anyhow::Result<SchemaCatalog> {
        match &self.catalog {
            Some(path) => {
                let path = PathBuf::from(cwd).join(path);
                let source = std::fs::read_to_string(&path)
                    .with_context(|| format!("Cannot read catalog {}", path.display()))?;
                Ok(SchemaCatalog::from_json(&source)?)
            }
            None => Ok(SchemaCatalog::builtin()),
        }
    }

    /// Path a processed `input` is written to
    pub fn output_path(&self, cwd: &str, input: &Path) -> PathBuf {
        match &self.out_dir {
            Some(out_dir) => {
                let name = input.file_name().map(PathBuf::from).unwrap_or_else(|| input.to_path_buf());
                PathBuf::from(cwd).join(out_dir).join(name)
            }
            None => input.to_path_buf(),
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            catalog: None,
            out_dir: None,
            pretty: default_pretty(),
            fail_on_warnings: false,
        }
    }
}
