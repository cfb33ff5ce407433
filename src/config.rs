use std::fs;
use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::errors::{AnalyzerError, Result};

/// Name of the configuration file stored inside the `.codecontext` directory.
pub const CONFIG_FILENAME: &str = "config.yaml";

/// Name of the hidden directory used to store project metadata.
pub const CODECONTEXT_DIR: &str = ".codecontext";

/// Configuration for an analyzed project.
///
/// Read by the CLI and server at startup; the analysis core treats these
/// values purely as input.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProjectConfig {
    /// Schema version of the configuration.
    pub version: u32,
    /// Root directory of the project being analyzed.
    pub root_dir: String,
    /// Extra glob patterns excluded during scanning, on top of the
    /// built-in defaults. `!`-prefixed entries re-include matches.
    pub exclude: Vec<String>,
    /// Whether the built-in default exclude list applies.
    pub use_default_excludes: bool,
    /// Emit a parsing progress message every this many files.
    pub progress_interval: usize,
    /// Git history window for semantic neighborhoods, in days.
    pub semantic_window_days: i64,
}

impl Default for ProjectConfig {
    fn default() -> Self {
        Self {
            version: 1,
            root_dir: String::new(),
            exclude: Vec::new(),
            use_default_excludes: true,
            progress_interval: 10,
            semantic_window_days: 30,
        }
    }
}

/// Returns the path to the `.codecontext` directory within the project root.
pub fn get_codecontext_dir(project_root: &Path) -> PathBuf {
    project_root.join(CODECONTEXT_DIR)
}

/// Returns the path to `config.yaml` within the `.codecontext` directory.
pub fn get_config_path(project_root: &Path) -> PathBuf {
    get_codecontext_dir(project_root).join(CONFIG_FILENAME)
}

/// Loads the configuration from disk.
///
/// If the configuration file does not exist, returns a default
/// configuration with `root_dir` set to the given project root.
pub fn load_config(project_root: &Path) -> Result<ProjectConfig> {
    let config_path = get_config_path(project_root);

    if !config_path.exists() {
        return Ok(ProjectConfig {
            root_dir: project_root.to_string_lossy().to_string(),
            ..ProjectConfig::default()
        });
    }

    let contents = fs::read_to_string(&config_path).map_err(|e| AnalyzerError::Config {
        message: format!(
            "failed to read config file '{}': {}",
            config_path.display(),
            e
        ),
    })?;

    let config: ProjectConfig =
        serde_yaml::from_str(&contents).map_err(|e| AnalyzerError::Config {
            message: format!(
                "failed to parse config file '{}': {}",
                config_path.display(),
                e
            ),
        })?;

    Ok(config)
}

/// Saves the configuration to disk using an atomic write.
///
/// Writes to a temporary file first and then renames it to the final
/// location, so a partial write never corrupts the configuration.
pub fn save_config(project_root: &Path, config: &ProjectConfig) -> Result<()> {
    let dir = get_codecontext_dir(project_root);
    fs::create_dir_all(&dir).map_err(|e| AnalyzerError::Config {
        message: format!("failed to create directory '{}': {}", dir.display(), e),
    })?;

    let config_path = get_config_path(project_root);
    let tmp_path = config_path.with_extension("tmp");

    let yaml = serde_yaml::to_string(config).map_err(|e| AnalyzerError::Config {
        message: format!("failed to serialize config: {}", e),
    })?;

    fs::write(&tmp_path, &yaml).map_err(|e| AnalyzerError::Config {
        message: format!(
            "failed to write temporary config file '{}': {}",
            tmp_path.display(),
            e
        ),
    })?;

    fs::rename(&tmp_path, &config_path).map_err(|e| AnalyzerError::Config {
        message: format!(
            "failed to rename temporary config file '{}' to '{}': {}",
            tmp_path.display(),
            config_path.display(),
            e
        ),
    })?;

    Ok(())
}
