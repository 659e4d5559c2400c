//! Configuration file support for variant selection.
//!
//! Two locations are consulted:
//! - Global: `<config dir>/harbour/variants.toml` - user-wide defaults
//! - Project: `.harbour/variants.toml` - project-specific overrides
//!
//! Project config takes precedence over global config.

use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

/// Project-relative location of the selection config.
pub const PROJECT_CONFIG_PATH: &str = ".harbour/variants.toml";

/// Variant selection configuration.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Selection behaviour
    pub select: SelectConfig,

    /// Batch selection settings
    pub batch: BatchConfig,
}

/// Settings that change how a single selection runs.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default, rename_all = "kebab-case")]
pub struct SelectConfig {
    /// Return an empty artifact set instead of failing when nothing matches
    pub allow_no_matching_variants: Option<bool>,

    /// Log discarded candidates at debug level on the cheap matching pass
    pub explain_discarded: Option<bool>,
}

/// Settings for `VariantSelector::select_all`.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct BatchConfig {
    /// Worker threads for batch selection (0 = rayon default)
    pub jobs: Option<usize>,
}

impl Config {
    /// Load configuration from a file.
    pub fn load(path: &Path) -> Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read config file: {}", path.display()))?;

        toml::from_str(&contents)
            .with_context(|| format!("failed to parse config file: {}", path.display()))
    }

    /// Load configuration with fallback to defaults if the file is missing or broken.
    pub fn load_or_default(path: &Path) -> Self {
        if path.exists() {
            Self::load(path).unwrap_or_else(|e| {
                tracing::warn!("Failed to load config from {}: {:#}", path.display(), e);
                Self::default()
            })
        } else {
            Self::default()
        }
    }

    /// Merge another config into this one (other takes precedence).
    pub fn merge(&mut self, other: Config) {
        if other.select.allow_no_matching_variants.is_some() {
            self.select.allow_no_matching_variants = other.select.allow_no_matching_variants;
        }
        if other.select.explain_discarded.is_some() {
            self.select.explain_discarded = other.select.explain_discarded;
        }
        if other.batch.jobs.is_some() {
            self.batch.jobs = other.batch.jobs;
        }
    }

    pub fn allow_no_matching_variants(&self) -> bool {
        self.select.allow_no_matching_variants.unwrap_or(false)
    }

    pub fn explain_discarded(&self) -> bool {
        self.select.explain_discarded.unwrap_or(true)
    }

    /// Worker thread count, `None` meaning the rayon default.
    pub fn jobs(&self) -> Option<usize> {
        self.batch.jobs.filter(|&jobs| jobs > 0)
    }
}

/// Location of the user-wide config file, if a home directory is known.
pub fn global_config_path() -> Option<PathBuf> {
    ProjectDirs::from("", "", "harbour").map(|dirs| dirs.config_dir().join("variants.toml"))
}

/// Load merged configuration from global and project locations.
///
/// Order of precedence (highest to lowest):
/// 1. Project config (.harbour/variants.toml)
/// 2. Global config
/// 3. Built-in defaults
pub fn load_config(global_path: Option<&Path>, project_path: &Path) -> Config {
    let mut config = global_path.map(Config::load_or_default).unwrap_or_default();
    config.merge(Config::load_or_default(project_path));
    config
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_defaults() {
        let config = Config::default();

        assert!(!config.allow_no_matching_variants());
        assert!(config.explain_discarded());
        assert_eq!(config.jobs(), None);
    }

    #[test]
    fn test_parse_kebab_case_keys() {
        let config: Config = toml::from_str(
            r#"
            [select]
            allow-no-matching-variants = true
            explain-discarded = false

            [batch]
            jobs = 4
            "#,
        )
        .unwrap();

        assert!(config.allow_no_matching_variants());
        assert!(!config.explain_discarded());
        assert_eq!(config.jobs(), Some(4));
    }

    #[test]
    fn test_zero_jobs_means_default() {
        let config: Config = toml::from_str("[batch]\njobs = 0\n").unwrap();
        assert_eq!(config.jobs(), None);
    }

    #[test]
    fn test_project_overrides_global() {
        let tmp = TempDir::new().unwrap();
        let global = tmp.path().join("global.toml");
        let project = tmp.path().join("project.toml");
        std::fs::write(&global, "[select]\nallow-no-matching-variants = true\n[batch]\njobs = 2\n")
            .unwrap();
        std::fs::write(&project, "[batch]\njobs = 8\n").unwrap();

        let config = load_config(Some(&global), &project);

        assert!(config.allow_no_matching_variants());
        assert_eq!(config.jobs(), Some(8));
    }

    #[test]
    fn test_broken_file_falls_back_to_defaults() {
        let tmp = TempDir::new().unwrap();
        let project = tmp.path().join("variants.toml");
        std::fs::write(&project, "[select\n").unwrap();

        let config = load_config(None, &project);

        assert!(!config.allow_no_matching_variants());
    }
}
