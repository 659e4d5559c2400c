//! Command implementations

pub mod chains;
pub mod graph;
pub mod select;

use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};

use harbour_variants::util::config::{global_config_path, load_config, PROJECT_CONFIG_PATH};
use harbour_variants::{Config, DryRunExecutor, SchemaMatcher, SelectionManifest, VariantSelector};

/// Options shared by every command.
pub struct GlobalOptions {
    pub color: bool,
    pub config: Option<PathBuf>,
}

/// A loaded manifest plus the config that applies to it.
pub struct Session {
    pub manifest: SelectionManifest,
    pub config: Config,
}

impl Session {
    /// Load `manifest_path` and the config around it. The project config is
    /// looked up next to the manifest.
    pub fn load(manifest_path: &Path, global: &GlobalOptions) -> Result<Self> {
        let manifest = SelectionManifest::load(manifest_path)
            .with_context(|| format!("could not load {}", manifest_path.display()))?;

        let project_dir = manifest_path.parent().unwrap_or(Path::new("."));
        let global_path = global.config.clone().or_else(global_config_path);
        let config = load_config(global_path.as_deref(), &project_dir.join(PROJECT_CONFIG_PATH));

        Ok(Session { manifest, config })
    }

    /// A selector over the manifest's schema and registry. Transforms run
    /// with the dry-run executor.
    pub fn selector(&self) -> VariantSelector {
        VariantSelector::new(
            Arc::new(SchemaMatcher::new(self.manifest.schema().clone())),
            Arc::new(self.manifest.registry().clone()),
            Arc::new(DryRunExecutor),
        )
        .with_config(&self.config)
    }
}
