//! Layered configuration for onboard.
//!
//! Sources, lowest to highest priority:
//!
//! 1. Built-in defaults.
//! 2. `config.{toml,yaml,json}` in the platform config directory.
//! 3. An explicit config file, if the caller passes one.
//! 4. `ONBOARD_` environment variables, nested keys split on `__`
//!    (`ONBOARD_FILTER__EXCLUDE_DIR_NAMES`).

pub mod error;

use crate::error::{ErrorKind, Result};
use directories::ProjectDirs;
use exn::{OptionExt, ResultExt};
use figment::Figment;
use figment::providers::{Env, Format, Json, Serialized, Toml, Yaml};
use onboard_records::{DEFAULT_CONCURRENCY, ImportFilter};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

const ENV_PREFIX: &str = "ONBOARD_";
const USER_CONFIG_FILES: &[&str] = &["config.toml", "config.yaml", "config.json"];

fn project_dirs() -> Option<ProjectDirs> {
    ProjectDirs::from("", "", "onboard")
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Where onboarded values are stored. Defaults to `archive` inside the
    /// platform data directory.
    pub archive_root: Option<PathBuf>,
    /// Whether records remember the absolute path they were imported from.
    pub include_original_path: bool,
    /// Bound on parallel per-file work.
    pub concurrency: usize,
    /// Default folder import filter.
    pub filter: ImportFilter,
}
impl Default for Config {
    fn default() -> Self {
        Self {
            archive_root: None,
            include_original_path: true,
            concurrency: DEFAULT_CONCURRENCY,
            filter: ImportFilter::default(),
        }
    }
}

impl Config {
    /// Load configuration from every source, with `explicit` layered on top
    /// of the user config file.
    pub fn load(explicit: Option<&Path>) -> Result<Self> {
        let user_dir = project_dirs().map(|dirs| dirs.config_dir().to_path_buf());
        Self::load_from(user_dir.as_deref(), explicit)
    }

    fn load_from(user_dir: Option<&Path>, explicit: Option<&Path>) -> Result<Self> {
        let mut figment = Figment::from(Serialized::defaults(Config::default()));
        if let Some(dir) = user_dir {
            for name in USER_CONFIG_FILES {
                let path = dir.join(name);
                if path.is_file() {
                    tracing::debug!(path = %path.display(), "Merging user config");
                    figment = merge_file(figment, &path)?;
                }
            }
        }
        if let Some(path) = explicit {
            if !path.is_file() {
                exn::bail!(ErrorKind::NotFound(path.to_path_buf()));
            }
            tracing::debug!(path = %path.display(), "Merging config file");
            figment = merge_file(figment, path)?;
        }
        figment = figment.merge(Env::prefixed(ENV_PREFIX).split("__"));

        let config: Config = figment.extract().or_raise(|| ErrorKind::Load)?;
        config.validate()?;
        Ok(config)
    }

    fn validate(&self) -> Result<()> {
        if self.concurrency == 0 {
            exn::bail!(ErrorKind::Invalid("concurrency must be at least 1"));
        }
        Ok(())
    }

    /// The archive root: the configured one, or `archive` in the platform
    /// data directory.
    pub fn archive_root(&self) -> Result<PathBuf> {
        if let Some(root) = &self.archive_root {
            return Ok(root.clone());
        }
        let dirs = project_dirs().ok_or_raise(|| ErrorKind::NoProjectDirs)?;
        Ok(dirs.data_dir().join("archive"))
    }
}

fn merge_file(figment: Figment, path: &Path) -> Result<Figment> {
    let extension = path.extension().and_then(|ext| ext.to_str()).map(str::to_ascii_lowercase);
    Ok(match extension.as_deref() {
        Some("toml") => figment.merge(Toml::file(path)),
        Some("yaml" | "yml") => figment.merge(Yaml::file(path)),
        Some("json") => figment.merge(Json::file(path)),
        _ => exn::bail!(ErrorKind::UnsupportedFormat(path.to_path_buf())),
    })
}
