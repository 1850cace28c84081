//! Goal configuration file.
//!
//! All goals read their options from one optional TOML file (default
//! `diststage.toml`) with one table per goal; CLI flags override file
//! values. Missing tables fall back to the documented defaults.

use crate::archive::ZipConfig;
use crate::descriptor::GenerateConfig;
use crate::merge::MergeConfig;
use crate::sources::SourcesConfig;
use crate::stage::StageConfig;
use serde::Deserialize;
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;

pub const DEFAULT_CONFIG_FILE: &str = "diststage.toml";

#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("cannot read config file {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed config file {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },
}

/// Per-goal configuration tables.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(default)]
pub struct FileConfig {
    pub stage: StageConfig,
    pub sources: SourcesConfig,
    pub zip: ZipConfig,
    pub generate: GenerateConfig,
    pub merge: MergeConfig,
}

impl FileConfig {
    /// Load from an explicit path (missing file is an error) or from
    /// the default path (missing file yields the defaults).
    pub fn load(path: Option<&Path>) -> Result<Self, ConfigError> {
        match path {
            Some(path) => Self::read(path),
            None => {
                let default = Path::new(DEFAULT_CONFIG_FILE);
                if default.is_file() {
                    Self::read(default)
                } else {
                    Ok(Self::default())
                }
            }
        }
    }

    fn read(path: &Path) -> Result<Self, ConfigError> {
        let text = fs::read_to_string(path).map_err(|source| ConfigError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        toml::from_str(&text).map_err(|source| ConfigError::Parse {
            path: path.to_path_buf(),
            source,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn missing_default_file_yields_defaults() {
        let config = FileConfig::load(None).unwrap();
        assert_eq!(config.stage.copy_kinds, vec!["jar", "war", "rar"]);
        assert_eq!(config.stage.unpack_kinds, vec!["zip"]);
        assert_eq!(config.stage.include_scope, vec!["compile"]);
        assert_eq!(config.stage.exclude_scope, vec!["test", "system"]);
        assert!(config.stage.silent);
        assert!(!config.sources.silent);
        assert_eq!(config.zip.extension, "zip");
    }

    #[test]
    fn explicit_missing_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nope.toml");
        assert!(matches!(
            FileConfig::load(Some(&path)),
            Err(ConfigError::Read { .. })
        ));
    }

    #[test]
    fn goal_tables_override_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diststage.toml");
        fs::write(
            &path,
            "[stage]\n\
             stage_dir = \"out/stage\"\n\
             copy_kinds = [\"jar\"]\n\
             copy_excludes = [\"org.example:widget\"]\n\n\
             [[stage.mappings]]\n\
             artifact_id = \"widget\"\n\
             name = \"renamed\"\n\n\
             [zip]\n\
             duplicate = \"preserve\"\n",
        )
        .unwrap();

        let config = FileConfig::load(Some(&path)).unwrap();
        assert_eq!(config.stage.stage_dir, PathBuf::from("out/stage"));
        assert_eq!(config.stage.copy_kinds, vec!["jar"]);
        assert_eq!(config.stage.copy_excludes, vec!["org.example:widget"]);
        assert_eq!(config.stage.mappings.len(), 1);
        assert_eq!(config.stage.mappings[0].name, "renamed");
        // untouched tables keep their defaults
        assert!(!config.sources.skip);
        assert_eq!(config.zip.duplicate, crate::archive::Duplicate::Preserve);
    }

    #[test]
    fn malformed_file_is_a_parse_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("diststage.toml");
        fs::write(&path, "[stage\n").unwrap();
        assert!(matches!(
            FileConfig::load(Some(&path)),
            Err(ConfigError::Parse { .. })
        ));
    }
}
