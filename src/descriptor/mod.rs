//! Project descriptor model.
//!
//! A descriptor is a TOML file declaring the project coordinates and
//! its direct dependencies. Reading keeps the leading `#` comment
//! block aside so a regenerated descriptor starts with the same
//! comments verbatim.

use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::info;

/// Descriptor read/write/regenerate errors.
#[derive(Debug, Error)]
pub enum DescriptorError {
    #[error("failed to read descriptor {path}: {source}")]
    Read {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("failed to write descriptor {path}: {source}")]
    Write {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("malformed descriptor {path}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: toml::de::Error,
    },

    #[error("failed to serialize descriptor: {0}")]
    Serialize(#[from] toml::ser::Error),
}

/// Project identity and metadata.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ProjectInfo {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Base name for produced archives; defaults to `artifact-version`.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub final_name: Option<String>,
}

/// One declared dependency.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DependencySpec {
    pub group: String,
    pub artifact: String,
    pub version: String,
    #[serde(default = "default_kind")]
    pub kind: String,
    #[serde(default, skip_serializing_if = "String::is_empty")]
    pub classifier: String,
    #[serde(default = "default_dep_scope")]
    pub scope: String,
}

fn default_kind() -> String {
    "jar".to_string()
}

fn default_dep_scope() -> String {
    "compile".to_string()
}

/// The structured descriptor content.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Project {
    pub project: ProjectInfo,
    #[serde(default, rename = "dependency", skip_serializing_if = "Vec::is_empty")]
    pub dependencies: Vec<DependencySpec>,
}

impl Project {
    /// Base name for produced archives.
    pub fn final_name(&self) -> String {
        self.project.final_name.clone().unwrap_or_else(|| {
            format!("{}-{}", self.project.artifact, self.project.version)
        })
    }
}

/// A descriptor file: the parsed model plus its leading comment block.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Descriptor {
    /// Leading comment lines (and blank lines among them), verbatim.
    pub header: String,
    pub project: Project,
}

impl Descriptor {
    pub fn read(path: &Path) -> Result<Self, DescriptorError> {
        let text = fs::read_to_string(path).map_err(|source| DescriptorError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        let project = toml::from_str(&text).map_err(|source| DescriptorError::Parse {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self {
            header: leading_comments(&text),
            project,
        })
    }

    /// Serialize the model after the preserved comment block.
    pub fn write(&self, path: &Path) -> Result<(), DescriptorError> {
        let body = toml::to_string_pretty(&self.project)?;
        let mut text = String::with_capacity(self.header.len() + body.len());
        text.push_str(&self.header);
        text.push_str(&body);
        fs::write(path, text).map_err(|source| DescriptorError::Write {
            path: path.to_path_buf(),
            source,
        })
    }
}

/// The comment block at the top of the file: every line up to the
/// first line that is neither blank nor a `#` comment.
fn leading_comments(text: &str) -> String {
    let mut header = String::new();
    for line in text.lines() {
        let trimmed = line.trim_start();
        if !trimmed.is_empty() && !trimmed.starts_with('#') {
            break;
        }
        header.push_str(line);
        header.push('\n');
    }
    header
}

/// Configuration for the `generate` goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GenerateConfig {
    pub skip: bool,
    /// Source descriptor to regenerate from.
    pub descriptor: PathBuf,
    pub output_dir: PathBuf,
    pub group: Option<String>,
    pub artifact: Option<String>,
    pub version: Option<String>,
    pub name: Option<String>,
    pub description: Option<String>,
    /// Artifact ids to drop from the dependency list.
    pub exclude_dependencies: Vec<String>,
    /// Scopes to drop from the dependency list.
    pub exclude_dependency_scopes: Vec<String>,
}

impl Default for GenerateConfig {
    fn default() -> Self {
        Self {
            skip: false,
            descriptor: PathBuf::from("project.toml"),
            output_dir: PathBuf::from("target"),
            group: None,
            artifact: None,
            version: None,
            name: None,
            description: None,
            exclude_dependencies: Vec::new(),
            exclude_dependency_scopes: vec!["system".to_string(), "test".to_string()],
        }
    }
}

/// Regenerate a descriptor: apply identity overrides, drop excluded
/// dependencies, and write `{output_dir}/project.toml` with the source
/// descriptor's leading comments preserved.
pub fn regenerate(config: &GenerateConfig) -> Result<Option<PathBuf>, DescriptorError> {
    if config.skip {
        info!("skipping generate");
        return Ok(None);
    }

    let mut descriptor = Descriptor::read(&config.descriptor)?;
    let info = &mut descriptor.project.project;
    if let Some(group) = &config.group {
        info.group = group.clone();
    }
    if let Some(artifact) = &config.artifact {
        info.artifact = artifact.clone();
    }
    if let Some(version) = &config.version {
        info.version = version.clone();
    }
    if config.name.is_some() {
        info.name = config.name.clone();
    }
    if config.description.is_some() {
        info.description = config.description.clone();
    }

    descriptor.project.dependencies.retain(|dep| {
        !config.exclude_dependencies.contains(&dep.artifact)
            && !config.exclude_dependency_scopes.contains(&dep.scope)
    });

    fs::create_dir_all(&config.output_dir).map_err(|source| DescriptorError::Write {
        path: config.output_dir.clone(),
        source,
    })?;
    let out = config.output_dir.join("project.toml");
    descriptor.write(&out)?;
    info!(path = %out.display(), "regenerated descriptor");
    Ok(Some(out))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    const SAMPLE: &str = "\
# Copyright notice
# kept verbatim

[project]
group = \"org.example\"
artifact = \"dist\"
version = \"2.0\"

[[dependency]]
group = \"org.example\"
artifact = \"widget\"
version = \"1.0\"

[[dependency]]
group = \"org.example\"
artifact = \"testkit\"
version = \"1.0\"
scope = \"test\"
";

    fn write_sample(dir: &TempDir) -> PathBuf {
        let path = dir.path().join("project.toml");
        fs::write(&path, SAMPLE).unwrap();
        path
    }

    #[test]
    fn read_parses_model_and_header() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let descriptor = Descriptor::read(&path).unwrap();
        assert_eq!(descriptor.header, "# Copyright notice\n# kept verbatim\n\n");
        assert_eq!(descriptor.project.project.artifact, "dist");
        assert_eq!(descriptor.project.dependencies.len(), 2);
        assert_eq!(descriptor.project.dependencies[0].kind, "jar");
        assert_eq!(descriptor.project.dependencies[0].scope, "compile");
        assert_eq!(descriptor.project.dependencies[1].scope, "test");
    }

    #[test]
    fn final_name_defaults_to_artifact_and_version() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let descriptor = Descriptor::read(&path).unwrap();
        assert_eq!(descriptor.project.final_name(), "dist-2.0");
    }

    #[test]
    fn regenerate_preserves_comments_and_drops_excluded() {
        let dir = TempDir::new().unwrap();
        let path = write_sample(&dir);
        let config = GenerateConfig {
            descriptor: path,
            output_dir: dir.path().join("out"),
            version: Some("3.0".to_string()),
            exclude_dependencies: vec!["widget".to_string()],
            ..GenerateConfig::default()
        };

        let out = regenerate(&config).unwrap().unwrap();
        let text = fs::read_to_string(&out).unwrap();
        assert!(text.starts_with("# Copyright notice\n# kept verbatim\n"));

        let regenerated = Descriptor::read(&out).unwrap();
        assert_eq!(regenerated.project.project.version, "3.0");
        // widget excluded by artifact id, testkit by the default scope list
        assert!(regenerated.project.dependencies.is_empty());
    }

    #[test]
    fn regenerate_skip_writes_nothing() {
        let config = GenerateConfig {
            skip: true,
            descriptor: PathBuf::from("/nonexistent/project.toml"),
            ..GenerateConfig::default()
        };
        assert!(regenerate(&config).unwrap().is_none());
    }

    #[test]
    fn parse_error_names_the_file() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("project.toml");
        fs::write(&path, "not toml [").unwrap();
        let err = Descriptor::read(&path).unwrap_err();
        assert!(matches!(err, DescriptorError::Parse { .. }));
    }
}
