//! Artifact descriptor: one resolved dependency.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::path::PathBuf;

/// A single resolved dependency.
///
/// Constructed once by the resolver and never mutated afterwards. A
/// missing `file` marks an artifact that could not be resolved to a
/// backing file; such artifacts are never staged.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Artifact {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    /// Secondary qualifier, e.g. "sources". Empty means no classifier.
    #[serde(default)]
    pub classifier: String,
    /// File extension, e.g. "jar" or "zip".
    pub kind: String,
    /// Dependency scope, e.g. "compile", "test", "runtime".
    #[serde(default = "default_scope")]
    pub scope: String,
    /// Backing file on disk, if resolved.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub file: Option<PathBuf>,
    /// True for direct project dependencies, false for artifacts
    /// pulled in transitively.
    #[serde(default)]
    pub direct: bool,
}

fn default_scope() -> String {
    "compile".to_string()
}

impl Artifact {
    /// Render the `group:artifact:version` coordinates.
    pub fn coords(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }

    /// True when the backing file is present and has a non-empty file name.
    pub fn has_backing_file(&self) -> bool {
        match &self.file {
            Some(path) => path
                .file_name()
                .map(|name| !name.is_empty())
                .unwrap_or(false),
            None => false,
        }
    }
}

impl fmt::Display for Artifact {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.classifier.is_empty() {
            write!(
                f,
                "{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.kind, self.version
            )
        } else {
            write!(
                f,
                "{}:{}:{}:{}:{}",
                self.group_id, self.artifact_id, self.kind, self.classifier, self.version
            )
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact() -> Artifact {
        Artifact {
            group_id: "org.example".into(),
            artifact_id: "widget".into(),
            version: "1.2.0".into(),
            classifier: String::new(),
            kind: "jar".into(),
            scope: "compile".into(),
            file: Some(PathBuf::from("/repo/widget-1.2.0.jar")),
            direct: true,
        }
    }

    #[test]
    fn coords_are_group_artifact_version() {
        assert_eq!(artifact().coords(), "org.example:widget:1.2.0");
    }

    #[test]
    fn display_includes_classifier_when_present() {
        let mut a = artifact();
        assert_eq!(a.to_string(), "org.example:widget:jar:1.2.0");
        a.classifier = "sources".into();
        assert_eq!(a.to_string(), "org.example:widget:jar:sources:1.2.0");
    }

    #[test]
    fn missing_file_is_not_a_backing_file() {
        let mut a = artifact();
        assert!(a.has_backing_file());
        a.file = None;
        assert!(!a.has_backing_file());
    }

    #[test]
    fn empty_file_name_is_not_a_backing_file() {
        let mut a = artifact();
        a.file = Some(PathBuf::from(""));
        assert!(!a.has_backing_file());
    }
}
