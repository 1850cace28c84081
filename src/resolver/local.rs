//! Directory-layout repository.
//!
//! Artifacts live under
//! `{root}/{group as path}/{artifact}/{version}/` with the file name
//! `{artifact}-{version}[-{classifier}].{kind}`, and the artifact's
//! own descriptor alongside as `{artifact}-{version}.toml`.

use super::{ArtifactRequest, ResolveError, Resolver};
use crate::descriptor::{DependencySpec, Descriptor};
use diststage_rules::Artifact;
use std::path::{Path, PathBuf};
use tracing::debug;

/// A repository rooted at a local directory.
#[derive(Debug, Clone)]
pub struct LocalRepository {
    root: PathBuf,
}

impl LocalRepository {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }

    pub fn root(&self) -> &Path {
        &self.root
    }

    fn version_dir(&self, request: &ArtifactRequest) -> PathBuf {
        let mut dir = self.root.clone();
        for part in request.group_id.split('.') {
            dir.push(part);
        }
        dir.push(&request.artifact_id);
        dir.push(&request.version);
        dir
    }

    fn artifact_path(&self, request: &ArtifactRequest) -> PathBuf {
        let mut name = format!("{}-{}", request.artifact_id, request.version);
        if !request.classifier.is_empty() {
            name.push('-');
            name.push_str(&request.classifier);
        }
        name.push('.');
        name.push_str(&request.kind);
        self.version_dir(request).join(name)
    }

    fn descriptor_path(&self, request: &ArtifactRequest) -> PathBuf {
        self.version_dir(request).join(format!(
            "{}-{}.toml",
            request.artifact_id, request.version
        ))
    }
}

impl Resolver for LocalRepository {
    fn resolve(&self, request: &ArtifactRequest) -> Result<Artifact, ResolveError> {
        let path = self.artifact_path(request);
        if !path.is_file() {
            return Err(ResolveError::NotFound {
                coords: request.coords(),
                kind: request.kind.clone(),
                classifier: request.classifier.clone(),
            });
        }
        debug!(path = %path.display(), "resolved artifact");
        Ok(Artifact {
            group_id: request.group_id.clone(),
            artifact_id: request.artifact_id.clone(),
            version: request.version.clone(),
            classifier: request.classifier.clone(),
            kind: request.kind.clone(),
            scope: "compile".to_string(),
            file: Some(path),
            direct: false,
        })
    }

    fn dependencies(
        &self,
        request: &ArtifactRequest,
    ) -> Result<Vec<DependencySpec>, ResolveError> {
        let path = self.descriptor_path(request);
        if !path.is_file() {
            return Err(ResolveError::DescriptorNotFound {
                coords: request.coords(),
            });
        }
        let descriptor = Descriptor::read(&path).map_err(|source| ResolveError::Descriptor {
            coords: request.coords(),
            source,
        })?;
        Ok(descriptor.project.dependencies)
    }
}
