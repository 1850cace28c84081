//! Dependency resolution interface.
//!
//! The staging goals do not resolve dependency graphs themselves;
//! they hand coordinate requests to a [`Resolver`] and get back
//! descriptors with backing files. The resolver is always passed in
//! explicitly.

mod local;

pub use local::LocalRepository;

use crate::descriptor::{DependencySpec, DescriptorError, Project};
use diststage_rules::Artifact;
use std::io;
use thiserror::Error;

/// A coordinate request for one artifact.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord)]
pub struct ArtifactRequest {
    pub group_id: String,
    pub artifact_id: String,
    pub version: String,
    pub kind: String,
    /// Empty means no classifier.
    pub classifier: String,
}

impl ArtifactRequest {
    /// Request the artifact declared by a dependency entry.
    pub fn from_spec(spec: &DependencySpec) -> Self {
        Self {
            group_id: spec.group.clone(),
            artifact_id: spec.artifact.clone(),
            version: spec.version.clone(),
            kind: spec.kind.clone(),
            classifier: spec.classifier.clone(),
        }
    }

    pub fn coords(&self) -> String {
        format!("{}:{}:{}", self.group_id, self.artifact_id, self.version)
    }
}

/// Resolution failures. All of these abort the invocation.
#[derive(Debug, Error)]
pub enum ResolveError {
    #[error("cannot resolve artifact {coords} ({kind}{classifier})", classifier = fmt_classifier(.classifier))]
    NotFound {
        coords: String,
        kind: String,
        classifier: String,
    },

    #[error("cannot resolve descriptor for {coords}")]
    DescriptorNotFound { coords: String },

    #[error("descriptor error for {coords}: {source}")]
    Descriptor {
        coords: String,
        #[source]
        source: DescriptorError,
    },

    #[error("repository I/O error: {0}")]
    Io(#[from] io::Error),
}

fn fmt_classifier(classifier: &str) -> String {
    if classifier.is_empty() {
        String::new()
    } else {
        format!(", classifier {classifier}")
    }
}

/// Resolves coordinate requests against a repository.
pub trait Resolver {
    /// Resolve one artifact to a descriptor with a backing file.
    fn resolve(&self, request: &ArtifactRequest) -> Result<Artifact, ResolveError>;

    /// Read the artifact's own descriptor and return its declared
    /// direct dependencies.
    fn dependencies(&self, request: &ArtifactRequest)
        -> Result<Vec<DependencySpec>, ResolveError>;
}

/// Resolve every direct dependency of a project.
///
/// The returned artifacts carry the declared scope and are marked as
/// direct dependencies. Any resolution failure aborts the whole call.
pub fn resolve_project(
    project: &Project,
    resolver: &dyn Resolver,
) -> Result<Vec<Artifact>, ResolveError> {
    let mut artifacts = Vec::with_capacity(project.dependencies.len());
    for spec in &project.dependencies {
        let resolved = resolver.resolve(&ArtifactRequest::from_spec(spec))?;
        artifacts.push(Artifact {
            scope: spec.scope.clone(),
            direct: true,
            ..resolved
        });
    }
    Ok(artifacts)
}
