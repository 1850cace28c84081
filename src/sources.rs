//! The unpack-sources goal.
//!
//! Filters the project's resolved dependencies through the full
//! filter chain, resolves the `sources` jar counterpart of each
//! survivor, and unpacks it into the output directory. Resolution
//! failures abort the goal.

use crate::archive::{self, ArchiveError};
use crate::descriptor::Project;
use crate::resolver::{resolve_project, ArtifactRequest, ResolveError, Resolver};
use diststage_rules::{FilterChain, FilterError, FilterSpec};
use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use thiserror::Error;
use tracing::info;

#[derive(Debug, Error)]
pub enum SourcesError {
    #[error("invalid filter configuration: {0}")]
    Filter(#[from] FilterError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("failed to unpack {artifact}: {source}")]
    Unpack {
        artifact: String,
        #[source]
        source: ArchiveError,
    },
}

/// Configuration for the unpack-sources goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct SourcesConfig {
    pub skip: bool,
    pub silent: bool,
    pub output_dir: PathBuf,
    /// Dependency filter applied before resolving sources.
    pub filter: FilterSpec,
    /// Glob selectors applied while unpacking.
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            skip: false,
            silent: false,
            output_dir: PathBuf::from("target/sources-dependency"),
            filter: FilterSpec::default(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }
}

/// Run the unpack-sources goal; returns the coordinates whose sources
/// were unpacked.
pub fn run(
    config: &SourcesConfig,
    project: &Project,
    resolver: &dyn Resolver,
) -> Result<Vec<String>, SourcesError> {
    if config.skip {
        info!("skipping unpack-sources");
        return Ok(Vec::new());
    }

    let chain = FilterChain::new(&config.filter)?;
    let artifacts = resolve_project(project, resolver)?;

    let mut unpacked = Vec::new();
    for artifact in chain.filter(artifacts) {
        // the sources counterpart shares the coordinates
        let request = ArtifactRequest {
            group_id: artifact.group_id.clone(),
            artifact_id: artifact.artifact_id.clone(),
            version: artifact.version.clone(),
            kind: "jar".to_string(),
            classifier: "sources".to_string(),
        };

        let sources = resolver.resolve(&request)?;
        let file = match &sources.file {
            Some(file) => file.clone(),
            None => {
                return Err(SourcesError::Resolve(ResolveError::NotFound {
                    coords: request.coords(),
                    kind: request.kind.clone(),
                    classifier: request.classifier.clone(),
                }))
            }
        };

        if !config.silent {
            info!(
                artifact = %sources,
                to = %config.output_dir.display(),
                "unpacking sources"
            );
        }
        archive::unpack(&file, &config.output_dir, &config.includes, &config.excludes)
            .map_err(|source| SourcesError::Unpack {
                artifact: sources.to_string(),
                source,
            })?;
        unpacked.push(artifact.coords());
    }
    Ok(unpacked)
}
