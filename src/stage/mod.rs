//! The stage-dependencies goal.
//!
//! Expands feature-set dependencies into their declared direct
//! dependencies, applies the scope rule, resolves everything, then
//! copies or unpacks each resolved artifact into the stage directory
//! according to the dispatch rules. Failures while staging one
//! artifact are reported and do not stop the batch; configuration and
//! resolution failures abort the goal.

use crate::archive;
use crate::descriptor::Project;
use crate::resolver::{ArtifactRequest, ResolveError, Resolver};
use diststage_rules::{map_name, Action, Artifact, Dispatcher, MappingRule, PatternError};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs;
use std::io;
use std::path::PathBuf;
use thiserror::Error;
use tracing::{error, info, warn};

/// Hard failures for the stage goal.
#[derive(Debug, Error)]
pub enum StageError {
    #[error("invalid exclusion pattern: {0}")]
    Pattern(#[from] PatternError),

    #[error(transparent)]
    Resolve(#[from] ResolveError),

    #[error("cannot create stage directory {path}: {source}")]
    StageDir {
        path: PathBuf,
        #[source]
        source: io::Error,
    },
}

/// Configuration for the stage goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StageConfig {
    pub skip: bool,
    /// Suppress per-file copy/unpack log lines.
    pub silent: bool,
    pub stage_dir: PathBuf,
    /// Kinds eligible for copying.
    pub copy_kinds: Vec<String>,
    /// Kinds eligible for unpacking.
    pub unpack_kinds: Vec<String>,
    /// `artifact` | `group:artifact` | `group:artifact:version` patterns.
    pub copy_excludes: Vec<String>,
    pub unpack_excludes: Vec<String>,
    /// Glob selectors applied while unpacking.
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    /// Group ids whose dependencies are feature sets to expand.
    pub feature_set_groups: Vec<String>,
    /// Scopes to include; empty means all scopes.
    pub include_scope: Vec<String>,
    /// Scopes to exclude; exclusion wins over inclusion.
    pub exclude_scope: Vec<String>,
    /// Ordered output-name overrides.
    pub mappings: Vec<MappingRule>,
}

impl Default for StageConfig {
    fn default() -> Self {
        Self {
            skip: false,
            silent: true,
            stage_dir: PathBuf::from("target/stage"),
            copy_kinds: vec!["jar".into(), "war".into(), "rar".into()],
            unpack_kinds: vec!["zip".into()],
            copy_excludes: Vec::new(),
            unpack_excludes: Vec::new(),
            includes: Vec::new(),
            excludes: Vec::new(),
            feature_set_groups: Vec::new(),
            include_scope: vec!["compile".into()],
            exclude_scope: vec!["test".into(), "system".into()],
            mappings: Vec::new(),
        }
    }
}

impl StageConfig {
    fn scope_included(&self, scope: &str) -> bool {
        let included = self.include_scope.is_empty()
            || self.include_scope.iter().any(|s| s == scope);
        included && !self.exclude_scope.iter().any(|s| s == scope)
    }
}

/// Why an artifact was skipped.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SkipReason {
    /// Eligible for both actions, excluded from both lists.
    Suppressed,
    /// Kind matched neither the copy nor the unpack list.
    UnhandledKind,
    /// The resolver returned no usable backing file.
    NoBackingFile,
}

/// One successfully staged artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StagedEntry {
    pub artifact: String,
    pub action: Action,
    pub dest: PathBuf,
}

/// One skipped artifact.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SkippedEntry {
    pub artifact: String,
    pub reason: SkipReason,
}

/// One artifact whose copy/unpack failed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FailedEntry {
    pub artifact: String,
    pub error: String,
}

/// Outcome of one stage run.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct StageReport {
    pub staged: Vec<StagedEntry>,
    pub skipped: Vec<SkippedEntry>,
    pub failed: Vec<FailedEntry>,
}

impl StageReport {
    pub fn staged_count(&self, action: Action) -> usize {
        self.staged.iter().filter(|e| e.action == action).count()
    }
}

/// Run the stage goal against a project and a resolver.
pub fn run(
    config: &StageConfig,
    project: &Project,
    resolver: &dyn Resolver,
) -> Result<StageReport, StageError> {
    if config.skip {
        info!("skipping stage-dependencies");
        return Ok(StageReport::default());
    }

    let dispatcher = Dispatcher::from_config(
        &config.copy_kinds,
        &config.unpack_kinds,
        &config.copy_excludes,
        &config.unpack_excludes,
    )?;

    let artifacts = collect_artifacts(config, project, resolver)?;

    fs::create_dir_all(&config.stage_dir).map_err(|source| StageError::StageDir {
        path: config.stage_dir.clone(),
        source,
    })?;

    let mut report = StageReport::default();
    for artifact in artifacts {
        stage_one(config, &dispatcher, &artifact, &mut report);
    }

    info!(
        copied = report.staged_count(Action::Copy),
        unpacked = report.staged_count(Action::Unpack),
        skipped = report.skipped.len(),
        failed = report.failed.len(),
        "stage-dependencies finished"
    );
    Ok(report)
}

/// Gather the artifact set: feature-set dependencies are expanded into
/// their declared direct dependencies, other direct dependencies are
/// taken as-is, and everything passes the scope rule. Requests are
/// de-duplicated by coordinates; a direct declaration wins over a
/// feature-set expansion of the same artifact.
fn collect_artifacts(
    config: &StageConfig,
    project: &Project,
    resolver: &dyn Resolver,
) -> Result<Vec<Artifact>, StageError> {
    let is_feature_set =
        |group: &str| config.feature_set_groups.iter().any(|g| g == group);

    // request -> (scope, direct)
    let mut requests: BTreeMap<ArtifactRequest, (String, bool)> = BTreeMap::new();

    for spec in &project.dependencies {
        if !is_feature_set(&spec.group) {
            continue;
        }
        for dep in resolver.dependencies(&ArtifactRequest::from_spec(spec))? {
            if !config.scope_included(&dep.scope) {
                continue;
            }
            requests
                .entry(ArtifactRequest::from_spec(&dep))
                .or_insert((dep.scope.clone(), false));
        }
    }

    for spec in &project.dependencies {
        if is_feature_set(&spec.group) || !config.scope_included(&spec.scope) {
            continue;
        }
        requests.insert(
            ArtifactRequest::from_spec(spec),
            (spec.scope.clone(), true),
        );
    }

    let mut artifacts = Vec::with_capacity(requests.len());
    for (request, (scope, direct)) in requests {
        let resolved = resolver.resolve(&request)?;
        artifacts.push(Artifact {
            scope,
            direct,
            ..resolved
        });
    }
    Ok(artifacts)
}

fn stage_one(
    config: &StageConfig,
    dispatcher: &Dispatcher,
    artifact: &Artifact,
    report: &mut StageReport,
) {
    if !artifact.has_backing_file() {
        error!(artifact = %artifact, "no backing file; skipping");
        report.skipped.push(SkippedEntry {
            artifact: artifact.to_string(),
            reason: SkipReason::NoBackingFile,
        });
        return;
    }
    // checked above
    let source = match &artifact.file {
        Some(file) => file.clone(),
        None => return,
    };

    match dispatcher.decide(artifact) {
        Action::Copy => {
            let name = map_name(&config.mappings, artifact);
            let dest = config.stage_dir.join(format!("{name}.{}", artifact.kind));
            if !config.silent {
                info!(from = %source.display(), to = %dest.display(), "copying");
            }
            match fs::copy(&source, &dest) {
                Ok(_) => report.staged.push(StagedEntry {
                    artifact: artifact.to_string(),
                    action: Action::Copy,
                    dest,
                }),
                Err(err) => {
                    error!(artifact = %artifact, %err, "copy failed");
                    report.failed.push(FailedEntry {
                        artifact: artifact.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Action::Unpack => {
            let name = map_name(&config.mappings, artifact);
            let dest = config.stage_dir.join(name);
            if !config.silent {
                info!(from = %source.display(), to = %dest.display(), "unpacking");
            }
            match archive::unpack(&source, &dest, &config.includes, &config.excludes) {
                Ok(()) => report.staged.push(StagedEntry {
                    artifact: artifact.to_string(),
                    action: Action::Unpack,
                    dest,
                }),
                Err(err) => {
                    error!(artifact = %artifact, %err, "unpack failed");
                    report.failed.push(FailedEntry {
                        artifact: artifact.to_string(),
                        error: err.to_string(),
                    });
                }
            }
        }
        Action::Suppressed => {
            warn!(artifact = %artifact, "excluded from both copy and unpack; skipping");
            report.skipped.push(SkippedEntry {
                artifact: artifact.to_string(),
                reason: SkipReason::Suppressed,
            });
        }
        Action::Unhandled => {
            warn!(artifact = %artifact, kind = %artifact.kind, "kind not handled; skipping");
            report.skipped.push(SkippedEntry {
                artifact: artifact.to_string(),
                reason: SkipReason::UnhandledKind,
            });
        }
    }
}
