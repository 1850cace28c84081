//! Copy/unpack action dispatch.
//!
//! Given the copy-eligible and unpack-eligible kind lists plus the two
//! exclusion-pattern lists, the dispatcher assigns one action per
//! artifact. The dispatcher is pure: it returns a decision and leaves
//! the copy/unpack calls (and logging) to the caller.

use crate::artifact::Artifact;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Pattern parse errors. These are configuration errors and fail the
/// invocation before any artifact is processed.
#[derive(Debug, Error, PartialEq, Eq)]
pub enum PatternError {
    #[error("empty exclusion pattern")]
    Empty,
    #[error("empty segment in exclusion pattern `{0}`")]
    EmptySegment(String),
    #[error("too many segments in exclusion pattern `{0}` (expected group:artifact[:version])")]
    TooManySegments(String),
}

/// An artifact exclusion pattern.
///
/// Accepted forms, matched by exact string equality on the present
/// fields (no wildcard support):
/// - `artifactId`
/// - `groupId:artifactId`
/// - `groupId:artifactId:version`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct ExcludePattern {
    group_id: Option<String>,
    artifact_id: String,
    version: Option<String>,
}

impl ExcludePattern {
    pub fn matches(&self, artifact: &Artifact) -> bool {
        if let Some(group) = &self.group_id {
            if group != &artifact.group_id {
                return false;
            }
        }
        if self.artifact_id != artifact.artifact_id {
            return false;
        }
        if let Some(version) = &self.version {
            if version != &artifact.version {
                return false;
            }
        }
        true
    }
}

impl FromStr for ExcludePattern {
    type Err = PatternError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() {
            return Err(PatternError::Empty);
        }
        let segments: Vec<&str> = s.split(':').collect();
        if segments.iter().any(|seg| seg.trim().is_empty()) {
            return Err(PatternError::EmptySegment(s.to_string()));
        }
        match segments.as_slice() {
            [artifact] => Ok(Self {
                group_id: None,
                artifact_id: artifact.to_string(),
                version: None,
            }),
            [group, artifact] => Ok(Self {
                group_id: Some(group.to_string()),
                artifact_id: artifact.to_string(),
                version: None,
            }),
            [group, artifact, version] => Ok(Self {
                group_id: Some(group.to_string()),
                artifact_id: artifact.to_string(),
                version: Some(version.to_string()),
            }),
            _ => Err(PatternError::TooManySegments(s.to_string())),
        }
    }
}

impl TryFrom<String> for ExcludePattern {
    type Error = PatternError;

    fn try_from(s: String) -> Result<Self, Self::Error> {
        s.parse()
    }
}

impl From<ExcludePattern> for String {
    fn from(p: ExcludePattern) -> String {
        p.to_string()
    }
}

impl fmt::Display for ExcludePattern {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if let Some(group) = &self.group_id {
            write!(f, "{group}:")?;
        }
        write!(f, "{}", self.artifact_id)?;
        if let Some(version) = &self.version {
            write!(f, ":{version}")?;
        }
        Ok(())
    }
}

/// The action assigned to one artifact.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Action {
    /// Copy the backing file into the stage directory.
    Copy,
    /// Extract the backing archive under the stage directory.
    Unpack,
    /// Eligible for both actions but excluded from both; nothing done.
    Suppressed,
    /// Kind matched neither eligibility list; nothing done.
    Unhandled,
}

impl Action {
    /// True for the two decisions that stage nothing.
    pub fn is_skip(self) -> bool {
        matches!(self, Action::Suppressed | Action::Unhandled)
    }
}

/// Decides the action for each artifact.
#[derive(Debug, Clone, Default)]
pub struct Dispatcher {
    copy_kinds: Vec<String>,
    unpack_kinds: Vec<String>,
    copy_excludes: Vec<ExcludePattern>,
    unpack_excludes: Vec<ExcludePattern>,
}

impl Dispatcher {
    pub fn new(
        copy_kinds: Vec<String>,
        unpack_kinds: Vec<String>,
        copy_excludes: Vec<ExcludePattern>,
        unpack_excludes: Vec<ExcludePattern>,
    ) -> Self {
        Self {
            copy_kinds,
            unpack_kinds,
            copy_excludes,
            unpack_excludes,
        }
    }

    /// Parse the exclusion lists and build a dispatcher. The first
    /// malformed pattern fails the whole configuration.
    pub fn from_config(
        copy_kinds: &[String],
        unpack_kinds: &[String],
        copy_excludes: &[String],
        unpack_excludes: &[String],
    ) -> Result<Self, PatternError> {
        let parse = |patterns: &[String]| -> Result<Vec<ExcludePattern>, PatternError> {
            patterns.iter().map(|p| p.parse()).collect()
        };
        Ok(Self {
            copy_kinds: copy_kinds.to_vec(),
            unpack_kinds: unpack_kinds.to_vec(),
            copy_excludes: parse(copy_excludes)?,
            unpack_excludes: parse(unpack_excludes)?,
        })
    }

    /// Assign an action to one artifact.
    ///
    /// When the kind is eligible for both copy and unpack, the
    /// exclusion lists break the tie; excluded from both suppresses
    /// the artifact entirely, and excluded from neither falls back to
    /// copy. When only one list matches the kind, the exclusion lists
    /// are not consulted.
    pub fn decide(&self, artifact: &Artifact) -> Action {
        let copy = self.copy_kinds.iter().any(|k| k == &artifact.kind);
        let unpack = self.unpack_kinds.iter().any(|k| k == &artifact.kind);

        match (copy, unpack) {
            (true, true) => {
                let copy_excluded = self.copy_excludes.iter().any(|p| p.matches(artifact));
                let unpack_excluded = self.unpack_excludes.iter().any(|p| p.matches(artifact));
                match (copy_excluded, unpack_excluded) {
                    (true, true) => Action::Suppressed,
                    (false, true) => Action::Copy,
                    (true, false) => Action::Unpack,
                    // copy takes precedence over unpack
                    (false, false) => Action::Copy,
                }
            }
            (true, false) => Action::Copy,
            (false, true) => Action::Unpack,
            (false, false) => Action::Unhandled,
        }
    }
}
