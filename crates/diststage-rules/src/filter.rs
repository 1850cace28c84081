//! Predicate filters over artifact descriptors.
//!
//! Each filter tests one attribute dimension against an include list
//! and an exclude list. An empty include list means "include all" for
//! that dimension; a non-empty exclude list always overrides a
//! matching include. The chain applies the filters in a fixed order
//! (transitivity, scope, kind, classifier, group id, artifact id) and
//! keeps the artifacts for which every filter passes.

use crate::artifact::Artifact;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Filter configuration errors, reported before any filtering runs.
#[derive(Debug, Error)]
pub enum FilterError {
    #[error("empty entry in {dimension} {list} list")]
    EmptyEntry {
        dimension: &'static str,
        list: &'static str,
    },
}

/// Include/exclude lists for every filter dimension.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct FilterSpec {
    pub exclude_transitive: bool,
    pub include_scope: Vec<String>,
    pub exclude_scope: Vec<String>,
    pub include_kinds: Vec<String>,
    pub exclude_kinds: Vec<String>,
    pub include_classifiers: Vec<String>,
    pub exclude_classifiers: Vec<String>,
    pub include_groups: Vec<String>,
    pub exclude_groups: Vec<String>,
    pub include_artifacts: Vec<String>,
    pub exclude_artifacts: Vec<String>,
}

/// The attribute dimension a filter inspects.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Dimension {
    Scope,
    Kind,
    Classifier,
    GroupId,
    ArtifactId,
}

impl Dimension {
    fn name(self) -> &'static str {
        match self {
            Dimension::Scope => "scope",
            Dimension::Kind => "kind",
            Dimension::Classifier => "classifier",
            Dimension::GroupId => "group",
            Dimension::ArtifactId => "artifact",
        }
    }

    fn attr<'a>(self, artifact: &'a Artifact) -> &'a str {
        match self {
            Dimension::Scope => &artifact.scope,
            Dimension::Kind => &artifact.kind,
            Dimension::Classifier => &artifact.classifier,
            Dimension::GroupId => &artifact.group_id,
            Dimension::ArtifactId => &artifact.artifact_id,
        }
    }
}

/// One include/exclude filter over a single attribute dimension.
#[derive(Debug, Clone)]
struct AttributeFilter {
    dimension: Dimension,
    include: Vec<String>,
    exclude: Vec<String>,
}

impl AttributeFilter {
    fn new(
        dimension: Dimension,
        include: &[String],
        exclude: &[String],
    ) -> Result<Self, FilterError> {
        for (list, name) in [(include, "include"), (exclude, "exclude")] {
            if list.iter().any(|entry| entry.trim().is_empty()) {
                return Err(FilterError::EmptyEntry {
                    dimension: dimension.name(),
                    list: name,
                });
            }
        }
        Ok(Self {
            dimension,
            include: include.to_vec(),
            exclude: exclude.to_vec(),
        })
    }

    fn matches(&self, artifact: &Artifact) -> bool {
        let attr = self.dimension.attr(artifact);
        // An empty attribute never matches a non-empty include list.
        if attr.is_empty() && !self.include.is_empty() {
            return false;
        }
        let included = self.include.is_empty() || self.include.iter().any(|i| i == attr);
        included && !self.exclude.iter().any(|e| e == attr)
    }
}

/// Keeps only direct project dependencies when `exclude_transitive`
/// is set; passes everything otherwise.
#[derive(Debug, Clone, Copy)]
struct TransitivityFilter {
    exclude_transitive: bool,
}

impl TransitivityFilter {
    fn matches(&self, artifact: &Artifact) -> bool {
        !self.exclude_transitive || artifact.direct
    }
}

/// Conjunction of all six filters, in fixed order.
#[derive(Debug, Clone)]
pub struct FilterChain {
    transitivity: TransitivityFilter,
    attributes: Vec<AttributeFilter>,
}

impl FilterChain {
    /// Build the chain, validating the spec first. A malformed list is
    /// a configuration error and nothing is filtered.
    pub fn new(spec: &FilterSpec) -> Result<Self, FilterError> {
        let attributes = vec![
            AttributeFilter::new(Dimension::Scope, &spec.include_scope, &spec.exclude_scope)?,
            AttributeFilter::new(Dimension::Kind, &spec.include_kinds, &spec.exclude_kinds)?,
            AttributeFilter::new(
                Dimension::Classifier,
                &spec.include_classifiers,
                &spec.exclude_classifiers,
            )?,
            AttributeFilter::new(Dimension::GroupId, &spec.include_groups, &spec.exclude_groups)?,
            AttributeFilter::new(
                Dimension::ArtifactId,
                &spec.include_artifacts,
                &spec.exclude_artifacts,
            )?,
        ];
        Ok(Self {
            transitivity: TransitivityFilter {
                exclude_transitive: spec.exclude_transitive,
            },
            attributes,
        })
    }

    /// True when every filter in the chain passes.
    pub fn matches(&self, artifact: &Artifact) -> bool {
        self.transitivity.matches(artifact)
            && self.attributes.iter().all(|f| f.matches(artifact))
    }

    /// Keep the subset of `artifacts` accepted by the whole chain.
    pub fn filter<I>(&self, artifacts: I) -> Vec<Artifact>
    where
        I: IntoIterator<Item = Artifact>,
    {
        artifacts.into_iter().filter(|a| self.matches(a)).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn artifact(scope: &str, kind: &str) -> Artifact {
        Artifact {
            group_id: "org.example".into(),
            artifact_id: "widget".into(),
            version: "1.0".into(),
            classifier: String::new(),
            kind: kind.into(),
            scope: scope.into(),
            file: None,
            direct: true,
        }
    }

    #[test]
    fn empty_spec_accepts_everything() {
        let chain = FilterChain::new(&FilterSpec::default()).unwrap();
        assert!(chain.matches(&artifact("compile", "jar")));
        assert!(chain.matches(&artifact("test", "zip")));
    }

    #[test]
    fn include_scope_limits_to_listed_scopes() {
        let spec = FilterSpec {
            include_scope: vec!["compile".into(), "runtime".into()],
            ..FilterSpec::default()
        };
        let chain = FilterChain::new(&spec).unwrap();
        assert!(chain.matches(&artifact("compile", "jar")));
        assert!(chain.matches(&artifact("runtime", "jar")));
        assert!(!chain.matches(&artifact("test", "jar")));
    }

    #[test]
    fn exclude_overrides_matching_include() {
        let spec = FilterSpec {
            include_scope: vec!["compile".into()],
            exclude_scope: vec!["compile".into()],
            ..FilterSpec::default()
        };
        let chain = FilterChain::new(&spec).unwrap();
        assert!(!chain.matches(&artifact("compile", "jar")));
    }

    #[test]
    fn empty_attribute_never_matches_nonempty_include() {
        let spec = FilterSpec {
            include_classifiers: vec!["sources".into()],
            ..FilterSpec::default()
        };
        let chain = FilterChain::new(&spec).unwrap();
        // classifier is empty; must not be silently included
        assert!(!chain.matches(&artifact("compile", "jar")));
    }

    #[test]
    fn transitive_artifacts_dropped_when_requested() {
        let spec = FilterSpec {
            exclude_transitive: true,
            ..FilterSpec::default()
        };
        let chain = FilterChain::new(&spec).unwrap();
        let mut a = artifact("compile", "jar");
        assert!(chain.matches(&a));
        a.direct = false;
        assert!(!chain.matches(&a));
    }

    #[test]
    fn unrelated_dimension_does_not_affect_result() {
        // include/exclude both empty for kind: kind must not matter
        let spec = FilterSpec {
            include_scope: vec!["compile".into()],
            ..FilterSpec::default()
        };
        let chain = FilterChain::new(&spec).unwrap();
        assert!(chain.matches(&artifact("compile", "jar")));
        assert!(chain.matches(&artifact("compile", "zip")));
        assert!(chain.matches(&artifact("compile", "war")));
    }

    #[test]
    fn blank_list_entry_is_a_configuration_error() {
        let spec = FilterSpec {
            include_groups: vec!["org.example".into(), "  ".into()],
            ..FilterSpec::default()
        };
        assert!(matches!(
            FilterChain::new(&spec),
            Err(FilterError::EmptyEntry { dimension: "group", list: "include" })
        ));
    }

    #[test]
    fn filter_keeps_only_accepted_artifacts() {
        let spec = FilterSpec {
            include_scope: vec!["compile".into()],
            exclude_kinds: vec!["zip".into()],
            ..FilterSpec::default()
        };
        let chain = FilterChain::new(&spec).unwrap();
        let kept = chain.filter(vec![
            artifact("compile", "jar"),
            artifact("compile", "zip"),
            artifact("test", "jar"),
        ]);
        assert_eq!(kept.len(), 1);
        assert_eq!(kept[0].kind, "jar");
        assert_eq!(kept[0].scope, "compile");
    }
}
