//! Output name mapping.
//!
//! An ordered list of mapping rules overrides the staged name of
//! selected artifacts; the first matching rule wins and the artifact
//! id is the fallback.

use crate::artifact::Artifact;
use serde::{Deserialize, Serialize};

/// One name-mapping rule.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MappingRule {
    /// When present, the rule only applies to this group id.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub group_id: Option<String>,
    pub artifact_id: String,
    /// The output name to use instead of the artifact id.
    pub name: String,
}

impl MappingRule {
    fn applies_to(&self, artifact: &Artifact) -> bool {
        if let Some(group) = &self.group_id {
            if group != &artifact.group_id {
                return false;
            }
        }
        self.artifact_id == artifact.artifact_id && !self.name.is_empty()
    }
}

/// Map an artifact to its staged output name.
///
/// Pure function: rules are evaluated in order, the first applicable
/// rule's name is returned, and the artifact id is used when no rule
/// matches.
pub fn map_name<'a>(rules: &'a [MappingRule], artifact: &'a Artifact) -> &'a str {
    rules
        .iter()
        .find(|rule| rule.applies_to(artifact))
        .map(|rule| rule.name.as_str())
        .unwrap_or(&artifact.artifact_id)
}
