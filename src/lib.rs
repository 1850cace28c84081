//! diststage - distribution staging for TOML-described projects
//!
//! This crate assembles distribution trees from a project descriptor:
//! it resolves declared dependencies against a repository, decides per
//! artifact whether to copy or unpack it, and packages the result. The
//! rule engine (filters, action dispatch, name mapping) lives in the
//! `diststage-rules` crate; this crate adds the resolver, the archive
//! helpers, and the goal runners behind the `diststage` binary.

pub mod archive;
pub mod config;
pub mod descriptor;
pub mod merge;
pub mod resolver;
pub mod sources;
pub mod stage;

pub use config::FileConfig;
pub use descriptor::{DependencySpec, Descriptor, Project, ProjectInfo};
pub use resolver::{ArtifactRequest, LocalRepository, ResolveError, Resolver};
pub use stage::{StageConfig, StageReport};

pub use diststage_rules::{
    map_name, Action, Artifact, Dispatcher, ExcludePattern, FilterChain, FilterSpec, MappingRule,
};
