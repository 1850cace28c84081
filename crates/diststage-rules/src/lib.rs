//! Artifact filtering and copy/unpack dispatch rules.
//!
//! Given a set of resolved artifacts and a configuration of
//! include/exclude predicates, these rules decide which artifacts
//! survive filtering, which action each one gets (copy, unpack, or
//! nothing) and under what output name it is staged. The rules are
//! pure decision logic; resolution, archiving and file I/O live in
//! the `diststage` crate.

mod artifact;
mod dispatch;
mod filter;
mod mapping;

pub use artifact::Artifact;
pub use dispatch::{Action, Dispatcher, ExcludePattern, PatternError};
pub use filter::{FilterChain, FilterError, FilterSpec};
pub use mapping::{map_name, MappingRule};
