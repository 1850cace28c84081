//! Archive packaging and extraction.
//!
//! Zip-family archives only (zip, jar, war). Creation takes a list of
//! file sets with include/exclude glob patterns and a duplicate
//! policy; extraction applies the same style of selectors per entry.

use globset::{Glob, GlobSet, GlobSetBuilder};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fs::{self, File};
use std::io;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use thiserror::Error;
use tracing::{debug, info, warn};
use walkdir::WalkDir;
use zip::write::SimpleFileOptions;
use zip::{ZipArchive, ZipWriter};

/// Extensions the unpacker recognizes. Everything in the zip family.
const UNPACK_KINDS: &[&str] = &["zip", "jar", "war"];

/// Archiver errors.
#[derive(Debug, Error)]
pub enum ArchiveError {
    #[error("unrecognized archive type: {path}")]
    UnknownKind { path: PathBuf },

    #[error("archive entry escapes destination: {name}")]
    EntryOutsideDest { name: String },

    #[error("duplicate archive entry: {name}")]
    DuplicateEntry { name: String },

    #[error("no final name configured for the archive")]
    MissingFinalName,

    #[error("invalid glob pattern: {0}")]
    Glob(#[from] globset::Error),

    #[error("zip error: {0}")]
    Zip(#[from] zip::result::ZipError),

    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    #[error("walk error: {0}")]
    Walk(#[from] walkdir::Error),
}

/// Behavior when two file sets contribute the same archive path.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Duplicate {
    /// Later entries replace earlier ones.
    #[default]
    Add,
    /// The first entry wins; later duplicates are skipped.
    Preserve,
    /// Any duplicate aborts the archive.
    Fail,
}

impl FromStr for Duplicate {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "add" => Ok(Duplicate::Add),
            "preserve" => Ok(Duplicate::Preserve),
            "fail" => Ok(Duplicate::Fail),
            other => Err(format!(
                "invalid duplicate policy `{other}` (expected add, preserve or fail)"
            )),
        }
    }
}

/// One directory tree to package, narrowed by glob patterns.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FileSet {
    pub dir: PathBuf,
    /// Include patterns; empty means all files.
    #[serde(default)]
    pub includes: Vec<String>,
    /// Exclude patterns; empty means exclude nothing.
    #[serde(default)]
    pub excludes: Vec<String>,
}

impl FileSet {
    pub fn new(dir: impl Into<PathBuf>) -> Self {
        Self {
            dir: dir.into(),
            includes: Vec::new(),
            excludes: Vec::new(),
        }
    }

    fn selector(&self) -> Result<Selector, ArchiveError> {
        Selector::new(&self.includes, &self.excludes)
    }
}

/// Include/exclude glob selector over relative paths.
struct Selector {
    includes: Option<GlobSet>,
    excludes: Option<GlobSet>,
}

impl Selector {
    fn new(includes: &[String], excludes: &[String]) -> Result<Self, ArchiveError> {
        Ok(Self {
            includes: build_glob_set(includes)?,
            excludes: build_glob_set(excludes)?,
        })
    }

    fn selects(&self, rel: &Path) -> bool {
        if let Some(includes) = &self.includes {
            if !includes.is_match(rel) {
                return false;
            }
        }
        match &self.excludes {
            Some(excludes) => !excludes.is_match(rel),
            None => true,
        }
    }
}

fn build_glob_set(patterns: &[String]) -> Result<Option<GlobSet>, ArchiveError> {
    if patterns.is_empty() {
        return Ok(None);
    }
    let mut builder = GlobSetBuilder::new();
    for pattern in patterns {
        builder.add(Glob::new(pattern)?);
    }
    Ok(Some(builder.build()?))
}

/// Create a zip archive at `dest` from the given file sets.
///
/// Entry names are the paths relative to each file set's directory
/// (forward slashes). Collisions across file sets are resolved by the
/// duplicate policy.
pub fn create_zip(
    filesets: &[FileSet],
    duplicate: Duplicate,
    dest: &Path,
) -> Result<PathBuf, ArchiveError> {
    info!(dest = %dest.display(), ?duplicate, "creating archive");

    let mut entries: BTreeMap<String, PathBuf> = BTreeMap::new();
    for fileset in filesets {
        if !fileset.dir.is_dir() {
            continue;
        }
        let selector = fileset.selector()?;
        for walked in WalkDir::new(&fileset.dir).sort_by_file_name() {
            let walked = walked?;
            if !walked.file_type().is_file() {
                continue;
            }
            let rel = walked
                .path()
                .strip_prefix(&fileset.dir)
                .unwrap_or(walked.path());
            if !selector.selects(rel) {
                continue;
            }
            let name = entry_name(rel);
            if entries.contains_key(&name) {
                match duplicate {
                    Duplicate::Add => {
                        debug!(entry = %name, "duplicate entry replaced");
                    }
                    Duplicate::Preserve => {
                        debug!(entry = %name, "duplicate entry preserved");
                        continue;
                    }
                    Duplicate::Fail => {
                        return Err(ArchiveError::DuplicateEntry { name });
                    }
                }
            }
            entries.insert(name, walked.path().to_path_buf());
        }
    }

    if let Some(parent) = dest.parent() {
        fs::create_dir_all(parent)?;
    }
    let mut writer = ZipWriter::new(File::create(dest)?);
    let options = SimpleFileOptions::default();
    for (name, path) in &entries {
        writer.start_file(name.as_str(), options)?;
        let mut file = File::open(path)?;
        io::copy(&mut file, &mut writer)?;
    }
    writer.finish()?;
    info!(dest = %dest.display(), entries = entries.len(), "archive created");
    Ok(dest.to_path_buf())
}

fn entry_name(rel: &Path) -> String {
    let parts: Vec<String> = rel
        .components()
        .map(|c| c.as_os_str().to_string_lossy().into_owned())
        .collect();
    parts.join("/")
}

/// Extract a zip-family archive into `dest`.
///
/// `includes`/`excludes` are glob patterns applied to entry paths; an
/// unrecognized file extension is a hard error. Entries that would
/// escape the destination are rejected.
pub fn unpack(
    archive: &Path,
    dest: &Path,
    includes: &[String],
    excludes: &[String],
) -> Result<(), ArchiveError> {
    let kind = archive
        .extension()
        .and_then(|ext| ext.to_str())
        .unwrap_or_default();
    if !UNPACK_KINDS.contains(&kind) {
        return Err(ArchiveError::UnknownKind {
            path: archive.to_path_buf(),
        });
    }

    let selector = Selector::new(includes, excludes)?;
    fs::create_dir_all(dest)?;

    let mut zip = ZipArchive::new(File::open(archive)?)?;
    for index in 0..zip.len() {
        let mut entry = zip.by_index(index)?;
        let rel = match entry.enclosed_name() {
            Some(rel) => rel,
            None => {
                return Err(ArchiveError::EntryOutsideDest {
                    name: entry.name().to_string(),
                });
            }
        };
        if !selector.selects(&rel) {
            continue;
        }
        let out = dest.join(&rel);
        if entry.is_dir() {
            fs::create_dir_all(&out)?;
            continue;
        }
        if let Some(parent) = out.parent() {
            fs::create_dir_all(parent)?;
        }
        let mut file = File::create(&out)?;
        io::copy(&mut entry, &mut file)?;
    }
    Ok(())
}

/// Configuration for the `zip` goal.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ZipConfig {
    pub skip: bool,
    pub output_dir: PathBuf,
    /// Base name of the produced archive; falls back to the project's
    /// final name when unset.
    pub final_name: Option<String>,
    pub extension: String,
    pub duplicate: Duplicate,
    /// Root of the default file set, used when `filesets` is empty.
    pub dir: PathBuf,
    pub includes: Vec<String>,
    pub excludes: Vec<String>,
    pub filesets: Vec<FileSet>,
}

impl Default for ZipConfig {
    fn default() -> Self {
        Self {
            skip: false,
            output_dir: PathBuf::from("target"),
            final_name: None,
            extension: "zip".to_string(),
            duplicate: Duplicate::Add,
            dir: PathBuf::from("target"),
            includes: Vec::new(),
            excludes: Vec::new(),
            filesets: Vec::new(),
        }
    }
}

/// Run the `zip` goal: package the configured file sets (or the
/// default file set over `dir`) into
/// `{output_dir}/{final_name}.{extension}`.
pub fn run_zip(
    config: &ZipConfig,
    fallback_final_name: Option<&str>,
) -> Result<Option<PathBuf>, ArchiveError> {
    if config.skip {
        info!("skipping zip");
        return Ok(None);
    }

    let final_name = match config
        .final_name
        .as_deref()
        .or(fallback_final_name)
    {
        Some(name) if !name.is_empty() => name.to_string(),
        _ => return Err(ArchiveError::MissingFinalName),
    };

    let filesets = if config.filesets.is_empty() {
        vec![FileSet {
            dir: config.dir.clone(),
            includes: config.includes.clone(),
            excludes: config.excludes.clone(),
        }]
    } else {
        config.filesets.clone()
    };

    let dest = config
        .output_dir
        .join(format!("{final_name}.{}", config.extension));
    if filesets.iter().all(|set| !set.dir.is_dir()) {
        warn!("no file set directory exists; archive will be empty");
    }
    create_zip(&filesets, config.duplicate, &dest).map(Some)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Read;
    use tempfile::TempDir;

    fn seed(dir: &Path, rel: &str, contents: &str) {
        let path = dir.join(rel);
        fs::create_dir_all(path.parent().unwrap()).unwrap();
        fs::write(path, contents).unwrap();
    }

    fn names(archive: &Path) -> Vec<String> {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        (0..zip.len())
            .map(|i| zip.by_index(i).unwrap().name().to_string())
            .collect()
    }

    fn entry_text(archive: &Path, name: &str) -> String {
        let mut zip = ZipArchive::new(File::open(archive).unwrap()).unwrap();
        let mut entry = zip.by_name(name).unwrap();
        let mut text = String::new();
        entry.read_to_string(&mut text).unwrap();
        text
    }

    #[test]
    fn packages_a_directory_tree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("stage");
        seed(&root, "a.txt", "a");
        seed(&root, "sub/b.txt", "b");

        let dest = dir.path().join("out.zip");
        create_zip(&[FileSet::new(&root)], Duplicate::Add, &dest).unwrap();

        let mut listed = names(&dest);
        listed.sort();
        assert_eq!(listed, vec!["a.txt", "sub/b.txt"]);
    }

    #[test]
    fn include_exclude_patterns_narrow_the_fileset() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("stage");
        seed(&root, "keep.txt", "k");
        seed(&root, "drop.log", "d");
        seed(&root, "sub/keep.txt", "k");

        let fileset = FileSet {
            dir: root,
            includes: vec!["**/*.txt".into(), "*.txt".into()],
            excludes: vec!["drop.*".into()],
        };
        let dest = dir.path().join("out.zip");
        create_zip(&[fileset], Duplicate::Add, &dest).unwrap();

        let mut listed = names(&dest);
        listed.sort();
        assert_eq!(listed, vec!["keep.txt", "sub/keep.txt"]);
    }

    #[test]
    fn duplicate_add_takes_the_later_entry() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        seed(&first, "same.txt", "first");
        seed(&second, "same.txt", "second");

        let dest = dir.path().join("out.zip");
        create_zip(
            &[FileSet::new(&first), FileSet::new(&second)],
            Duplicate::Add,
            &dest,
        )
        .unwrap();
        assert_eq!(entry_text(&dest, "same.txt"), "second");
    }

    #[test]
    fn duplicate_preserve_keeps_the_first_entry() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        seed(&first, "same.txt", "first");
        seed(&second, "same.txt", "second");

        let dest = dir.path().join("out.zip");
        create_zip(
            &[FileSet::new(&first), FileSet::new(&second)],
            Duplicate::Preserve,
            &dest,
        )
        .unwrap();
        assert_eq!(entry_text(&dest, "same.txt"), "first");
    }

    #[test]
    fn duplicate_fail_aborts() {
        let dir = TempDir::new().unwrap();
        let first = dir.path().join("first");
        let second = dir.path().join("second");
        seed(&first, "same.txt", "first");
        seed(&second, "same.txt", "second");

        let dest = dir.path().join("out.zip");
        let err = create_zip(
            &[FileSet::new(&first), FileSet::new(&second)],
            Duplicate::Fail,
            &dest,
        )
        .unwrap_err();
        assert!(matches!(err, ArchiveError::DuplicateEntry { .. }));
    }

    #[test]
    fn unpack_restores_the_tree() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("stage");
        seed(&root, "a.txt", "a");
        seed(&root, "sub/b.txt", "b");
        let archive = dir.path().join("out.zip");
        create_zip(&[FileSet::new(&root)], Duplicate::Add, &archive).unwrap();

        let dest = dir.path().join("unpacked");
        unpack(&archive, &dest, &[], &[]).unwrap();
        assert_eq!(fs::read_to_string(dest.join("a.txt")).unwrap(), "a");
        assert_eq!(fs::read_to_string(dest.join("sub/b.txt")).unwrap(), "b");
    }

    #[test]
    fn unpack_selectors_filter_entries() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("stage");
        seed(&root, "a.txt", "a");
        seed(&root, "b.log", "b");
        let archive = dir.path().join("out.zip");
        create_zip(&[FileSet::new(&root)], Duplicate::Add, &archive).unwrap();

        let dest = dir.path().join("unpacked");
        unpack(&archive, &dest, &["*.txt".into()], &[]).unwrap();
        assert!(dest.join("a.txt").is_file());
        assert!(!dest.join("b.log").exists());
    }

    #[test]
    fn unknown_archive_kind_is_rejected() {
        let dir = TempDir::new().unwrap();
        let bogus = dir.path().join("file.tar");
        fs::write(&bogus, "not a zip").unwrap();
        let err = unpack(&bogus, dir.path(), &[], &[]).unwrap_err();
        assert!(matches!(err, ArchiveError::UnknownKind { .. }));
    }

    #[test]
    fn zip_goal_uses_default_fileset_and_final_name_fallback() {
        let dir = TempDir::new().unwrap();
        let root = dir.path().join("target");
        seed(&root, "a.txt", "a");

        let config = ZipConfig {
            output_dir: dir.path().join("out"),
            dir: root,
            ..ZipConfig::default()
        };
        let produced = run_zip(&config, Some("dist-1.0")).unwrap().unwrap();
        assert!(produced.ends_with("out/dist-1.0.zip"));
        assert_eq!(names(&produced), vec!["a.txt"]);
    }

    #[test]
    fn zip_goal_without_final_name_is_a_configuration_error() {
        let config = ZipConfig::default();
        assert!(matches!(
            run_zip(&config, None),
            Err(ArchiveError::MissingFinalName)
        ));
    }

    #[test]
    fn duplicate_policy_parses() {
        assert_eq!("add".parse::<Duplicate>().unwrap(), Duplicate::Add);
        assert_eq!("preserve".parse::<Duplicate>().unwrap(), Duplicate::Preserve);
        assert_eq!("fail".parse::<Duplicate>().unwrap(), Duplicate::Fail);
        assert!("replace".parse::<Duplicate>().is_err());
    }
}
