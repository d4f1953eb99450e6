//! Glob-based file search over a workspace folder.

use std::path::{Path, PathBuf};

use async_trait::async_trait;
use globset::{GlobBuilder, GlobSet, GlobSetBuilder};
use tracing::{debug, trace};
use walkdir::{DirEntry, WalkDir};

use crate::error::{AppError, Result};

/// Default include glob: source files of a JS/TS component project.
pub const DEFAULT_INCLUDE_GLOB: &str = "**/*.{ts,tsx,js,jsx,vue}";

/// Default exclude glob.
pub const DEFAULT_EXCLUDE_GLOB: &str = "**/node_modules/**";

/// Include/exclude glob pair, as written by the user. `exclude: None`
/// disables exclusion.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FilePattern {
    pub include: String,
    pub exclude: Option<String>,
}

impl Default for FilePattern {
    fn default() -> Self {
        Self {
            include: DEFAULT_INCLUDE_GLOB.to_string(),
            exclude: Some(DEFAULT_EXCLUDE_GLOB.to_string()),
        }
    }
}

/// Compiled form of a [`FilePattern`].
///
/// Globs are matched against paths relative to a folder root, with `*`
/// never crossing a path separator. An exclude glob ending in `/**` also
/// prunes the directories it names, so walks never enter them.
#[derive(Debug, Clone)]
pub struct PatternMatcher {
    include: GlobSet,
    exclude: GlobSet,
    prune: GlobSet,
}

impl PatternMatcher {
    pub fn new(pattern: &FilePattern) -> Result<Self> {
        let include = compile(std::iter::once(pattern.include.as_str()))?;
        let exclude = compile(pattern.exclude.iter().map(String::as_str))?;
        let prune = compile(
            pattern
                .exclude
                .iter()
                .filter_map(|glob| glob.strip_suffix("/**"))
                .filter(|dir| !dir.is_empty()),
        )?;
        Ok(Self {
            include,
            exclude,
            prune,
        })
    }

    /// Whether a root-relative directory lies wholly inside an exclusion.
    pub fn is_pruned_dir(&self, relative: &Path) -> bool {
        self.prune.is_match(relative)
    }

    /// Whether a root-relative path is included and not excluded.
    pub fn is_match(&self, relative: &Path) -> bool {
        self.include.is_match(relative) && !self.exclude.is_match(relative)
    }

    /// Whether an absolute `path` under `root` matches.
    ///
    /// Paths outside `root` never match.
    pub fn matches_under(&self, root: &Path, path: &Path) -> bool {
        match path.strip_prefix(root) {
            Ok(relative) => self.is_match(relative),
            Err(_) => false,
        }
    }
}

fn compile<'a>(globs: impl Iterator<Item = &'a str>) -> Result<GlobSet> {
    let mut builder = GlobSetBuilder::new();
    for glob in globs {
        builder.add(GlobBuilder::new(glob).literal_separator(true).build()?);
    }
    Ok(builder.build()?)
}

/// Asynchronous file search collaborator.
#[async_trait]
pub trait FileSearch: Send + Sync {
    /// Return the absolute paths of all files under `root` accepted by `matcher`.
    async fn find_files(&self, root: &Path, matcher: &PatternMatcher) -> Result<Vec<PathBuf>>;
}

/// Searches the real filesystem with a blocking directory walk.
#[derive(Debug, Clone, Default)]
pub struct GlobSearch {
    follow_links: bool,
}

impl GlobSearch {
    pub fn new(follow_links: bool) -> Self {
        Self { follow_links }
    }
}

#[async_trait]
impl FileSearch for GlobSearch {
    async fn find_files(&self, root: &Path, matcher: &PatternMatcher) -> Result<Vec<PathBuf>> {
        let root = root.to_path_buf();
        let matcher = matcher.clone();
        let follow_links = self.follow_links;
        tokio::task::spawn_blocking(move || walk_matching(&root, &matcher, follow_links))
            .await
            .map_err(|e| AppError::Search(e.to_string()))?
    }
}

fn should_enter(entry: &DirEntry, root: &Path, matcher: &PatternMatcher) -> bool {
    if entry.depth() == 0 || !entry.file_type().is_dir() {
        return true;
    }
    entry
        .path()
        .strip_prefix(root)
        .map(|relative| !matcher.is_pruned_dir(relative))
        .unwrap_or(true)
}

/// Walk `root` recursively and collect matching regular files.
///
/// Excluded directories are not entered. Unreadable entries are skipped.
pub fn walk_matching(root: &Path, matcher: &PatternMatcher, follow_links: bool) -> Result<Vec<PathBuf>> {
    if !root.is_dir() {
        return Err(AppError::Search(format!(
            "{} is not a directory",
            root.display()
        )));
    }

    let mut found = Vec::new();
    let walker = WalkDir::new(root)
        .follow_links(follow_links)
        .into_iter()
        .filter_entry(|e| should_enter(e, root, matcher));
    for entry in walker {
        let entry = match entry {
            Ok(e) => e,
            Err(err) => {
                trace!(error = %err, "skipping unreadable entry");
                continue;
            }
        };
        if !entry.file_type().is_file() {
            continue;
        }
        let accepted = entry
            .path()
            .strip_prefix(root)
            .map(|relative| matcher.is_match(relative))
            .unwrap_or(false);
        if accepted {
            found.push(entry.into_path());
        }
    }

    debug!(root = %root.display(), matches = found.len(), "search finished");
    Ok(found)
}
