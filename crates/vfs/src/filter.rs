//! Exclusion rules applied during scanning and remote synchronization.

use globset::{Glob, GlobSet, GlobSetBuilder};

use dropforge_protocol::RESERVED_PATH_SEGMENT;

use crate::path;
use crate::VfsError;

/// The three exclusion rules, in precedence order:
///
/// 1. any path whose first component is the editor-reserved segment;
/// 2. any path at or under a base game definition path;
/// 3. any path matching a user-supplied glob pattern (full unix path).
///
/// Directories are only subject to rules 1 and 2; files to all three.
#[derive(Debug)]
pub struct ExcludeFilter {
    base_gamedef_paths: Vec<String>,
    patterns: GlobSet,
}

impl ExcludeFilter {
    pub fn new(
        base_gamedef_paths: &[String],
        exclude_patterns: &[String],
    ) -> Result<Self, VfsError> {
        let mut builder = GlobSetBuilder::new();
        for pattern in exclude_patterns {
            let glob = Glob::new(pattern).map_err(|source| VfsError::Pattern {
                pattern: pattern.clone(),
                source,
            })?;
            builder.add(glob);
        }
        let patterns = builder.build().map_err(|source| VfsError::Pattern {
            pattern: exclude_patterns.join(", "),
            source,
        })?;

        Ok(Self {
            base_gamedef_paths: base_gamedef_paths
                .iter()
                .filter(|p| !p.is_empty() && p.as_str() != "/")
                .cloned()
                .collect(),
            patterns,
        })
    }

    /// An empty filter that excludes only the reserved segment.
    pub fn none() -> Self {
        Self::new(&[], &[]).unwrap()
    }

    /// Whether a directory is excluded (rules 1 and 2). Excluded
    /// directories are skipped entirely; their contents are never visited.
    pub fn directory_excluded(&self, dir: &str) -> bool {
        self.reserved(dir) || self.under_base_gamedef(dir)
    }

    /// Whether a file is excluded (all three rules).
    pub fn file_excluded(&self, file: &str) -> bool {
        self.reserved(file) || self.under_base_gamedef(file) || self.matches_pattern(file)
    }

    /// Rule 3 alone — the per-file glob test.
    pub fn matches_pattern(&self, unix_path: &str) -> bool {
        self.patterns.is_match(unix_path)
    }

    fn reserved(&self, unix_path: &str) -> bool {
        path::first_component(unix_path) == Some(RESERVED_PATH_SEGMENT)
    }

    fn under_base_gamedef(&self, unix_path: &str) -> bool {
        self.base_gamedef_paths
            .iter()
            .any(|base| path::starts_with(unix_path, base))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn reserved_segment_always_excluded() {
        let filter = ExcludeFilter::none();
        assert!(filter.directory_excluded("/igde"));
        assert!(filter.file_excluded("/igde/cache/data.bin"));
        assert!(!filter.directory_excluded("/igdeother"));
        assert!(!filter.directory_excluded("/data"));
    }

    #[test]
    fn base_gamedef_subtree_excluded() {
        let filter = ExcludeFilter::new(&["/shared/materials".into()], &[]).unwrap();
        assert!(filter.directory_excluded("/shared/materials"));
        assert!(filter.directory_excluded("/shared/materials/stone"));
        assert!(filter.file_excluded("/shared/materials/stone/diffuse.png"));
        assert!(!filter.directory_excluded("/shared"));
        assert!(!filter.file_excluded("/shared/readme.txt"));
    }

    #[test]
    fn pattern_applies_to_files_only() {
        let filter = ExcludeFilter::new(&[], &["*.tmp".into()]).unwrap();
        assert!(filter.file_excluded("/a/skip.tmp"));
        assert!(!filter.file_excluded("/a/keep.txt"));
        // Directory-level exclusion ignores patterns.
        assert!(!filter.directory_excluded("/a.tmp"));
    }

    #[test]
    fn pattern_matches_full_unix_path() {
        let filter = ExcludeFilter::new(&[], &["/work/**".into()]).unwrap();
        assert!(filter.file_excluded("/work/wip/sketch.psd"));
        assert!(!filter.file_excluded("/data/work.txt"));
    }

    #[test]
    fn invalid_pattern_is_reported() {
        let result = ExcludeFilter::new(&[], &["[".into()]);
        assert!(matches!(result, Err(VfsError::Pattern { .. })));
    }

    #[test]
    fn root_base_path_is_ignored() {
        // A base game definition mounted at the root would exclude the
        // whole project; treat it as unset.
        let filter = ExcludeFilter::new(&["/".into()], &[]).unwrap();
        assert!(!filter.directory_excluded("/data"));
    }
}
