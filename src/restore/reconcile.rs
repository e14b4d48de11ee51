//! Live tree vs archive reconciliation
//!
//! Computes which live paths are missing from an archive and orders them so
//! that a directory always comes after everything inside it.

use std::collections::HashSet;
use std::fs;
use std::path::Path;

use crate::archive::lister::{is_dir_entry, list_subtree};
use crate::archive::pattern::normalize;
use crate::error::StashResult;

/// Live paths absent from the archive, children before parents
///
/// `live` must be in traversal order (parents before children); the result
/// is that order reversed with duplicates removed.
pub fn diff(live: &[String], archive_entries: &HashSet<String>) -> Vec<String> {
    let mut seen: HashSet<&String> = HashSet::new();
    let mut missing: Vec<String> = live
        .iter()
        .filter(|path| !archive_entries.contains(path.as_str()))
        .filter(|path| seen.insert(*path))
        .cloned()
        .collect();
    missing.reverse();
    missing
}

/// Diff restricted to the selected paths
///
/// Each selected directory is scanned on its own and diffed against the
/// archive; results are concatenated in selection order and deduplicated.
/// Live paths for which `is_candidate` returns false are never part of the
/// result. A file or link sitting where a selected directory belongs is
/// itself a candidate. Selected paths missing on disk contribute nothing,
/// and so do selected files that are still files.
pub fn scoped_diff<F>(
    root: &Path,
    selection: &[String],
    archive_entries: &HashSet<String>,
    is_candidate: F,
) -> StashResult<Vec<String>>
where
    F: Fn(&str) -> bool,
{
    let mut seen = HashSet::new();
    let mut result = Vec::new();

    for selected in selection {
        let relative = normalize(selected);
        if relative.is_empty() {
            continue;
        }

        let target = root.join(&relative);
        let Ok(metadata) = fs::symlink_metadata(&target) else {
            continue;
        };

        let live: Vec<String> = if metadata.is_dir() {
            list_subtree(root, &target)?
        } else if is_dir_entry(selected) {
            vec![relative]
        } else {
            continue;
        };
        let live: Vec<String> = live
            .into_iter()
            .filter(|path| is_candidate(path.as_str()))
            .collect();

        for path in diff(&live, archive_entries) {
            if seen.insert(path.clone()) {
                result.push(path);
            }
        }
    }

    Ok(result)
}

/// Drop directories that would still hold something after deletion
///
/// Anything on disk that is not being deleted (excluded paths, archived
/// paths, `protected` paths) keeps all of its ancestors alive, so excluded
/// files are never lost with their parent and every directory removal hits
/// an empty directory.
pub fn retain_deletable(
    candidates: Vec<String>,
    live_all: &[String],
    protected: &[String],
) -> Vec<String> {
    let doomed: HashSet<String> = candidates
        .iter()
        .filter(|path| !protected.contains(*path))
        .cloned()
        .collect();

    let mut blocked: HashSet<String> = HashSet::new();
    let kept = live_all
        .iter()
        .map(String::as_str)
        .filter(|path| !doomed.contains(*path))
        .chain(protected.iter().map(String::as_str));
    for path in kept {
        for ancestor in ancestors(path) {
            if !blocked.insert(ancestor) {
                break;
            }
        }
    }

    candidates
        .into_iter()
        .filter(|path| doomed.contains(path))
        .filter(|path| !(is_dir_entry(path) && blocked.contains(path)))
        .collect()
}

/// Directory markers of every ancestor of `path`, nearest first
fn ancestors(path: &str) -> Vec<String> {
    let trimmed = path.trim_end_matches('/');
    let mut result = Vec::new();
    let mut end = trimmed.len();
    while let Some(index) = trimmed[..end].rfind('/') {
        result.push(trimmed[..=index].to_string());
        end = index;
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::pattern::{has_dot_component, PatternSet};
    use tempfile::TempDir;

    fn set(items: &[&str]) -> HashSet<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn list(items: &[&str]) -> Vec<String> {
        items.iter().map(|s| s.to_string()).collect()
    }

    fn position(items: &[String], item: &str) -> usize {
        items.iter().position(|i| i == item).unwrap()
    }

    #[test]
    fn test_diff_is_set_difference() {
        let live = list(&["a.txt", "new/", "new/x.rs", "new/y.rs", "src/", "src/main.rs"]);
        let archive = set(&["a.txt", "src/", "src/main.rs"]);

        let result = diff(&live, &archive);
        assert_eq!(result, list(&["new/y.rs", "new/x.rs", "new/"]));
    }

    #[test]
    fn test_diff_children_before_parents() {
        let live = list(&["a/", "a/b/", "a/b/c.txt", "a/d.txt", "e/"]);
        let result = diff(&live, &HashSet::new());

        for (i, path) in result.iter().enumerate() {
            for later in &result[i + 1..] {
                assert!(
                    !(is_dir_entry(path) && later.starts_with(path.as_str())),
                    "{} listed before its descendant {}",
                    path,
                    later
                );
            }
        }
        assert!(position(&result, "a/b/c.txt") < position(&result, "a/b/"));
        assert!(position(&result, "a/b/") < position(&result, "a/"));
    }

    #[test]
    fn test_diff_deduplicates() {
        let live = list(&["x", "x", "y"]);
        assert_eq!(diff(&live, &HashSet::new()), list(&["y", "x"]));
    }

    #[test]
    fn test_diff_nothing_missing() {
        let live = list(&["a", "b/"]);
        assert!(diff(&live, &set(&["a", "b/"])).is_empty());
    }

    #[test]
    fn test_scoped_diff_stays_in_selection() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/extra")).unwrap();
        fs::create_dir_all(root.join("other")).unwrap();
        fs::write(root.join("src/main.rs"), "").unwrap();
        fs::write(root.join("src/extra/new.rs"), "").unwrap();
        fs::write(root.join("src/debug.log"), "").unwrap();
        fs::write(root.join("other/stray.txt"), "").unwrap();

        let archive = set(&["src/", "src/main.rs"]);
        let exclude = PatternSet::new(["**/*.log"], true).unwrap();

        let result = scoped_diff(
            root,
            &list(&["src/", "missing/", "src/main.rs"]),
            &archive,
            |path| !exclude.is_match(path),
        )
        .unwrap();

        assert_eq!(result, list(&["src/extra/new.rs", "src/extra/"]));
    }

    #[test]
    fn test_scoped_diff_overlapping_selections() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/lib")).unwrap();
        fs::write(root.join("src/lib/a.rs"), "").unwrap();
        fs::write(root.join("src/b.rs"), "").unwrap();

        let archive = set(&["src/"]);
        let result = scoped_diff(
            root,
            &list(&["src/lib/", "src/"]),
            &archive,
            |_| true,
        )
        .unwrap();

        assert_eq!(result.len(), 3);
        assert!(position(&result, "src/lib/a.rs") < position(&result, "src/lib/"));
        assert!(result.contains(&"src/b.rs".to_string()));
        assert!(!result.contains(&"src/".to_string()));
    }

    #[test]
    fn test_scoped_diff_file_in_place_of_selected_directory() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::write(root.join("src"), "not a directory").unwrap();

        let archive = set(&["src/", "src/main.rs"]);
        let result = scoped_diff(root, &list(&["src/"]), &archive, |_| true).unwrap();
        assert_eq!(result, list(&["src"]));

        // a selected file that is still a file is left to extraction
        let archive = set(&["src"]);
        let result = scoped_diff(root, &list(&["src"]), &archive, |_| true).unwrap();
        assert!(result.is_empty());
    }

    #[test]
    fn test_scoped_diff_skips_non_candidates() {
        let temp = TempDir::new().unwrap();
        let root = temp.path();
        fs::create_dir_all(root.join("src/.cache")).unwrap();
        fs::write(root.join("src/.cache/blob"), "").unwrap();
        fs::write(root.join("src/.env"), "").unwrap();
        fs::write(root.join("src/new.rs"), "").unwrap();

        let archive = set(&["src/"]);
        let result = scoped_diff(root, &list(&["src/"]), &archive, |path| {
            !has_dot_component(path)
        })
        .unwrap();
        assert_eq!(result, list(&["src/new.rs"]));
    }

    #[test]
    fn test_retain_deletable_keeps_parents_of_excluded() {
        let live_all = list(&["logs/", "logs/app.log", "logs/old.txt", "tmp/", "tmp/x"]);
        let candidates = list(&["tmp/x", "tmp/", "logs/old.txt", "logs/"]);

        let result = retain_deletable(candidates, &live_all, &[]);
        assert_eq!(result, list(&["tmp/x", "tmp/", "logs/old.txt"]));
    }

    #[test]
    fn test_retain_deletable_protected_paths() {
        let live_all = list(&["archives/", "archives/snap.tar.gz", "a.txt"]);
        let candidates = list(&["a.txt", "archives/snap.tar.gz", "archives/"]);

        let result = retain_deletable(candidates, &live_all, &list(&["archives/snap.tar.gz"]));
        assert_eq!(result, list(&["a.txt"]));
    }

    #[test]
    fn test_retain_deletable_nested_blocking() {
        let live_all = list(&["a/", "a/b/", "a/b/keep.log", "a/c.txt"]);
        let candidates = list(&["a/c.txt", "a/b/", "a/"]);

        let result = retain_deletable(candidates, &live_all, &[]);
        assert_eq!(result, list(&["a/c.txt"]));
    }

    #[test]
    fn test_ancestors() {
        assert_eq!(ancestors("a/b/c.txt"), list(&["a/b/", "a/"]));
        assert_eq!(ancestors("a/b/"), list(&["a/"]));
        assert!(ancestors("top.txt").is_empty());
    }
}
