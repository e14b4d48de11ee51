//! Glob matching for include and exclude patterns
//!
//! Paths are matched in File Entry form: `/` separated and relative to the
//! project root. Directory markers are matched without their trailing `/`.

use globset::{GlobBuilder, GlobMatcher, GlobSet, GlobSetBuilder};

use crate::error::{StashError, StashResult};

/// Normalize a relative path for matching
///
/// Backslashes become `/`, a leading `./` is dropped, and the trailing `/`
/// of a directory marker is removed.
pub fn normalize(path: &str) -> String {
    let path = path.replace('\\', "/");
    let path = path.strip_prefix("./").unwrap_or(&path);
    path.trim_end_matches('/').to_string()
}

/// Whether any component of `path` starts with `.`
pub fn has_dot_component(path: &str) -> bool {
    normalize(path).split('/').any(|c| c.starts_with('.'))
}

/// Match a single path against a single pattern
pub fn matches(path: &str, pattern: &str, match_dotfiles: bool) -> StashResult<bool> {
    let set = PatternSet::new([pattern], match_dotfiles)?;
    Ok(set.is_match(path))
}

fn compile(pattern: &str) -> StashResult<globset::Glob> {
    GlobBuilder::new(pattern)
        .literal_separator(true)
        .build()
        .map_err(|e| StashError::Pattern {
            pattern: pattern.to_string(),
            message: e.kind().to_string(),
        })
}

/// An ordered list of compiled glob patterns with OR semantics
#[derive(Debug, Clone)]
pub struct PatternSet {
    patterns: Vec<String>,
    set: GlobSet,
    /// Pattern index of each glob in `set`
    owners: Vec<usize>,
    /// Per pattern, matchers for its segments that start with `.`
    dot_segments: Vec<Vec<GlobMatcher>>,
    match_dotfiles: bool,
}

impl PatternSet {
    /// Compile a list of patterns
    ///
    /// With `match_dotfiles` false, a path component starting with `.` is
    /// only matched by a pattern segment that itself starts with `.`.
    pub fn new<I, S>(patterns: I, match_dotfiles: bool) -> StashResult<Self>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut builder = GlobSetBuilder::new();
        let mut kept = Vec::new();
        let mut owners = Vec::new();
        let mut dot_segments = Vec::new();

        for pattern in patterns {
            let pattern = normalize(pattern.as_ref());
            if pattern.is_empty() {
                return Err(StashError::Validation("Patterns cannot be empty".into()));
            }

            builder.add(compile(&pattern)?);
            owners.push(kept.len());

            // `dir/**` also covers the `dir/` marker itself
            if let Some(dir) = pattern.strip_suffix("/**").filter(|d| !d.is_empty()) {
                builder.add(compile(dir)?);
                owners.push(kept.len());
            }

            let mut dots = Vec::new();
            for segment in pattern.split('/').filter(|s| s.starts_with('.')) {
                dots.push(compile(segment)?.compile_matcher());
            }
            dot_segments.push(dots);
            kept.push(pattern);
        }

        let set = builder.build().map_err(|e| StashError::Pattern {
            pattern: kept.join(" "),
            message: e.to_string(),
        })?;

        Ok(Self {
            patterns: kept,
            set,
            owners,
            dot_segments,
            match_dotfiles,
        })
    }

    /// A set that matches nothing
    pub fn empty() -> Self {
        Self {
            patterns: Vec::new(),
            set: GlobSet::empty(),
            owners: Vec::new(),
            dot_segments: Vec::new(),
            match_dotfiles: true,
        }
    }

    /// Whether the path matches at least one pattern
    pub fn is_match(&self, path: &str) -> bool {
        if self.patterns.is_empty() {
            return false;
        }

        let path = normalize(path);
        if path.is_empty() {
            return false;
        }

        let hits = self.set.matches(&path);
        if self.match_dotfiles {
            return !hits.is_empty();
        }

        let dot_components: Vec<&str> = path.split('/').filter(|c| c.starts_with('.')).collect();
        hits.into_iter().any(|hit| {
            let index = self.owners[hit];
            dot_components.iter().all(|component| {
                self.dot_segments[index]
                    .iter()
                    .any(|segment| segment.is_match(component))
            })
        })
    }
}

/// Include/exclude filter shared by archive creation and restore
#[derive(Debug, Clone)]
pub struct Filter {
    include: PatternSet,
    exclude: PatternSet,
}

impl Filter {
    /// Build a filter; exclude patterns always match dotfiles
    pub fn new<I, E, S, T>(include: I, exclude: E, match_dotfiles: bool) -> StashResult<Self>
    where
        I: IntoIterator<Item = S>,
        E: IntoIterator<Item = T>,
        S: AsRef<str>,
        T: AsRef<str>,
    {
        Ok(Self {
            include: PatternSet::new(include, match_dotfiles)?,
            exclude: PatternSet::new(exclude, true)?,
        })
    }

    /// Matches an include pattern and no exclude pattern
    pub fn includes(&self, path: &str) -> bool {
        self.include.is_match(path) && !self.exclude.is_match(path)
    }
}
