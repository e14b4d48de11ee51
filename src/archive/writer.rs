//! Archive creation
//!
//! Writes a gzip-compressed tar of every listed path that passes the
//! include/exclude filter, reporting counts after each entry.

use std::borrow::Cow;
use std::fs::{self, File};
use std::io::{self, BufWriter, Read, Write};
use std::path::{Path, PathBuf};

use chrono::{DateTime, Local};
use flate2::write::GzEncoder;
use flate2::Compression;
use tar::{Builder, EntryType, Header};
use tracing::{debug, info};

use super::lister::{is_dir_entry, list_all};
use super::naming::{format_timestamp, render_output_name};
use super::pattern::Filter;
use crate::config::{Options, ProjectPaths};
use crate::error::{StashError, StashResult};

/// Highest gzip compression level
pub const MAX_LEVEL: u32 = 9;

/// Counts reported while and after writing an archive
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct WriteSummary {
    pub file_count: usize,
    pub directory_count: usize,
    /// Compressed bytes written to the archive file so far
    pub total_bytes: u64,
}

/// Write adapter counting bytes that reach the file
struct CountingWriter<W> {
    inner: W,
    count: u64,
}

impl<W: Write> Write for CountingWriter<W> {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        let written = self.inner.write(buf)?;
        self.count += written as u64;
        Ok(written)
    }

    fn flush(&mut self) -> io::Result<()> {
        self.inner.flush()
    }
}

/// Tar front-ends treat a leading `@` as "read another archive", so such
/// names are stored as `./@name`.
pub fn escape_entry_name(name: &str) -> Cow<'_, str> {
    if name.starts_with('@') {
        Cow::Owned(format!("./{}", name))
    } else {
        Cow::Borrowed(name)
    }
}

/// Writes new archives from a project tree
pub struct ArchiveWriter {
    filter: Filter,
    level: u32,
}

impl ArchiveWriter {
    /// Create a writer at the default (maximum) compression level
    pub fn new(filter: Filter) -> Self {
        Self {
            filter,
            level: MAX_LEVEL,
        }
    }

    /// Set the compression level (0-9)
    pub fn with_level(mut self, level: u32) -> StashResult<Self> {
        if level > MAX_LEVEL {
            return Err(StashError::Validation(format!(
                "Invalid compression level {} (expected 0-{})",
                level, MAX_LEVEL
            )));
        }
        self.level = level;
        Ok(self)
    }

    /// Archive everything under `base` that passes the filter into `destination`
    ///
    /// `on_progress` is called after each entry is written. A failure leaves
    /// whatever was already written in place.
    pub fn create<F>(
        &self,
        base: &Path,
        destination: &Path,
        mut on_progress: F,
    ) -> StashResult<WriteSummary>
    where
        F: FnMut(&WriteSummary),
    {
        let own_name = relative_destination(base, destination);
        let entries: Vec<String> = list_all(base)?
            .into_iter()
            .filter(|entry| self.filter.includes(entry))
            .filter(|entry| own_name.as_deref() != Some(entry.as_str()))
            .collect();

        debug!(
            "Archiving {} entries from {} into {}",
            entries.len(),
            base.display(),
            destination.display()
        );

        if let Some(parent) = destination.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| StashError::archive_write(destination, e))?;
        }

        let file = File::create(destination).map_err(|e| StashError::archive_write(destination, e))?;
        let counting = CountingWriter {
            inner: BufWriter::new(file),
            count: 0,
        };
        let mut builder = Builder::new(GzEncoder::new(counting, Compression::new(self.level)));

        let mut summary = WriteSummary::default();

        for entry in &entries {
            let source = base.join(entry.trim_end_matches('/'));
            let is_dir = is_dir_entry(entry);

            append_entry(&mut builder, entry, &source, is_dir).map_err(|e| {
                StashError::archive_write(destination, format!("{}: {}", entry, e))
            })?;

            if is_dir {
                summary.directory_count += 1;
            } else {
                summary.file_count += 1;
            }
            summary.total_bytes = builder.get_ref().get_ref().count;
            on_progress(&summary);
        }

        let encoder = builder
            .into_inner()
            .map_err(|e| StashError::archive_write(destination, e))?;
        let mut counting = encoder
            .finish()
            .map_err(|e| StashError::archive_write(destination, e))?;
        counting
            .flush()
            .map_err(|e| StashError::archive_write(destination, e))?;

        summary.total_bytes = counting.count;
        on_progress(&summary);

        info!(
            "Wrote {} ({} files, {} directories, {} bytes)",
            destination.display(),
            summary.file_count,
            summary.directory_count,
            summary.total_bytes
        );

        Ok(summary)
    }
}

fn append_entry<W: Write>(
    builder: &mut Builder<W>,
    name: &str,
    source: &Path,
    is_dir: bool,
) -> io::Result<()> {
    let metadata = fs::symlink_metadata(source)?;
    let mut header = Header::new_gnu();
    header.set_metadata(&metadata);

    // links are stored as links, never followed
    let link_target = if metadata.file_type().is_symlink() {
        header.set_entry_type(EntryType::Symlink);
        header.set_size(0);
        Some(fs::read_link(source)?)
    } else {
        None
    };

    let data: Box<dyn Read> = if is_dir || link_target.is_some() {
        Box::new(io::empty())
    } else {
        Box::new(File::open(source)?.take(metadata.len()))
    };

    let escaped = escape_entry_name(name);
    if let Cow::Owned(raw) = &escaped {
        // `append_data` would normalize the `./` prefix away, so the short
        // name field is filled in directly.
        let field = &mut header.as_old_mut().name;
        if raw.len() < field.len() {
            field.fill(0);
            field[..raw.len()].copy_from_slice(raw.as_bytes());
            if let Some(target) = &link_target {
                header.set_link_name(target)?;
            }
            header.set_cksum();
            return builder.append(&header, data);
        }
        debug!("Name too long to escape, storing as-is: {}", name);
    }

    match link_target {
        Some(target) => builder.append_link(&mut header, name, target),
        None => builder.append_data(&mut header, name, data),
    }
}

/// Entry name of `destination` when it lives under `base`
fn relative_destination(base: &Path, destination: &Path) -> Option<String> {
    let base = base.canonicalize().ok()?;
    let parent = destination.parent().filter(|p| !p.as_os_str().is_empty())?;
    let parent = parent.canonicalize().ok()?;
    let file_name = destination.file_name()?;
    let relative = parent.join(file_name);
    let relative = relative.strip_prefix(&base).ok()?;
    Some(super::lister::entry_name(relative, false))
}

/// Parameters of one archive creation run
#[derive(Debug, Clone)]
pub struct ArchiveRequest {
    pub comment: Option<String>,
    pub level: u32,
    pub match_dotfiles: bool,
    pub now: DateTime<Local>,
}

impl Default for ArchiveRequest {
    fn default() -> Self {
        Self {
            comment: None,
            level: MAX_LEVEL,
            match_dotfiles: false,
            now: Local::now(),
        }
    }
}

/// Result of [`create_archive`]
#[derive(Debug, Clone)]
pub struct ArchiveOutcome {
    pub path: PathBuf,
    pub summary: WriteSummary,
}

/// Full path of the archive `options` and `request` would produce
pub fn resolve_output(
    paths: &ProjectPaths,
    options: &Options,
    request: &ArchiveRequest,
) -> StashResult<PathBuf> {
    options.validate_for_archive()?;

    let timestamp = format_timestamp(&request.now, &options.timestamp_format)?;
    let name = render_output_name(
        &options.output,
        &paths.cwd_name(),
        &timestamp,
        request.comment.as_deref(),
    );
    Ok(paths.resolve(name))
}

/// Resolve the output name from the options and archive the project
pub fn create_archive<F>(
    paths: &ProjectPaths,
    options: &Options,
    request: &ArchiveRequest,
    on_progress: F,
) -> StashResult<ArchiveOutcome>
where
    F: FnMut(&WriteSummary),
{
    let path = resolve_output(paths, options, request)?;

    let filter = Filter::new(&options.include, &options.exclude, request.match_dotfiles)?;
    let writer = ArchiveWriter::new(filter).with_level(request.level)?;

    let summary = writer.create(paths.root(), &path, on_progress)?;
    Ok(ArchiveOutcome { path, summary })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::archive::index::list_entries;
    use tempfile::TempDir;

    fn create_project() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let base = temp_dir.path();
        fs::create_dir_all(base.join("src")).unwrap();
        fs::create_dir_all(base.join("node_modules/pkg")).unwrap();
        fs::write(base.join("src/main.rs"), "fn main() {}").unwrap();
        fs::write(base.join("debug.log"), "noise").unwrap();
        fs::write(base.join("node_modules/pkg/index.js"), "x").unwrap();
        fs::write(base.join(".env"), "SECRET=1").unwrap();
        temp_dir
    }

    #[test]
    fn test_create_filters_entries() {
        let project = create_project();
        let out = TempDir::new().unwrap();
        let destination = out.path().join("snap.tar.gz");

        let filter = Filter::new(["**/*"], ["*.log", "node_modules/**"], false).unwrap();
        let summary = ArchiveWriter::new(filter)
            .create(project.path(), &destination, |_| {})
            .unwrap();

        assert_eq!(summary.file_count, 1);
        assert_eq!(summary.directory_count, 1);
        assert_eq!(summary.total_bytes, fs::metadata(&destination).unwrap().len());

        let entries = list_entries(&destination).unwrap();
        assert_eq!(entries, vec!["src/", "src/main.rs"]);
    }

    #[test]
    fn test_progress_is_streamed() {
        let project = create_project();
        let out = TempDir::new().unwrap();
        let destination = out.path().join("snap.tar.gz");

        let filter = Filter::new(["**/*"], Vec::<String>::new(), true).unwrap();
        let mut seen = Vec::new();
        let summary = ArchiveWriter::new(filter)
            .create(project.path(), &destination, |s| seen.push(*s))
            .unwrap();

        // one callback per entry plus the final one
        let entries = summary.file_count + summary.directory_count;
        assert_eq!(seen.len(), entries + 1);
        assert_eq!(seen[0].file_count + seen[0].directory_count, 1);
        assert_eq!(*seen.last().unwrap(), summary);
    }

    #[test]
    fn test_at_prefixed_names_are_escaped() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("@types"), "decl").unwrap();
        let out = TempDir::new().unwrap();
        let destination = out.path().join("snap.tar.gz");

        let filter = Filter::new(["**/*"], Vec::<String>::new(), true).unwrap();
        ArchiveWriter::new(filter)
            .create(project.path(), &destination, |_| {})
            .unwrap();

        let mut archive = crate::archive::index::open(&destination).unwrap();
        let raw: Vec<Vec<u8>> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap().header().path_bytes().into_owned())
            .collect();
        assert_eq!(raw, vec![b"./@types".to_vec()]);

        assert_eq!(list_entries(&destination).unwrap(), vec!["@types"]);
    }

    #[test]
    fn test_destination_inside_project_is_skipped() {
        let project = create_project();
        let destination = project.path().join("snap.tar.gz");
        fs::write(&destination, "old").unwrap();

        let filter = Filter::new(["**/*"], ["node_modules/**"], true).unwrap();
        ArchiveWriter::new(filter)
            .create(project.path(), &destination, |_| {})
            .unwrap();

        let entries = list_entries(&destination).unwrap();
        assert!(!entries.contains(&"snap.tar.gz".to_string()));
        assert!(entries.contains(&".env".to_string()));
    }

    #[cfg(unix)]
    #[test]
    fn test_symlinks_are_stored_as_links() {
        let project = TempDir::new().unwrap();
        fs::write(project.path().join("a.txt"), "a").unwrap();
        std::os::unix::fs::symlink("gone", project.path().join("dangling")).unwrap();
        std::os::unix::fs::symlink("a.txt", project.path().join("link")).unwrap();
        let out = TempDir::new().unwrap();
        let destination = out.path().join("snap.tar.gz");

        let filter = Filter::new(["**/*"], Vec::<String>::new(), true).unwrap();
        let summary = ArchiveWriter::new(filter)
            .create(project.path(), &destination, |_| {})
            .unwrap();
        assert_eq!(summary.file_count, 3);

        let mut archive = crate::archive::index::open(&destination).unwrap();
        let links: Vec<(String, String)> = archive
            .entries()
            .unwrap()
            .map(|e| e.unwrap())
            .filter(|e| e.header().entry_type() == EntryType::Symlink)
            .map(|e| {
                let name = e.path().unwrap().to_string_lossy().to_string();
                let target = e.link_name().unwrap().unwrap().to_string_lossy().to_string();
                (name, target)
            })
            .collect();
        assert_eq!(
            links,
            vec![
                ("dangling".to_string(), "gone".to_string()),
                ("link".to_string(), "a.txt".to_string()),
            ]
        );
    }

    #[test]
    fn test_invalid_level() {
        let filter = Filter::new(["**/*"], Vec::<String>::new(), true).unwrap();
        let err = ArchiveWriter::new(filter).with_level(10).err().unwrap();
        assert!(err.is_validation());
    }

    #[test]
    fn test_unwritable_destination() {
        let project = create_project();
        let blocker = project.path().join("file");
        fs::write(&blocker, "not a dir").unwrap();

        let filter = Filter::new(["**/*"], Vec::<String>::new(), true).unwrap();
        let err = ArchiveWriter::new(filter)
            .create(project.path(), &blocker.join("snap.tar.gz"), |_| {})
            .unwrap_err();
        assert!(matches!(err, StashError::ArchiveWrite { .. }));
    }

    #[test]
    fn test_create_archive_names_output() {
        let root = TempDir::new().unwrap();
        let project = root.path().join("proj");
        fs::create_dir(&project).unwrap();
        fs::write(project.join("a.txt"), "a").unwrap();

        let paths = ProjectPaths::with_root(project.clone());
        let options = Options {
            timestamp_format: "%Y".to_string(),
            ..Options::default()
        };
        let request = ArchiveRequest {
            comment: Some("first".to_string()),
            ..ArchiveRequest::default()
        };

        let outcome = create_archive(&paths, &options, &request, |_| {}).unwrap();
        let year = request.now.format("%Y").to_string();
        assert_eq!(
            outcome.path,
            project.join(format!("../proj_{} - first.tar.gz", year))
        );
        assert!(outcome.path.exists());
        assert_eq!(outcome.summary.file_count, 1);
    }
}
