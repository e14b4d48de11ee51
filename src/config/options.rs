//! Archive options for stash
//!
//! The options document controls what gets archived, where archives are
//! written and how they are named. It is persisted as a JSON object whose key
//! set must match [`OPTION_KEYS`] exactly.

use std::collections::BTreeSet;
use std::fs::{self, File};
use std::io::{BufReader, BufWriter, ErrorKind, Write};
use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::error::{StashError, StashResult};

/// Keys of the canonical options document, in display order
pub const OPTION_KEYS: [&str; 7] = [
    "output",
    "include",
    "exclude",
    "archive_directory",
    "timestamp_format",
    "comment",
    "prompt",
];

/// User options for archive creation and restore
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Options {
    /// Output path template (without extension)
    pub output: String,

    /// Glob patterns selecting what to archive
    pub include: Vec<String>,

    /// Glob patterns that are never archived nor deleted on restore
    pub exclude: Vec<String>,

    /// Directory scanned for existing archives
    pub archive_directory: String,

    /// strftime format used for `<timestamp>`
    pub timestamp_format: String,

    /// Ask for a comment before archiving
    pub comment: bool,

    /// Run the full prompt flow before archiving
    pub prompt: bool,
}

impl Default for Options {
    fn default() -> Self {
        Self {
            output: "../<cwd>_<timestamp>".to_string(),
            include: vec!["**/*".to_string()],
            exclude: vec!["node_modules/**".to_string(), ".git/**".to_string()],
            archive_directory: "..".to_string(),
            timestamp_format: "%Y-%m-%d_%H-%M-%S".to_string(),
            comment: false,
            prompt: false,
        }
    }
}

impl Options {
    /// Load options from a JSON file
    ///
    /// The document must contain exactly the keys in [`OPTION_KEYS`]. On any
    /// error the caller's current options are left untouched, since a new
    /// value is only returned on success.
    pub fn load(path: &Path) -> StashResult<Self> {
        let file = File::open(path).map_err(|e| match e.kind() {
            ErrorKind::NotFound => StashError::options_not_found(path.display().to_string()),
            _ => StashError::Config(format!("Failed to open {}: {}", path.display(), e)),
        })?;

        let value: serde_json::Value = serde_json::from_reader(BufReader::new(file))
            .map_err(|e| StashError::Json(format!("Failed to parse {}: {}", path.display(), e)))?;

        let object = value.as_object().ok_or_else(|| {
            StashError::Config(format!("{} is not a JSON object", path.display()))
        })?;

        let expected: BTreeSet<&str> = OPTION_KEYS.iter().copied().collect();
        let actual: BTreeSet<&str> = object.keys().map(String::as_str).collect();

        if expected != actual {
            return Err(StashError::ConfigSchema {
                path: path.to_path_buf(),
                missing: expected.difference(&actual).map(|k| k.to_string()).collect(),
                unexpected: actual.difference(&expected).map(|k| k.to_string()).collect(),
            });
        }

        let options: Options = serde_json::from_value(value)
            .map_err(|e| StashError::Json(format!("Failed to parse {}: {}", path.display(), e)))?;

        options.check_patterns()?;
        Ok(options)
    }

    /// Save options to a JSON file atomically (write to temp, then rename)
    pub fn save(&self, path: &Path) -> StashResult<()> {
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| {
                StashError::Io(format!(
                    "Failed to create directory {}: {}",
                    parent.display(),
                    e
                ))
            })?;
        }

        let temp_path = path.with_extension("json.tmp");

        let file = File::create(&temp_path)
            .map_err(|e| StashError::Io(format!("Failed to create temp file: {}", e)))?;

        let mut writer = BufWriter::new(file);
        serde_json::to_writer_pretty(&mut writer, self)
            .map_err(|e| StashError::Json(format!("Failed to serialize options: {}", e)))?;

        writer
            .flush()
            .map_err(|e| StashError::Io(format!("Failed to flush options: {}", e)))?;

        writer
            .get_ref()
            .sync_all()
            .map_err(|e| StashError::Io(format!("Failed to sync options: {}", e)))?;

        fs::rename(&temp_path, path).map_err(|e| {
            let _ = fs::remove_file(&temp_path);
            StashError::Io(format!("Failed to rename temp file: {}", e))
        })?;

        Ok(())
    }

    /// Check that the options can drive archive creation
    ///
    /// Collects every problem instead of stopping at the first one.
    pub fn validate_for_archive(&self) -> StashResult<()> {
        let mut errors = Vec::new();

        if self.output.trim().is_empty() {
            errors.push("Please define an output file path!");
        }
        if self.include.is_empty() {
            errors.push("Please define at least one include pattern!");
        }

        if errors.is_empty() {
            self.check_patterns()
        } else {
            Err(StashError::Validation(errors.join(" ")))
        }
    }

    /// Pattern lists never contain empty strings
    fn check_patterns(&self) -> StashResult<()> {
        for (name, list) in [("include", &self.include), ("exclude", &self.exclude)] {
            if list.iter().any(|p| p.trim().is_empty()) {
                return Err(StashError::Validation(format!(
                    "The {} list contains an empty pattern",
                    name
                )));
            }
        }
        Ok(())
    }

    /// Read one option as a tagged value
    pub fn get(&self, field: OptionField) -> OptionValue {
        match field {
            OptionField::Output => OptionValue::Text(self.output.clone()),
            OptionField::Include => OptionValue::List(self.include.clone()),
            OptionField::Exclude => OptionValue::List(self.exclude.clone()),
            OptionField::ArchiveDirectory => OptionValue::Text(self.archive_directory.clone()),
            OptionField::TimestampFormat => OptionValue::Text(self.timestamp_format.clone()),
            OptionField::Comment => OptionValue::Flag(self.comment),
            OptionField::Prompt => OptionValue::Flag(self.prompt),
        }
    }

    /// Replace one option with a tagged value of the matching kind
    pub fn set(&mut self, field: OptionField, value: OptionValue) -> StashResult<()> {
        match (field, value) {
            (OptionField::Output, OptionValue::Text(v)) => self.output = v,
            (OptionField::ArchiveDirectory, OptionValue::Text(v)) => self.archive_directory = v,
            (OptionField::TimestampFormat, OptionValue::Text(v)) => self.timestamp_format = v,
            (OptionField::Include, OptionValue::List(v)) => {
                ensure_no_empty(&v)?;
                self.include = v;
            }
            (OptionField::Exclude, OptionValue::List(v)) => {
                ensure_no_empty(&v)?;
                self.exclude = v;
            }
            (OptionField::Comment, OptionValue::Flag(v)) => self.comment = v,
            (OptionField::Prompt, OptionValue::Flag(v)) => self.prompt = v,
            (field, value) => {
                return Err(StashError::Validation(format!(
                    "'{}' expects a {:?} value, got {:?}",
                    field.key(),
                    field.kind(),
                    value.kind()
                )))
            }
        }
        Ok(())
    }
}

fn ensure_no_empty(items: &[String]) -> StashResult<()> {
    if items.iter().any(|p| p.trim().is_empty()) {
        return Err(StashError::Validation("Patterns cannot be empty".into()));
    }
    Ok(())
}

/// One field of the options document
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum OptionField {
    Output,
    Include,
    Exclude,
    ArchiveDirectory,
    TimestampFormat,
    Comment,
    Prompt,
}

impl OptionField {
    /// All fields in document order
    pub const ALL: [OptionField; 7] = [
        OptionField::Output,
        OptionField::Include,
        OptionField::Exclude,
        OptionField::ArchiveDirectory,
        OptionField::TimestampFormat,
        OptionField::Comment,
        OptionField::Prompt,
    ];

    /// JSON key of this field
    pub fn key(self) -> &'static str {
        match self {
            OptionField::Output => "output",
            OptionField::Include => "include",
            OptionField::Exclude => "exclude",
            OptionField::ArchiveDirectory => "archive_directory",
            OptionField::TimestampFormat => "timestamp_format",
            OptionField::Comment => "comment",
            OptionField::Prompt => "prompt",
        }
    }

    /// Human readable label for menus
    pub fn label(self) -> &'static str {
        match self {
            OptionField::Output => "Output",
            OptionField::Include => "Include patterns",
            OptionField::Exclude => "Exclude patterns",
            OptionField::ArchiveDirectory => "Archive directory",
            OptionField::TimestampFormat => "Timestamp format",
            OptionField::Comment => "Ask for comment",
            OptionField::Prompt => "Prompt for all options",
        }
    }

    /// The value kind stored in this field
    pub fn kind(self) -> ValueKind {
        match self {
            OptionField::Include | OptionField::Exclude => ValueKind::List,
            OptionField::Output | OptionField::ArchiveDirectory | OptionField::TimestampFormat => {
                ValueKind::Text
            }
            OptionField::Comment | OptionField::Prompt => ValueKind::Flag,
        }
    }
}

/// Kind of an option value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    List,
    Text,
    Flag,
}

/// Tagged option value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum OptionValue {
    List(Vec<String>),
    Text(String),
    Flag(bool),
}

/// Edit operation on a list value
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ListEdit {
    Add(String),
    Remove(usize),
    Replace(usize, String),
    Clear,
}

impl OptionValue {
    pub fn kind(&self) -> ValueKind {
        match self {
            OptionValue::List(_) => ValueKind::List,
            OptionValue::Text(_) => ValueKind::Text,
            OptionValue::Flag(_) => ValueKind::Flag,
        }
    }

    /// Apply a list edit; rejects empty items and out of range indices
    pub fn edit_list(&mut self, edit: ListEdit) -> StashResult<()> {
        let OptionValue::List(items) = self else {
            return Err(StashError::Validation("Not a list value".into()));
        };

        match edit {
            ListEdit::Add(item) => {
                let item = non_empty(item)?;
                items.push(item);
            }
            ListEdit::Remove(index) => {
                check_index(index, items.len())?;
                items.remove(index);
            }
            ListEdit::Replace(index, item) => {
                check_index(index, items.len())?;
                items[index] = non_empty(item)?;
            }
            ListEdit::Clear => items.clear(),
        }
        Ok(())
    }

    /// Replace a text value
    pub fn set_text(&mut self, text: impl Into<String>) -> StashResult<()> {
        match self {
            OptionValue::Text(current) => {
                *current = text.into();
                Ok(())
            }
            _ => Err(StashError::Validation("Not a text value".into())),
        }
    }

    /// Flip a flag value
    pub fn toggle(&mut self) -> StashResult<()> {
        match self {
            OptionValue::Flag(current) => {
                *current = !*current;
                Ok(())
            }
            _ => Err(StashError::Validation("Not a flag value".into())),
        }
    }

    /// Short summary for menu rendering
    pub fn summary(&self) -> String {
        match self {
            OptionValue::List(items) if items.is_empty() => "(none)".to_string(),
            OptionValue::List(items) => items
                .iter()
                .map(|i| format!("\"{}\"", i))
                .collect::<Vec<_>>()
                .join(" "),
            OptionValue::Text(text) => text.clone(),
            OptionValue::Flag(true) => "yes".to_string(),
            OptionValue::Flag(false) => "no".to_string(),
        }
    }
}

fn non_empty(item: String) -> StashResult<String> {
    let trimmed = item.trim();
    if trimmed.is_empty() {
        return Err(StashError::Validation("Patterns cannot be empty".into()));
    }
    Ok(trimmed.to_string())
}

fn check_index(index: usize, len: usize) -> StashResult<()> {
    if index >= len {
        return Err(StashError::Validation(format!(
            "No item at position {} (list has {})",
            index + 1,
            len
        )));
    }
    Ok(())
}

/// Split a line of quoted patterns (`"a/**" "*.rs"`) into items
///
/// Unquoted input is split on whitespace.
pub fn parse_pattern_line(line: &str) -> Vec<String> {
    let line = line.trim();
    if !line.contains('"') {
        return line.split_whitespace().map(str::to_string).collect();
    }

    line.split('"')
        .skip(1)
        .step_by(2)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect()
}
