//! Options editing session
//!
//! Owns the in-memory options for one interactive session, from start to
//! save or exit.

use std::path::{Path, PathBuf};

use tracing::{debug, info};

use crate::config::{ListEdit, OptionField, OptionValue, Options};
use crate::error::StashResult;

/// Session controller for the options being edited
#[derive(Debug, Clone)]
pub struct OptionsEditor {
    options: Options,
    source: Option<PathBuf>,
    dirty: bool,
}

impl OptionsEditor {
    pub fn new(options: Options) -> Self {
        Self {
            options,
            source: None,
            dirty: false,
        }
    }

    pub fn options(&self) -> &Options {
        &self.options
    }

    pub fn into_options(self) -> Options {
        self.options
    }

    /// File the options were last loaded from or saved to
    pub fn source(&self) -> Option<&Path> {
        self.source.as_deref()
    }

    /// Unsaved edits since the last load or save
    pub fn is_dirty(&self) -> bool {
        self.dirty
    }

    /// Replace the options with the contents of `path`
    ///
    /// On error the current options stay in place.
    pub fn load(&mut self, path: &Path) -> StashResult<()> {
        let loaded = Options::load(path)?;
        self.options = loaded;
        self.source = Some(path.to_path_buf());
        self.dirty = false;
        info!("Loaded options from {}", path.display());
        Ok(())
    }

    pub fn save(&mut self, path: &Path) -> StashResult<()> {
        self.options.save(path)?;
        self.source = Some(path.to_path_buf());
        self.dirty = false;
        info!("Saved options to {}", path.display());
        Ok(())
    }

    pub fn value(&self, field: OptionField) -> OptionValue {
        self.options.get(field)
    }

    /// Replace a whole field
    pub fn set(&mut self, field: OptionField, value: OptionValue) -> StashResult<()> {
        self.options.set(field, value)?;
        self.dirty = true;
        debug!("Set {}", field.key());
        Ok(())
    }

    /// Apply a list edit to `include` or `exclude`
    pub fn edit_list(&mut self, field: OptionField, edit: ListEdit) -> StashResult<()> {
        let mut value = self.options.get(field);
        value.edit_list(edit)?;
        self.set(field, value)
    }

    /// Add several patterns at once; nothing is added if any is invalid
    pub fn add_patterns(&mut self, field: OptionField, patterns: Vec<String>) -> StashResult<()> {
        let mut value = self.options.get(field);
        for pattern in patterns {
            value.edit_list(ListEdit::Add(pattern))?;
        }
        self.set(field, value)
    }

    pub fn set_text(&mut self, field: OptionField, text: impl Into<String>) -> StashResult<()> {
        let mut value = self.options.get(field);
        value.set_text(text)?;
        self.set(field, value)
    }

    pub fn toggle(&mut self, field: OptionField) -> StashResult<()> {
        let mut value = self.options.get(field);
        value.toggle()?;
        self.set(field, value)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::TempDir;

    #[test]
    fn test_edits_mark_dirty() {
        let mut editor = OptionsEditor::new(Options::default());
        assert!(!editor.is_dirty());

        editor.toggle(OptionField::Comment).unwrap();
        assert!(editor.options().comment);
        assert!(editor.is_dirty());
    }

    #[test]
    fn test_list_edits() {
        let mut editor = OptionsEditor::new(Options::default());
        editor
            .add_patterns(OptionField::Exclude, vec!["*.log".into(), "tmp/**".into()])
            .unwrap();
        assert_eq!(
            editor.options().exclude,
            vec!["node_modules/**", ".git/**", "*.log", "tmp/**"]
        );

        editor
            .edit_list(OptionField::Exclude, ListEdit::Remove(0))
            .unwrap();
        assert_eq!(editor.options().exclude[0], ".git/**");

        editor
            .edit_list(OptionField::Include, ListEdit::Clear)
            .unwrap();
        assert!(editor.options().include.is_empty());
    }

    #[test]
    fn test_invalid_edit_keeps_options() {
        let mut editor = OptionsEditor::new(Options::default());
        let before = editor.options().clone();

        let err = editor
            .add_patterns(OptionField::Include, vec!["src/**".into(), "  ".into()])
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(editor.options(), &before);

        assert!(editor.toggle(OptionField::Output).is_err());
        assert!(editor.set_text(OptionField::Include, "x").is_err());
        assert!(!editor.is_dirty());
    }

    #[test]
    fn test_failed_load_keeps_options() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("legacy.json");
        fs::write(
            &path,
            r#"{"output": "x", "globs": ["*"], "ignores": [], "level": 9, "comment": ""}"#,
        )
        .unwrap();

        let mut editor = OptionsEditor::new(Options::default());
        editor.toggle(OptionField::Prompt).unwrap();
        let before = editor.options().clone();

        let err = editor.load(&path).unwrap_err();
        assert!(err.is_config_schema());
        assert_eq!(editor.options(), &before);
        assert!(editor.source().is_none());
    }

    #[test]
    fn test_save_then_load() {
        let temp = TempDir::new().unwrap();
        let path = temp.path().join("stash.json");

        let mut editor = OptionsEditor::new(Options::default());
        editor.set_text(OptionField::Output, "backups/<cwd>").unwrap();
        editor.save(&path).unwrap();
        assert!(!editor.is_dirty());
        assert_eq!(editor.source(), Some(path.as_path()));

        let mut other = OptionsEditor::new(Options::default());
        other.load(&path).unwrap();
        assert_eq!(other.options().output, "backups/<cwd>");
    }
}
