//! Interactive menu
//!
//! The menu owns an [`OptionsEditor`] for the whole session. Failed
//! operations are reported and the menu keeps running; only prompt failures
//! end the session.

use std::path::Path;

use chrono::Local;

use super::create::{handle_create, CreateArgs};
use super::editor::OptionsEditor;
use super::prompt::Prompter;
use crate::archive::{list_archives, list_entries, ExtractMode};
use crate::config::options::parse_pattern_line;
use crate::config::paths::DEFAULT_OPTIONS_FILE;
use crate::config::{ListEdit, OptionField, OptionValue, Options, ProjectPaths, ValueKind};
use crate::display::{archive_label, format_plan, format_report};
use crate::error::{StashError, StashResult};
use crate::restore::RestoreExecutor;

const BACK: &str = "Back";

/// Top level menu entries
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum MainChoice {
    Create,
    Manage,
    Edit,
    Load,
    Save,
    Exit,
}

impl MainChoice {
    const ALL: [MainChoice; 6] = [
        MainChoice::Create,
        MainChoice::Manage,
        MainChoice::Edit,
        MainChoice::Load,
        MainChoice::Save,
        MainChoice::Exit,
    ];

    fn label(self) -> &'static str {
        match self {
            MainChoice::Create => "Create archive",
            MainChoice::Manage => "Manage archives",
            MainChoice::Edit => "Edit options",
            MainChoice::Load => "Load options",
            MainChoice::Save => "Save options",
            MainChoice::Exit => "Exit",
        }
    }
}

/// What to do with a selected archive
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArchiveAction {
    ExtractAll,
    ExtractNewer,
    ExtractSome,
    RestoreAll,
    RestoreNewer,
    RestoreSome,
    Delete,
}

impl ArchiveAction {
    pub const ALL: [ArchiveAction; 7] = [
        ArchiveAction::ExtractAll,
        ArchiveAction::ExtractNewer,
        ArchiveAction::ExtractSome,
        ArchiveAction::RestoreAll,
        ArchiveAction::RestoreNewer,
        ArchiveAction::RestoreSome,
        ArchiveAction::Delete,
    ];

    pub fn label(self) -> &'static str {
        match self {
            ArchiveAction::ExtractAll => "Extract all",
            ArchiveAction::ExtractNewer => "Extract newer",
            ArchiveAction::ExtractSome => "Extract some",
            ArchiveAction::RestoreAll => "Restore all",
            ArchiveAction::RestoreNewer => "Restore newer",
            ArchiveAction::RestoreSome => "Restore some",
            ArchiveAction::Delete => "Delete",
        }
    }

    fn mode(self) -> ExtractMode {
        match self {
            ArchiveAction::ExtractNewer | ArchiveAction::RestoreNewer => ExtractMode::NewerOnly,
            _ => ExtractMode::All,
        }
    }
}

/// Interactive session over one project
pub struct Menu<'a, P: Prompter> {
    prompter: &'a mut P,
    paths: &'a ProjectPaths,
    editor: OptionsEditor,
    args: CreateArgs,
}

impl<'a, P: Prompter> Menu<'a, P> {
    pub fn new(
        prompter: &'a mut P,
        paths: &'a ProjectPaths,
        editor: OptionsEditor,
        args: CreateArgs,
    ) -> Self {
        Self {
            prompter,
            paths,
            editor,
            args,
        }
    }

    /// Run until the user exits; returns the final options
    pub fn run(mut self) -> StashResult<Options> {
        let labels: Vec<String> = MainChoice::ALL
            .iter()
            .map(|c| c.label().to_string())
            .collect();

        loop {
            let Some(index) = self.prompter.select("What would you like to do?", &labels, 0)?
            else {
                break;
            };
            let choice = MainChoice::ALL
                .get(index)
                .copied()
                .unwrap_or(MainChoice::Exit);

            let result = match choice {
                MainChoice::Create => self.create(),
                MainChoice::Manage => self.manage(),
                MainChoice::Edit => self.edit_options(),
                MainChoice::Load => self.load(),
                MainChoice::Save => self.save(),
                MainChoice::Exit => break,
            };
            report(result)?;
        }

        if self.editor.is_dirty()
            && self
                .prompter
                .confirm("Save changes to the options file?", false)?
        {
            report(self.save_to_default())?;
        }

        Ok(self.editor.into_options())
    }

    fn create(&mut self) -> StashResult<()> {
        handle_create(
            &mut *self.prompter,
            self.paths,
            self.editor.options(),
            self.args.clone(),
        )?;
        Ok(())
    }

    fn manage(&mut self) -> StashResult<()> {
        let dir = self
            .paths
            .archive_dir(&self.editor.options().archive_directory);
        let archives = list_archives(&dir)?;
        if archives.is_empty() {
            println!("No archives found in {}.", dir.display());
            return Ok(());
        }

        let now = Local::now();
        let mut labels: Vec<String> = archives.iter().map(|a| archive_label(a, now)).collect();
        labels.push(BACK.to_string());

        let Some(index) = self.prompter.select("Select an archive", &labels, 0)? else {
            return Ok(());
        };
        let Some(archive) = archives.get(index) else {
            return Ok(());
        };

        let mut actions: Vec<String> = ArchiveAction::ALL
            .iter()
            .map(|a| a.label().to_string())
            .collect();
        actions.push(BACK.to_string());

        let prompt = archive.display_name().to_string();
        let Some(index) = self.prompter.select(&prompt, &actions, 0)? else {
            return Ok(());
        };
        match ArchiveAction::ALL.get(index) {
            Some(&action) => self.run_action(&archive.path, action),
            None => Ok(()),
        }
    }

    /// Run one action against an archive
    pub fn run_action(&mut self, archive: &Path, action: ArchiveAction) -> StashResult<()> {
        let mode = action.mode();
        let executor = RestoreExecutor::from_options(self.paths.clone(), self.editor.options())?
            .with_dotfiles(self.args.match_dotfiles);

        let report = match action {
            ArchiveAction::ExtractAll | ArchiveAction::ExtractNewer => {
                executor.extract(archive, mode)?
            }
            ArchiveAction::ExtractSome => {
                let Some(selection) = self.pick_entries(archive)? else {
                    return Ok(());
                };
                executor.extract_some(archive, &selection, mode)?
            }
            ArchiveAction::RestoreAll | ArchiveAction::RestoreNewer => {
                let plan = executor.plan_restore(archive)?;
                if !self.confirm_plan(&plan)? {
                    return Ok(());
                }
                executor.restore(archive, mode)?
            }
            ArchiveAction::RestoreSome => {
                let Some(selection) = self.pick_entries(archive)? else {
                    return Ok(());
                };
                let plan = executor.plan_restore_some(archive, &selection)?;
                if !self.confirm_plan(&plan)? {
                    return Ok(());
                }
                executor.restore_some(archive, &selection, mode)?
            }
            ArchiveAction::Delete => return self.delete(archive),
        };

        println!("{}", format_report(&report));
        Ok(())
    }

    fn delete(&mut self, archive: &Path) -> StashResult<()> {
        let prompt = format!("Delete {}?", archive.display());
        if !self.prompter.confirm(&prompt, false)? {
            return Ok(());
        }

        if RestoreExecutor::delete_archive(archive)? {
            println!("Deleted {}", archive.display());
        } else {
            println!("{} was already gone", archive.display());
        }
        Ok(())
    }

    fn pick_entries(&mut self, archive: &Path) -> StashResult<Option<Vec<String>>> {
        let entries = list_entries(archive)?;
        let picked = self
            .prompter
            .multi_select("Select entries (space to toggle)", &entries)?;

        if picked.is_empty() {
            println!("Nothing selected.");
            return Ok(None);
        }
        Ok(Some(
            picked
                .into_iter()
                .filter_map(|i| entries.get(i).cloned())
                .collect(),
        ))
    }

    fn confirm_plan(&mut self, plan: &[String]) -> StashResult<bool> {
        println!("{}", format_plan(plan));
        if plan.is_empty() {
            return Ok(true);
        }
        self.prompter.confirm("Proceed with restore?", false)
    }

    fn edit_options(&mut self) -> StashResult<()> {
        loop {
            let mut labels: Vec<String> = OptionField::ALL
                .iter()
                .map(|f| format!("{}: {}", f.label(), self.editor.value(*f).summary()))
                .collect();
            labels.push(BACK.to_string());

            let Some(index) = self.prompter.select("Edit options", &labels, 0)? else {
                return Ok(());
            };
            let Some(&field) = OptionField::ALL.get(index) else {
                return Ok(());
            };
            report(self.edit_field(field))?;
        }
    }

    fn edit_field(&mut self, field: OptionField) -> StashResult<()> {
        match field.kind() {
            ValueKind::Flag => self.editor.toggle(field),
            ValueKind::Text => {
                let current = self.editor.value(field).summary();
                let text = self.prompter.input(field.label(), &current)?;
                self.editor.set_text(field, text)
            }
            ValueKind::List => self.edit_list(field),
        }
    }

    fn edit_list(&mut self, field: OptionField) -> StashResult<()> {
        let items: Vec<String> = ["Add patterns", "Remove a pattern", "Replace a pattern", "Clear", BACK]
            .iter()
            .map(|s| s.to_string())
            .collect();

        let Some(choice) = self.prompter.select(field.label(), &items, 0)? else {
            return Ok(());
        };

        match choice {
            0 => {
                let line = self.prompter.input("Patterns to add", "")?;
                self.editor.add_patterns(field, parse_pattern_line(&line))
            }
            1 => match self.pick_pattern(field)? {
                Some(index) => self.editor.edit_list(field, ListEdit::Remove(index)),
                None => Ok(()),
            },
            2 => {
                let Some(index) = self.pick_pattern(field)? else {
                    return Ok(());
                };
                let current = match self.editor.value(field) {
                    OptionValue::List(list) => list.get(index).cloned().unwrap_or_default(),
                    _ => String::new(),
                };
                let text = self.prompter.input("Replacement", &current)?;
                self.editor.edit_list(field, ListEdit::Replace(index, text))
            }
            3 => self.editor.edit_list(field, ListEdit::Clear),
            _ => Ok(()),
        }
    }

    fn pick_pattern(&mut self, field: OptionField) -> StashResult<Option<usize>> {
        let OptionValue::List(patterns) = self.editor.value(field) else {
            return Ok(None);
        };
        if patterns.is_empty() {
            println!("{} is empty.", field.label());
            return Ok(None);
        }
        self.prompter.select("Select a pattern", &patterns, 0)
    }

    fn load(&mut self) -> StashResult<()> {
        let file = self.prompter.input("Options file", DEFAULT_OPTIONS_FILE)?;
        let path = self.paths.resolve(non_empty_or_default(&file));
        self.editor.load(&path)?;
        println!("Loaded options from {}", path.display());
        Ok(())
    }

    fn save(&mut self) -> StashResult<()> {
        let initial = self
            .editor
            .source()
            .map(|p| p.display().to_string())
            .unwrap_or_else(|| DEFAULT_OPTIONS_FILE.to_string());
        let file = self.prompter.input("Save options to", &initial)?;
        let path = self.paths.resolve(non_empty_or_default(&file));
        self.editor.save(&path)?;
        println!("Saved options to {}", path.display());
        Ok(())
    }

    fn save_to_default(&mut self) -> StashResult<()> {
        let path = self
            .editor
            .source()
            .map(Path::to_path_buf)
            .unwrap_or_else(|| self.paths.default_options_file());
        self.editor.save(&path)?;
        println!("Saved options to {}", path.display());
        Ok(())
    }
}

fn non_empty_or_default(file: &str) -> &str {
    if file.trim().is_empty() {
        DEFAULT_OPTIONS_FILE
    } else {
        file.trim()
    }
}

/// Print a failed operation and carry on; prompt failures end the session
fn report(result: StashResult<()>) -> StashResult<()> {
    match result {
        Err(e @ StashError::Prompt(_)) => Err(e),
        Err(e) => {
            eprintln!("Error: {}", e);
            Ok(())
        }
        Ok(()) => Ok(()),
    }
}
