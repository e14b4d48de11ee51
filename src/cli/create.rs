//! Archive creation command
//!
//! Runs the optional prompt flow, then writes the archive while a spinner
//! shows the running counts.

use std::time::{Duration, Instant};

use chrono::Local;
use indicatif::{ProgressBar, ProgressStyle};

use super::prompt::Prompter;
use crate::archive::writer::MAX_LEVEL;
use crate::archive::{create_archive, resolve_output, ArchiveOutcome, ArchiveRequest, WriteSummary};
use crate::config::options::parse_pattern_line;
use crate::config::{OptionField, OptionValue, Options, ProjectPaths};
use crate::display::{archive::plural, format_counts, format_size, format_written};
use crate::error::{StashError, StashResult};

/// Where the archive comment comes from
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum CommentSource {
    /// No comment unless the options ask for one
    #[default]
    None,
    Given(String),
    /// Ask before archiving
    Prompt,
}

/// Per-run settings that are not part of the options document
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CreateArgs {
    pub comment: CommentSource,
    pub level: u32,
    pub match_dotfiles: bool,
}

impl Default for CreateArgs {
    fn default() -> Self {
        Self {
            comment: CommentSource::None,
            level: MAX_LEVEL,
            match_dotfiles: false,
        }
    }
}

impl CreateArgs {
    fn comment_text(&self) -> Option<String> {
        match &self.comment {
            CommentSource::Given(text) => Some(text.clone()),
            _ => None,
        }
    }
}

/// Ask for every archive setting, pre-filled with the current values
pub fn prompt_all<P: Prompter>(
    prompter: &mut P,
    options: &mut Options,
    args: &mut CreateArgs,
) -> StashResult<()> {
    let output = prompter.input("Output file", &options.output)?;
    options.set(OptionField::Output, OptionValue::Text(output))?;

    for field in [OptionField::Include, OptionField::Exclude] {
        let current = options.get(field).summary();
        let line = prompter.input(field.label(), &current)?;
        options.set(field, OptionValue::List(parse_pattern_line(&line)))?;
    }

    args.match_dotfiles = prompter.confirm("Include dotfiles?", args.match_dotfiles)?;

    let level = prompter.input("Compression level (0-9)", &args.level.to_string())?;
    args.level = parse_level(&level)?;

    let initial = args.comment_text().unwrap_or_default();
    args.comment = comment_from(prompter.input("Comment", &initial)?);
    Ok(())
}

/// Parse a compression level typed by the user
pub fn parse_level(text: &str) -> StashResult<u32> {
    match text.trim().parse::<u32>() {
        Ok(level) if level <= MAX_LEVEL => Ok(level),
        _ => Err(StashError::Validation(format!(
            "Invalid compression level '{}' (expected 0-{})",
            text.trim(),
            MAX_LEVEL
        ))),
    }
}

fn comment_from(text: String) -> CommentSource {
    if text.trim().is_empty() {
        CommentSource::None
    } else {
        CommentSource::Given(text.trim().to_string())
    }
}

/// Create an archive of the project
///
/// `options.prompt` runs the full prompt flow first; otherwise a comment is
/// asked for when requested by `args` or `options.comment`.
pub fn handle_create<P: Prompter>(
    prompter: &mut P,
    paths: &ProjectPaths,
    options: &Options,
    args: CreateArgs,
) -> StashResult<ArchiveOutcome> {
    let mut options = options.clone();
    let mut args = args;

    if options.prompt {
        prompt_all(prompter, &mut options, &mut args)?;
    } else if args.comment == CommentSource::Prompt
        || (options.comment && args.comment == CommentSource::None)
    {
        args.comment = comment_from(prompter.input("Comment", "")?);
    }

    let request = ArchiveRequest {
        comment: args.comment_text(),
        level: args.level,
        match_dotfiles: args.match_dotfiles,
        now: Local::now(),
    };

    let destination = resolve_output(paths, &options, &request)?;
    println!(
        "Archiving {} at compression level {}...",
        destination.display(),
        request.level
    );

    let start = Instant::now();
    let spinner = progress_spinner();
    let result = create_archive(paths, &options, &request, |summary| {
        spinner.set_message(progress_message(summary));
    });
    spinner.finish_and_clear();
    let outcome = result?;

    println!("{}", format_counts(&outcome.summary));
    println!("{}", format_written(&outcome.summary, start.elapsed()));

    Ok(outcome)
}

fn progress_spinner() -> ProgressBar {
    let spinner = ProgressBar::new_spinner();
    let style = ProgressStyle::with_template("{spinner:.yellow} {msg}")
        .unwrap_or_else(|_| ProgressStyle::default_spinner())
        .tick_chars("⠋⠙⠹⠸⠼⠴⠦⠧⠇⠏");
    spinner.set_style(style);
    spinner.enable_steady_tick(Duration::from_millis(100));
    spinner
}

fn progress_message(summary: &WriteSummary) -> String {
    format!(
        "{}, {} ({})",
        plural(summary.file_count, "file", "files"),
        plural(summary.directory_count, "directory", "directories"),
        format_size(summary.total_bytes)
    )
}
