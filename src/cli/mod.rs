//! CLI command handlers
//!
//! This module contains the archive creation command, the interactive menu
//! and the options editing session it drives.

pub mod create;
pub mod editor;
pub mod menu;
pub mod prompt;

pub use create::{handle_create, prompt_all, CommentSource, CreateArgs};
pub use editor::OptionsEditor;
pub use menu::{ArchiveAction, Menu};
pub use prompt::{Prompter, TerminalPrompter};
