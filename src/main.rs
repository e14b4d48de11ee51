use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use stash::archive::writer::MAX_LEVEL;
use stash::cli::{handle_create, CommentSource, CreateArgs, Menu, OptionsEditor, TerminalPrompter};
use stash::config::paths::DEFAULT_OPTIONS_FILE;
use stash::config::{OptionField, OptionValue, Options, ProjectPaths};
use stash::error::StashResult;

#[derive(Parser)]
#[command(
    name = "stash",
    version,
    about = "Timestamped project archives with selective restore",
    long_about = "stash writes timestamped, optionally commented .tar.gz archives of the \
                  current project and can later extract or restore them, deleting files \
                  that are not in the archive. Run without arguments for the interactive menu."
)]
struct Cli {
    /// Output path template without extension (<cwd>, <timestamp>, <version>)
    #[arg(short, long)]
    output: Option<String>,

    /// Glob patterns to archive
    #[arg(short, long, num_args = 1..)]
    include: Option<Vec<String>>,

    /// Glob patterns never archived nor deleted on restore
    #[arg(short = 'x', long, num_args = 0..)]
    exclude: Option<Vec<String>>,

    /// strftime format used for <timestamp>
    #[arg(short, long)]
    timestamp_format: Option<String>,

    /// Directory holding existing archives
    #[arg(short, long = "archive-dir")]
    archive_dir: Option<String>,

    /// Comment appended to the file name; without text, ask for one
    #[arg(short, long, num_args = 0..=1, default_missing_value = "")]
    comment: Option<String>,

    /// Ask for every option before archiving
    #[arg(short, long)]
    prompt: bool,

    /// Load options from a JSON file
    #[arg(short = 'f', long = "config")]
    config: Option<PathBuf>,

    /// Save the effective options and exit
    #[arg(short, long, num_args = 0..=1, default_missing_value = DEFAULT_OPTIONS_FILE)]
    save: Option<PathBuf>,

    /// Open the interactive menu
    #[arg(short, long)]
    menu: bool,

    /// Let include patterns match dotfiles
    #[arg(short, long)]
    dot: bool,

    /// Compression level (0-9)
    #[arg(short, long, value_parser = clap::value_parser!(u32).range(0..=9))]
    level: Option<u32>,

    /// More log output (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count)]
    verbose: u8,
}

impl Cli {
    /// Flags override whatever came from defaults or the config file
    fn apply(&self, options: &mut Options) -> StashResult<()> {
        let texts = [
            (OptionField::Output, &self.output),
            (OptionField::TimestampFormat, &self.timestamp_format),
            (OptionField::ArchiveDirectory, &self.archive_dir),
        ];
        for (field, value) in texts {
            if let Some(value) = value {
                options.set(field, OptionValue::Text(value.clone()))?;
            }
        }

        let lists = [
            (OptionField::Include, &self.include),
            (OptionField::Exclude, &self.exclude),
        ];
        for (field, value) in lists {
            if let Some(value) = value {
                options.set(field, OptionValue::List(value.clone()))?;
            }
        }

        if self.prompt {
            options.prompt = true;
        }
        Ok(())
    }

    fn create_args(&self) -> CreateArgs {
        let comment = match self.comment.as_deref().map(str::trim) {
            None => CommentSource::None,
            Some("") => CommentSource::Prompt,
            Some(text) => CommentSource::Given(text.to_string()),
        };
        CreateArgs {
            comment,
            level: self.level.unwrap_or(MAX_LEVEL),
            match_dotfiles: self.dot,
        }
    }
}

fn main() -> Result<()> {
    let no_args = std::env::args_os().len() <= 1;
    let cli = Cli::parse();

    init_tracing(cli.verbose);

    let paths = ProjectPaths::new()?;

    // defaults, then the config file, then flags
    let mut options = match &cli.config {
        Some(path) => Options::load(&paths.resolve(path))?,
        None => Options::default(),
    };
    cli.apply(&mut options)?;

    if let Some(path) = &cli.save {
        let path = paths.resolve(path);
        options.save(&path)?;
        println!("Saved options to {}", path.display());
        return Ok(());
    }

    let mut prompter = TerminalPrompter;

    if cli.menu || no_args {
        println!("stash {}", env!("CARGO_PKG_VERSION"));
        Menu::new(
            &mut prompter,
            &paths,
            OptionsEditor::new(options),
            cli.create_args(),
        )
        .run()?;
        return Ok(());
    }

    handle_create(&mut prompter, &paths, &options, cli.create_args())?;
    Ok(())
}

/// Initialize tracing; `RUST_LOG` wins over `-v`
fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| match verbose {
        0 => EnvFilter::new("warn"),
        1 => EnvFilter::new("info"),
        2 => EnvFilter::new("debug"),
        _ => EnvFilter::new("trace"),
    });

    tracing_subscriber::registry()
        .with(fmt::layer().with_target(false).with_writer(std::io::stderr))
        .with(filter)
        .init();
}
