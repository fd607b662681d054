use clap::{ArgAction, Args, Parser, Subcommand};
use shelfnote_config::LibraryKind;
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "shelfnote", version)]
#[command(about = "Materialize an Audiobookshelf library as notes in a markdown vault")]
#[command(long_about = "\
Materialize an Audiobookshelf library as notes in a markdown vault

Every audiobook, ebook and podcast episode gets one note. Notes are filed as

  {dir}/{author}/{title}.md
  {dir}/{author}/{series}/{number} | {title}.md
  {dir}/{podcast}/{episode}.md

Only the section between the `%%Metadata ...%%` and `%%` markers (and
`{{key}}` tokens in the frontmatter) is rewritten on later syncs. Everything
else in a note belongs to you.

Run 'shelfnote config init' to write a documented config file.")]
pub struct Cli {
    /// Config file [default: platform config dir]/shelfnote/config.toml
    #[arg(long, env = "SHELFNOTE_CONFIG", global = true)]
    pub config: Option<PathBuf>,

    /// Root of the vault; overrides `vault` from the config file
    #[arg(long, global = true)]
    pub vault: Option<PathBuf>,

    /// More logging (-v debug, -vv trace)
    #[arg(short, long, action = ArgAction::Count, global = true, conflicts_with = "quiet")]
    pub verbose: u8,

    /// Less logging (-q warnings, -qq errors only)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub quiet: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand)]
pub enum Command {
    /// Fetch the libraries and create or update their notes
    Sync(SyncArgs),
    /// Inspect or create the config file
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Args)]
pub struct SyncArgs {
    /// Import a single library kind (audiobooks, ebooks or podcasts)
    #[arg(long)]
    pub only: Option<LibraryKind>,

    /// Read the vault and report what would change without writing anything
    #[arg(long)]
    pub dry_run: bool,
}

#[derive(Subcommand)]
pub enum ConfigCommand {
    /// Write a documented config file
    Init {
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
    /// Print the effective settings, API key redacted
    Show,
    /// Print the config file location
    Path,
    /// Convert the Obsidian plugin's data.json into a config file
    ImportPlugin {
        /// Path to `.obsidian/plugins/<plugin>/data.json`
        data: PathBuf,
        /// Overwrite an existing file
        #[arg(long)]
        force: bool,
    },
}

impl Cli {
    /// Log level directive used when `RUST_LOG` is not set.
    pub fn log_level(&self) -> &'static str {
        match (self.verbose, self.quiet) {
            (0, 0) => "info",
            (1, _) => "debug",
            (v, _) if v > 1 => "trace",
            (_, 1) => "warn",
            _ => "error",
        }
    }
}
