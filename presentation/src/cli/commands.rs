//! CLI command definitions

use clap::Parser;
use std::path::PathBuf;

/// CLI arguments for agora
#[derive(Parser, Debug)]
#[command(name = "agora")]
#[command(author, version, about = "Council chat - AI personas discuss your problem with you")]
#[command(long_about = r#"
Agora runs a council of AI personas that talk with you and among themselves.

In council mode a router picks who speaks next and the personas keep the
discussion going until you answer or the safety valve pauses them. The
conversation moves through three phases: exploration, synthesis, action.
In direct mode (--direct) exactly one persona answers each message.

Configuration files are loaded from (in priority order):
1. AGORA_* environment variables
2. --config <path>     Explicit config file
3. ./agora.toml        Project-level config
4. ~/.config/agora/config.toml   Global config

Example:
  agora --council startup "Should we raise a seed round now?"
  agora -p zen_master --direct
  agora --session 0192f3c4-... --minutes minutes.md
"#)]
pub struct Cli {
    /// Opening message for a new session
    pub message: Option<String>,

    /// Resume an existing session by id
    #[arg(short, long, value_name = "ID")]
    pub session: Option<String>,

    /// Title for a new session
    #[arg(short, long)]
    pub title: Option<String>,

    /// Objective given to every participant of a new session
    #[arg(long)]
    pub context: Option<String>,

    /// Built-in council preset for a new session
    #[arg(long, value_name = "PRESET", conflicts_with = "participant")]
    pub council: Option<String>,

    /// Participant for a new session (can be specified multiple times)
    #[arg(short, long, value_name = "ID")]
    pub participant: Vec<String>,

    /// One-to-one conversation with a single participant
    #[arg(long)]
    pub direct: bool,

    /// List stored sessions and exit
    #[arg(long)]
    pub list: bool,

    /// List available participants and councils and exit
    #[arg(long)]
    pub participants: bool,

    /// Delete a stored session and exit
    #[arg(long, value_name = "ID")]
    pub delete: Option<String>,

    /// Write meeting minutes of --session to a file and exit
    #[arg(long, value_name = "PATH", requires = "session")]
    pub minutes: Option<PathBuf>,

    /// Verbosity level (-v = info, -vv = debug, -vvv = trace)
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,

    /// Hide the router's rationale above replies
    #[arg(short, long)]
    pub quiet: bool,

    /// Path to configuration file
    #[arg(long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Disable loading of configuration files
    #[arg(long)]
    pub no_config: bool,

    /// Show configuration file locations and exit
    #[arg(long)]
    pub show_config: bool,
}
