//! Command definitions for the ambience CLI.
//!
//! Uses clap derive macro for argument parsing.

use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::notification::sanitize_task_name;
use crate::types::{clamp_volume, Category, TimerState};

// ============================================================================
// CLI Structure
// ============================================================================

/// Ambient sound mixer and focus timer
#[derive(Parser, Debug)]
#[command(
    name = "ambience",
    version,
    about = "Ambient sound mixer and focus timer",
    long_about = "Play looping ambient tracks on their own or mixed together, \
                  run a focus/break timer alongside, and share mixes as links.",
    propagate_version = true
)]
pub struct Cli {
    /// Subcommand to execute
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// Enable verbose output for debugging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// Directory for preferences and saved mixes
    #[arg(long, global = true, value_name = "DIR")]
    pub data_dir: Option<PathBuf>,

    /// Configuration file to use instead of the default location
    #[arg(long, global = true, value_name = "FILE")]
    pub config: Option<PathBuf>,
}

// ============================================================================
// Subcommands
// ============================================================================

/// Available subcommands
#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// List the available tracks
    Tracks {
        /// Only show one category
        #[arg(short, long, value_parser = parse_category)]
        category: Option<Category>,
    },

    /// Start an interactive session
    Play(PlayArgs),

    /// Manage saved mixes
    Mixes {
        #[command(subcommand)]
        command: MixesCommand,
    },

    /// Show the mix inside a share token or link
    Decode {
        /// Share token, or a link carrying one
        token: String,
    },

    /// Generate shell completion scripts
    Completions {
        /// Shell type for completion script
        #[arg(value_enum)]
        shell: clap_complete::Shell,
    },
}

/// Saved-mix subcommands
#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum MixesCommand {
    /// List saved mixes
    List,

    /// Delete a saved mix
    Delete {
        /// Mix id, id prefix or name
        id: String,
    },

    /// Print the share link of a saved mix
    Share {
        /// Mix id, id prefix or name
        id: String,
    },
}

// ============================================================================
// Play Command Arguments
// ============================================================================

/// Arguments for the play command
#[derive(Args, Debug, Clone, Default)]
pub struct PlayArgs {
    /// Tracks to start with; more than one implies --mix
    pub tracks: Vec<String>,

    /// Start in mix mode
    #[arg(short, long)]
    pub mix: bool,

    /// Master volume (0.0-1.0)
    #[arg(long, value_parser = parse_volume)]
    pub volume: Option<f32>,

    /// Load a saved mix by id, id prefix or name
    #[arg(short, long, value_name = "MIX", conflicts_with = "tracks")]
    pub load: Option<String>,

    /// Start a timer with this many focus minutes (1-600)
    #[arg(
        short,
        long,
        value_name = "MINUTES",
        value_parser = clap::value_parser!(u32).range(1..=600)
    )]
    pub focus: Option<u32>,

    /// Break minutes between rounds (0 for a simple timer)
    #[arg(
        short = 'b',
        long = "break",
        value_name = "MINUTES",
        default_value = "0",
        requires = "focus",
        value_parser = clap::value_parser!(u32).range(0..=120)
    )]
    pub break_minutes: u32,

    /// Number of focus/break rounds (1-10)
    #[arg(
        short,
        long,
        default_value = "1",
        requires = "focus",
        value_parser = clap::value_parser!(u32).range(1..=i64::from(TimerState::MAX_ROUNDS))
    )]
    pub rounds: u32,

    /// Task name shown with the timer
    #[arg(short, long, requires = "focus", value_parser = validate_task_name)]
    pub task: Option<String>,

    /// Share link (or token) to open
    #[arg(long, conflicts_with_all = ["tracks", "load"])]
    pub url: Option<String>,
}

// ============================================================================
// Validation Functions
// ============================================================================

/// Validates the task name.
///
/// - Must not be empty
/// - Control characters are removed and the name is cut to 100 characters
fn validate_task_name(s: &str) -> Result<String, String> {
    sanitize_task_name(s).ok_or_else(|| "task name cannot be empty".to_string())
}

/// Parses a volume, rejecting values outside 0.0-1.0.
pub(crate) fn parse_volume(s: &str) -> Result<f32, String> {
    let volume: f32 = s
        .trim()
        .parse()
        .map_err(|_| format!("'{}' is not a number", s))?;
    if clamp_volume(volume) != volume {
        return Err(format!("volume must be between 0.0 and 1.0, got {}", s));
    }
    Ok(volume)
}

/// Parses a category name.
fn parse_category(s: &str) -> Result<Category, String> {
    Category::ALL
        .into_iter()
        .find(|c| c.as_str().eq_ignore_ascii_case(s))
        .ok_or_else(|| {
            let names: Vec<&str> = Category::ALL.iter().map(|c| c.as_str()).collect();
            format!("unknown category '{}' (expected one of: {})", s, names.join(", "))
        })
}

// ============================================================================
// Tests
// ============================================================================
