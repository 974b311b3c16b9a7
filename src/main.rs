//! Ambience CLI - ambient sound mixer and focus timer
//!
//! Play looping ambient tracks alone or mixed, run a focus/break timer
//! alongside, and share mixes as links.

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::{bail, Context, Result};
use clap::{CommandFactory, Parser};

use ambience::cli::{build_catalog, run_interactive, Cli, Commands, Display, MixesCommand};
use ambience::config::AppConfig;
use ambience::mixes::MixLibrary;
use ambience::share;
use ambience::storage::FileMixStore;

/// Main entry point
#[tokio::main(flavor = "current_thread")]
async fn main() {
    // Parse command line arguments
    let cli = Cli::parse();

    // Initialize logging
    init_tracing(cli.verbose);

    // Execute command
    if let Err(e) = execute(cli).await {
        Display::show_error(&format!("{:#}", e));
        std::process::exit(1);
    }
}

/// Initializes the tracing subscriber for logging.
///
/// `RUST_LOG` wins over `--verbose`.
fn init_tracing(verbose: bool) {
    use tracing_subscriber::{fmt, EnvFilter};

    let default = if verbose { "debug" } else { "warn" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default));

    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .without_time()
        .with_writer(std::io::stderr)
        .init();
}

/// Loads the configuration file and applies command-line overrides.
fn load_config(path: Option<PathBuf>, data_dir: Option<PathBuf>) -> Result<AppConfig> {
    let mut config = match path.or_else(AppConfig::default_path) {
        Some(path) => AppConfig::load(&path)?,
        None => AppConfig::default(),
    };
    if data_dir.is_some() {
        config.data_dir = data_dir;
    }
    Ok(config)
}

fn open_library(config: &AppConfig) -> Result<MixLibrary> {
    let data_dir = config.data_dir()?;
    Ok(MixLibrary::load(Arc::new(FileMixStore::in_dir(&data_dir))))
}

fn resolve_mix(library: &MixLibrary, query: &str) -> Result<String> {
    library
        .find(query)
        .map(|mix| mix.id.clone())
        .with_context(|| format!("no saved mix matches '{}'", query))
}

/// Executes the CLI command.
async fn execute(cli: Cli) -> Result<()> {
    if cli.verbose {
        tracing::info!("Verbose mode enabled");
    }

    let config = load_config(cli.config, cli.data_dir)?;

    match cli.command {
        Some(Commands::Tracks { category }) => {
            let catalog = build_catalog(&config)?;
            Display::show_tracks(&catalog, category);
        }
        Some(Commands::Play(args)) => {
            run_interactive(&config, args).await?;
        }
        Some(Commands::Mixes { command }) => {
            let mut library = open_library(&config)?;
            match command {
                MixesCommand::List => Display::show_mixes(library.list()),
                MixesCommand::Delete { id } => {
                    let id = resolve_mix(&library, &id)?;
                    library.delete(&id).context("failed to delete mix")?;
                    Display::show_message(&format!("Deleted mix {}", id));
                }
                MixesCommand::Share { id } => {
                    let id = resolve_mix(&library, &id)?;
                    let url = library.share_url(&id, &config.share_base_url)?;
                    Display::show_message(&url);
                }
            }
        }
        Some(Commands::Decode { token }) => {
            let token = share::token_from_url(&token).unwrap_or(token);
            match share::decode(token.trim()) {
                Some(mix) => Display::show_shared(&mix),
                None => bail!("not a valid share token"),
            }
        }
        Some(Commands::Completions { shell }) => {
            generate_completions(shell);
        }
        None => {
            // No command provided, show help
            Cli::command().print_help()?;
        }
    }

    Ok(())
}

/// Generates shell completion scripts.
fn generate_completions(shell: clap_complete::Shell) {
    use clap_complete::generate;
    use std::io;

    let mut cmd = Cli::command();
    let bin_name = cmd.get_name().to_string();
    generate(shell, &mut cmd, bin_name, &mut io::stdout());
}

// ============================================================================
// Tests
// ============================================================================
