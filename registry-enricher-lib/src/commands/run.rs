//! Command dispatch logic for registry-enricher

use super::{UpdateArgs, process_update};
use crate::{Host, Result};
use clap::builder::Styles;
use clap::builder::styling::{AnsiColor, Effects};
use clap::{Parser, Subcommand};
use ohno::app_err;
use std::io::Write;

const CLAP_STYLES: Styles = Styles::styled()
    .header(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .usage(AnsiColor::Green.on_default().effects(Effects::BOLD))
    .literal(AnsiColor::Cyan.on_default().effects(Effects::BOLD))
    .placeholder(AnsiColor::Cyan.on_default());

#[derive(Parser, Debug)]
#[command(name = "registry-enricher", version, author, long_about = None)]
#[command(about = "Enrich a tool registry with metadata from its source repositories")]
#[command(styles = CLAP_STYLES)]
struct Cli {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Fetch repository metadata for registry tools and merge it into the enriched snapshot
    Update(Box<UpdateArgs>),
}

/// Dispatch command-line arguments to the appropriate handler
///
/// This function parses the command-line arguments and executes the corresponding
/// subcommand. It's designed to be called from main.rs with the program arguments.
///
/// # Arguments
///
/// * `args` - An iterator of command-line arguments (typically from `std::env::args()`)
///
/// # Errors
///
/// Returns an error if the arguments are invalid or if the executed command fails.
/// Help and version requests are written to the host's output and are not errors.
pub async fn run<I, T, H>(host: &mut H, args: I) -> Result<()>
where
    I: IntoIterator<Item = T>,
    T: Into<std::ffi::OsString> + Clone,
    H: Host,
{
    let cli = match Cli::try_parse_from(args) {
        Ok(cli) => cli,
        Err(e) if e.use_stderr() => {
            let _ = write!(host.error(), "{}", e.render());
            return Err(app_err!("invalid command line arguments"));
        }
        Err(e) => {
            let _ = write!(host.output(), "{}", e.render());
            return Ok(());
        }
    };

    match &cli.command {
        Command::Update(update_args) => process_update(host, update_args).await,
    }
}
