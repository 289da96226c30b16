mod commands;
mod input;
mod logging;
mod render;

use std::path::PathBuf;

use anyhow::Result;
use clap::{ArgAction, Parser, Subcommand};
use timebucket_core::MalformedPolicy;

use commands::Context;

#[derive(Parser)]
#[command(name = "timebucket")]
#[command(about = "Group notifications into Today, Yesterday, This week and Earlier")]
struct Cli {
    /// Log more (-v info, -vv debug, -vvv trace)
    #[arg(short, long, action = ArgAction::Count, global = true)]
    verbose: u8,

    /// Config file to use instead of ~/.config/timebucket/config.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Group notifications read from a JSON file (or stdin) into date sections
    Group {
        /// JSON array or JSON-lines file; "-" or absent reads stdin
        input: Option<PathBuf>,

        /// Reference instant (e.g. "2024-06-10T12:00:00"), defaults to now
        #[arg(long)]
        now: Option<String>,

        /// IANA timezone deciding where a day starts (e.g. "Europe/Berlin")
        #[arg(long)]
        tz: Option<String>,

        /// What to do with unreadable timestamps: "skip" or "earliest"
        #[arg(long)]
        malformed: Option<MalformedPolicy>,

        /// Print JSON instead of text
        #[arg(long)]
        json: bool,
    },
    /// Show the configured ranges and where they start and end
    Ranges {
        /// Reference instant, defaults to now
        #[arg(long)]
        now: Option<String>,

        /// IANA timezone deciding where a day starts
        #[arg(long)]
        tz: Option<String>,
    },
    /// Show the config path (creating a commented template) and effective settings
    Config,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    let _logger = logging::init(cli.verbose)?;
    let config_path = cli.config.as_deref();

    match cli.command {
        Commands::Group {
            input,
            now,
            tz,
            malformed,
            json,
        } => {
            let ctx = Context::resolve(config_path, tz.as_deref(), now.as_deref())?;
            commands::group::run(&ctx, input.as_deref(), malformed, json)
        }
        Commands::Ranges { now, tz } => {
            let ctx = Context::resolve(config_path, tz.as_deref(), now.as_deref())?;
            commands::ranges::run(&ctx)
        }
        Commands::Config => commands::config::run(config_path),
    }
}
