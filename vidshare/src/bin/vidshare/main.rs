mod commands;
mod context;
mod examples;
mod output;
mod theme;

use std::fmt::Write;
use std::path::PathBuf;

use anyhow::Result;
use clap::{
    ColorChoice, Command, CommandFactory, FromArgMatches, Parser, Subcommand,
    builder::{Styles, styling::AnsiColor},
};
use colored::{Color, Colorize};

use commands::{
    init::{InitArgs, handle_init},
    reset::{ResetArgs, handle_reset},
    seed::{SeedArgs, handle_seed},
    stats::{StatsArgs, handle_stats},
    videos::{VideosArgs, handle_videos},
};
use context::CliContext;
use examples::{ExampleGroup, command_examples};
use output::{GlobalOptions, OutputFormat, OutputManager};
use theme::{COLOR_ENABLED, PALETTE};

const ENVIRONMENT_VARIABLES: &[(&str, &str)] = &[
    ("REDIS_URL", "Redis Stack URL, substituted for ${REDIS_URL} in vidshare.toml"),
    ("VIDSHARE_USER", "Default user id for commands acting on a channel"),
    ("RUST_LOG", "Log filter, e.g. vidshare=debug"),
];

#[derive(Parser)]
#[command(name = "vidshare")]
#[command(version)]
#[command(
    about = "Inspect and seed a vidshare store",
    long_about = r#"Command line companion for the vidshare data-access core.

Commands:
  init     Write a vidshare.toml config file
  seed     Create demo creators, videos, subscriptions and likes
  videos   List videos with paging, search and sorting
  stats    Show a channel's dashboard totals
  reset    Delete everything stored under the configured prefix
"#
)]
#[command(subcommand_required = true, arg_required_else_help = true)]
struct Cli {
    /// Path to the config file
    #[arg(long, global = true, default_value = vidshare::config::DEFAULT_CONFIG_FILE)]
    config: PathBuf,

    /// Output format
    #[arg(long, global = true, value_enum, default_value = "table")]
    output: OutputFormat,

    /// Suppress output (only errors will be shown)
    #[arg(short = 'q', long, global = true)]
    quiet: bool,

    /// Enable verbose output
    #[arg(short = 'v', long, global = true)]
    verbose: bool,

    /// Disable colored output
    #[arg(long, global = true)]
    no_color: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Write a config file in the current directory
    Init(InitArgs),

    /// Populate the store with demo data
    Seed(SeedArgs),

    /// List videos
    Videos(VideosArgs),

    /// Channel dashboard totals
    Stats(StatsArgs),

    /// Remove all stored data (Redis backend)
    Reset(ResetArgs),
}

fn build_cli_command() -> Command {
    let mut command = Cli::command()
        .styles(help_styles())
        .color(if *COLOR_ENABLED { ColorChoice::Auto } else { ColorChoice::Never })
        .after_long_help(environment_help());
    for example in command_examples() {
        let help = render_examples(example.groups);
        command = command.mut_subcommand(example.name, |sub| sub.after_long_help(help));
    }
    command
}

fn paint(text: &str, color: Color, bold: bool) -> String {
    if !*COLOR_ENABLED {
        return text.to_string();
    }
    let painted = text.color(color);
    if bold { painted.bold().to_string() } else { painted.to_string() }
}

fn render_examples(groups: &[ExampleGroup]) -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", paint("Examples:", PALETTE.heading, true));
    for group in groups {
        let _ = writeln!(buffer, "  {}", paint(group.title, PALETTE.label, true));
        for line in group.commands {
            let _ = writeln!(buffer, "    $ {}", paint(line, PALETTE.value, false));
        }
    }
    buffer
}

fn environment_help() -> String {
    let mut buffer = String::new();
    let _ = writeln!(buffer, "{}", paint("Environment:", PALETTE.heading, true));
    for (key, description) in ENVIRONMENT_VARIABLES {
        let key = format!("{key:<14}");
        let _ = writeln!(buffer, "  {}{description}", paint(&key, PALETTE.label, true));
    }
    buffer
}

fn help_styles() -> Styles {
    Styles::styled()
        .header(AnsiColor::BrightBlue.on_default().bold())
        .usage(AnsiColor::BrightBlue.on_default().bold())
        .literal(AnsiColor::BrightCyan.on_default())
        .placeholder(AnsiColor::BrightBlack.on_default())
        .valid(AnsiColor::Green.on_default())
        .invalid(AnsiColor::Yellow.on_default())
        .error(AnsiColor::Red.on_default().bold())
}

#[tokio::main]
async fn main() {
    env_logger::init();

    let matches = build_cli_command().get_matches();
    let cli = Cli::from_arg_matches(&matches).unwrap_or_else(|err| err.exit());
    if cli.no_color {
        colored::control::set_override(false);
    }

    let output = OutputManager::new(GlobalOptions {
        output_format: cli.output.clone(),
        quiet: cli.quiet,
        verbose: cli.verbose,
        no_color: cli.no_color,
    });

    if let Err(err) = execute(cli, &output).await {
        output.error(&format!("{err:#}"));
        std::process::exit(1);
    }
}

async fn execute(cli: Cli, output: &OutputManager) -> Result<()> {
    let ctx = CliContext::load(&cli.config)?;

    match cli.command {
        Commands::Init(args) => handle_init(args, &ctx, output)?,
        Commands::Seed(args) => handle_seed(args, &ctx, output).await?,
        Commands::Videos(args) => handle_videos(args, &ctx, output).await?,
        Commands::Stats(args) => handle_stats(args, &ctx, output).await?,
        Commands::Reset(args) => handle_reset(args, &ctx, output).await?,
    }

    Ok(())
}
