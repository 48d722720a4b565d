use anyhow::{Context, Result};
use clap::{Args, ValueEnum};
use vidshare::{StoreBackend, VidshareConfig};

use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Create a config file",
    commands: &[
        "vidshare init                      # In-memory backend, default settings",
        "vidshare init --backend redis      # Redis Stack at ${REDIS_URL}",
        "vidshare init --force              # Overwrite an existing vidshare.toml",
    ],
}];

#[derive(Clone, Copy, Debug, ValueEnum)]
pub enum BackendArg {
    Memory,
    Redis,
}

impl From<BackendArg> for StoreBackend {
    fn from(value: BackendArg) -> Self {
        match value {
            BackendArg::Memory => StoreBackend::Memory,
            BackendArg::Redis => StoreBackend::Redis,
        }
    }
}

#[derive(Args)]
pub struct InitArgs {
    /// Storage backend to configure
    #[arg(long, value_enum, default_value = "memory")]
    backend: BackendArg,

    /// Key prefix for every stored record
    #[arg(long)]
    prefix: Option<String>,

    /// Overwrite an existing config file
    #[arg(long)]
    force: bool,
}

pub fn handle_init(args: InitArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    output.heading("Initialize vidshare");

    if ctx.has_config_file() && !args.force {
        output.warning(&format!("{} already exists", ctx.config_path.display()));
        output.info("Use --force to overwrite it.");
        return Ok(());
    }

    let mut config = VidshareConfig::default();
    config.store.backend = args.backend.into();
    if let Some(prefix) = args.prefix {
        config.store.prefix = prefix;
    }

    let rendered = config.to_toml_string()?;
    std::fs::write(&ctx.config_path, rendered)
        .with_context(|| format!("Failed to write {}", ctx.config_path.display()))?;

    output.success(&format!("Wrote {}", ctx.config_path.display()));
    output.key_value("backend", &config.store.backend.to_string());
    output.key_value("prefix", &config.store.prefix);
    if config.store.backend == StoreBackend::Redis {
        output.bullet("Set REDIS_URL to your Redis Stack instance before running other commands");
    }
    Ok(())
}
