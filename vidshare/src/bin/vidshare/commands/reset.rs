use anyhow::Result;
use clap::Args;
use vidshare::store::{AnyStore, cleanup_pattern};

use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::OutputManager;

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Wipe stored data",
    commands: &["vidshare reset --yes     # Delete every key under the configured prefix"],
}];

#[derive(Args)]
pub struct ResetArgs {
    /// Confirm deleting all data under the prefix
    #[arg(long)]
    yes: bool,
}

pub async fn handle_reset(args: ResetArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    output.heading("Reset store");

    let client = ctx.client(output).await?;
    let AnyStore::Redis(store) = client.store() else {
        output.info("memory backend holds nothing between runs; nothing to reset");
        return Ok(());
    };

    let pattern = format!("{}:*", store.prefix());
    if !args.yes {
        output.warning(&format!("This deletes every key matching {pattern}"));
        output.info("Re-run with --yes to confirm.");
        return Ok(());
    }

    store.drop_indexes().await?;
    let mut conn = store.connection();
    let removed = cleanup_pattern(&mut conn, &pattern).await?;
    output.success(&format!("Removed {removed} keys and dropped search indexes"));
    Ok(())
}
