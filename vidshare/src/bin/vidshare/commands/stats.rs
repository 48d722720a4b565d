use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use vidshare::{ChannelStats, Principal};

use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Channel dashboard",
    commands: &[
        "vidshare stats --user <USER_ID>                 # Totals for one channel",
        "vidshare --output compact stats --user <USER_ID>",
    ],
}];

#[derive(Args)]
pub struct StatsArgs {
    /// Channel owner's user id
    #[arg(long, env = "VIDSHARE_USER")]
    user: String,
}

/// Stats as rendered for one channel
#[derive(serde::Serialize)]
struct StatsView(ChannelStats);

impl TableDisplay for StatsView {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Videos", "Views", "Subscribers", "Likes"]);
        table.add_row(vec![
            Cell::new(self.0.total_videos),
            Cell::new(self.0.total_views),
            Cell::new(self.0.total_subscribers),
            Cell::new(self.0.total_likes),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "videos={} views={} subscribers={} likes={}",
            self.0.total_videos, self.0.total_views, self.0.total_subscribers, self.0.total_likes
        )
    }
}

pub async fn handle_stats(args: StatsArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    let principal = Principal::require(Some(args.user.trim()))?;
    let client = ctx.client(output).await?;
    let stats = client.channel_stats(&principal).await?;

    output.heading("Channel stats");
    output.display(&StatsView(stats))?;
    Ok(())
}
