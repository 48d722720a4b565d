use anyhow::Result;
use clap::Args;
use comfy_table::{Cell, Table};
use vidshare::{Joined, ListQuery, OwnerProfile, Page, Video};

use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[
    ExampleGroup {
        title: "Browse",
        commands: &[
            "vidshare videos                              # Newest first, 10 per page",
            "vidshare videos --page 2 --limit 20          # Second page of 20",
            "vidshare videos --sort-by views --sort-type desc",
        ],
    },
    ExampleGroup {
        title: "Search",
        commands: &[
            "vidshare videos --query episode              # Title or description contains",
            "vidshare videos --user <USER_ID>             # One creator's videos",
        ],
    },
];

#[derive(Args)]
pub struct VideosArgs {
    #[arg(long)]
    page: Option<i64>,

    /// Page size (1-100)
    #[arg(long)]
    limit: Option<i64>,

    /// Text to look for in title and description
    #[arg(long)]
    query: Option<String>,

    /// createdAt, title, duration or views
    #[arg(long)]
    sort_by: Option<String>,

    /// asc or desc
    #[arg(long)]
    sort_type: Option<String>,

    /// Only videos owned by this user id
    #[arg(long)]
    user: Option<String>,
}

impl From<VideosArgs> for ListQuery {
    fn from(args: VideosArgs) -> Self {
        ListQuery {
            page: args.page,
            limit: args.limit,
            query: args.query,
            sort_by: args.sort_by,
            sort_type: args.sort_type,
            user_id: args.user,
        }
    }
}

impl TableDisplay for Page<Joined<Video, OwnerProfile>> {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Title", "Owner", "Duration", "Views", "Published", "Id"]);
        if self.items.is_empty() {
            table.add_row(vec![Cell::new("No videos found")]);
            return table;
        }
        for item in &self.items {
            let video = &item.row;
            let owner = item
                .joined
                .as_ref()
                .map_or_else(|| "(deleted)".to_string(), |o| o.username.clone());
            table.add_row(vec![
                Cell::new(&video.title),
                Cell::new(owner),
                Cell::new(format_duration(video.duration)),
                Cell::new(video.views),
                Cell::new(if video.is_published { "yes" } else { "no" }),
                Cell::new(video.id.as_str()),
            ]);
        }
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "page {}/{} ({} of {} videos)",
            self.page,
            self.total_pages,
            self.items.len(),
            self.total
        )
    }
}

fn format_duration(seconds: f64) -> String {
    let total = seconds.max(0.0).round() as u64;
    format!("{}:{:02}", total / 60, total % 60)
}

pub async fn handle_videos(args: VideosArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    let client = ctx.client(output).await?;
    let page = client.list_videos(&args.into()).await?;

    output.heading("Videos");
    output.display(&page)?;
    output.info(&format!(
        "page {} of {}, {} total",
        page.page,
        page.total_pages.max(1),
        page.total
    ));
    Ok(())
}
