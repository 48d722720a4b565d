use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::Args;
use comfy_table::{Cell, Table};
use serde::Serialize;
use vidshare::{
    Client, EntityId, NewUser, NewVideo, PrefixUploader, Principal, RepoError, User, store::AnyStore,
};

use crate::context::CliContext;
use crate::examples::ExampleGroup;
use crate::output::{GlobalOptions, OutputManager, TableDisplay, themed_table};

pub const EXAMPLES: &[ExampleGroup] = &[ExampleGroup {
    title: "Seed demo data",
    commands: &[
        "vidshare seed                           # 3 creators with 5 videos each",
        "vidshare seed --users 10 --videos 2     # More creators, fewer videos",
        "vidshare --output json seed             # Summary as JSON",
    ],
}];

#[derive(Args)]
pub struct SeedArgs {
    /// Number of creator accounts
    #[arg(long, default_value_t = 3)]
    users: u32,

    /// Videos published per creator
    #[arg(long, default_value_t = 5)]
    videos: u32,

    /// Base URL the fake uploader hands out
    #[arg(long, default_value = "https://cdn.example.invalid/media/")]
    cdn: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SeedSummary {
    pub users: u32,
    pub videos: u32,
    pub subscriptions: u32,
    pub likes: u32,
    #[serde(skip)]
    pub creators: Vec<(String, EntityId)>,
}

impl TableDisplay for SeedSummary {
    fn to_table(&self, options: &GlobalOptions) -> Table {
        let mut table = themed_table(options, &["Users", "Videos", "Subscriptions", "Likes"]);
        table.add_row(vec![
            Cell::new(self.users),
            Cell::new(self.videos),
            Cell::new(self.subscriptions),
            Cell::new(self.likes),
        ]);
        table
    }

    fn to_compact(&self) -> String {
        format!(
            "users={} videos={} subscriptions={} likes={}",
            self.users, self.videos, self.subscriptions, self.likes
        )
    }
}

pub async fn handle_seed(args: SeedArgs, ctx: &CliContext, output: &OutputManager) -> Result<()> {
    output.heading("Seed demo data");
    ctx.warn_if_ephemeral(output);

    let client = ctx.client(output).await?;
    let summary = seed(&client, &args, output).await?;

    output.display(&summary)?;
    for (username, id) in &summary.creators {
        output.bullet(&format!("{username}  {id}"));
    }
    output.success("Seeding complete");
    Ok(())
}

async fn seed(client: &Client<AnyStore>, args: &SeedArgs, output: &OutputManager) -> Result<SeedSummary> {
    let mut summary = SeedSummary::default();
    let mut creators = Vec::new();

    for n in 1..=args.users {
        let user = ensure_user(client, &format!("creator{n}")).await?;
        output.verbose(&format!("user {} ({})", user.username, user.id));
        summary.creators.push((user.username.clone(), user.id.clone()));
        creators.push(Principal::new(user.id));
        summary.users += 1;
    }

    let mut first_videos = Vec::new();
    for (index, creator) in creators.iter().enumerate() {
        output.progress(&format!("Publishing videos for creator{}", index + 1));
        for n in 1..=args.videos {
            let uploader = PrefixUploader::new(&args.cdn)?.with_duration(f64::from(n) * 30.0);
            let video = client
                .publish_video(
                    creator,
                    NewVideo {
                        title: format!("Episode {n} from creator{}", index + 1),
                        description: format!("Demo upload number {n}"),
                        video_file: PathBuf::from(format!("creator{}-ep{n}.mp4", index + 1)),
                        thumbnail: PathBuf::from(format!("creator{}-ep{n}.png", index + 1)),
                    },
                    &uploader,
                )
                .await
                .context("Failed to publish a demo video")?;
            if n == 1 {
                first_videos.push(video.id.clone());
            }
            summary.videos += 1;
        }
        output.clear_line();
    }

    // Each creator follows the next one and likes their first video.
    if creators.len() > 1 {
        for (index, fan) in creators.iter().enumerate() {
            let next = (index + 1) % creators.len();
            let channel = creators[next].as_str();
            if !client.toggle_subscription(fan, channel).await?.active {
                client.toggle_subscription(fan, channel).await?;
            }
            summary.subscriptions += 1;

            if let Some(video) = first_videos.get(next) {
                if !client.toggle_video_like(fan, video.as_str()).await?.active {
                    client.toggle_video_like(fan, video.as_str()).await?;
                }
                summary.likes += 1;
            }
        }
    }

    Ok(summary)
}

/// Register `username`, or reuse the account from an earlier seed.
async fn ensure_user(client: &Client<AnyStore>, username: &str) -> Result<User> {
    let new = NewUser {
        username: username.to_string(),
        full_name: format!("Demo {username}"),
        avatar: None,
    };
    match client.register_user(new).await {
        Ok(user) => Ok(user),
        Err(RepoError::UniqueConstraintViolation { .. }) => client
            .find_user_by_username(username)
            .await?
            .with_context(|| format!("{username} is taken but could not be loaded")),
        Err(err) => Err(err.into()),
    }
}
