use clap::{Args, Parser, Subcommand};
use feed_poster::{config, Database, FeedPoster, FeedSelection, FeedUpdate, FetchConfig, RunOptions};
use std::time::Duration;
use tracing::{info, Level};
use tracing_subscriber::fmt::writer::MakeWriterExt;
use tracing_subscriber::EnvFilter;

/// Cross-post new RSS/Atom entries to Mastodon.
#[derive(Parser)]
#[command(name = "feed-poster", version, about)]
struct Cli {
    /// SQLite database file (created if missing)
    #[arg(long, env = "DATABASE_URL")]
    db: String,

    /// Network timeout for feed and Mastodon requests, in seconds
    #[arg(long, default_value_t = 30)]
    timeout: u64,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// List all feeds
    List,
    /// Add a feed, or update the given fields of an existing one
    Save(SaveArgs),
    /// Process all feeds in the database
    Run(RunArgs),
    /// Process the single feed described by FEED_URL, INSTANCE_URL,
    /// ACCESS_TOKEN, MAX_POST_AGE_DAYS and POST_FORMAT
    Env(RunArgs),
}

#[derive(Args)]
struct SaveArgs {
    /// Feed ID to update; omit to add a new feed
    #[arg(long)]
    feed_id: Option<i64>,
    #[arg(long)]
    feed_url: Option<String>,
    #[arg(long)]
    instance_url: Option<String>,
    #[arg(long)]
    access_token: Option<String>,
    /// Maximum post age in days [default for new feeds: 30]
    #[arg(long)]
    max_age_days: Option<u32>,
    /// Post template using {title}, {link} and {summary} [default: {title}\n\n{link}\n]
    #[arg(long, alias = "toot-format")]
    post_format: Option<String>,
}

#[derive(Args, Clone, Copy)]
struct RunArgs {
    /// Maximum number of posts per feed and cycle, 0 for no limit
    #[arg(long, default_value_t = 0)]
    max_posts: usize,
    /// Record entries as posted without actually posting them
    #[arg(long, alias = "dry-posts")]
    dry_run: bool,
    /// Keep running and poll every N seconds
    #[arg(long, value_name = "SECONDS")]
    interval: Option<u64>,
}

impl RunArgs {
    fn options(&self) -> RunOptions {
        RunOptions {
            max_posts: self.max_posts,
            dry_run: self.dry_run,
        }
    }
}

fn init_tracing() {
    let writer = std::io::stderr
        .with_max_level(Level::WARN)
        .or_else(std::io::stdout);

    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(writer)
        .init();
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();

    let cli = Cli::parse();
    let db = Database::connect(&cli.db).await?;
    let fetch_config = FetchConfig {
        timeout_seconds: cli.timeout,
        ..FetchConfig::default()
    };
    let poster = FeedPoster::new(&db, fetch_config)?;

    match cli.command {
        Command::List => {
            for feed in poster.feed_manager().list_feeds().await? {
                println!(
                    "ID: {}, URL: {}, Instance: {}, Max Age: {} days, Toot Format: {}",
                    feed.id, feed.feed_url, feed.instance_url, feed.max_post_age_days, feed.post_format
                );
            }
        }
        Command::Save(args) => {
            let update = FeedUpdate {
                id: args.feed_id,
                feed_url: args.feed_url,
                instance_url: args.instance_url,
                access_token: args.access_token,
                max_post_age_days: args.max_age_days,
                post_format: args.post_format,
            };
            let feed_id = poster.feed_manager().save_feed(update).await?;
            info!("Saved feed {}", feed_id);
        }
        Command::Run(args) => run(&poster, FeedSelection::Catalog, args).await?,
        Command::Env(args) => {
            let feed = config::feed_from_env()?;
            run(&poster, FeedSelection::Single(feed), args).await?
        }
    }

    Ok(())
}

async fn run(poster: &FeedPoster, feeds: FeedSelection, args: RunArgs) -> anyhow::Result<()> {
    match args.interval {
        Some(seconds) => {
            poster
                .run_forever(&feeds, Duration::from_secs(seconds.max(1)), args.options())
                .await?
        }
        None => {
            poster.run_once(&feeds, args.options()).await?;
        }
    }

    Ok(())
}
