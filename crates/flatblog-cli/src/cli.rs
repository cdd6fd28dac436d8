use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

#[derive(Parser)]
#[command(
    name = "flatblog",
    about = "flatblog: a blog kept in flat files",
    version,
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Data root; overrides `data_root` from the config file
    #[arg(long, global = true)]
    pub root: Option<PathBuf>,

    /// TOML config file (defaults to ./flatblog.toml when present)
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand)]
pub enum Command {
    /// Create, read, list and moderate posts
    Post(PostArgs),
    /// Show how many listing pages exist
    Pages,
    /// Show the persisted view counter of a post
    Stats(StatsArgs),
    /// Add, list and delete comments
    Comment(CommentArgs),
    /// List the days that have posts
    Days,
}

#[derive(Args)]
pub struct PostArgs {
    #[command(subcommand)]
    pub action: PostAction,
}

#[derive(Subcommand)]
pub enum PostAction {
    /// Create a post (unapproved until `post approve`)
    New {
        #[arg(long)]
        title: String,
        #[arg(long, default_value = "")]
        summary: String,
        #[arg(long)]
        body: String,
        #[arg(long)]
        author: String,
    },
    /// Show a post and count a view
    Show {
        #[arg(allow_negative_numbers = true)]
        id: i64,
        /// Refuse unapproved posts, as the public site does
        #[arg(long)]
        public: bool,
    },
    /// Read posts by consecutive id, approved or not, without counting views
    Range {
        #[arg(allow_negative_numbers = true)]
        from: i64,
        /// Number of ids to read
        #[arg(short, long, default_value = "5")]
        count: usize,
    },
    /// List approved posts, newest first
    Recent {
        /// 1-based page number
        #[arg(short, long, default_value = "1")]
        page: usize,
    },
    /// List approved posts of a day (YYYY-MM-DD)
    Day {
        day: String,
        /// Sort by views, most viewed first
        #[arg(long)]
        top: bool,
    },
    /// Approve a post, or revoke its approval
    Approve {
        #[arg(allow_negative_numbers = true)]
        id: i64,
        #[arg(long)]
        revoke: bool,
    },
}

#[derive(Args)]
pub struct StatsArgs {
    #[arg(allow_negative_numbers = true)]
    pub id: i64,
}

#[derive(Args)]
pub struct CommentArgs {
    #[command(subcommand)]
    pub action: CommentAction,
}

#[derive(Subcommand)]
pub enum CommentAction {
    /// Comment on a post
    Add {
        #[arg(allow_negative_numbers = true)]
        post: i64,
        #[arg(long)]
        author: String,
        #[arg(long)]
        content: String,
    },
    /// List the visible comments of a post
    List {
        #[arg(allow_negative_numbers = true)]
        post: i64,
    },
    /// Delete the comment at a position
    Delete {
        #[arg(allow_negative_numbers = true)]
        post: i64,
        position: usize,
    },
}
