use std::path::{Path, PathBuf};

use anyhow::Context;
use colored::Colorize;
use serde::Serialize;

use flatblog_sdk::{Blog, BlogConfig, Comment, NewPost, Page, Post};

use crate::cli::*;

const DEFAULT_CONFIG: &str = "flatblog.toml";

pub async fn run_command(cli: Cli) -> anyhow::Result<()> {
    let config = load_config(cli.config.as_deref(), cli.root)?;
    let blog = Blog::open(config).await.context("opening data root")?;

    let result = dispatch(&blog, cli.command, cli.format);
    // Always stop the background tasks so buffered writes land.
    blog.shutdown().await;
    result
}

fn load_config(path: Option<&Path>, root: Option<PathBuf>) -> anyhow::Result<BlogConfig> {
    let mut config = match path {
        Some(path) => BlogConfig::load(path)?,
        None if Path::new(DEFAULT_CONFIG).is_file() => BlogConfig::load(Path::new(DEFAULT_CONFIG))?,
        None => BlogConfig::default(),
    };
    if let Some(root) = root {
        config.data_root = root;
    }
    Ok(config)
}

fn dispatch(blog: &Blog, command: Command, format: OutputFormat) -> anyhow::Result<()> {
    match command {
        Command::Post(args) => cmd_post(blog, args.action, format),
        Command::Pages => cmd_pages(blog, format),
        Command::Stats(args) => {
            let stats = blog.read_stats(args.id)?;
            emit(format, &stats, || {
                println!("Post {}: {} views", stats.id.to_string().yellow(), stats.views.to_string().bold());
            })
        }
        Command::Comment(args) => cmd_comment(blog, args.action, format),
        Command::Days => {
            let days = blog.days()?;
            emit(format, &days, || {
                if days.is_empty() {
                    println!("No posts yet.");
                }
                for day in &days {
                    println!("{day}");
                }
            })
        }
    }
}

fn cmd_post(blog: &Blog, action: PostAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        PostAction::New { title, summary, body, author } => {
            let id = blog.create_post(NewPost { title, summary, body }, &author)?;
            emit(format, &id, || {
                println!("{} Created post {}", "✓".green().bold(), id.to_string().yellow());
                println!("  Approve it with: flatblog post approve {id}");
            })
        }
        PostAction::Show { id, public } => {
            let post = if public { blog.open_post(id)? } else { blog.read_post(id)? };
            emit(format, &post, || print_post(&post))
        }
        PostAction::Range { from, count } => {
            let posts = blog.get_posts(from, count)?;
            emit(format, &posts, || {
                for post in &posts {
                    print_summary(post, false);
                }
            })
        }
        PostAction::Recent { page } => {
            let posts = blog.list_recent_posts(Page::from_one_based(page))?;
            let pages = blog.page_count();
            emit(format, &posts, || {
                println!("Page {} of {}", page.max(1), pages);
                if posts.is_empty() {
                    println!("No posts.");
                }
                for post in &posts {
                    print_summary(post, false);
                }
            })
        }
        PostAction::Day { day, top } => {
            let posts = if top { blog.top_posts_on_day(&day)? } else { blog.posts_on_day(&day)? };
            emit(format, &posts, || {
                if posts.is_empty() {
                    println!("No posts on {day}.");
                }
                for post in &posts {
                    print_summary(post, top);
                }
            })
        }
        PostAction::Approve { id, revoke } => {
            blog.set_validity(id, !revoke)?;
            let verb = if revoke { "Revoked" } else { "Approved" };
            emit(format, &!revoke, || {
                println!("{} {} post {}", "✓".green().bold(), verb, id.to_string().yellow());
            })
        }
    }
}

fn cmd_pages(blog: &Blog, format: OutputFormat) -> anyhow::Result<()> {
    #[derive(Serialize)]
    struct Pages {
        pages: usize,
        per_page: usize,
        approved: usize,
    }
    let pages = Pages {
        pages: blog.page_count(),
        per_page: blog.config().page_size,
        approved: blog.posts().approved_count(),
    };
    emit(format, &pages, || {
        println!(
            "{} pages of {} ({} approved posts)",
            pages.pages.to_string().bold(),
            pages.per_page,
            pages.approved
        );
    })
}

fn cmd_comment(blog: &Blog, action: CommentAction, format: OutputFormat) -> anyhow::Result<()> {
    match action {
        CommentAction::Add { post, author, content } => {
            blog.submit_comment(post, &author, &content)?;
            emit(format, &post, || {
                println!("{} Comment added to post {}", "✓".green().bold(), post.to_string().yellow());
            })
        }
        CommentAction::List { post } => {
            let comments = blog.list_comments(post)?;
            emit(format, &comments, || {
                for comment in &comments {
                    print_comment(comment);
                }
            })
        }
        CommentAction::Delete { post, position } => {
            blog.delete_comment(post, position)?;
            emit(format, &position, || {
                println!("{} Deleted comment {} of post {}", "✓".green().bold(), position, post.to_string().yellow());
            })
        }
    }
}

/// Print `value` as JSON, or run `text` for human output.
fn emit<T: Serialize>(format: OutputFormat, value: &T, text: impl FnOnce()) -> anyhow::Result<()> {
    match format {
        OutputFormat::Json => println!("{}", serde_json::to_string_pretty(value)?),
        OutputFormat::Text => text(),
    }
    Ok(())
}

fn print_post(post: &Post) {
    let status = if post.approved { "approved".green() } else { "draft".yellow() };
    println!("{}  {}", post.title.bold(), format!("#{}", post.id).dimmed());
    println!("  by {} on {} ({})", post.author.cyan(), post.created.format("%Y-%m-%d %H:%M UTC"), status);
    if !post.summary.is_empty() {
        println!("\n{}", post.summary.italic());
    }
    println!("\n{}", post.body);
}

fn print_summary(post: &Post, with_views: bool) {
    let id = format!("#{}", post.id);
    if with_views {
        println!("{:>6}  {}  {} views", id.yellow(), post.title.bold(), post.views());
    } else {
        println!("{:>6}  {}  {} ({})", id.yellow(), post.title.bold(), post.author.cyan(), post.day());
    }
}

fn print_comment(comment: &Comment) {
    println!(
        "[{}] {} {}: {}",
        comment.position,
        comment.author.cyan(),
        comment.created.format("%Y-%m-%d %H:%M").to_string().dimmed(),
        comment.content
    );
}
