use anyhow::{anyhow, Result};
use clap::{Args, Parser, Subcommand};
use colored::Colorize;
use serde_yaml::Value;
use std::path::PathBuf;
use tracing::info;

use rust_press::{Engine, ItemId, Site};

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// 指定站点目录
    #[arg(short, long, default_value = ".")]
    pub path: PathBuf,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// 列出相关文章
    Related(RelatedArgs),

    /// 列出热门文章
    Popular(ListArgs),

    /// 列出最新文章
    Recent(ListArgs),

    /// 显示文章的阅读时间、阅读数和摘要
    Info(ItemArgs),

    /// 记录一次文章详情页阅读
    View(ItemArgs),

    /// 读取配置项
    Config(ConfigArgs),

    /// 列出分类和标签
    Terms,
}

#[derive(Args)]
pub struct RelatedArgs {
    /// 文章 id
    pub id: u64,

    /// 返回数量，默认读取 content.related_posts_count
    #[arg(short = 'n', long)]
    pub limit: Option<i64>,
}

#[derive(Args)]
pub struct ListArgs {
    /// 返回数量，默认读取站点配置
    #[arg(short = 'n', long)]
    pub limit: Option<i64>,
}

#[derive(Args)]
pub struct ItemArgs {
    /// 文章 id
    pub id: u64,
}

#[derive(Args)]
pub struct ConfigArgs {
    /// 点号路径，例如 site.description
    pub key: String,
}

/// 执行命令
pub fn execute(cli: Cli) -> Result<()> {
    let site = Site::load(&cli.path)?;
    let engine = site.engine();

    match cli.command {
        Commands::Related(args) => {
            let id = ItemId(args.id);
            let ids = match args.limit {
                Some(limit) => engine.related(id, limit)?,
                None => engine.related_default(id)?,
            };
            print_list(&engine, &format!("Related to #{}", id), &ids)?;
        }
        Commands::Popular(args) => {
            let ids = match args.limit {
                Some(limit) => engine.popular(limit)?,
                None => engine.popular_default()?,
            };
            print_list(&engine, "Popular Articles", &ids)?;
        }
        Commands::Recent(args) => {
            let ids = match args.limit {
                Some(limit) => engine.recent(limit)?,
                None => engine.recent_default()?,
            };
            print_list(&engine, "Latest Posts", &ids)?;
        }
        Commands::Info(args) => {
            let id = ItemId(args.id);
            let item = engine
                .item(id)?
                .ok_or_else(|| anyhow!("文章不存在: {}", id))?;

            println!("{}", item.title.bright_cyan());
            println!("  {} {}", "date:".bright_white(), item.date.format("%Y-%m-%d"));
            println!("  {} {}", "author:".bright_white(), item.author);
            println!("  {} {} min read", "reading:".bright_white(), engine.estimated_reading_time(id)?);
            println!("  {} {}", "views:".bright_white(), engine.format_view_count(id)?);
            println!("  {} {}", "likes:".bright_white(), engine.like_count(id)?);
            println!("  {} {}", "excerpt:".bright_white(), engine.excerpt(id)?);
        }
        Commands::View(args) => {
            let id = ItemId(args.id);
            match site.record_view(id)? {
                Some(count) => {
                    info!("已保存阅读数到 {}", site.views_path().display());
                    println!("{} #{} -> {}", "Viewed".green(), id, count);
                }
                None => println!("{} #{} (unknown or unpublished)", "Not counted".yellow(), id),
            }
        }
        Commands::Config(args) => {
            let value = engine.config_get(&args.key, Value::Null);
            if value.is_null() {
                println!("{}", "(not set)".yellow());
            } else {
                print!("{}", serde_yaml::to_string(&value)?);
            }
        }
        Commands::Terms => {
            println!("{}", "Categories".bright_cyan());
            for term in engine.categories()? {
                println!("  {} ({}) [{}]", term.name, term.count, term.id);
            }
            println!("{}", "Tags".bright_cyan());
            for term in engine.tags()? {
                println!("  {} ({}) [{}]", term.name, term.count, term.id);
            }
        }
    }

    Ok(())
}

fn print_list(engine: &Engine, heading: &str, ids: &[ItemId]) -> Result<()> {
    println!("{}", heading.bright_cyan());
    if ids.is_empty() {
        println!("  {}", "(none)".yellow());
        return Ok(());
    }

    for id in ids {
        if let Some(item) = engine.item(*id)? {
            println!(
                "  #{} {} {}",
                id,
                item.title.bright_white(),
                format!("({} views)", engine.format_view_count(*id)?).bright_black()
            );
        }
    }
    Ok(())
}
