use anyhow::Result;
use clap::Parser;
use colored::Colorize;
use tracing::error;
use tracing_subscriber::{fmt, EnvFilter};

mod cli;

fn main() -> Result<()> {
    // 初始化日志系统，默认只输出警告
    fmt()
        .with_target(false)
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("warn")),
        )
        .init();

    // 解析命令行参数
    let cli = cli::Cli::parse();

    println!("{} {}", "Rust-Press".bright_cyan(), env!("CARGO_PKG_VERSION").bright_green());
    println!();

    // 执行命令
    if let Err(e) = cli::execute(cli) {
        error!("Error: {}", e);

        // 打印错误链
        for cause in e.chain().skip(1) {
            error!("Caused by: {}", cause);
        }

        std::process::exit(1);
    }

    Ok(())
}
