use anyhow::Result;
use clap::Parser;

mod cli;
mod config;
mod error;
mod prompt;
mod screen;
mod server;
mod store;

use cli::Cli;

fn main() -> Result<()> {
    // CLI引数パース
    let cli = Cli::parse();

    // ログ初期化
    let default_level = if cli.verbose { "debug" } else { "warn" };
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new(default_level)),
        )
        .with_writer(std::io::stderr)
        .init();

    // 実行
    cli.execute()?;

    Ok(())
}
