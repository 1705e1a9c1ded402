//! `adya`: the command-line surface around `adya-cli`'s generator and
//! `adya-core`'s checker.

use adya_cli::command::{self, Command};
use adya_cli::config::CliConfig;
use adya_cli::trace;
use anyhow::Result;
use clap::Parser;
use human_panic::setup_panic;
use log::info;

#[derive(Debug, Parser)]
#[command(author, version, about = "Black-box transactional isolation checker")]
pub struct Cli {
    /// Configuration file path. Falls back to the platform config
    /// directory, then to built-in defaults.
    #[clap(short = 'c', long = "config")]
    config: Option<String>,

    #[clap(short = 'l', long, default_value = "info")]
    log_level: String,

    #[clap(subcommand)]
    cmd: Command,
}

fn main() -> Result<()> {
    setup_panic!();

    let cli = Cli::parse();
    let cfg = CliConfig::load(cli.config.as_deref()).unwrap_or_default();

    let _guards = trace::init_logging(&cfg.log_dir(), &cli.log_level).ok();
    info!("adya starting: {:?}", cli.cmd);

    command::run(cli.cmd, &cfg)
}
