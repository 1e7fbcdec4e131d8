use anyhow::Context;
use clap::Parser;
use pv_report_sync::cli::{run, Cli};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    run(cli).context("synchronization run failed")
}
