mod audit;
mod bic;
mod engine;
mod feeds;
mod filespec;
mod matcher;
mod merge;
mod provider;
mod registry;
mod sidetable;
mod slug;
mod store;
mod tables;
#[cfg(test)]
mod testutil;

use anyhow::Result;
use clap::Parser;

#[derive(Debug, Parser)]
#[command(name = "providermerge", about = "Resolve aggregator feeds into the provider registry.")]
struct Command {
    #[command(subcommand)]
    subcmd: SubCommand,
}

#[derive(Debug, clap::Subcommand)]
enum SubCommand {
    Resolve(engine::cmd::ResolveCommand),
    Migrate(engine::cmd::MigrateCommand),
    Check(audit::CheckCommand),
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();

    let cmd = Command::parse();
    use SubCommand::*;
    match &cmd.subcmd {
        Resolve(c) => c.run(),
        Migrate(c) => c.run(),
        Check(c) => c.run(),
    }
}
