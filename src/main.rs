use clap::Parser;
use semantic_query_cache::cli::{self, Cli, Command};

fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    match cli.command {
        Command::Retrieve(args) => cli::retrieve::run(args),
        Command::Replay(args) => cli::replay::run(args),
    }
}
