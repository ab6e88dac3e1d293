use anyhow::Result;
use clap::Parser;
use two_party_sharing_with_beaver::cli_utils::Args;
use two_party_sharing_with_beaver::runner;

fn main() -> Result<()> {
    let args = Args::parse();
    runner::run(args)
}
