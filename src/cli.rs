use clap::Parser;
use std::path::PathBuf;

#[derive(Parser, Debug, Clone)]
#[command(name = "orchard-claimer")]
#[command(version = "0.1.0")]
#[command(
    about = "Find unclaimed MerkleOrchard distributions and build claimDistributions calldata",
    long_about = None
)]
pub struct Cli {
    /// Account to claim for
    #[arg(short = 'a', long)]
    pub account: String,

    /// Chain ID
    #[arg(short = 'c', long = "chainid")]
    pub chain_id: u64,

    /// Output file for the pending claims found
    #[arg(short = 'o', long)]
    pub output: PathBuf,

    /// Config directory
    #[arg(long, env = "ORCHARD_CONFIG_DIR", default_value = "config")]
    pub config_dir: PathBuf,
}
