use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};
use rtsl_types::Identity;

#[derive(Parser, Debug)]
#[command(
    name = "rtsl",
    about = "Runtime save/load: inspect, verify and demo asset-library shards",
    version
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,

    /// Root directory of the shard store
    #[arg(long, global = true, default_value = ".")]
    pub root: PathBuf,

    /// TOML configuration file
    #[arg(long, global = true)]
    pub config: Option<PathBuf>,

    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[arg(long, global = true, value_enum, default_value = "text")]
    pub format: OutputFormat,
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    Text,
    Json,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// List shards with ordinal, record count and identity range
    Ls(LsArgs),
    /// Print the records of one shard
    Show(ShowArgs),
    /// Check that every reference resolves and every type is registered
    Verify(VerifyArgs),
    /// Build a sample scene on top of the built-ins and save both
    Demo(DemoArgs),
    /// Materialize roots from shards into a fresh world
    Load(LoadArgs),
}

#[derive(Args, Debug)]
pub struct LsArgs {
    /// Folder to list (default: everything)
    pub folder: Option<String>,
}

#[derive(Args, Debug)]
pub struct ShowArgs {
    /// Shard key, `folder/name`
    pub key: String,
}

#[derive(Args, Debug)]
pub struct VerifyArgs {
    /// Shard keys (default: every shard in the store)
    pub keys: Vec<String>,
}

#[derive(Args, Debug)]
pub struct DemoArgs {
    /// Destination folder of the scene
    #[arg(long, default_value = "Scenes/Demo")]
    pub scene: String,
    /// Number of crate objects in the scene
    #[arg(long, default_value_t = 8)]
    pub objects: usize,
}

#[derive(Args, Debug)]
pub struct LoadArgs {
    /// Shard keys making up the set to load from
    #[arg(required = true)]
    pub keys: Vec<String>,
    /// Root identity to materialize (`ordinal:local` or raw integer)
    #[arg(long = "identity", required = true)]
    pub identities: Vec<Identity>,
}
