use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(
    name = "dbdump",
    author,
    version,
    about = "Dump MySQL/MariaDB databases, keeping schema but skipping data from noisy tables"
)]
pub struct Cli {
    /// Database host
    #[arg(short = 'H', long, global = true)]
    pub host: Option<String>,

    /// Database port
    #[arg(short = 'P', long, global = true)]
    pub port: Option<u16>,

    /// Database user
    #[arg(short = 'u', long, global = true)]
    pub user: Option<String>,

    /// Database password
    #[arg(short = 'p', long, env = "MYSQL_PWD", hide_env_values = true, global = true)]
    pub password: Option<String>,

    /// Database name
    #[arg(short = 'd', long, global = true)]
    pub database: Option<String>,

    /// Saved connection profile from profiles.toml
    #[arg(long, global = true)]
    pub profile: Option<String>,

    /// Show debug logging
    #[arg(short = 'v', long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
    /// Dump the database, skipping data from excluded tables
    Dump(DumpArgs),
    /// List all tables with their sizes and row counts
    List,
    /// Inspect configuration and saved profiles
    #[command(subcommand)]
    Config(ConfigCommand),
}

#[derive(Subcommand, Debug)]
pub enum ConfigCommand {
    /// Show every configuration layer and the merged exclusions
    Show(ExcludeArgs),
    /// List saved connection profiles
    List,
}

/// Flags that contribute exclusion rules.
#[derive(Args, Debug, Clone, Default)]
pub struct ExcludeArgs {
    /// Project config file (defaults to ./.dbdump.toml when present)
    #[arg(short = 'c', long)]
    pub config: Option<PathBuf>,

    /// Skip data for this table (repeatable)
    #[arg(long = "exclude", value_name = "TABLE")]
    pub exclude: Vec<String>,

    /// Skip data for tables matching this glob (repeatable)
    #[arg(long = "exclude-pattern", value_name = "GLOB")]
    pub exclude_pattern: Vec<String>,

    /// Do not apply the built-in noisy-table list
    #[arg(long)]
    pub no_defaults: bool,
}

#[derive(Args, Debug)]
pub struct DumpArgs {
    #[command(flatten)]
    pub excludes: ExcludeArgs,

    /// Output file (default: {database}_{timestamp}.sql)
    #[arg(short = 'o', long)]
    pub output: Option<PathBuf>,

    /// Show what would be dumped without dumping
    #[arg(long)]
    pub dry_run: bool,
}
