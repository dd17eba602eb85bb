use std::path::PathBuf;

use clap::Parser;

use crate::cmd::Commands;

/// The acting user when `--as` is not given.
pub const CURRENT_USER_ID: &str = "u1";

/// Task workspace with output analytics.
/// Storage defaults to ~/.taskfirst/workspace.json or a path passed via --db.
#[derive(Parser)]
#[command(name = "tf", version, about = "Task workspace and team output analytics")]
pub struct Cli {
    /// Path to the JSON workspace file.
    #[arg(long, global = true, env = "TASKFIRST_DB")]
    pub db: Option<PathBuf>,

    /// Use the in-memory demo workspace; changes are discarded on exit.
    #[arg(long, global = true, env = "TASKFIRST_MOCK")]
    pub mock: bool,

    /// Enable debug logging on stderr.
    #[arg(short, long, global = true)]
    pub verbose: bool,

    /// User id acting as creator and default assignee.
    #[arg(long = "as", global = true, value_name = "USER_ID", default_value = CURRENT_USER_ID)]
    pub acting_user: String,

    #[command(subcommand)]
    pub command: Commands,
}
