use std::path::PathBuf;

use clap::{Args, Parser, Subcommand, ValueEnum};

#[derive(Parser, Debug)]
#[command(
    name = "detective-dashboard",
    version,
    about = "Browse detective-story datasets and their AI-generated annotations"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Serve(ServeArgs),
    Stats(StatsArgs),
    Inventory(InventoryArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct ServeArgs {
    #[arg(long, env = "DASHBOARD_DATA_ROOT", default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long, env = "DASHBOARD_ANNOTATIONS", default_value = "user_annotations.json")]
    pub annotations_path: PathBuf,

    #[arg(long, default_value = "127.0.0.1")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 3001)]
    pub port: u16,

    /// Dataset served by the non-namespaced `/api/...` routes.
    #[arg(long, default_value = "bmds")]
    pub legacy_dataset: String,
}

#[derive(Copy, Clone, Debug, Eq, PartialEq, ValueEnum)]
pub enum StatsFormat {
    Json,
    Csv,
}

#[derive(Args, Debug, Clone)]
pub struct StatsArgs {
    #[arg(long, env = "DASHBOARD_DATA_ROOT", default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long, env = "DASHBOARD_ANNOTATIONS", default_value = "user_annotations.json")]
    pub annotations_path: PathBuf,

    #[arg(long, default_value = "bmds")]
    pub dataset: String,

    #[arg(long, value_enum, default_value_t = StatsFormat::Json)]
    pub format: StatsFormat,

    /// Write to this file instead of stdout.
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct InventoryArgs {
    #[arg(long, env = "DASHBOARD_DATA_ROOT", default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long)]
    pub manifest_path: Option<PathBuf>,

    /// Restrict the scan to these dataset keys (repeatable).
    #[arg(long = "dataset")]
    pub datasets: Vec<String>,

    #[arg(long, default_value_t = false)]
    pub dry_run: bool,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long, env = "DASHBOARD_DATA_ROOT", default_value = "data")]
    pub data_root: PathBuf,

    #[arg(long, env = "DASHBOARD_ANNOTATIONS", default_value = "user_annotations.json")]
    pub annotations_path: PathBuf,
}
