use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "nb-images")]
#[command(about = "Move base64 images embedded in notebooks to a GitHub repository and link them by URL")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Upload embedded images and rewrite the notebooks in place
    Upload(UploadArgs),

    /// Report embedded images without uploading or modifying anything
    Scan(ScanArgs),
}

#[derive(Args)]
pub struct ScanOptions {
    /// Root directory to search for notebooks
    #[arg(value_name = "ROOT", default_value = ".")]
    pub root: PathBuf,

    /// Minimum base64 run length treated as an image
    #[arg(long, value_name = "CHARS", default_value = "200")]
    pub min_length: usize,

    /// Notebook file extension
    #[arg(long, default_value = "ipynb")]
    pub extension: String,

    /// Directory name skipped at any depth
    #[arg(long, value_name = "NAME", default_value = ".ipynb_checkpoints")]
    pub exclude_dir: String,
}

#[derive(Args)]
pub struct UploadArgs {
    #[command(flatten)]
    pub scan: ScanOptions,

    /// Repository owner receiving the images
    #[arg(long, required = true)]
    pub owner: String,

    /// Repository name receiving the images
    #[arg(long, required = true)]
    pub repo: String,

    /// Target branch
    #[arg(long, default_value = "main")]
    pub branch: String,

    /// Folder inside the repository for uploaded images
    #[arg(long, value_name = "PATH", default_value = "notebook_images")]
    pub image_folder: String,

    /// Base URL of the GitHub API
    #[arg(long, value_name = "URL", default_value = "https://api.github.com")]
    pub api_base: String,

    /// Environment variable holding the API token
    #[arg(long, value_name = "VAR", default_value = "GITHUB_TOKEN")]
    pub token_env: String,

    /// Pause after every successful upload, in milliseconds
    #[arg(long, value_name = "MS", default_value = "500")]
    pub throttle_ms: u64,
}

#[derive(Args)]
pub struct ScanArgs {
    #[command(flatten)]
    pub scan: ScanOptions,

    /// Write the scan report to a JSON file
    #[arg(long, value_name = "FILE")]
    pub json_output: Option<PathBuf>,
}
