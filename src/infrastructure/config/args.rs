use super::app_config::LogLevel;
use clap::Parser;
use std::path::PathBuf;

#[derive(Debug, Parser)]
#[command(
    name = "remote-image-loader",
    version,
    about = "Load remote images into display slots with caching",
    long_about = None
)]
pub struct CliArgs {
    /// Image URLs to load, one slot each.
    #[arg(value_name = "URL", required = true)]
    pub urls: Vec<String>,

    /// Configuration file path.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    /// Log file path.
    #[arg(long, value_name = "PATH")]
    pub log_path: Option<PathBuf>,

    /// Log verbosity level.
    #[arg(long, value_enum)]
    pub log_level: Option<LogLevel>,

    /// Per-request timeout in seconds.
    #[arg(long, value_name = "SECS")]
    pub timeout: Option<u64>,

    /// Disable the disk HTTP response cache.
    #[arg(long)]
    pub no_http_cache: bool,

    /// Empty the disk HTTP response cache before loading.
    #[arg(long)]
    pub clear_http_cache: bool,

    /// Maximum number of decoded images kept in memory.
    #[arg(long, value_name = "COUNT")]
    pub max_cached_images: Option<usize>,

    /// Image file shown in every slot until its download finishes.
    #[arg(long, value_name = "PATH")]
    pub placeholder: Option<PathBuf>,

    /// Load every URL this many times to exercise the memory cache.
    #[arg(long, default_value_t = 1)]
    pub passes: usize,
}
