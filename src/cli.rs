use std::{net::SocketAddr, path::PathBuf};

use clap::Parser;

use crate::logging::LogLevel;

macro_rules! arg_env {
    ($v:literal) => {
        concat!("TUBEFETCH_", $v)
    };
}

/// Web front-end around `yt-dlp` to list and download the streams of web videos.
///
/// Every option can also be set in the configuration file or with
/// a `TUBEFETCH_<OPTION>` environment variable.
/// Command-line values take precedence.
#[derive(Parser, Debug, Default)]
#[command(version, about)]
pub struct Args {
    /// The path to a TOML configuration file
    #[arg(long, short, env=arg_env!("CONFIG"))]
    pub config: Option<PathBuf>,

    /// The address to listen on, e.g. 127.0.0.1:5000
    #[arg(long, env=arg_env!("LISTEN"))]
    pub listen: Option<SocketAddr>,

    /// The path to the `yt-dlp` (or `youtube-dl`) program.
    /// Searched in the PATH when not set
    #[arg(long, env=arg_env!("PROGRAM"))]
    pub program: Option<PathBuf>,

    /// The directory in which per-request temporary directories are created.
    /// Defaults to the system temporary directory
    #[arg(long, env=arg_env!("TEMP_DIR"))]
    pub temp_dir: Option<PathBuf>,

    /// The maximum level of the logs to print
    #[arg(long, value_enum, env=arg_env!("LOG_LEVEL"))]
    pub log_level: Option<LogLevel>,

    /// A file to also append the logs to
    #[arg(long, env=arg_env!("LOG_FILE"))]
    pub log_file: Option<PathBuf>,
}
