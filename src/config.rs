use std::{
    net::{Ipv4Addr, SocketAddr},
    path::PathBuf,
};

use ::config::{Config, Environment, File, FileFormat};
use miette::{IntoDiagnostic, Result, WrapErr};
use serde::Deserialize;

use crate::{cli::Args, logging::LogLevel};

/// Default maximum size of a request body (64 MB)
pub const DEFAULT_MAX_BODY_BYTES: usize = 64 * 1024 * 1024;

/// Default number of description characters shown before truncating it
pub const DEFAULT_DESCRIPTION_PREVIEW: usize = 300;

/// Runtime settings, merged from defaults, the configuration file,
/// `TUBEFETCH_*` environment variables and the command line, in that order.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct Settings {
    /// Address the HTTP server listens on
    pub listen: SocketAddr,
    /// Explicit extractor program, searched in the PATH otherwise
    pub program: Option<PathBuf>,
    /// Parent of the per-request download directories
    pub temp_dir: Option<PathBuf>,
    pub max_body_bytes: usize,
    pub description_preview: usize,
    pub log_level: LogLevel,
    /// File the logs are also appended to
    pub log_file: Option<PathBuf>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            listen: SocketAddr::from((Ipv4Addr::LOCALHOST, 5000)),
            program: None,
            temp_dir: None,
            max_body_bytes: DEFAULT_MAX_BODY_BYTES,
            description_preview: DEFAULT_DESCRIPTION_PREVIEW,
            log_level: LogLevel::Info,
            log_file: None,
        }
    }
}

impl Settings {
    pub fn load(args: &Args) -> Result<Self> {
        let mut builder = Config::builder();
        if let Some(path) = &args.config {
            builder = builder.add_source(File::from(path.as_path()).format(FileFormat::Toml));
        }

        let mut settings: Settings = builder
            .add_source(Environment::with_prefix("TUBEFETCH").try_parsing(true))
            .build()
            .into_diagnostic()
            .wrap_err("Could not read configuration")?
            .try_deserialize()
            .into_diagnostic()
            .wrap_err("Invalid configuration")?;

        settings.apply_args(args);
        Ok(settings)
    }

    fn apply_args(&mut self, args: &Args) {
        if let Some(listen) = args.listen {
            self.listen = listen;
        }
        if let Some(program) = &args.program {
            self.program = Some(program.clone());
        }
        if let Some(temp_dir) = &args.temp_dir {
            self.temp_dir = Some(temp_dir.clone());
        }
        if let Some(log_level) = args.log_level {
            self.log_level = log_level;
        }
        if let Some(log_file) = &args.log_file {
            self.log_file = Some(log_file.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use indoc::indoc;

    use super::*;

    #[test]
    fn file_values_override_defaults() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("tubefetch.toml");
        std::fs::write(
            &path,
            indoc! {r#"
                listen = "0.0.0.0:8080"
                program = "/opt/yt-dlp"
                description_preview = 120
                log_level = "debug"
                log_file = "/var/log/tubefetch.log"
            "#},
        )
        .unwrap();

        let args = Args {
            config: Some(path),
            ..Args::default()
        };
        let settings = Settings::load(&args).unwrap();

        assert_eq!(settings.listen, "0.0.0.0:8080".parse().unwrap());
        assert_eq!(settings.program, Some(PathBuf::from("/opt/yt-dlp")));
        assert_eq!(settings.description_preview, 120);
        assert_eq!(settings.log_level, LogLevel::Debug);
        assert_eq!(settings.log_file, Some(PathBuf::from("/var/log/tubefetch.log")));
        assert_eq!(settings.max_body_bytes, DEFAULT_MAX_BODY_BYTES);
        assert_eq!(settings.temp_dir, None);
    }

    #[test]
    fn command_line_wins() {
        let mut settings = Settings::default();
        let args = Args {
            listen: Some("127.0.0.1:9000".parse().unwrap()),
            log_level: Some(LogLevel::Trace),
            log_file: Some(PathBuf::from("tubefetch.log")),
            ..Args::default()
        };

        settings.apply_args(&args);
        assert_eq!(settings.listen.port(), 9000);
        assert_eq!(settings.log_level, LogLevel::Trace);
        assert_eq!(settings.log_file, Some(PathBuf::from("tubefetch.log")));
    }

    #[test]
    fn missing_file_is_an_error() {
        let args = Args {
            config: Some(PathBuf::from("/nonexistent/tubefetch.toml")),
            ..Args::default()
        };
        assert!(Settings::load(&args).is_err());
    }
}
