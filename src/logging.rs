use std::{fs::OpenOptions, path::Path, sync::Mutex};

use miette::{IntoDiagnostic, Result, WrapErr};
use owo_colors::OwoColorize;
use serde::Deserialize;
use time::{
    format_description::FormatItem, macros::format_description, OffsetDateTime, UtcOffset,
};
use tracing::{Event, Level, Subscriber};
use tracing_subscriber::{
    filter::LevelFilter,
    fmt::{self, format, FmtContext, FormatEvent, FormatFields},
    layer::SubscriberExt,
    registry::LookupSpan,
    util::SubscriberInitExt,
};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, clap::ValueEnum)]
#[serde(rename_all = "lowercase")]
pub enum LogLevel {
    Error,
    Warn,
    Info,
    Debug,
    Trace,
}

impl From<LogLevel> for Level {
    fn from(level: LogLevel) -> Self {
        match level {
            LogLevel::Error => Level::ERROR,
            LogLevel::Warn => Level::WARN,
            LogLevel::Info => Level::INFO,
            LogLevel::Debug => Level::DEBUG,
            LogLevel::Trace => Level::TRACE,
        }
    }
}

/// Initialize the logging system.
///
/// Logs are printed on the terminal and, if `log_file` is given, also appended to that file.
///
/// Must be called before any other thread is spawned,
/// as the local time offset cannot be read afterwards on some platforms.
pub fn init_logging(level: Level, log_file: Option<&Path>) -> Result<()> {
    // Fall back to UTC rather than refusing to start
    let local_offset = UtcOffset::current_local_offset().unwrap_or(UtcOffset::UTC);

    let file_layer = match log_file {
        Some(path) => {
            let file = OpenOptions::new()
                .create(true)
                .append(true)
                .open(path)
                .into_diagnostic()
                .wrap_err_with(|| format!("Could not open log file {}", path.display()))?;

            Some(
                fmt::layer()
                    .event_format(MyPrettyLogger::new(local_offset))
                    .with_ansi(false)
                    .with_writer(Mutex::new(file)),
            )
        }
        None => None,
    };

    tracing_subscriber::registry()
        .with(LevelFilter::from_level(level))
        .with(fmt::layer().event_format(MyPrettyLogger::new(local_offset)))
        .with(file_layer)
        .try_init()
        .into_diagnostic()
        .wrap_err("Setting default subscriber failed")
}

/// The level, right-aligned on 5 characters.
/// Padded before coloring, escape codes would count in the width otherwise.
fn level_column(level: &Level, ansi: bool) -> String {
    let padded = format!("{:>5}", level.as_str());
    if !ansi {
        return padded;
    }

    match *level {
        Level::ERROR => padded.red().to_string(),
        Level::WARN => padded.yellow().to_string(),
        Level::DEBUG => padded.blue().to_string(),
        Level::TRACE => padded.purple().to_string(),
        _ => padded.green().to_string(),
    }
}

/// Custom logger as the default ones are not as customizable as I want
struct MyPrettyLogger {
    offset: UtcOffset,
    time_format: &'static [FormatItem<'static>],
}

impl MyPrettyLogger {
    fn new(offset: UtcOffset) -> Self {
        Self {
            offset,
            time_format: format_description!("[hour]:[minute]:[second]"),
        }
    }
}

impl<S, N> FormatEvent<S, N> for MyPrettyLogger
where
    S: Subscriber + for<'a> LookupSpan<'a>,
    N: for<'a> FormatFields<'a> + 'static,
{
    fn format_event(
        &self,
        ctx: &FmtContext<'_, S, N>,
        mut writer: format::Writer<'_>,
        event: &Event<'_>,
    ) -> std::fmt::Result {
        let metadata = event.metadata();

        let now = OffsetDateTime::now_utc().to_offset(self.offset).time();
        let now = now.format(self.time_format).map_err(|_| std::fmt::Error)?;
        let thread = std::thread::current();
        let thread_name = thread.name().unwrap_or("<unnamed>");
        // Skip the crate name, keep the module path
        let target = metadata
            .target()
            .split_once("::")
            .map_or(metadata.target(), |(_, module)| module);

        let level = level_column(metadata.level(), writer.has_ansi_escapes());
        if writer.has_ansi_escapes() {
            write!(
                &mut writer,
                "{} {} {} {} ",
                now,
                level,
                thread_name.yellow(),
                target.dimmed(),
            )?;
        } else {
            write!(&mut writer, "{} {} {} {} ", now, level, thread_name, target)?;
        }

        // Show the request the event belongs to, if any
        if let Some(scope) = ctx.event_scope() {
            for span in scope.from_root() {
                write!(writer, "{}: ", span.name())?;
            }
        }

        ctx.field_format().format_fields(writer.by_ref(), event)?;

        writeln!(writer)
    }
}
