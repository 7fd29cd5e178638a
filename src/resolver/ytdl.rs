use std::{
    ffi::{OsStr, OsString},
    path::{Path, PathBuf},
    process::{Command, Output},
};

use miette::{miette, IntoDiagnostic, WrapErr};
use tracing::{debug, info, trace};

use super::{
    command::{
        assert_success_command, last_stderr_line, run_command, run_command_lines, Capture,
        YTDL_DEFAULT_ARGS, YT_DL, YT_DLP,
    },
    formats::RawVideo,
    MediaResolver,
};
use crate::{
    result::{bail, Error, Result},
    types::{StreamDescriptor, StreamKind, VideoInfo},
};

/// Output template of downloaded files, relative to the request directory.
/// The user-facing name is computed separately.
const OUTPUT_TEMPLATE: &str = "%(id)s.%(ext)s";

/// Which extractor the program is, as their options differ
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Flavor {
    YtDlp,
    YoutubeDl,
}

impl Flavor {
    /// Guess the flavor of an explicitly configured program from its file name
    fn from_program(program: &Path) -> Self {
        match program.file_stem().and_then(OsStr::to_str) {
            Some(YT_DL) => Self::YoutubeDl,
            _ => Self::YtDlp,
        }
    }
}

/// Interface for the [yt-dlp](https://github.com/yt-dlp/yt-dlp) program,
/// or its ancestor [youtube-dl](https://github.com/ytdl-org/youtube-dl)
#[derive(Debug)]
pub struct Ytdl {
    program: OsString,
    flavor: Flavor,
}

impl Ytdl {
    /// Verify that the given program, or else the `yt-dlp` or `youtube-dl` binaries, are reachable
    pub fn new(program: Option<&Path>) -> Result<Self> {
        if let Some(program) = program {
            return assert_success_command(program.as_os_str(), |cmd| cmd.arg("--version"))
                .map(|()| Self {
                    program: program.as_os_str().to_owned(),
                    flavor: Flavor::from_program(program),
                })
                .map_err(|err| {
                    err.wrap_err_with(|| format!("{} is not usable", program.display()))
                });
        }

        for (candidate, flavor) in [(YT_DLP, Flavor::YtDlp), (YT_DL, Flavor::YoutubeDl)] {
            if assert_success_command(OsStr::new(candidate), |cmd| cmd.arg("--version")).is_ok() {
                info!("Using {candidate} as media resolver");
                return Ok(Self {
                    program: candidate.into(),
                    flavor,
                });
            }
        }

        bail("Neither yt-dlp nor youtube-dl found")
    }

    pub fn flavor(&self) -> Flavor {
        self.flavor
    }

    /// Run the command and check if it failed with saying the stream is unavailable.
    /// In that case, return [`Error::UnavailableStream`].
    /// If the extractor does not recognize the URL, return [`Error::InvalidUrl`].
    ///
    /// In other cases, return the output handle.
    pub fn run_check_availability<F>(&self, f: F, capture: Capture) -> Result<Output>
    where
        F: FnOnce(&mut Command) -> &mut Command,
    {
        let res = run_command(&self.program, f, capture | Capture::STDERR)?;
        check_availability(res)
    }

    /// Arguments of a download of `stream` into `output`, the URL excepted
    fn download_args(&self, stream: &StreamDescriptor, output: &Path) -> Vec<OsString> {
        let (selector, merge_format) = format_selector(stream);

        let mut args: Vec<OsString> = YTDL_DEFAULT_ARGS.into_iter().map(OsString::from).collect();
        // Or else fails when file already exists, even an empty one
        args.push("--no-continue".into());
        args.push("--newline".into());
        args.push("-f".into());
        args.push(selector.into());
        args.push("-o".into());
        args.push(output.as_os_str().to_owned());

        // Only yt-dlp can tell where the file ended up, after merging
        if self.flavor == Flavor::YtDlp {
            args.extend(["--progress", "--print", "after_move:filepath"].map(OsString::from));
        }

        if let Some(format) = merge_format {
            args.push("--merge-output-format".into());
            args.push(format.into());
        }

        args
    }
}

fn check_availability(res: Output) -> Result<Output> {
    let stderr = String::from_utf8_lossy(&res.stderr);
    match classify_stderr(&stderr) {
        Some(err) => Err(err),
        None => Ok(res),
    }
}

/// Percentage of a `[download]  42.3% of ...` progress line
fn progress_percent(line: &str) -> Option<f64> {
    let rest = line.strip_prefix("[download]")?.trim_start();
    let (percent, _) = rest.split_once('%')?;
    percent.parse().ok()
}

/// Logs download progress by steps of 10%
#[derive(Debug, Default)]
struct ProgressLog {
    last_step: Option<u8>,
}

impl ProgressLog {
    fn observe(&mut self, stream_id: &str, line: &str) {
        let Some(percent) = progress_percent(line) else {
            trace!("{line}");
            return;
        };

        let step = (percent / 10.0).clamp(0.0, 10.0) as u8;
        if self.last_step.map_or(true, |last| step > last) {
            self.last_step = Some(step);
            info!("Stream {stream_id} download progress: {percent:.1}%");
        }
    }
}

/// Find the `ERROR:` lines of the extractor that map to a typed error
fn classify_stderr(stderr: &str) -> Option<Error> {
    stderr
        .lines()
        .filter(|line| line.starts_with("ERROR:"))
        .map(str::to_lowercase)
        .find_map(|line| {
            if line.contains("unavailable") || line.contains("private video") {
                Some(Error::UnavailableStream)
            } else if line.contains("unsupported url") || line.contains("is not a valid url") {
                Some(Error::InvalidUrl)
            } else {
                None
            }
        })
}

/// Failure of a command that did run, reported with its last stderr line
fn unsuccessful(action: &str, res: &Output) -> Error {
    let reason = last_stderr_line(res).unwrap_or_else(|| res.status.to_string());
    Error::Miette(miette!("{action}: {reason}"))
}

/// The `-f` selector and the optional `--merge-output-format` for the stream.
///
/// Video streams without their own audio track are merged with the best
/// audio stream that fits the video container.
fn format_selector(stream: &StreamDescriptor) -> (String, Option<&'static str>) {
    let id = &stream.id;
    if stream.kind == StreamKind::Audio || stream.has_audio {
        return (id.clone(), None);
    }

    let selector = match stream.container.companion_audio() {
        Some(ext) => format!("{id}+bestaudio[ext={ext}]/{id}+bestaudio"),
        None => format!("{id}+bestaudio"),
    };
    (selector, stream.container.merge_format())
}

/// The file path printed by `--print after_move:filepath`
fn printed_path(stdout: &[u8]) -> Option<PathBuf> {
    String::from_utf8_lossy(stdout)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('['))
        .last()
        .map(PathBuf::from)
}

/// Locate the downloaded file, preferring the printed path and otherwise
/// taking the only regular file left in the directory
fn find_downloaded_file(out_dir: &Path, printed: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = printed.filter(|p| p.is_file()) {
        return Ok(path);
    }

    let mut files = out_dir
        .read_dir()
        .into_diagnostic()
        .wrap_err("Could not read download directory")?
        .filter_map(|entry| entry.ok().map(|e| e.path()))
        .filter(|path| path.is_file() && path.extension().is_some_and(|ext| ext != "part"));

    match (files.next(), files.next()) {
        (Some(path), None) => Ok(path),
        (None, _) => bail("The extractor did not produce any file"),
        (Some(_), Some(_)) => bail("The extractor produced more than one file"),
    }
}

impl MediaResolver for Ytdl {
    fn video_info(&self, url: &str) -> Result<VideoInfo> {
        let res = self.run_check_availability(
            |cmd| {
                cmd.arg("-J")
                    .args(YTDL_DEFAULT_ARGS)
                    .arg("--no-progress")
                    .arg("--")
                    .arg(url)
            },
            Capture::STDOUT,
        )?;
        if !res.status.success() {
            return Err(unsuccessful("Could not get video information", &res));
        }

        let raw: RawVideo = serde_json::from_slice(&res.stdout)
            .into_diagnostic()
            .wrap_err("Could not parse json")?;
        debug!("{} formats found for video {}", raw.formats.len(), raw.id);

        Ok(raw.into_video_info())
    }

    fn download(&self, url: &str, stream: &StreamDescriptor, out_dir: &Path) -> Result<PathBuf> {
        let args = self.download_args(stream, &out_dir.join(OUTPUT_TEMPLATE));

        info!("Downloading stream {} of {url}", stream.id);
        let mut progress = ProgressLog::default();
        let res = run_command_lines(
            &self.program,
            |cmd| cmd.args(&args).arg("--").arg(url),
            |line| progress.observe(&stream.id, line),
        )
        .and_then(check_availability)?;
        if !res.status.success() {
            return Err(unsuccessful("Could not download stream", &res));
        }

        let path = find_downloaded_file(out_dir, printed_path(&res.stdout))?;
        debug!("Stream {} written to {}", stream.id, path.display());
        Ok(path)
    }
}
