use std::{
    ffi::OsStr,
    io::{self, BufRead, BufReader, Read},
    process::{Command, Output, Stdio},
};

use bitflags::bitflags;
use miette::{IntoDiagnostic, WrapErr};
use tracing::{debug, trace, Level};

use crate::result::{bail, Result};

pub const YT_DL: &str = "youtube-dl";
pub const YT_DLP: &str = "yt-dlp";

/// Arguments given to every extractor invocation
pub const YTDL_DEFAULT_ARGS: [&str; 2] = ["--no-playlist", "--no-warnings"];

bitflags! {
    #[derive(Debug, Clone, Copy, PartialEq, Eq)]
    pub struct Capture: u8 {
        const STDIN = 0b0000001;
        const STDOUT = 0b0000010;
        const STDERR = 0b0000100;
    }
}

/// Run a command, returning its raw output handle.
///
/// IO handles will be captured only if the caller required it or if the log level is Debug.
/// In that last case, `stdout` and `stderr` will be logged.
///
/// The function returns an error only if the command failed to execute.
/// If the program runs but returns a non-0 status code, it will not trigger an error.
pub fn run_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &OsStr,
    f: F,
    capture: Capture,
) -> Result<Output> {
    let is_debug = tracing::enabled!(Level::DEBUG);
    let get_io = |capture| {
        if capture {
            Stdio::piped()
        } else {
            Stdio::null()
        }
    };

    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(get_io(capture.contains(Capture::STDIN)))
        .stdout(get_io(is_debug || capture.contains(Capture::STDOUT)))
        .stderr(get_io(is_debug || capture.contains(Capture::STDERR)));

    debug!("Executing command: {cmd:?}");
    let res = cmd
        .output()
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not run {}", program.to_string_lossy()))?;

    if is_debug {
        debug!("status: {}", res.status);
        debug!("stdout: {} bytes long", res.stdout.len());
        trace!("stdout: {:?}", String::from_utf8_lossy(&res.stdout));
        debug!("stderr: {} bytes long", res.stderr.len());
        trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
    }

    Ok(res)
}

/// Run a command, handing every line of its `stdout` to `on_line` as soon as it is printed.
///
/// Both `stdout` and `stderr` are captured and returned, like [`run_command`] does
/// with [`Capture::STDOUT`] and [`Capture::STDERR`].
pub fn run_command_lines<F, L>(program: &OsStr, f: F, mut on_line: L) -> Result<Output>
where
    F: FnOnce(&mut Command) -> &mut Command,
    L: FnMut(&str),
{
    let mut cmd = Command::new(program);
    let cmd = f(&mut cmd)
        .stdin(Stdio::null())
        .stdout(Stdio::piped())
        .stderr(Stdio::piped());

    debug!("Executing command: {cmd:?}");
    let mut child = cmd
        .spawn()
        .into_diagnostic()
        .wrap_err_with(|| format!("Could not run {}", program.to_string_lossy()))?;

    let (Some(child_stdout), Some(mut child_stderr)) = (child.stdout.take(), child.stderr.take())
    else {
        return bail("Could not capture the command output");
    };

    // stderr is drained on its own thread so that neither pipe can fill up
    let (stdout, stderr) = std::thread::scope(|scope| {
        let stderr_reader = scope.spawn(move || {
            let mut buf = Vec::new();
            child_stderr.read_to_end(&mut buf).map(|_| buf)
        });

        let stdout = read_lines(child_stdout, &mut on_line);
        let stderr = stderr_reader
            .join()
            .unwrap_or_else(|_| Err(io::Error::other("stderr reader panicked")));
        (stdout, stderr)
    });

    let status = child
        .wait()
        .into_diagnostic()
        .wrap_err("Could not wait for the command")?;
    let res = Output {
        status,
        stdout: stdout.into_diagnostic().wrap_err("Could not read stdout")?,
        stderr: stderr.into_diagnostic().wrap_err("Could not read stderr")?,
    };

    debug!("status: {}", res.status);
    trace!("stderr: {:?}", String::from_utf8_lossy(&res.stderr));
    Ok(res)
}

fn read_lines(reader: impl Read, on_line: &mut impl FnMut(&str)) -> io::Result<Vec<u8>> {
    let mut all = Vec::new();
    for line in BufReader::new(reader).split(b'\n') {
        let line = line?;
        on_line(String::from_utf8_lossy(&line).trim_end());
        all.extend_from_slice(&line);
        all.push(b'\n');
    }
    Ok(all)
}

/// Run the command and verify that it has returned a success status code.
pub fn assert_success_command<F: FnOnce(&mut Command) -> &mut Command>(
    program: &OsStr,
    f: F,
) -> Result<()> {
    let res = run_command(program, f, Capture::empty())?;
    if res.status.success() {
        Ok(())
    } else {
        bail("Command did run but was not successful")
    }
}

/// The last non-empty line of the captured stderr, used as a short failure reason
pub fn last_stderr_line(output: &Output) -> Option<String> {
    String::from_utf8_lossy(&output.stderr)
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty())
        .last()
        .map(String::from)
}
