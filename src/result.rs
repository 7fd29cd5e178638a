use std::fmt::Display;

use miette::miette;

#[derive(Debug)]
pub enum Error {
    /// The submitted text is empty or does not look like a video URL
    InvalidUrl,

    /// A download was requested without choosing a stream
    MissingSelection,

    /// The chosen stream is not listed for the video
    UnavailableFormat,

    /// The video itself cannot be reached (removed, private, region locked...)
    UnavailableStream,

    Miette(miette::Report),
}

impl From<miette::Report> for Error {
    fn from(err: miette::Report) -> Self {
        Error::Miette(err)
    }
}

impl From<Error> for miette::Report {
    fn from(err: Error) -> Self {
        match err {
            Error::InvalidUrl => miette!("Invalid YouTube URL format"),
            Error::MissingSelection => miette!("No format selected"),
            Error::UnavailableFormat => miette!("Selected format is not available"),
            Error::UnavailableStream => miette!("Unavailable stream"),
            Error::Miette(err) => err,
        }
    }
}

impl Error {
    pub fn wrap_err_with<D, F>(self, f: F) -> Error
    where
        D: Display + Send + Sync + 'static,
        F: FnOnce() -> D,
    {
        match self {
            Error::Miette(report) => Error::Miette(report.wrap_err(f())),
            err => err,
        }
    }
}

pub type Result<T> = std::result::Result<T, Error>;

/// Return early with an untyped error
pub fn bail<T, D>(msg: D) -> Result<T>
where
    D: Display + std::fmt::Debug + Send + Sync + 'static,
{
    Err(Error::Miette(miette::Report::msg(msg)))
}
