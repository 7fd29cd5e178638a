use std::path::Path;

use miette::{IntoDiagnostic, WrapErr};
use tempfile::TempDir;
use time::{macros::format_description, OffsetDateTime};

use crate::{
    result::Result,
    types::{StreamDescriptor, StreamKind},
};

/// Longest title kept in a file name, in characters
const MAX_TITLE_CHARS: usize = 100;
/// Longest file name accepted by common file systems, in bytes
const MAX_FILENAME_BYTES: usize = 255;

/// Create a temporary directory owned by a single request.
///
/// The directory and its content are removed at the handle drop.
/// **As such, one must keep the handle alive while the files are in use.**
pub fn request_tempdir(parent: Option<&Path>) -> Result<TempDir> {
    let mut builder = tempfile::Builder::new();
    builder.prefix("tubefetch-");

    let dir = match parent {
        Some(parent) => builder.tempdir_in(parent),
        None => builder.tempdir(),
    };
    Ok(dir
        .into_diagnostic()
        .wrap_err("Could not create request directory")?)
}

/// Keep a title safe to use in a file name: only ASCII letters, digits,
/// `-`, `_` and `.`, with whitespace runs turned into a single `_`
fn sanitize_title(title: &str) -> String {
    let mut out = String::with_capacity(title.len());
    for c in title.chars() {
        if c.is_whitespace() || c == '_' {
            if !out.ends_with('_') {
                out.push('_');
            }
        } else if c.is_ascii_alphanumeric() || c == '-' || c == '.' {
            out.push(c);
        }
    }

    let trimmed: String = out
        .trim_matches(|c| c == '_' || c == '.')
        .chars()
        .take(MAX_TITLE_CHARS)
        .collect();
    if trimmed.is_empty() {
        "download".to_owned()
    } else {
        trimmed
    }
}

/// Name under which the stream is offered to the client:
/// `<title>[_<resolution>]_<YYYYmmdd_HHMMSS>.<ext>`
pub fn attachment_filename(title: &str, stream: &StreamDescriptor, now: OffsetDateTime) -> String {
    let quality = match stream.kind {
        StreamKind::Video => format!("_{}", stream.quality),
        StreamKind::Audio => String::new(),
    };
    let timestamp = now
        .format(format_description!(
            "[year][month][day]_[hour][minute][second]"
        ))
        .unwrap_or_default();
    let ext = stream.container.with_dot();

    let mut name = format!("{}{quality}_{timestamp}", sanitize_title(title));
    // Everything is ASCII at this point, so byte truncation is safe
    name.truncate(MAX_FILENAME_BYTES - ext.len());
    name.push_str(ext);
    name
}
