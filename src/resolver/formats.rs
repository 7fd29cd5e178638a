//! Shaping of the raw extractor output into the descriptors shown to users.

use std::{cmp::Reverse, collections::HashSet};

use serde::Deserialize;
use time::{macros::format_description, Date};

use crate::types::{Bitrate, Container, StreamDescriptor, Streams, VideoInfo};

/// The subset of the `-J` output we care about
#[derive(Debug, Deserialize)]
pub struct RawVideo {
    pub id: String,
    pub title: Option<String>,
    pub uploader: Option<String>,
    pub channel: Option<String>,
    pub duration: Option<f64>,
    pub thumbnail: Option<String>,
    pub description: Option<String>,
    pub view_count: Option<u64>,
    pub upload_date: Option<String>,
    #[serde(default)]
    pub formats: Vec<RawFormat>,
}

#[derive(Debug, Deserialize)]
pub struct RawFormat {
    pub format_id: String,
    pub ext: Option<String>,
    pub vcodec: Option<String>,
    pub acodec: Option<String>,
    pub height: Option<u32>,
    pub fps: Option<f64>,
    pub abr: Option<f64>,
    pub tbr: Option<f64>,
    pub filesize: Option<f64>,
    pub filesize_approx: Option<f64>,
}

impl RawFormat {
    fn has_codec(codec: &Option<String>) -> bool {
        codec.as_deref().is_some_and(|c| !c.is_empty() && c != "none")
    }

    fn has_video(&self) -> bool {
        Self::has_codec(&self.vcodec)
    }

    fn has_audio(&self) -> bool {
        Self::has_codec(&self.acodec)
    }

    fn container(&self) -> Option<Container> {
        self.ext.as_deref().and_then(Container::from_ext)
    }

    fn filesize(&self) -> Option<u64> {
        self.filesize
            .or(self.filesize_approx)
            .filter(|size| *size > 0.0)
            .map(|size| size as u64)
    }

    fn audio_descriptor(&self) -> Option<StreamDescriptor> {
        if self.has_video() || !self.has_audio() {
            return None;
        }

        let bitrate = self.abr.or(self.tbr).and_then(Bitrate::from_kbps)?;
        Some(StreamDescriptor::audio(
            &self.format_id,
            self.container()?,
            bitrate,
            self.filesize(),
        ))
    }

    fn video_descriptor(&self) -> Option<StreamDescriptor> {
        if !self.has_video() {
            return None;
        }

        let fps = self.fps.filter(|fps| *fps > 0.0).map(|fps| fps.round() as u32);
        Some(StreamDescriptor::video(
            &self.format_id,
            self.container()?,
            self.height.filter(|h| *h > 0)?,
            fps,
            self.has_audio(),
            self.filesize(),
        ))
    }
}

impl RawVideo {
    pub fn into_video_info(self) -> VideoInfo {
        let streams = shape_streams(&self.formats);

        VideoInfo {
            title: self
                .title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| self.id.clone()),
            id: self.id,
            author: self.uploader.or(self.channel).unwrap_or_default(),
            length: self.duration.map(|d| d.max(0.0) as u64).unwrap_or_default(),
            thumbnail_url: self.thumbnail,
            description: self.description.unwrap_or_default(),
            view_count: self.view_count,
            publish_date: self.upload_date.as_deref().and_then(publish_date),
            streams,
        }
    }
}

/// "20091025" -> "2009-10-25"
fn publish_date(upload_date: &str) -> Option<String> {
    Date::parse(upload_date, format_description!("[year][month][day]"))
        .ok()?
        .format(format_description!("[year]-[month]-[day]"))
        .ok()
}

/// Build the audio and video descriptor lists.
///
/// Audio streams are the audio-only formats, best bitrate first.
/// Video streams are deduplicated by resolution, best resolution first.
/// For a given resolution, a format already holding an audio track
/// wins over one that needs merging, then mp4 wins over other containers.
pub fn shape_streams(formats: &[RawFormat]) -> Streams {
    let mut audio: Vec<_> = formats.iter().filter_map(RawFormat::audio_descriptor).collect();
    audio.sort_by_key(|s| Reverse(s.bitrate));
    let mut seen_ids = HashSet::new();
    audio.retain(|s| seen_ids.insert(s.id.clone()));

    let mut candidates: Vec<_> = formats
        .iter()
        .filter_map(|f| Some((f.video_descriptor()?, f.tbr.unwrap_or_default())))
        .collect();
    // Stable sort keeps the extractor order for equal keys
    candidates.sort_by(|(a, a_tbr), (b, b_tbr)| {
        let key = |s: &StreamDescriptor| {
            (
                Reverse(s.height()),
                !s.has_audio,
                s.container != Container::Mp4,
            )
        };
        key(a)
            .cmp(&key(b))
            .then_with(|| b_tbr.total_cmp(a_tbr))
    });

    let mut seen_resolutions = HashSet::new();
    let video = candidates
        .into_iter()
        .map(|(s, _)| s)
        .filter(|s| seen_resolutions.insert(s.quality.clone()))
        .collect();

    Streams { audio, video }
}
