use std::fmt::Display;

use serde::Serialize;

/// An audio bitrate, in kilobits per second
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(transparent)]
pub struct Bitrate(u32);

impl Bitrate {
    /// Build a bitrate from the fractional kbps value reported by the extractor.
    /// Return None when the value is unknown or not positive.
    pub fn from_kbps(kbps: f64) -> Option<Self> {
        let rounded = kbps.round();
        if rounded >= 1.0 && rounded <= u32::MAX as f64 {
            Some(Self(rounded as u32))
        } else {
            None
        }
    }

    pub fn kbps(self) -> u32 {
        self.0
    }

    pub fn quality(self) -> AudioQuality {
        match self.0 {
            128.. => AudioQuality::High,
            64.. => AudioQuality::Medium,
            _ => AudioQuality::Low,
        }
    }
}

impl Display for Bitrate {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}kbps", self.0)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AudioQuality {
    Low,
    Medium,
    High,
}

impl Display for AudioQuality {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            AudioQuality::Low => "Low",
            AudioQuality::Medium => "Medium",
            AudioQuality::High => "High",
        })
    }
}
