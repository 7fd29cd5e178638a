mod bitrate;
mod container;
mod video;

pub use bitrate::{AudioQuality, Bitrate};
pub use container::Container;
pub use video::{StreamDescriptor, StreamKind, Streams, VideoInfo};
