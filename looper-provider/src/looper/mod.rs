use std::fmt::{Display, Formatter};
use std::time::Duration;

use bytes::Bytes;

use crate::spec::{VideoLayer, VideoQuality, VideoSpec};

pub mod h264;
pub mod opus;
pub mod stream;
pub mod vp8;

pub const MIME_TYPE_H264: &str = "video/H264";
pub const MIME_TYPE_VP8: &str = "video/VP8";
pub const MIME_TYPE_OPUS: &str = "audio/opus";

/// One encoded unit handed to the transport.
#[derive(Clone, Debug, Default, PartialEq, Eq)]
pub struct Sample {
    pub data: Bytes,
    /// How long the transport should wait before pulling the next sample.
    /// Zero for units that share a frame's timestamp (e.g. parameter sets).
    pub duration: Duration,
}

impl Display for Sample {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        write!(
            f,
            "Sample {{ data: {}, duration: {:?} }}",
            self.data.len(),
            self.duration
        )
    }
}

/// What a transport needs to advertise the stream.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct CodecCapability {
    pub mime_type: String,
    pub clock_rate: u32,
    pub channels: u16,
    pub sdp_fmtp_line: String,
}

/// Pull-based source of encoded samples. Loopers never run dry: reaching
/// the end of their clip rewinds to the start.
pub trait SampleProvider: Send {
    fn next_sample(&mut self) -> anyhow::Result<Sample>;
}

impl<T: SampleProvider + ?Sized> SampleProvider for Box<T> {
    fn next_sample(&mut self) -> anyhow::Result<Sample> {
        (**self).next_sample()
    }
}

pub trait Looper: SampleProvider {
    fn codec(&self) -> CodecCapability;
}

pub trait VideoLooper: Looper {
    /// The layer this looper was built for.
    fn spec(&self) -> &VideoSpec;

    fn to_layer(&self, quality: VideoQuality) -> VideoLayer {
        self.spec().to_layer(quality)
    }
}

/// Layer descriptors for a selected batch; position `i` announces quality `i`.
pub fn layers_of(loopers: &[Box<dyn VideoLooper>]) -> Vec<VideoLayer> {
    loopers
        .iter()
        .enumerate()
        .map(|(i, looper)| looper.to_layer(VideoQuality::from_index(i)))
        .collect()
}
