use std::fmt::{Display, Formatter};
use std::time::Duration;

use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoCodec {
    H264,
    Vp8,
}

impl VideoCodec {
    pub fn as_str(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::Vp8 => "vp8",
        }
    }

    /// File extension of the pre-encoded clips for this codec.
    pub fn extension(&self) -> &'static str {
        match self {
            VideoCodec::H264 => "h264",
            VideoCodec::Vp8 => "ivf",
        }
    }

    pub fn parse(name: &str) -> Option<Self> {
        match name.to_ascii_lowercase().as_str() {
            "h264" => Some(VideoCodec::H264),
            "vp8" => Some(VideoCodec::Vp8),
            _ => None,
        }
    }
}

impl Display for VideoCodec {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str(self.as_str())
    }
}

/// One simulcast layer of a clip family.
#[derive(Clone, Debug, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct VideoSpec {
    pub codec: VideoCodec,
    // clip family, e.g. "butterfly"
    pub prefix: String,
    pub height: u32,
    pub width: u32,
    pub kbps: u32,
    pub fps: u32,
}

impl VideoSpec {
    /// Resource path of the clip backing this layer:
    /// `resources/{prefix}_{size}_{kbps}.{ext}`, where `size` is the height,
    /// or `p{width}` for portrait clips.
    pub fn name(&self) -> String {
        let size = if self.is_portrait() {
            format!("p{}", self.width)
        } else {
            self.height.to_string()
        };
        format!(
            "resources/{}_{}_{}.{}",
            self.prefix,
            size,
            self.kbps,
            self.codec.extension()
        )
    }

    pub fn is_portrait(&self) -> bool {
        self.height > self.width
    }

    /// Target bitrate in bits per second.
    pub fn bitrate(&self) -> u32 {
        self.kbps * 1000
    }

    pub fn pixels(&self) -> u64 {
        self.width as u64 * self.height as u64
    }

    pub fn frame_duration(&self) -> Duration {
        Duration::from_secs(1) / self.fps.max(1)
    }

    pub fn to_layer(&self, quality: VideoQuality) -> VideoLayer {
        VideoLayer {
            quality,
            width: self.width,
            height: self.height,
            bitrate: self.bitrate(),
        }
    }
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum VideoQuality {
    Low,
    Medium,
    High,
}

impl VideoQuality {
    /// Quality of the layer at `index` in an ascending layer set.
    pub fn from_index(index: usize) -> Self {
        match index {
            0 => VideoQuality::Low,
            1 => VideoQuality::Medium,
            _ => VideoQuality::High,
        }
    }
}

/// Simulcast layer as announced to the media server.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct VideoLayer {
    pub quality: VideoQuality,
    pub width: u32,
    pub height: u32,
    // bps
    pub bitrate: u32,
}
