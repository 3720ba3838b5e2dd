use std::sync::{Arc, LazyLock};

use crate::spec::{VideoCodec, VideoSpec};

const VIDEO_FPS: [u32; 3] = [15, 20, 30];
const BASE_HEIGHT: u32 = 180;

const AUDIO_CLIPS: [&str; 7] = [
    "change-amelia",
    "change-benjamin",
    "change-elena",
    "change-clint",
    "change-emma",
    "change-ken",
    "change-sophie",
];

/// Simulcast layers of one clip family, lowest quality first.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Ladder {
    specs: Vec<VideoSpec>,
}

impl Ladder {
    /// Panics when `specs` is empty, mixes codecs or families, or is not
    /// ascending. A malformed ladder is a programming error.
    pub fn new(specs: Vec<VideoSpec>) -> Self {
        assert!(!specs.is_empty(), "ladder must have at least one layer");
        let first = &specs[0];
        assert!(
            specs
                .iter()
                .all(|s| s.codec == first.codec && s.prefix == first.prefix),
            "ladder {} mixes codecs or clip families",
            first.prefix
        );
        assert!(
            specs
                .windows(2)
                .all(|w| w[0].pixels() <= w[1].pixels() && w[0].kbps <= w[1].kbps),
            "ladder {} is not sorted ascending",
            first.prefix
        );
        Self { specs }
    }

    /// Layer `i` is 180p scaled by `2^i` at 16:9, with `bitrates[i]` kbps and
    /// a framerate from 15/20/30 (the last entry repeats past three layers).
    pub fn generate(prefix: &str, codec: VideoCodec, bitrates: &[u32]) -> Self {
        let specs = bitrates
            .iter()
            .enumerate()
            .map(|(i, &kbps)| {
                let height = BASE_HEIGHT << i;
                VideoSpec {
                    codec,
                    prefix: prefix.to_string(),
                    height,
                    width: height * 16 / 9,
                    kbps,
                    fps: VIDEO_FPS[i.min(VIDEO_FPS.len() - 1)],
                }
            })
            .collect();
        Self::new(specs)
    }

    pub fn codec(&self) -> VideoCodec {
        self.specs[0].codec
    }

    pub fn prefix(&self) -> &str {
        &self.specs[0].prefix
    }

    pub fn specs(&self) -> &[VideoSpec] {
        &self.specs
    }

    pub fn len(&self) -> usize {
        self.specs.len()
    }

    pub fn is_empty(&self) -> bool {
        self.specs.is_empty()
    }
}

/// Portrait 3:4 "circles" test pattern layer.
fn circles_spec(width: u32, kbps: u32, fps: u32) -> VideoSpec {
    VideoSpec {
        codec: VideoCodec::H264,
        prefix: "circles".to_string(),
        height: width * 4 / 3,
        width,
        kbps,
        fps,
    }
}

/// Read-only table of video ladders and audio clips.
#[derive(Debug)]
pub struct Catalog {
    ladders: Vec<Ladder>,
    audio_clips: Vec<String>,
}

impl Catalog {
    pub fn new(ladders: Vec<Ladder>, audio_clips: Vec<String>) -> Self {
        assert!(!ladders.is_empty(), "catalog needs at least one ladder");
        assert!(!audio_clips.is_empty(), "catalog needs at least one audio clip");
        Self {
            ladders,
            audio_clips,
        }
    }

    /// The clips shipped in the embedded resource bundle.
    pub fn builtin() -> Arc<Catalog> {
        static BUILTIN: LazyLock<Arc<Catalog>> = LazyLock::new(|| {
            let ladders = vec![
                Ladder::generate("butterfly", VideoCodec::H264, &[150, 400, 2000]),
                Ladder::generate("cartoon", VideoCodec::H264, &[120, 400, 1500]),
                Ladder::generate("crescent", VideoCodec::Vp8, &[150, 600, 2000]),
                Ladder::generate("neon", VideoCodec::Vp8, &[150, 600, 2000]),
                Ladder::generate("tunnel", VideoCodec::Vp8, &[150, 600, 2000]),
                Ladder::new(vec![
                    circles_spec(180, 200, 15),
                    circles_spec(360, 700, 20),
                    circles_spec(540, 2000, 30),
                ]),
            ];
            let audio_clips = AUDIO_CLIPS.iter().map(|s| s.to_string()).collect();
            Arc::new(Catalog::new(ladders, audio_clips))
        });
        Arc::clone(&BUILTIN)
    }

    pub fn video_ladders(&self) -> &[Ladder] {
        &self.ladders
    }

    pub fn audio_clips(&self) -> &[String] {
        &self.audio_clips
    }

    /// Ladders whose layers are all encoded with `codec`, in catalog order.
    /// `None` keeps every ladder.
    pub fn ladders_for(&self, codec: Option<VideoCodec>) -> Vec<&Ladder> {
        self.ladders
            .iter()
            .filter(|l| codec.is_none_or(|c| l.codec() == c))
            .collect()
    }
}

pub fn audio_resource_name(clip: &str) -> String {
    format!("resources/{}.ogg", clip)
}
