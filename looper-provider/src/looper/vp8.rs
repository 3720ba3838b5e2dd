use std::io::Read;
use std::time::Duration;

use bytes::{Buf, Bytes};

use crate::{
    looper::{CodecCapability, Looper, MIME_TYPE_VP8, Sample, SampleProvider, VideoLooper},
    spec::VideoSpec,
};

const IVF_SIGNATURE: &[u8; 4] = b"DKIF";
const IVF_FOURCC_VP8: &[u8; 4] = b"VP80";
const IVF_FILE_HEADER_LEN: usize = 32;
const IVF_FRAME_HEADER_LEN: usize = 12;

/// IVF file header fields we care about.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct IvfHeader {
    pub width: u16,
    pub height: u16,
    pub timebase_denominator: u32,
    pub timebase_numerator: u32,
    pub frame_count: u32,
}

/// Replays the VP8 frames of an IVF file, one frame per sample.
pub struct Vp8Looper {
    spec: VideoSpec,
    header: IvfHeader,
    frames: Vec<Bytes>,
    frame_duration: Duration,
    position: usize,
}

impl Vp8Looper {
    pub fn new(mut reader: impl Read, spec: VideoSpec) -> anyhow::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let (header, frames) = parse_ivf(Bytes::from(data))?;
        if frames.is_empty() {
            anyhow::bail!("no VP8 frames found in {}", spec.name());
        }
        Ok(Self {
            frame_duration: spec.frame_duration(),
            spec,
            header,
            frames,
            position: 0,
        })
    }

    pub fn header(&self) -> &IvfHeader {
        &self.header
    }

    pub fn frame_count(&self) -> usize {
        self.frames.len()
    }
}

impl SampleProvider for Vp8Looper {
    fn next_sample(&mut self) -> anyhow::Result<Sample> {
        if self.position >= self.frames.len() {
            log::trace!("rewinding {}", self.spec.name());
            self.position = 0;
        }
        let frame = self.frames[self.position].clone();
        self.position += 1;
        Ok(Sample {
            data: frame,
            duration: self.frame_duration,
        })
    }
}

impl Looper for Vp8Looper {
    fn codec(&self) -> CodecCapability {
        CodecCapability {
            mime_type: MIME_TYPE_VP8.to_string(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: String::new(),
        }
    }
}

impl VideoLooper for Vp8Looper {
    fn spec(&self) -> &VideoSpec {
        &self.spec
    }
}

fn parse_ivf(mut data: Bytes) -> anyhow::Result<(IvfHeader, Vec<Bytes>)> {
    if data.len() < IVF_FILE_HEADER_LEN {
        anyhow::bail!("IVF header truncated: {} bytes", data.len());
    }
    if &data[..4] != IVF_SIGNATURE {
        anyhow::bail!("missing IVF signature");
    }
    if &data[8..12] != IVF_FOURCC_VP8 {
        anyhow::bail!(
            "unexpected IVF fourcc {:?}",
            String::from_utf8_lossy(&data[8..12])
        );
    }

    data.advance(6);
    let header_len = data.get_u16_le() as usize;
    data.advance(4);
    let header = IvfHeader {
        width: data.get_u16_le(),
        height: data.get_u16_le(),
        timebase_denominator: data.get_u32_le(),
        timebase_numerator: data.get_u32_le(),
        frame_count: data.get_u32_le(),
    };
    data.advance(4);

    // header length field may announce extra bytes past the fixed 32
    let extra = header_len.saturating_sub(IVF_FILE_HEADER_LEN);
    if data.remaining() < extra {
        anyhow::bail!("IVF header length {} exceeds file", header_len);
    }
    data.advance(extra);

    let mut frames = Vec::new();
    while data.has_remaining() {
        if data.remaining() < IVF_FRAME_HEADER_LEN {
            anyhow::bail!("IVF frame header {} truncated", frames.len());
        }
        let size = data.get_u32_le() as usize;
        let _timestamp = data.get_u64_le();
        if data.remaining() < size {
            anyhow::bail!(
                "IVF frame {} truncated: want {} bytes, have {}",
                frames.len(),
                size,
                data.remaining()
            );
        }
        frames.push(data.split_to(size));
    }
    Ok((header, frames))
}
