use std::io::Read;
use std::time::Duration;

use bytes::{Buf, Bytes};

use crate::looper::{CodecCapability, Looper, MIME_TYPE_OPUS, Sample, SampleProvider};

const OGG_CAPTURE: &[u8; 4] = b"OggS";
const OGG_PAGE_HEADER_LEN: usize = 27;
const OPUS_HEAD: &[u8; 8] = b"OpusHead";
const OPUS_TAGS: &[u8; 8] = b"OpusTags";
const OPUS_CLOCK_RATE: u64 = 48_000;
// granule position of a page on which no packet completes
const GRANULE_NONE: u64 = u64::MAX;

#[derive(Clone, Debug)]
struct OggPage {
    granule_position: u64,
    payload: Bytes,
}

/// Replays the audio pages of an Ogg Opus file. Each page is one sample;
/// its duration comes from the granule position advance since the
/// previous page.
pub struct OpusLooper {
    channels: u8,
    pages: Vec<OggPage>,
    last_granule: u64,
    position: usize,
}

impl OpusLooper {
    pub fn new(mut reader: impl Read) -> anyhow::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let mut pages = parse_ogg(Bytes::from(data))?;

        let head = match pages.first() {
            Some(page) if page.payload.starts_with(OPUS_HEAD) => page.payload.clone(),
            _ => anyhow::bail!("first Ogg page is not an Opus ID header"),
        };
        // OpusHead: magic(8) version(1) channel count(1) ...
        let channels = head
            .get(9)
            .copied()
            .ok_or_else(|| anyhow::anyhow!("Opus ID header truncated"))?;

        pages.retain(|p| !p.payload.starts_with(OPUS_HEAD) && !p.payload.starts_with(OPUS_TAGS));
        if pages.is_empty() {
            anyhow::bail!("no Opus audio pages found");
        }

        Ok(Self {
            channels,
            pages,
            last_granule: 0,
            position: 0,
        })
    }

    /// Channel count from the Opus ID header.
    pub fn channels(&self) -> u8 {
        self.channels
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

impl SampleProvider for OpusLooper {
    fn next_sample(&mut self) -> anyhow::Result<Sample> {
        if self.position >= self.pages.len() {
            log::trace!("rewinding opus clip");
            self.position = 0;
            self.last_granule = 0;
        }
        let page = &self.pages[self.position];
        self.position += 1;

        if page.granule_position == GRANULE_NONE {
            return Ok(Sample {
                data: page.payload.clone(),
                duration: Duration::ZERO,
            });
        }
        let samples = page.granule_position.saturating_sub(self.last_granule);
        self.last_granule = page.granule_position;
        Ok(Sample {
            data: page.payload.clone(),
            duration: granule_duration(samples),
        })
    }
}

fn granule_duration(samples: u64) -> Duration {
    Duration::from_secs(samples / OPUS_CLOCK_RATE)
        + Duration::from_nanos((samples % OPUS_CLOCK_RATE) * 1_000_000_000 / OPUS_CLOCK_RATE)
}

impl Looper for OpusLooper {
    fn codec(&self) -> CodecCapability {
        CodecCapability {
            mime_type: MIME_TYPE_OPUS.to_string(),
            clock_rate: OPUS_CLOCK_RATE as u32,
            channels: 2,
            sdp_fmtp_line: "minptime=10;useinbandfec=1".to_string(),
        }
    }
}

/// Splits an Ogg stream into pages. CRCs are not checked.
fn parse_ogg(mut data: Bytes) -> anyhow::Result<Vec<OggPage>> {
    let mut pages = Vec::new();
    while data.has_remaining() {
        if data.remaining() < OGG_PAGE_HEADER_LEN {
            anyhow::bail!("Ogg page {} header truncated", pages.len());
        }
        if &data[..4] != OGG_CAPTURE {
            anyhow::bail!("Ogg page {} missing capture pattern", pages.len());
        }
        let version = data[4];
        if version != 0 {
            anyhow::bail!("unsupported Ogg version {}", version);
        }

        data.advance(6);
        let granule_position = data.get_u64_le();
        // serial(4) sequence(4) crc(4)
        data.advance(12);
        let segments = data.get_u8() as usize;
        if data.remaining() < segments {
            anyhow::bail!("Ogg page {} segment table truncated", pages.len());
        }
        let payload_len: usize = data[..segments].iter().map(|&s| s as usize).sum();
        data.advance(segments);
        if data.remaining() < payload_len {
            anyhow::bail!(
                "Ogg page {} truncated: want {} bytes, have {}",
                pages.len(),
                payload_len,
                data.remaining()
            );
        }
        pages.push(OggPage {
            granule_position,
            payload: data.split_to(payload_len),
        });
    }
    Ok(pages)
}
