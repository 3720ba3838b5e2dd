use std::io::Read;
use std::ops::Range;
use std::time::Duration;

use bytes::Bytes;

use crate::{
    looper::{CodecCapability, Looper, MIME_TYPE_H264, Sample, SampleProvider, VideoLooper},
    spec::VideoSpec,
};

const H264_FMTP: &str = "level-asymmetry-allowed=1;packetization-mode=1;profile-level-id=42e01f";

/// Replays an Annex B H.264 elementary stream one NAL unit at a time.
pub struct H264Looper {
    spec: VideoSpec,
    nals: Vec<Bytes>,
    frame_duration: Duration,
    position: usize,
}

impl H264Looper {
    pub fn new(mut reader: impl Read, spec: VideoSpec) -> anyhow::Result<Self> {
        let mut data = Vec::new();
        reader.read_to_end(&mut data)?;
        let data = Bytes::from(data);

        let nals: Vec<Bytes> = split_annexb(&data)
            .into_iter()
            .map(|range| data.slice(range))
            .collect();
        if nals.is_empty() {
            anyhow::bail!("no H.264 NAL units found in {}", spec.name());
        }
        if !nals.iter().any(|nal| is_slice(nal_type(nal))) {
            anyhow::bail!("no coded slices found in {}", spec.name());
        }

        Ok(Self {
            frame_duration: spec.frame_duration(),
            spec,
            nals,
            position: 0,
        })
    }

    pub fn nal_count(&self) -> usize {
        self.nals.len()
    }
}

impl SampleProvider for H264Looper {
    fn next_sample(&mut self) -> anyhow::Result<Sample> {
        if self.position >= self.nals.len() {
            log::trace!("rewinding {}", self.spec.name());
            self.position = 0;
        }
        let nal = self.nals[self.position].clone();
        self.position += 1;

        let duration = if is_slice(nal_type(&nal)) {
            self.frame_duration
        } else {
            Duration::ZERO
        };
        Ok(Sample {
            data: nal,
            duration,
        })
    }
}

impl Looper for H264Looper {
    fn codec(&self) -> CodecCapability {
        CodecCapability {
            mime_type: MIME_TYPE_H264.to_string(),
            clock_rate: 90000,
            channels: 0,
            sdp_fmtp_line: H264_FMTP.to_string(),
        }
    }
}

impl VideoLooper for H264Looper {
    fn spec(&self) -> &VideoSpec {
        &self.spec
    }
}

fn nal_type(nal: &[u8]) -> u8 {
    nal.first().map_or(0, |b| b & 0x1f)
}

/// Coded slice types 1..=5 (non-IDR, partitions A/B/C, IDR) advance the clock.
fn is_slice(nal_type: u8) -> bool {
    (1..=5).contains(&nal_type)
}

/// Byte ranges of the NAL units in an Annex B stream, start codes removed.
/// Bytes before the first start code are ignored.
fn split_annexb(data: &[u8]) -> Vec<Range<usize>> {
    // (start code offset, payload offset)
    let mut marks = Vec::new();
    let mut i = 0;
    while i + 3 <= data.len() {
        if data[i] == 0x00 && data[i + 1] == 0x00 && data[i + 2] == 0x01 {
            let code_start = if i > 0 && data[i - 1] == 0x00 { i - 1 } else { i };
            marks.push((code_start, i + 3));
            i += 3;
        } else {
            i += 1;
        }
    }

    marks
        .iter()
        .enumerate()
        .map(|(n, &(_, payload))| {
            let end = marks.get(n + 1).map_or(data.len(), |&(code, _)| code);
            payload..end
        })
        .filter(|range| !range.is_empty())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::spec::VideoCodec;

    fn spec() -> VideoSpec {
        VideoSpec {
            codec: VideoCodec::H264,
            prefix: "butterfly".to_string(),
            height: 180,
            width: 320,
            kbps: 150,
            fps: 20,
        }
    }

    fn stream() -> Vec<u8> {
        let mut data = Vec::new();
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x67, 0x42, 0xe0, 0x1f]); // SPS
        data.extend_from_slice(&[0x00, 0x00, 0x00, 0x01, 0x68, 0xce, 0x3c, 0x80]); // PPS
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x65, 0x88, 0x84]); // IDR
        data.extend_from_slice(&[0x00, 0x00, 0x01, 0x41, 0x9a, 0x02]); // non-IDR
        data
    }

    #[test]
    fn test_split_annexb() {
        let data = stream();
        let nals: Vec<_> = split_annexb(&data).into_iter().map(|r| &data[r]).collect();
        assert_eq!(nals.len(), 4);
        assert_eq!(nals[0], &[0x67, 0x42, 0xe0, 0x1f]);
        assert_eq!(nals[1], &[0x68, 0xce, 0x3c, 0x80]);
        assert_eq!(nals[2], &[0x65, 0x88, 0x84]);
        assert_eq!(nals[3], &[0x41, 0x9a, 0x02]);
    }

    #[test]
    fn test_split_ignores_leading_garbage() {
        let data = [0xff, 0x10, 0x00, 0x00, 0x01, 0x65, 0x01];
        let ranges = split_annexb(&data);
        assert_eq!(ranges, vec![5..7]);
    }

    #[test]
    fn test_samples_loop_with_frame_durations() -> anyhow::Result<()> {
        let mut looper = H264Looper::new(stream().as_slice(), spec())?;
        assert_eq!(looper.nal_count(), 4);

        let frame = Duration::from_millis(50);
        let durations: Vec<_> = (0..8)
            .map(|_| looper.next_sample().map(|s| s.duration))
            .collect::<anyhow::Result<_>>()?;
        assert_eq!(
            durations,
            vec![
                Duration::ZERO,
                Duration::ZERO,
                frame,
                frame,
                Duration::ZERO,
                Duration::ZERO,
                frame,
                frame
            ]
        );
        Ok(())
    }

    #[test]
    fn test_rejects_stream_without_slices() {
        let data = [0x00, 0x00, 0x00, 0x01, 0x67, 0x42];
        assert!(H264Looper::new(&data[..], spec()).is_err());
        assert!(H264Looper::new(&b"not h264"[..], spec()).is_err());
    }

    #[test]
    fn test_codec_and_layer() -> anyhow::Result<()> {
        let looper = H264Looper::new(stream().as_slice(), spec())?;
        let codec = looper.codec();
        assert_eq!(codec.mime_type, MIME_TYPE_H264);
        assert_eq!(codec.clock_rate, 90000);
        assert!(codec.sdp_fmtp_line.contains("packetization-mode=1"));
        let layer = looper.to_layer(crate::spec::VideoQuality::Low);
        assert_eq!(layer.bitrate, 150_000);
        Ok(())
    }
}
