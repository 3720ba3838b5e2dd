use std::io::Read;

use crate::{
    looper::{Looper, VideoLooper, h264::H264Looper, opus::OpusLooper, vp8::Vp8Looper},
    spec::{VideoCodec, VideoSpec},
};

/// Builds the codec looper matching `spec.codec` from an open clip.
pub fn new_video_looper(reader: impl Read, spec: VideoSpec) -> anyhow::Result<Box<dyn VideoLooper>> {
    let name = spec.name();
    let looper: Box<dyn VideoLooper> = match spec.codec {
        VideoCodec::H264 => {
            let looper = H264Looper::new(reader, spec)?;
            log::debug!("{}: {} NAL units", name, looper.nal_count());
            Box::new(looper)
        }
        VideoCodec::Vp8 => {
            let looper = Vp8Looper::new(reader, spec)?;
            let header = looper.header();
            log::debug!(
                "{}: {} frames, {}x{}, timebase {}/{}",
                name,
                looper.frame_count(),
                header.width,
                header.height,
                header.timebase_numerator,
                header.timebase_denominator
            );
            Box::new(looper)
        }
    };
    Ok(looper)
}

pub fn new_audio_looper(reader: impl Read) -> anyhow::Result<Box<dyn Looper>> {
    let looper = OpusLooper::new(reader)?;
    log::debug!(
        "opus clip: {} pages, {} channel(s)",
        looper.page_count(),
        looper.channels()
    );
    Ok(Box::new(looper))
}
