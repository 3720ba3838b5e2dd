use std::sync::{
    Arc,
    atomic::{AtomicU64, Ordering},
};
use std::time::Instant;

use futures::StreamExt;
use looper_provider::{
    Provider,
    looper::{SampleProvider, layers_of, stream::LooperStream},
};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;

use crate::config::LoadConfig;

/// Counters for one simulated outgoing track.
pub(crate) struct TrackStats {
    name: String,
    started: Instant,
    samples: AtomicU64,
    bytes: AtomicU64,
}

impl TrackStats {
    fn new(name: String) -> Self {
        Self {
            name,
            started: Instant::now(),
            samples: AtomicU64::new(0),
            bytes: AtomicU64::new(0),
        }
    }

    fn record(&self, bytes: usize) {
        self.samples.fetch_add(1, Ordering::Relaxed);
        self.bytes.fetch_add(bytes as u64, Ordering::Relaxed);
    }

    pub(crate) fn samples(&self) -> u64 {
        self.samples.load(Ordering::Relaxed)
    }

    pub(crate) fn bytes(&self) -> u64 {
        self.bytes.load(Ordering::Relaxed)
    }

    pub(crate) fn kbps(&self) -> f64 {
        let secs = self.started.elapsed().as_secs_f64();
        if secs <= 0.0 {
            return 0.0;
        }
        self.bytes() as f64 * 8.0 / secs / 1000.0
    }
}

/// A fake participant publishing one video layer set and, optionally, audio.
pub(crate) struct Publisher {
    id: usize,
    tracks: Vec<Arc<TrackStats>>,
    handles: Vec<JoinHandle<()>>,
}

impl Publisher {
    /// Selects loopers for this publisher and spawns one pulling task per
    /// track. Nothing is spawned when selection fails.
    pub(crate) fn start(
        id: usize,
        provider: &Provider,
        config: &LoadConfig,
        cancel: CancellationToken,
    ) -> anyhow::Result<Self> {
        let video = provider.create_video_loopers(
            &config.video_resolution,
            &config.video_codec,
            config.simulcast,
        )?;
        let audio = if config.audio {
            Some(provider.create_audio_looper()?)
        } else {
            None
        };

        let layers = layers_of(&video);
        log::info!(
            "publisher {} announcing {} layer(s): {}",
            id,
            layers.len(),
            serde_json::to_string(&layers)?
        );

        let mut publisher = Self {
            id,
            tracks: Vec::new(),
            handles: Vec::new(),
        };
        for (looper, layer) in video.into_iter().zip(layers) {
            let name = format!(
                "video-{}-{}x{}",
                looper.codec().mime_type,
                layer.width,
                layer.height
            );
            publisher.spawn_track(name, looper, cancel.clone());
        }
        if let Some(looper) = audio {
            let name = format!("audio-{}", looper.codec().mime_type);
            publisher.spawn_track(name, looper, cancel.clone());
        }
        Ok(publisher)
    }

    fn spawn_track<L>(&mut self, name: String, looper: L, cancel: CancellationToken)
    where
        L: SampleProvider + Unpin + 'static,
    {
        let stats = Arc::new(TrackStats::new(name));
        self.tracks.push(Arc::clone(&stats));
        let id = self.id;
        self.handles.push(tokio::spawn(async move {
            let mut stream = LooperStream::new(looper);
            loop {
                tokio::select! {
                    _ = cancel.cancelled() => {
                        break;
                    },
                    next = stream.next() => match next {
                        Some(Ok(sample)) => stats.record(sample.data.len()),
                        Some(Err(e)) => {
                            log::error!("publisher {} track {} failed: {:#}", id, stats.name, e);
                            break;
                        }
                        None => break,
                    },
                }
            }
        }));
    }

    pub(crate) fn tracks(&self) -> &[Arc<TrackStats>] {
        &self.tracks
    }

    /// Waits for every track task to exit; call after cancelling.
    pub(crate) async fn join(&mut self) {
        for handle in self.handles.drain(..) {
            if let Err(e) = handle.await {
                log::warn!("publisher {} track task: {}", self.id, e);
            }
        }
    }

    pub(crate) fn report(&self) {
        for track in &self.tracks {
            log::info!(
                "publisher {} {}: {} samples, {} bytes, {:.1} kbps",
                self.id,
                track.name,
                track.samples(),
                track.bytes(),
                track.kbps()
            );
        }
    }
}
