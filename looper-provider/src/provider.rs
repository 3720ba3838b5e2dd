use std::io::Read;
use std::sync::Arc;

use crate::{
    catalog::{Catalog, audio_resource_name},
    error::LooperError,
    factory::{new_audio_looper, new_video_looper},
    looper::{Looper, VideoLooper},
    resource::{EmbeddedStore, ResourceStore},
    rotation::RotationCounter,
    selector::{LayerSelector, Tier, parse_codec_filter},
    spec::{VideoCodec, VideoSpec},
};

/// Hands out loopers for simulated publishers.
///
/// Shared by every publisher of a load test: the video and audio rotation
/// counters spread concurrent callers across the catalog.
pub struct Provider {
    selector: LayerSelector,
    audio_rotation: RotationCounter,
    store: Arc<dyn ResourceStore>,
}

impl Provider {
    pub fn new(catalog: Arc<Catalog>, store: Arc<dyn ResourceStore>) -> Self {
        Self::with_rotation(
            catalog,
            store,
            RotationCounter::new(),
            RotationCounter::new(),
        )
    }

    pub fn with_rotation(
        catalog: Arc<Catalog>,
        store: Arc<dyn ResourceStore>,
        video_rotation: RotationCounter,
        audio_rotation: RotationCounter,
    ) -> Self {
        Self {
            selector: LayerSelector::with_rotation(catalog, video_rotation),
            audio_rotation,
            store,
        }
    }

    /// Builtin catalog backed by the embedded clips.
    pub fn embedded() -> Self {
        Self::new(Catalog::builtin(), Arc::new(EmbeddedStore))
    }

    pub fn catalog(&self) -> &Catalog {
        self.selector.catalog()
    }

    pub fn video_rotation(&self) -> &RotationCounter {
        self.selector.rotation()
    }

    pub fn audio_rotation(&self) -> &RotationCounter {
        &self.audio_rotation
    }

    pub fn select_video_specs(
        &self,
        tier: Tier,
        codec: Option<VideoCodec>,
        simulcast: bool,
    ) -> Result<Vec<VideoSpec>, LooperError> {
        self.selector.select(tier, codec, simulcast)
    }

    /// Selects a layer set and builds one looper per layer, lowest first.
    ///
    /// `resolution` is "low", "medium" or anything else for high;
    /// `codec_filter` is "" for any codec, otherwise "h264" or "vp8".
    pub fn create_video_loopers(
        &self,
        resolution: &str,
        codec_filter: &str,
        simulcast: bool,
    ) -> Result<Vec<Box<dyn VideoLooper>>, LooperError> {
        let codec = parse_codec_filter(codec_filter)?;
        let specs = self.select_video_specs(Tier::parse(resolution), codec, simulcast)?;
        self.video_loopers_for(specs)
    }

    /// Builds loopers for `specs` in order. The first failure aborts the
    /// batch; loopers already built are dropped.
    pub fn video_loopers_for(
        &self,
        specs: Vec<VideoSpec>,
    ) -> Result<Vec<Box<dyn VideoLooper>>, LooperError> {
        let mut loopers = Vec::with_capacity(specs.len());
        for spec in specs {
            let path = spec.name();
            let reader = self.open(&path)?;
            let looper =
                new_video_looper(reader, spec).map_err(|e| LooperError::construction(&path, e))?;
            loopers.push(looper);
        }
        Ok(loopers)
    }

    /// Next audio clip in rotation, as an Opus looper.
    pub fn create_audio_looper(&self) -> Result<Box<dyn Looper>, LooperError> {
        let clips = self.catalog().audio_clips();
        // catalog construction guarantees at least one clip
        let index = self.audio_rotation.next_index(clips.len()).unwrap_or_default();
        let path = audio_resource_name(&clips[index]);
        log::debug!("selected audio clip {}", path);
        let reader = self.open(&path)?;
        new_audio_looper(reader).map_err(|e| LooperError::construction(&path, e))
    }

    fn open(&self, path: &str) -> Result<Box<dyn Read + Send>, LooperError> {
        self.store.open(path).map_err(|source| {
            log::warn!("resource {} unavailable: {}", path, source);
            LooperError::ResourceUnavailable {
                path: path.to_string(),
                source,
            }
        })
    }
}

#[cfg(test)]
#[path = "provider_test.rs"]
mod provider_test;
