use std::fmt::{Display, Formatter};
use std::sync::Arc;

use crate::{
    catalog::{Catalog, Ladder},
    error::LooperError,
    rotation::RotationCounter,
    spec::{VideoCodec, VideoSpec},
};

/// Requested resolution ceiling; decides how many layers are kept.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Tier {
    Low,
    Medium,
    High,
}

impl Tier {
    /// "low" and "medium" are recognized; anything else is High.
    pub fn parse(resolution: &str) -> Self {
        match resolution {
            "low" => Tier::Low,
            "medium" => Tier::Medium,
            _ => Tier::High,
        }
    }

    pub fn layer_count(&self) -> usize {
        match self {
            Tier::Low => 1,
            Tier::Medium => 2,
            Tier::High => 3,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Tier::Low => "low",
            Tier::Medium => "medium",
            Tier::High => "high",
        }
    }
}

impl Display for Tier {
    fn fmt(&self, f: &mut Formatter<'_>) -> Result<(), std::fmt::Error> {
        f.write_str(self.as_str())
    }
}

/// Parses a codec filter: empty means no filter, a known codec filters to
/// it, and anything else matches no ladder.
pub fn parse_codec_filter(codec: &str) -> Result<Option<VideoCodec>, LooperError> {
    if codec.is_empty() {
        return Ok(None);
    }
    VideoCodec::parse(codec)
        .map(Some)
        .ok_or_else(|| LooperError::NoMatchingLadder {
            codec: codec.to_string(),
        })
}

/// Picks a ladder round-robin and cuts it down to the requested tier.
#[derive(Debug)]
pub struct LayerSelector {
    catalog: Arc<Catalog>,
    rotation: RotationCounter,
}

impl LayerSelector {
    pub fn new(catalog: Arc<Catalog>) -> Self {
        Self::with_rotation(catalog, RotationCounter::new())
    }

    pub fn with_rotation(catalog: Arc<Catalog>, rotation: RotationCounter) -> Self {
        Self { catalog, rotation }
    }

    pub fn catalog(&self) -> &Catalog {
        &self.catalog
    }

    pub fn rotation(&self) -> &RotationCounter {
        &self.rotation
    }

    /// Next ladder among those matching `codec`. Filtering happens before
    /// the rotation index is taken, so the index always lands in range.
    pub fn next_ladder(&self, codec: Option<VideoCodec>) -> Result<&Ladder, LooperError> {
        let filtered = self.catalog.ladders_for(codec);
        let index =
            self.rotation
                .next_index(filtered.len())
                .ok_or_else(|| LooperError::NoMatchingLadder {
                    codec: codec.map(|c| c.to_string()).unwrap_or_default(),
                })?;
        Ok(filtered[index])
    }

    pub fn select(
        &self,
        tier: Tier,
        codec: Option<VideoCodec>,
        simulcast: bool,
    ) -> Result<Vec<VideoSpec>, LooperError> {
        let ladder = self.next_ladder(codec)?;
        let specs = truncate(ladder, tier, simulcast)?;
        log::debug!(
            "selected {} layer(s) of {} ({}) for tier {}, simulcast {}",
            specs.len(),
            ladder.prefix(),
            ladder.codec(),
            tier,
            simulcast
        );
        Ok(specs)
    }
}

/// Keeps the lowest `tier.layer_count()` layers. Without simulcast only the
/// top of that prefix survives, so `Low` yields the ladder's lowest layer and
/// `High` its third.
pub fn truncate(ladder: &Ladder, tier: Tier, simulcast: bool) -> Result<Vec<VideoSpec>, LooperError> {
    let keep = tier.layer_count();
    if keep > ladder.len() {
        return Err(LooperError::InvalidTier {
            tier,
            ladder: ladder.prefix().to_string(),
            requested: keep,
            available: ladder.len(),
        });
    }
    let kept = &ladder.specs()[..keep];
    if simulcast {
        Ok(kept.to_vec())
    } else {
        Ok(kept[keep - 1..].to_vec())
    }
}

#[cfg(test)]
#[path = "selector_test.rs"]
mod selector_test;
