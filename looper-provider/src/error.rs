use thiserror::Error;

use crate::selector::Tier;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// Failures surfaced by layer selection and looper construction.
///
/// None of these are retried internally; a batch either yields every
/// looper it asked for or one of these errors.
#[derive(Error, Debug)]
pub enum LooperError {
    /// The codec filter excludes every ladder in the catalog.
    #[error("no video ladder matches codec filter {codec:?}")]
    NoMatchingLadder { codec: String },

    /// The tier asks for more layers than the rotated ladder has.
    #[error("tier {tier} needs {requested} layers but ladder {ladder} has {available}")]
    InvalidTier {
        tier: Tier,
        ladder: String,
        requested: usize,
        available: usize,
    },

    #[error("resource {path} unavailable: {source}")]
    ResourceUnavailable {
        path: String,
        #[source]
        source: std::io::Error,
    },

    /// The codec looper rejected the resource (e.g. malformed bitstream).
    #[error("failed to construct looper for {path}: {source}")]
    LooperConstructionFailed {
        path: String,
        #[source]
        source: BoxError,
    },
}

impl LooperError {
    pub(crate) fn construction(path: &str, err: anyhow::Error) -> Self {
        Self::LooperConstructionFailed {
            path: path.to_string(),
            source: err.into(),
        }
    }
}
