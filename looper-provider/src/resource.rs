use std::io::{Cursor, Read};
use std::path::{Component, Path, PathBuf};

/// Prefix every catalog resource path starts with.
pub const RESOURCE_PREFIX: &str = "resources/";

/// Read-only access to pre-encoded clips by catalog path.
///
/// Opening the same path from many threads at once must be safe; stores
/// never hand out writable handles.
pub trait ResourceStore: Send + Sync {
    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + Send>>;
}

fn strip_prefix(path: &str) -> &str {
    path.strip_prefix(RESOURCE_PREFIX).unwrap_or(path)
}

fn not_found(path: &str) -> std::io::Error {
    std::io::Error::new(
        std::io::ErrorKind::NotFound,
        format!("resource not found: {}", path),
    )
}

#[derive(Debug, rust_embed::Embed)]
#[folder = "resources/"]
struct Resources;

/// Clips compiled into the binary.
#[derive(Clone, Copy, Debug, Default)]
pub struct EmbeddedStore;

impl EmbeddedStore {
    /// Embedded file names, without the `resources/` prefix.
    pub fn list() -> Vec<String> {
        Resources::iter().map(|p| p.into_owned()).collect()
    }
}

impl ResourceStore for EmbeddedStore {
    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + Send>> {
        let file = Resources::get(strip_prefix(path)).ok_or_else(|| not_found(path))?;
        Ok(Box::new(Cursor::new(file.data)))
    }
}

/// Clips read from a directory on disk, laid out like the embedded bundle.
#[derive(Clone, Debug)]
pub struct DirStore {
    root: PathBuf,
}

impl DirStore {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl ResourceStore for DirStore {
    fn open(&self, path: &str) -> std::io::Result<Box<dyn Read + Send>> {
        let relative = Path::new(strip_prefix(path));
        if relative
            .components()
            .any(|c| !matches!(c, Component::Normal(_)))
        {
            return Err(std::io::Error::new(
                std::io::ErrorKind::InvalidInput,
                format!("resource path escapes store: {}", path),
            ));
        }
        let file = std::fs::File::open(self.root.join(relative))?;
        Ok(Box::new(file))
    }
}
