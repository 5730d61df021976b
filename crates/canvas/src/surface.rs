//! Seams to the host: drawing and asset loading live outside this crate.

use scene_graph::NodeRef;
use std::path::PathBuf;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum RenderError {
    #[error("invalid raster size {width}x{height}")]
    InvalidSize { width: u32, height: u32 },
    #[error("render backend failed: {0}")]
    Backend(String),
}

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("asset `{0}` not found")]
    NotFound(String),
    #[error("failed to read asset `{reference}`")]
    Io {
        reference: String,
        #[source]
        source: std::io::Error,
    },
}

/// Something that can draw a scene.
///
/// Nodes are handed over in paint order (the graph's flat list); the surface
/// must treat them as read-only.
pub trait RenderSurface {
    fn paint(&mut self, nodes: &[NodeRef<'_>]);

    /// Composites the nodes onto an opaque off-screen surface of the given
    /// size and returns its raw pixel bytes.
    fn export_raster(
        &mut self,
        nodes: &[NodeRef<'_>],
        width: u32,
        height: u32,
    ) -> Result<Vec<u8>, RenderError>;
}

/// Resolves an asset reference (path, URL, key) to its bytes.
pub trait AssetFetcher {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, FetchError>;
}

/// Reads assets from the local filesystem, relative to `root`.
#[derive(Clone, Debug)]
pub struct FileFetcher {
    root: PathBuf,
}

impl FileFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl AssetFetcher for FileFetcher {
    fn fetch(&self, reference: &str) -> Result<Vec<u8>, FetchError> {
        let path = self.root.join(reference);
        std::fs::read(&path).map_err(|source| match source.kind() {
            std::io::ErrorKind::NotFound => FetchError::NotFound(reference.to_string()),
            _ => FetchError::Io {
                reference: reference.to_string(),
                source,
            },
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_file_fetcher_resolves_against_root() {
        let root = std::env::temp_dir().join(format!("folio-fetch-{}", std::process::id()));
        std::fs::create_dir_all(root.join("icons")).unwrap();
        std::fs::write(root.join("icons/dot.svg"), b"<svg/>").unwrap();

        let fetcher = FileFetcher::new(root.clone());
        assert_eq!(fetcher.fetch("icons/dot.svg").unwrap(), b"<svg/>");
        assert!(matches!(
            fetcher.fetch("icons/none.svg"),
            Err(FetchError::NotFound(reference)) if reference == "icons/none.svg"
        ));
        assert!(matches!(
            fetcher.fetch("icons"),
            Err(FetchError::Io { .. })
        ));
        let _ = std::fs::remove_dir_all(&root);
    }
}
