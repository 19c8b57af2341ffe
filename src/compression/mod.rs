//! Message compressors and the registry that negotiates which one to use
//! for a given direction of an exchange.

mod deflate;
mod gzip;
mod identity;

pub use deflate::DeflateCompressor;
pub use gzip::GzipCompressor;
pub use identity::IdentityCompressor;

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

/// The name every registry must always carry, as a no-op compressor.
pub const IDENTITY: &str = "identity";

#[derive(Debug, Clone, thiserror::Error)]
pub enum CompressionError {
    #[error("compression failed: {0}")]
    Compress(String),
    #[error("decompression failed: {0}")]
    Decompress(String),
}

/// A per-message byte-buffer transform, keyed on the wire by its
/// [`Compressor::encoding_name`].
///
/// Implementations must be safe to call concurrently on independent
/// buffers and must not retain references to the buffers they are given
/// after returning — every input/output buffer here is a `Bytes`, which is
/// reference-counted and cheap to hand back rather than alias.
#[async_trait]
pub trait Compressor: Send + Sync + 'static {
    /// The wire name of this encoding, e.g. `"gzip"`. Case-sensitive.
    fn encoding_name(&self) -> &'static str;

    async fn compress(&self, input: Bytes) -> Result<Bytes, CompressionError>;

    async fn decompress(&self, input: Bytes) -> Result<Bytes, CompressionError>;
}

/// Tuning knobs for the deflate-family compressors. Mirrors the parameters
/// zlib/miniz expose, with zlib's own defaults.
#[derive(Debug, Clone, Copy)]
pub struct CompressionConfig {
    /// 0 (stored) ..= 9 (max compression). zlib default is 6.
    pub level: u32,
    /// log2 of the LZ77 window size, 9..=15. zlib default is 15.
    pub window_bits: u32,
    /// Internal compressor memory usage, 1..=9. zlib default is 8.
    pub mem_level: u32,
}

impl Default for CompressionConfig {
    fn default() -> Self {
        Self {
            level: 6,
            window_bits: 15,
            mem_level: 8,
        }
    }
}

/// Owns one instance of every configured [`Compressor`], keyed by its
/// wire encoding name. `identity` is always present.
#[derive(Clone)]
pub struct CompressorRegistry {
    compressors: HashMap<&'static str, Arc<dyn Compressor>>,
}

impl CompressorRegistry {
    /// A registry carrying only `identity`.
    pub fn identity_only() -> Self {
        let mut compressors: HashMap<&'static str, Arc<dyn Compressor>> = HashMap::new();
        compressors.insert(IDENTITY, Arc::new(IdentityCompressor));
        Self { compressors }
    }

    /// A registry carrying `identity`, `gzip`, and `deflate`, all built
    /// with `config`.
    pub fn with_standard_compressors(config: CompressionConfig) -> Self {
        let mut registry = Self::identity_only();
        registry.register(Arc::new(GzipCompressor::new(config)));
        registry.register(Arc::new(DeflateCompressor::new(config)));
        registry
    }

    /// Registers (or replaces) a compressor under its own
    /// [`Compressor::encoding_name`].
    pub fn register(&mut self, compressor: Arc<dyn Compressor>) {
        self.compressors.insert(compressor.encoding_name(), compressor);
    }

    /// Looks up a compressor by its exact wire name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn Compressor>> {
        self.compressors.get(name).cloned()
    }

    /// Returns the first name in `names` that this registry supports, or
    /// `None` if the list is empty or nothing matches.
    pub fn resolve_first<'a, I>(&self, names: I) -> Option<Arc<dyn Compressor>>
    where
        I: IntoIterator<Item = &'a str>,
    {
        names.into_iter().find_map(|name| self.resolve(name))
    }

    /// The full set of supported encoding names, suitable for advertising
    /// in `grpc-accept-encoding`.
    pub fn encodings(&self) -> Vec<&'static str> {
        let mut names: Vec<_> = self.compressors.keys().copied().collect();
        names.sort_unstable();
        names
    }

    /// `grpc-accept-encoding` header value listing every supported name.
    pub fn accept_encoding_header(&self) -> String {
        self.encodings().join(",")
    }
}

impl Default for CompressorRegistry {
    fn default() -> Self {
        Self::with_standard_compressors(CompressionConfig::default())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn identity_is_always_registered() {
        let registry = CompressorRegistry::identity_only();
        assert!(registry.resolve(IDENTITY).is_some());
        assert_eq!(registry.encodings(), vec![IDENTITY]);
    }

    #[tokio::test]
    async fn resolve_first_prefers_earlier_match() {
        let registry = CompressorRegistry::with_standard_compressors(CompressionConfig::default());
        let resolved = registry.resolve_first(["lz4", "gzip", "deflate"]);
        assert_eq!(resolved.unwrap().encoding_name(), "gzip");
    }

    #[tokio::test]
    async fn resolve_first_empty_or_no_match() {
        let registry = CompressorRegistry::with_standard_compressors(CompressionConfig::default());
        assert!(registry.resolve_first(Vec::<&str>::new()).is_none());
        assert!(registry.resolve_first(["lz4", "snappy"]).is_none());
    }

    #[tokio::test]
    async fn standard_registry_has_identity_gzip_deflate() {
        let registry = CompressorRegistry::with_standard_compressors(CompressionConfig::default());
        assert_eq!(registry.encodings(), vec!["deflate", "gzip", "identity"]);
    }
}
