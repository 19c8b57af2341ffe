use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::write::{GzDecoder, GzEncoder};
use flate2::Compression;

use super::{CompressionConfig, CompressionError, Compressor};

/// Deflate wrapped in a gzip envelope, per the `gzip` content-coding.
///
/// `window_bits`/`mem_level` are accepted for parity with the other
/// deflate-family compressor and to document intent, but `flate2`'s gzip
/// writer only exposes a compression level — the window/mem-level knobs
/// take effect through [`super::DeflateCompressor`]'s raw-deflate path.
#[derive(Debug, Clone, Copy)]
pub struct GzipCompressor {
    config: CompressionConfig,
}

impl GzipCompressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }
}

impl Default for GzipCompressor {
    fn default() -> Self {
        Self::new(CompressionConfig::default())
    }
}

#[async_trait]
impl Compressor for GzipCompressor {
    fn encoding_name(&self) -> &'static str {
        "gzip"
    }

    async fn compress(&self, input: Bytes) -> Result<Bytes, CompressionError> {
        let level = Compression::new(self.config.level);
        let mut encoder = GzEncoder::new(Vec::new(), level);
        encoder
            .write_all(&input)
            .map_err(|e| CompressionError::Compress(e.to_string()))?;
        let out = encoder
            .finish()
            .map_err(|e| CompressionError::Compress(e.to_string()))?;
        Ok(Bytes::from(out))
    }

    async fn decompress(&self, input: Bytes) -> Result<Bytes, CompressionError> {
        let mut decoder = GzDecoder::new(Vec::new());
        decoder
            .write_all(&input)
            .map_err(|e| CompressionError::Decompress(e.to_string()))?;
        let out = decoder
            .finish()
            .map_err(|e| CompressionError::Decompress(e.to_string()))?;
        Ok(Bytes::from(out))
    }
}
