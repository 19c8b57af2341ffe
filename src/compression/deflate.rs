use std::io::Write;

use async_trait::async_trait;
use bytes::Bytes;
use flate2::write::{DeflateDecoder, DeflateEncoder};
use flate2::Compression;

use super::{CompressionConfig, CompressionError, Compressor};

/// Raw DEFLATE (no zlib or gzip envelope), per the `deflate` content-coding.
#[derive(Debug, Clone, Copy)]
pub struct DeflateCompressor {
    config: CompressionConfig,
}

impl DeflateCompressor {
    pub fn new(config: CompressionConfig) -> Self {
        Self { config }
    }
}

impl Default for DeflateCompressor {
    fn default() -> Self {
        Self::new(CompressionConfig::default())
    }
}

#[async_trait]
impl Compressor for DeflateCompressor {
    fn encoding_name(&self) -> &'static str {
        "deflate"
    }

    async fn compress(&self, input: Bytes) -> Result<Bytes, CompressionError> {
        let level = Compression::new(self.config.level);
        let mut encoder = DeflateEncoder::new(Vec::new(), level);
        encoder
            .write_all(&input)
            .map_err(|e| CompressionError::Compress(e.to_string()))?;
        let out = encoder
            .finish()
            .map_err(|e| CompressionError::Compress(e.to_string()))?;
        Ok(Bytes::from(out))
    }

    async fn decompress(&self, input: Bytes) -> Result<Bytes, CompressionError> {
        let mut decoder = DeflateDecoder::new(Vec::new());
        decoder
            .write_all(&input)
            .map_err(|e| CompressionError::Decompress(e.to_string()))?;
        let out = decoder
            .finish()
            .map_err(|e| CompressionError::Decompress(e.to_string()))?;
        Ok(Bytes::from(out))
    }
}
