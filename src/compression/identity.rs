use async_trait::async_trait;
use bytes::Bytes;

use super::{CompressionError, Compressor, IDENTITY};

/// The no-op compressor, always present in every [`super::CompressorRegistry`].
#[derive(Debug, Clone, Copy, Default)]
pub struct IdentityCompressor;

#[async_trait]
impl Compressor for IdentityCompressor {
    fn encoding_name(&self) -> &'static str {
        IDENTITY
    }

    async fn compress(&self, input: Bytes) -> Result<Bytes, CompressionError> {
        Ok(input)
    }

    async fn decompress(&self, input: Bytes) -> Result<Bytes, CompressionError> {
        Ok(input)
    }
}
