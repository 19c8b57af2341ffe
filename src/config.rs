//! Process-wide configuration shared, read-only, by every exchange.

use std::sync::Arc;

use crate::codec::reader::DEFAULT_MAX_FRAME_LENGTH;
use crate::compression::{CompressionConfig, CompressorRegistry};

/// Built once at startup and handed to every exchange as `Arc<RuntimeConfig>`.
/// Never mutated after construction — the compressor registry in particular
/// must stay safe for concurrent reads across every in-flight exchange.
#[derive(Clone)]
pub struct RuntimeConfig {
    pub compressors: Arc<CompressorRegistry>,
    /// The outbound encoding used when the client's `grpc-accept-encoding`
    /// does not (or the request lacks it) pin down a preference. `None`
    /// means `identity`.
    pub default_outbound_encoding: Option<&'static str>,
    /// No single frame's declared payload length may exceed this, across
    /// both requests and responses. Guards against an attacker-controlled
    /// length prefix driving an unbounded allocation.
    pub max_frame_length: u32,
}

impl RuntimeConfig {
    pub fn new(compressors: CompressorRegistry) -> Self {
        Self {
            compressors: Arc::new(compressors),
            default_outbound_encoding: None,
            max_frame_length: DEFAULT_MAX_FRAME_LENGTH,
        }
    }

    pub fn with_default_outbound_encoding(mut self, encoding: &'static str) -> Self {
        self.default_outbound_encoding = Some(encoding);
        self
    }

    pub fn with_max_frame_length(mut self, max_frame_length: u32) -> Self {
        self.max_frame_length = max_frame_length;
        self
    }
}

impl Default for RuntimeConfig {
    fn default() -> Self {
        Self::new(CompressorRegistry::with_standard_compressors(CompressionConfig::default()))
    }
}
