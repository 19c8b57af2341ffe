//! The 5-byte gRPC frame header: a compression flag plus a big-endian
//! message length.

use bytes::{Buf, BufMut, BytesMut};

/// Exactly 5 bytes: `compressed_flag (1 byte) ++ length (4 bytes, BE)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct LengthPrefix {
    /// Whether the frame payload must be run through the negotiated
    /// compressor before it is a valid protobuf message.
    ///
    /// Per the gRPC wire spec only 0/1 are legal flag bytes; this
    /// implementation follows the documented tolerance of treating any
    /// non-zero byte as "compressed" rather than rejecting the frame, since
    /// `1` is the only value this or any other conformant writer ever
    /// emits.
    pub compressed: bool,
    pub length: u32,
}

pub const PREFIX_LEN: usize = 5;

impl LengthPrefix {
    pub fn new(compressed: bool, length: u32) -> Self {
        Self { compressed, length }
    }

    /// Parses a prefix from exactly [`PREFIX_LEN`] bytes. Panics if `buf`
    /// holds fewer than 5 bytes — callers are expected to have checked
    /// `buf.len() >= PREFIX_LEN` first, matching the reader's own
    /// accumulation discipline.
    pub fn parse(mut buf: impl Buf) -> Self {
        assert!(buf.remaining() >= PREFIX_LEN, "not enough bytes for a length prefix");
        let flag = buf.get_u8();
        let length = buf.get_u32();
        Self {
            compressed: flag != 0,
            length,
        }
    }

    /// Writes this prefix as 5 bytes into `out`. The flag byte emitted is
    /// always exactly `0` or `1`.
    pub fn write(self, out: &mut BytesMut) {
        out.put_u8(if self.compressed { 1 } else { 0 });
        out.put_u32(self.length);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn round_trips() {
        let prefix = LengthPrefix::new(true, 42);
        let mut buf = BytesMut::new();
        prefix.write(&mut buf);
        assert_eq!(buf.len(), PREFIX_LEN);
        let parsed = LengthPrefix::parse(buf.freeze());
        assert_eq!(parsed, prefix);
    }

    #[test]
    fn non_zero_non_one_flag_is_compressed() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[7, 0, 0, 0, 3]);
        let parsed = LengthPrefix::parse(buf.freeze());
        assert!(parsed.compressed);
        assert_eq!(parsed.length, 3);
    }

    #[test]
    fn zero_flag_is_uncompressed() {
        let mut buf = BytesMut::new();
        buf.extend_from_slice(&[0, 0, 0, 0, 5]);
        let parsed = LengthPrefix::parse(buf.freeze());
        assert!(!parsed.compressed);
        assert_eq!(parsed.length, 5);
    }
}
