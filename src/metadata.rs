//! Inbound (read-only) and outbound (mutable) metadata views over an HTTP
//! header/trailer map, including the `*-bin` binary-metadata convention and
//! the handful of headers gRPC gives special meaning.

use std::time::Duration;

use base64::Engine;
use http::{HeaderMap, HeaderName, HeaderValue};

const BIN_SUFFIX: &str = "-bin";

// base64 standard alphabet, no padding — the encoding gRPC mandates for
// `*-bin` metadata values.
fn b64() -> base64::engine::GeneralPurpose {
    base64::engine::GeneralPurpose::new(
        &base64::alphabet::STANDARD,
        base64::engine::GeneralPurposeConfig::new()
            .with_encode_padding(false)
            .with_decode_padding_mode(base64::engine::DecodePaddingMode::Indifferent),
    )
}

fn bin_name(name: &str) -> String {
    if name.ends_with(BIN_SUFFIX) {
        name.to_string()
    } else {
        format!("{name}{BIN_SUFFIX}")
    }
}

/// A read-only view over an inbound header or trailer map.
///
/// Lookups are case-insensitive (headers are ASCII case-insensitive by
/// construction of [`http::HeaderMap`]); iteration order is never
/// meaningful and must not be relied upon.
#[derive(Debug, Clone)]
pub struct Metadata {
    inner: HeaderMap,
}

/// The gRPC unit suffix on a `grpc-timeout` value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TimeoutUnit {
    Hours,
    Minutes,
    Seconds,
    Millis,
    Micros,
    Nanos,
}

impl TimeoutUnit {
    fn from_char(c: char) -> Option<Self> {
        Some(match c {
            'H' => Self::Hours,
            'M' => Self::Minutes,
            'S' => Self::Seconds,
            'm' => Self::Millis,
            'u' => Self::Micros,
            'n' => Self::Nanos,
            _ => return None,
        })
    }

    fn to_duration(self, value: u64) -> Duration {
        match self {
            Self::Hours => Duration::from_secs(value.saturating_mul(3600)),
            Self::Minutes => Duration::from_secs(value.saturating_mul(60)),
            Self::Seconds => Duration::from_secs(value),
            Self::Millis => Duration::from_millis(value),
            Self::Micros => Duration::from_micros(value),
            Self::Nanos => Duration::from_nanos(value),
        }
    }
}

/// The largest magnitude the `grpc-timeout` grammar allows: 8 decimal
/// digits, i.e. up to 99,999,999 of whatever unit is given.
const MAX_TIMEOUT_DIGITS: usize = 8;
const MAX_TIMEOUT_VALUE: u64 = 99_999_999;

/// Parses a `grpc-timeout` header value of the form `<digits><unit>`.
pub fn parse_grpc_timeout(raw: &str) -> Option<Duration> {
    let unit_char = raw.chars().last()?;
    let unit = TimeoutUnit::from_char(unit_char)?;
    let digits = &raw[..raw.len() - unit_char.len_utf8()];

    if digits.is_empty() || digits.len() > MAX_TIMEOUT_DIGITS || !digits.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let value: u64 = digits.parse().ok()?;
    if value > MAX_TIMEOUT_VALUE {
        return None;
    }

    Some(unit.to_duration(value))
}

impl Metadata {
    pub fn from_header_map(inner: HeaderMap) -> Self {
        Self { inner }
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.inner
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.inner
    }

    /// Whether any stored plain-value entry has this (case-insensitive)
    /// name.
    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    /// The first plain-text value stored under `name`, if any and if it is
    /// valid UTF-8.
    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|v| v.to_str().ok())
    }

    /// All plain-text values stored under `name`, in insertion order.
    pub fn get_all<'a>(&'a self, name: &str) -> impl Iterator<Item = &'a str> + 'a {
        self.inner.get_all(name).iter().filter_map(|v| v.to_str().ok())
    }

    /// Decodes the base64(no-pad) binary value stored under `name`. The
    /// caller passes the *bare* name (e.g. `"trace"`); the `-bin` suffix is
    /// appended automatically.
    pub fn get_binary(&self, name: &str) -> Option<Vec<u8>> {
        let full = bin_name(name);
        let raw = self.inner.get(&full)?.as_bytes();
        b64().decode(raw).ok()
    }

    /// Whether the decoded binary value under `name` equals `expected`.
    pub fn contains_binary(&self, name: &str, expected: &[u8]) -> bool {
        self.get_binary(name).as_deref() == Some(expected)
    }

    /// The `accept-encoding` header, split on commas and trimmed.
    pub fn accept_encoding(&self) -> Vec<String> {
        self.get("accept-encoding")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// The `grpc-accept-encoding` header (client-advertised decoders),
    /// split the same way as `accept-encoding`.
    pub fn grpc_accept_encoding(&self) -> Vec<String> {
        self.get("grpc-accept-encoding")
            .map(|v| v.split(',').map(|s| s.trim().to_string()).filter(|s| !s.is_empty()).collect())
            .unwrap_or_default()
    }

    /// The single `grpc-encoding` token naming the inbound compressor, if
    /// present.
    pub fn grpc_encoding(&self) -> Option<&str> {
        self.get("grpc-encoding")
    }

    /// The informational `grpc-message-type` header.
    pub fn grpc_message_type(&self) -> Option<&str> {
        self.get("grpc-message-type")
    }

    /// The parsed `grpc-timeout` deadline, if present and well-formed.
    pub fn grpc_timeout(&self) -> Option<Duration> {
        self.get("grpc-timeout").and_then(parse_grpc_timeout)
    }

    /// The `grpc-status` trailer as an integer (for responses).
    pub fn grpc_status_code(&self) -> Option<u32> {
        self.get("grpc-status").and_then(|v| v.parse().ok())
    }

    /// The `grpc-message` trailer, percent-decoded is not performed here —
    /// gRPC message text is carried as UTF-8 directly per the core spec
    /// (percent-encoding is a client-library concern out of scope for this
    /// core).
    pub fn grpc_message(&self) -> Option<&str> {
        self.get("grpc-message")
    }
}

/// A mutable metadata view for building outbound headers or trailers.
#[derive(Debug, Clone, Default)]
pub struct MetadataMut {
    inner: HeaderMap,
}

impl MetadataMut {
    pub fn new() -> Self {
        Self { inner: HeaderMap::new() }
    }

    pub fn into_header_map(self) -> HeaderMap {
        self.inner
    }

    pub fn header_map(&self) -> &HeaderMap {
        &self.inner
    }

    pub fn header_map_mut(&mut self) -> &mut HeaderMap {
        &mut self.inner
    }

    pub fn contains(&self, name: &str) -> bool {
        self.inner.contains_key(name)
    }

    pub fn get(&self, name: &str) -> Option<&str> {
        self.inner.get(name).and_then(|v| v.to_str().ok())
    }

    /// Appends a plain-text value. Multiple calls with the same name append
    /// additional values rather than overwriting.
    pub fn add(&mut self, name: &str, value: &str) -> Result<(), InvalidMetadataValue> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| InvalidMetadataValue)?;
        let value = HeaderValue::from_str(value).map_err(|_| InvalidMetadataValue)?;
        self.inner.append(name, value);
        Ok(())
    }

    /// Replaces all values stored under `name` with a single `value`.
    pub fn set(&mut self, name: &str, value: &str) -> Result<(), InvalidMetadataValue> {
        let name = HeaderName::from_bytes(name.as_bytes()).map_err(|_| InvalidMetadataValue)?;
        let value = HeaderValue::from_str(value).map_err(|_| InvalidMetadataValue)?;
        self.inner.insert(name, value);
        Ok(())
    }

    /// Appends a binary value, base64(no-pad)-encoding it and writing it
    /// under `name` + `-bin`. Callers never write the suffix themselves.
    pub fn add_binary(&mut self, name: &str, value: &[u8]) -> Result<(), InvalidMetadataValue> {
        let full = bin_name(name);
        let encoded = b64().encode(value);
        self.add(&full, &encoded)
    }

    pub fn set_binary(&mut self, name: &str, value: &[u8]) -> Result<(), InvalidMetadataValue> {
        let full = bin_name(name);
        let encoded = b64().encode(value);
        self.set(&full, &encoded)
    }

    pub fn get_binary(&self, name: &str) -> Option<Vec<u8>> {
        let full = bin_name(name);
        let raw = self.inner.get(&full)?.as_bytes();
        b64().decode(raw).ok()
    }

    pub fn remove(&mut self, name: &str) {
        self.inner.remove(name);
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, thiserror::Error)]
#[error("metadata name or value is not a valid ASCII header token")]
pub struct InvalidMetadataValue;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn case_insensitive_contains() {
        let mut map = HeaderMap::new();
        map.insert("X-Request-Id", HeaderValue::from_static("abc"));
        let md = Metadata::from_header_map(map);
        assert!(md.contains("x-request-id"));
        assert!(md.contains("X-REQUEST-ID"));
    }

    #[test]
    fn binary_round_trip() {
        let mut mut_md = MetadataMut::new();
        mut_md.add_binary("trace", &[1, 2, 3, 4]).unwrap();
        assert!(mut_md.header_map().contains_key("trace-bin"));

        let md = Metadata::from_header_map(mut_md.into_header_map());
        assert_eq!(md.get_binary("trace"), Some(vec![1, 2, 3, 4]));
        assert!(md.contains_binary("trace", &[1, 2, 3, 4]));
        assert!(!md.contains_binary("trace", &[1, 2, 3]));
    }

    #[test]
    fn add_binary_is_idempotent_on_suffix() {
        let mut mut_md = MetadataMut::new();
        // Passing the suffix explicitly should not double it up.
        mut_md.add_binary("trace-bin", &[9]).unwrap();
        let keys: Vec<_> = mut_md.header_map().keys().map(|k| k.as_str().to_string()).collect();
        assert_eq!(keys, vec!["trace-bin"]);
    }

    #[test]
    fn accept_encoding_parses_csv() {
        let mut map = HeaderMap::new();
        map.insert("accept-encoding", HeaderValue::from_static("gzip, deflate,identity"));
        let md = Metadata::from_header_map(map);
        assert_eq!(md.accept_encoding(), vec!["gzip", "deflate", "identity"]);
    }

    #[test]
    fn grpc_timeout_parses_units() {
        assert_eq!(parse_grpc_timeout("10S"), Some(Duration::from_secs(10)));
        assert_eq!(parse_grpc_timeout("500m"), Some(Duration::from_millis(500)));
        assert_eq!(parse_grpc_timeout("1H"), Some(Duration::from_secs(3600)));
        assert_eq!(parse_grpc_timeout("2M"), Some(Duration::from_secs(120)));
        assert_eq!(parse_grpc_timeout("3u"), Some(Duration::from_micros(3)));
        assert_eq!(parse_grpc_timeout("4n"), Some(Duration::from_nanos(4)));
    }

    #[test]
    fn grpc_timeout_rejects_malformed() {
        assert_eq!(parse_grpc_timeout(""), None);
        assert_eq!(parse_grpc_timeout("S"), None);
        assert_eq!(parse_grpc_timeout("12X"), None);
        assert_eq!(parse_grpc_timeout("123456789S"), None); // 9 digits, too many
        assert_eq!(parse_grpc_timeout("99999999S"), Some(Duration::from_secs(99_999_999)));
        assert_eq!(parse_grpc_timeout("100000000S"), None); // too many digits anyway
    }

    #[test]
    fn grpc_status_and_message_trailers() {
        let mut map = HeaderMap::new();
        map.insert("grpc-status", HeaderValue::from_static("5"));
        map.insert("grpc-message", HeaderValue::from_static("no such row"));
        let md = Metadata::from_header_map(map);
        assert_eq!(md.grpc_status_code(), Some(5));
        assert_eq!(md.grpc_message(), Some("no such row"));
    }
}
