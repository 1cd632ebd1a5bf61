//! Payload stages shared by file reads and the key-value store.
//!
//! Reads run decompress → parse, writes run serialize → compress. Each
//! stage fails with its own status and a failed stage stops the pipeline.

use std::io::{self, Read, Write};

use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use flate2::Compression;
use flate2::read::ZlibDecoder;
use flate2::write::ZlibEncoder;
use rummage_types::Status;
use serde::Serialize;
use serde::de::DeserializeOwned;

/// Deflate `data` into a zlib stream.
pub fn compress(data: &[u8]) -> io::Result<Vec<u8>> {
    let mut encoder = ZlibEncoder::new(Vec::with_capacity(data.len() / 2), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Inflate a zlib stream.
pub fn decompress(data: &[u8]) -> Result<Vec<u8>, Status> {
    let mut out = Vec::new();
    ZlibDecoder::new(data).read_to_end(&mut out).map_err(|err| {
        tracing::debug!(error = %err, "decompress stage rejected payload");
        Status::DecodeFailed
    })?;
    Ok(out)
}

/// Parse JSON bytes into `T`.
pub fn parse<T: DeserializeOwned>(data: &[u8]) -> Result<T, Status> {
    serde_json::from_slice(data).map_err(|err| {
        tracing::debug!(error = %err, "parse stage rejected payload");
        Status::ParseFailed
    })
}

/// Serialize `value` as JSON bytes.
///
/// Failures report `PARSE_FAILED`, the status of the stage this one mirrors.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<Vec<u8>, Status> {
    serde_json::to_vec(value).map_err(|err| {
        tracing::debug!(error = %err, "serialize stage rejected value");
        Status::ParseFailed
    })
}

/// Bytes to UTF-8 text, for string-only stores.
pub fn utf8(data: Vec<u8>) -> Result<String, Status> {
    String::from_utf8(data).map_err(|_| Status::DecodeFailed)
}

/// Binary payload to a string-safe form.
pub fn to_base64(data: &[u8]) -> String {
    STANDARD.encode(data)
}

pub fn from_base64(text: &str) -> Result<Vec<u8>, Status> {
    STANDARD.decode(text.trim()).map_err(|_| Status::DecodeFailed)
}
