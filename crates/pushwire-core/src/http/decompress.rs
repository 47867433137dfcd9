//! Transparent decoding of compressed response bodies

use flate2::read::{DeflateDecoder, MultiGzDecoder, ZlibDecoder};
use std::io::{self, Read};

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

/// Content encodings the transport decodes
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContentEncoding {
    Gzip,
    Deflate,
    Compress,
}

impl ContentEncoding {
    /// Parse a `Content-Encoding` header value
    pub fn parse(value: &str) -> Option<Self> {
        match value.trim().to_ascii_lowercase().as_str() {
            "gzip" | "x-gzip" => Some(ContentEncoding::Gzip),
            "deflate" => Some(ContentEncoding::Deflate),
            "compress" | "x-compress" => Some(ContentEncoding::Compress),
            _ => None,
        }
    }
}

/// Decode `body`, detecting gzip and zlib framing from the stream header
///
/// All three encodings go through the same detection, since servers label
/// zlib-wrapped, raw deflate and gzip payloads inconsistently.
pub fn decode(body: &[u8]) -> io::Result<Vec<u8>> {
    if body.is_empty() {
        return Ok(Vec::new());
    }

    let mut decoded = Vec::new();
    if body.starts_with(&GZIP_MAGIC) {
        MultiGzDecoder::new(body).read_to_end(&mut decoded)?;
        return Ok(decoded);
    }

    match ZlibDecoder::new(body).read_to_end(&mut decoded) {
        Ok(_) => Ok(decoded),
        Err(_) => {
            decoded.clear();
            DeflateDecoder::new(body).read_to_end(&mut decoded)?;
            Ok(decoded)
        }
    }
}
