//! Raw byte access to the listing table, from disk or over HTTP.

use crate::error::Result;
use flate2::read::GzDecoder;
use std::io::Read;
use tracing::debug;

const GZIP_MAGIC: [u8; 2] = [0x1f, 0x8b];

pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let resp = reqwest::blocking::get(url)?.error_for_status()?;
    Ok(resp.bytes()?.to_vec())
}

/// Loads table bytes from a local file path or fetches them over HTTP,
/// decompressing gzip input.
#[tracing::instrument]
pub fn load_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(source)?
    } else {
        std::fs::read(source)?
    };
    debug!(bytes = bytes.len(), "Source bytes loaded");
    maybe_gunzip(bytes)
}

/// Decompresses `bytes` if they carry the gzip magic header.
pub fn maybe_gunzip(bytes: Vec<u8>) -> Result<Vec<u8>> {
    if !bytes.starts_with(&GZIP_MAGIC) {
        return Ok(bytes);
    }
    let mut decoder = GzDecoder::new(bytes.as_slice());
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    debug!(bytes = out.len(), "Source decompressed");
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use flate2::Compression;
    use flate2::write::GzEncoder;
    use std::io::Write;

    #[test]
    fn test_plain_bytes_pass_through() {
        let bytes = b"price,brand\n".to_vec();
        assert_eq!(maybe_gunzip(bytes.clone()).unwrap(), bytes);
    }

    #[test]
    fn test_gzip_bytes_are_decompressed() {
        let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
        encoder.write_all(b"price,brand\n100,audi\n").unwrap();
        let compressed = encoder.finish().unwrap();

        let out = maybe_gunzip(compressed).unwrap();
        assert_eq!(out, b"price,brand\n100,audi\n");
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let err = load_source("/nonexistent/autos.csv").unwrap_err();
        assert!(matches!(err, crate::error::Error::Io(_)));
    }
}
