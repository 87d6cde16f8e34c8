//! Source retrieval from local paths or HTTP(S) URLs.

use tracing::debug;

use crate::error::{Error, Result};

/// Downloads `url` with a blocking client.
pub fn fetch_bytes(url: &str) -> Result<Vec<u8>> {
    let fetch_err = |source| Error::Fetch {
        url: url.to_string(),
        source,
    };
    let resp = reqwest::blocking::get(url)
        .and_then(|r| r.error_for_status())
        .map_err(fetch_err)?;
    Ok(resp.bytes().map_err(fetch_err)?.to_vec())
}

/// Reads a source given as a local path or an `http(s)://` URL.
#[tracing::instrument]
pub fn read_source(source: &str) -> Result<Vec<u8>> {
    let bytes = if source.starts_with("http://") || source.starts_with("https://") {
        fetch_bytes(source)?
    } else {
        std::fs::read(source).map_err(|e| Error::io(source, e))?
    };
    debug!(bytes = bytes.len(), "Source read");
    Ok(bytes)
}
