//! HTTP download with progress logging and SHA-256 hashing.

use std::path::Path;

use sha2::{Digest, Sha256};
use tracing::{debug, info};

use crate::error::UtilError;

/// Download a URL to a file, logging progress and computing SHA-256.
///
/// Returns the hex-encoded SHA-256 hash of the downloaded content.
///
/// # Errors
/// Returns an error if the HTTP request fails, the file cannot be written,
/// or a read error occurs during streaming.
pub fn download(url: &str, dest: &Path) -> Result<String, UtilError> {
    let download_err = |message: String| UtilError::Download {
        url: url.to_owned(),
        message,
    };

    let agent = ureq::Agent::new_with_config(
        ureq::config::Config::builder()
            .timeout_connect(Some(std::time::Duration::from_secs(30)))
            .timeout_global(Some(std::time::Duration::from_secs(600)))
            .build(),
    );

    info!(%url, "downloading");
    let response = agent.get(url).call().map_err(|e| download_err(e.to_string()))?;

    let content_length: Option<u64> = response
        .headers()
        .get("content-length")
        .and_then(|v| v.to_str().ok())
        .and_then(|s| s.parse().ok());

    let mut body = response.into_body();
    let mut reader = body.as_reader();
    let mut file =
        std::fs::File::create(dest).map_err(|source| UtilError::io("create", dest, source))?;

    let mut hasher = Sha256::new();
    let mut downloaded: u64 = 0;
    let mut last_pct: u64 = 0;
    let mut buf = vec![0u8; 64 * 1024];

    loop {
        let n = std::io::Read::read(&mut reader, &mut buf).map_err(|e| download_err(e.to_string()))?;
        if n == 0 {
            break;
        }
        let Some(chunk) = buf.get(..n) else {
            break;
        };
        std::io::Write::write_all(&mut file, chunk)
            .map_err(|source| UtilError::io("write", dest, source))?;
        hasher.update(chunk);

        downloaded = downloaded.saturating_add(n as u64);

        if let Some(total) = content_length.filter(|t| *t > 0) {
            let pct = downloaded.saturating_mul(100) / total;
            if pct != last_pct && pct % 10 == 0 {
                debug!(%url, "downloaded {pct}%");
                last_pct = pct;
            }
        }
    }

    let kb = downloaded / 1024;
    info!(%url, "downloaded {kb} KiB");

    Ok(format!("{:x}", hasher.finalize()))
}
