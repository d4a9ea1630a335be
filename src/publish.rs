//! All-or-nothing playlist publishing
//!
//! Content is written to a temporary file in the destination directory and
//! renamed over the destination, so readers see either the previous file or
//! the complete new one.

use std::io::{ErrorKind, Write};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tempfile::NamedTempFile;
use tracing::{info, warn};

use crate::config::OutputConfig;
use crate::errors::{AppError, AppResult, PersistenceError};
use crate::utils::HttpTransport;
use crate::utils::url::UrlUtils;

fn parent_dir(path: &Path) -> PathBuf {
    match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir.to_path_buf(),
        _ => PathBuf::from("."),
    }
}

/// Replace `path` with `contents` atomically
pub fn write_atomic(path: &Path, contents: &str) -> Result<(), PersistenceError> {
    let dir = parent_dir(path);
    let mut temp = NamedTempFile::new_in(&dir).map_err(|e| PersistenceError::io(&dir, e))?;

    temp.write_all(contents.as_bytes())
        .and_then(|_| temp.flush())
        .and_then(|_| temp.as_file().sync_all())
        .map_err(|e| PersistenceError::io(temp.path(), e))?;

    temp.persist(path)
        .map_err(|e| PersistenceError::io(path, e.error))?;
    Ok(())
}

/// [`write_atomic`] on the blocking pool
pub async fn publish(path: &Path, contents: String) -> AppResult<()> {
    let destination = path.to_path_buf();
    let bytes = contents.len();
    tokio::task::spawn_blocking(move || write_atomic(&destination, &contents))
        .await
        .map_err(|e| AppError::internal(format!("Publish task failed: {e}")))??;

    info!("Published {} ({} KB)", path.display(), bytes / 1024);
    Ok(())
}

/// `existing` cut at `marker`, followed by the marker and `appendix`
///
/// Any previous appendix after the marker is discarded. Content without a
/// marker is kept verbatim. The result has no trailing newline.
pub fn splice_appendix(existing: &str, marker: &str, appendix: &str) -> String {
    let base = match existing.find(marker) {
        Some(position) => existing[..position].trim_end(),
        None => existing,
    };
    let tail = format!("{marker}\n\n{}", appendix.trim());
    format!("{base}\n{}", tail.trim())
}

async fn read_existing(path: &Path) -> Result<String, PersistenceError> {
    match tokio::fs::read_to_string(path).await {
        Ok(contents) => Ok(contents),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(String::new()),
        Err(e) if e.kind() == ErrorKind::InvalidData => Err(PersistenceError::Encoding {
            path: path.to_path_buf(),
        }),
        Err(e) => Err(PersistenceError::io(path, e)),
    }
}

/// Fetch the configured appendix playlist and splice it into the output file
///
/// Returns `Ok(false)` without touching the file when the fetch fails.
pub async fn publish_appendix(
    transport: &dyn HttpTransport,
    output: &OutputConfig,
    timeout: Duration,
) -> AppResult<bool> {
    let existing = read_existing(&output.path).await?;

    let appendix = match transport.fetch_text(&output.appendix_url, timeout).await {
        Ok(text) => text,
        Err(e) => {
            warn!(
                "Appendix fetch failed, {} left unchanged: {} - {}",
                output.path.display(),
                UrlUtils::obfuscate_credentials(&output.appendix_url),
                e
            );
            return Ok(false);
        }
    };

    let contents = splice_appendix(&existing, &output.appendix_marker, &appendix);
    publish(&output.path, contents).await?;
    Ok(true)
}
