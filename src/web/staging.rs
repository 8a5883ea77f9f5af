//! Upload staging
//!
//! When a staging directory is configured, each upload is written to its own
//! temp file before decoding. Names are unique per request and the file is
//! removed when the handle drops.

use std::io::Write;
use std::path::Path;
use tempfile::NamedTempFile;
use uuid::Uuid;

/// Write `data` to a fresh temp file under `dir`
pub fn stage_upload(dir: &Path, request_id: Uuid, data: &[u8]) -> std::io::Result<NamedTempFile> {
    std::fs::create_dir_all(dir)?;

    let mut file = tempfile::Builder::new()
        .prefix(&format!("upload-{}-", request_id))
        .tempfile_in(dir)?;
    file.write_all(data)?;
    file.flush()?;

    Ok(file)
}

/// Stage `data` and read it back from disk
pub fn stage_and_read(dir: &Path, request_id: Uuid, data: &[u8]) -> std::io::Result<Vec<u8>> {
    let staged = stage_upload(dir, request_id, data)?;
    tracing::debug!(path = %staged.path().display(), "Upload staged");
    std::fs::read(staged.path())
}
