// Run summary export and content digests

use std::fs::File;
use std::io::{BufWriter, Read, Write};
use std::path::Path;

use sha2::{Digest, Sha256};

use foodshare_clean::RunSummary;

use crate::error::IoError;

/// SHA-256 of a file's bytes → "sha256:<64 hex>".
pub fn sha256_file(path: &Path) -> Result<String, IoError> {
    let mut file = File::open(path).map_err(|e| IoError::read(path, e))?;
    let mut hasher = Sha256::new();
    let mut buf = [0u8; 8192];
    loop {
        let n = file.read(&mut buf).map_err(|e| IoError::read(path, e))?;
        if n == 0 {
            break;
        }
        hasher.update(&buf[..n]);
    }
    Ok(format!("sha256:{:x}", hasher.finalize()))
}

/// Export the run summary as pretty JSON with a trailing newline.
pub fn write_summary(summary: &RunSummary, path: &Path) -> Result<(), IoError> {
    let file = File::create(path).map_err(|e| IoError::write(path, e))?;
    let mut writer = BufWriter::new(file);
    serde_json::to_writer_pretty(&mut writer, summary).map_err(|e| IoError::write(path, e))?;
    writer
        .write_all(b"\n")
        .and_then(|_| writer.flush())
        .map_err(|e| IoError::write(path, e))?;
    Ok(())
}
