//! Flat-file ledger of already-relayed video ids.
//!
//! One id per line, append-only. Membership testing is the only read; the only
//! mutation is appending a single id. Single-writer usage is assumed, so no
//! locking.

use std::fs::{File, OpenOptions};
use std::io::{self, BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use tracing::debug;

pub struct UploadLedger {
    path: PathBuf,
}

impl UploadLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        UploadLedger { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// True iff some line of the ledger file is exactly `id`. A missing file
    /// means nothing has been uploaded yet, not an error.
    pub fn contains(&self, id: &str) -> io::Result<bool> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == io::ErrorKind::NotFound => return Ok(false),
            Err(e) => return Err(e),
        };
        for line in BufReader::new(file).lines() {
            if line? == id {
                return Ok(true);
            }
        }
        Ok(false)
    }

    /// Appends `id\n`, creating the file if absent. Synced to disk before
    /// returning so the mark survives the process exiting right after.
    pub fn record(&self, id: &str) -> io::Result<()> {
        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        writeln!(file, "{id}")?;
        file.sync_all()?;
        debug!(id = id, path = %self.path.display(), "Recorded video id in ledger");
        Ok(())
    }
}
