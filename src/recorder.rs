// ===============================
// src/recorder.rs
// ===============================
//
// JSONL audit recorder:
// - Writes every Event as one JSON line.
// - Buffered through BufWriter; flushed every FLUSH_EVERY_N_EVENTS and on finish.
// - Creates the parent directory if it does not exist yet.
// - Truncates an existing file: one run, one trail.
//
// Enabled with `--record-file` or `RECORD_FILE=/path/to/events.jsonl`.
//
use std::fs::{self, File, OpenOptions};
use std::io::{BufWriter, Write};
use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, info};

use crate::domain::Event;

const FLUSH_EVERY_N_EVENTS: u32 = 1000;

#[derive(Debug, Error)]
pub enum RecorderError {
    #[error("recorder: open {path} failed: {source}")]
    Open { path: PathBuf, #[source] source: std::io::Error },
    #[error("recorder: serialize error: {0}")]
    Serialize(#[from] serde_json::Error),
    #[error("recorder: write {path} failed: {source}")]
    Write { path: PathBuf, #[source] source: std::io::Error },
}

pub struct Recorder {
    path: PathBuf,
    writer: BufWriter<File>,
    since_last_flush: u32,
    written: u64,
}

impl Recorder {
    pub fn create(path: &Path) -> Result<Self, RecorderError> {
        let open_err = |source: std::io::Error| RecorderError::Open { path: path.to_path_buf(), source };
        if let Some(parent) = path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(open_err)?;
            }
        }
        let file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .open(path)
            .map_err(open_err)?;
        info!(path = %path.display(), "recorder: started");
        Ok(Self { path: path.to_path_buf(), writer: BufWriter::new(file), since_last_flush: 0, written: 0 })
    }

    pub fn record(&mut self, ev: &Event) -> Result<(), RecorderError> {
        let line = serde_json::to_string(ev)?;
        self.write_line(line.as_bytes())?;
        self.written += 1;
        self.since_last_flush += 1;
        if self.since_last_flush >= FLUSH_EVERY_N_EVENTS {
            self.flush()?;
        }
        Ok(())
    }

    pub fn finish(mut self) -> Result<u64, RecorderError> {
        self.flush()?;
        info!(path = %self.path.display(), events = self.written, "recorder: stopped");
        Ok(self.written)
    }

    fn write_line(&mut self, bytes: &[u8]) -> Result<(), RecorderError> {
        self.writer
            .write_all(bytes)
            .and_then(|_| self.writer.write_all(b"\n"))
            .map_err(|source| RecorderError::Write { path: self.path.clone(), source })
    }

    fn flush(&mut self) -> Result<(), RecorderError> {
        debug!(pending = self.since_last_flush, "recorder: flush");
        self.since_last_flush = 0;
        self.writer.flush().map_err(|source| RecorderError::Write { path: self.path.clone(), source })
    }
}
