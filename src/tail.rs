//! Live-tail source: follows a file like `tail -f`.
//!
//! The source seeks to end-of-file on open and then yields every complete
//! line appended afterwards. An empty read is not end-of-sequence; the
//! source sleeps for the poll interval and retries until its
//! [`CancelToken`] is cancelled.

use crate::stage::Stage;
use crate::{Error, Result};
use std::fs::File;
use std::io::{self, BufRead, BufReader, Seek, SeekFrom};
use std::path::Path;
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};
use std::thread;
use std::time::Duration;

/// Cloneable stop signal shared between a tail source and its controller.
#[derive(Debug, Clone, Default)]
pub struct CancelToken {
    cancelled: Arc<AtomicBool>,
}

impl CancelToken {
    pub fn new() -> Self {
        Self::default()
    }

    /// Ask every holder of this token to stop.
    pub fn cancel(&self) {
        self.cancelled.store(true, Ordering::SeqCst);
    }

    pub fn is_cancelled(&self) -> bool {
        self.cancelled.load(Ordering::SeqCst)
    }
}

/// Options for [`TailSource`].
#[derive(Debug, Clone)]
pub struct TailOptions {
    /// Sleep between read attempts when no new data is available.
    pub poll_interval: Duration,
    /// Stops the source; the pending pull then ends the sequence.
    pub cancel: CancelToken,
}

impl TailOptions {
    /// Default wait between empty reads.
    pub const DEFAULT_POLL_INTERVAL: Duration = Duration::from_millis(10);

    pub fn new() -> Self {
        Self::default()
    }

    pub fn poll_interval(mut self, interval: Duration) -> Self {
        self.poll_interval = interval;
        self
    }

    pub fn cancel_token(mut self, cancel: CancelToken) -> Self {
        self.cancel = cancel;
        self
    }
}

impl Default for TailOptions {
    fn default() -> Self {
        Self {
            poll_interval: Self::DEFAULT_POLL_INTERVAL,
            cancel: CancelToken::new(),
        }
    }
}

/// An unbounded line source over the growing end of a file.
pub struct TailSource {
    name: String,
    reader: Option<BufReader<File>>,
    pending: Vec<u8>,
    options: TailOptions,
}

impl TailSource {
    /// Open `path` and position the reader at its current end.
    pub fn open(path: &Path, options: TailOptions) -> Result<Self> {
        let mut file = File::open(path).map_err(|e| Error::open(path, e))?;
        let offset = file.seek(SeekFrom::End(0))?;
        tracing::debug!(path = %path.display(), offset, "tailing file");
        Ok(Self {
            name: format!("TAIL {}", path.display()),
            reader: Some(BufReader::new(file)),
            pending: Vec::new(),
            options,
        })
    }
}

impl Stage for TailSource {
    type Item = String;

    fn pull(&mut self) -> Result<Option<String>> {
        loop {
            if self.options.cancel.is_cancelled() {
                tracing::debug!(stage = %self.name, "tail cancelled");
                return Ok(None);
            }
            let Some(reader) = self.reader.as_mut() else {
                return Ok(None);
            };
            // A line written in several pieces, possibly split inside a
            // UTF-8 sequence, accumulates in `pending` as raw bytes.
            let read = reader.read_until(b'\n', &mut self.pending)?;
            if self.pending.ends_with(b"\n") {
                let bytes = std::mem::take(&mut self.pending);
                let line = String::from_utf8(bytes)
                    .map_err(|e| io::Error::new(io::ErrorKind::InvalidData, e))?;
                return Ok(Some(line));
            }
            if read == 0 {
                tracing::trace!(stage = %self.name, "no new data");
                thread::sleep(self.options.poll_interval);
            }
        }
    }

    fn close(&mut self) -> Result<()> {
        self.reader.take();
        Ok(())
    }

    fn name(&self) -> &str {
        &self.name
    }
}
