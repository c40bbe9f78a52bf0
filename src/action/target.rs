// src/action/target.rs

//! Output destination for an action's callback.

use std::fmt;
use std::fs::File;
use std::io::{self, Write};
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

use tracing::{debug, warn};

use crate::errors::{Result, TriplineError};

type SharedWriter = Arc<Mutex<Option<Box<dyn Write + Send>>>>;

/// Write handle given to callbacks.
///
/// Cheap to clone; every clone writes to the same destination. Each `write`
/// call locks the destination for that call only, so two triggers firing at
/// once may interleave their writes. Once the owning [`OutputTarget`] has
/// released its file, writes fail with `BrokenPipe`.
#[derive(Clone)]
pub struct Output {
    inner: SharedWriter,
}

impl Output {
    fn new(writer: Box<dyn Write + Send>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(Some(writer))),
        }
    }

    // A callback that panicked mid-write leaves the writer usable.
    fn lock(&self) -> MutexGuard<'_, Option<Box<dyn Write + Send>>> {
        self.inner.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Take the writer out, flush and drop it. `None` if it was already
    /// gone.
    fn close(&self) -> Option<io::Result<()>> {
        let mut writer = self.lock().take()?;
        Some(writer.flush())
    }
}

impl fmt::Debug for Output {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Output").finish_non_exhaustive()
    }
}

impl Write for Output {
    fn write(&mut self, buf: &[u8]) -> io::Result<usize> {
        match self.lock().as_mut() {
            Some(writer) => writer.write(buf),
            None => Err(io::Error::new(
                io::ErrorKind::BrokenPipe,
                "output target already released",
            )),
        }
    }

    fn flush(&mut self) -> io::Result<()> {
        match self.lock().as_mut() {
            Some(writer) => writer.flush(),
            None => Ok(()),
        }
    }
}

/// Where an action writes, plus the file it owns if it opened one itself.
pub struct OutputTarget {
    output: Output,
    owned: Option<PathBuf>,
}

impl Default for OutputTarget {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for OutputTarget {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OutputTarget")
            .field("owned", &self.owned)
            .finish_non_exhaustive()
    }
}

impl OutputTarget {
    /// Target writing to the process stdout.
    pub fn new() -> Self {
        Self {
            output: Output::new(Box::new(io::stdout())),
            owned: None,
        }
    }

    /// Write to a sink owned by the caller. Nothing is closed on release.
    pub fn to_writer(&mut self, writer: impl Write + Send + 'static) {
        self.output = Output::new(Box::new(writer));
        self.owned = None;
    }

    /// Create (or truncate) `path` right away and write to it.
    ///
    /// The file is owned by this target and closed by
    /// [`OutputTarget::release_if_owned`].
    pub fn to_file(&mut self, path: impl AsRef<Path>) -> Result<()> {
        let path = path.as_ref();
        let file = File::create(path).map_err(|source| TriplineError::OutputFile {
            path: path.to_path_buf(),
            source,
        })?;

        debug!(path = ?path, "output file created");
        self.output = Output::new(Box::new(file));
        self.owned = Some(path.to_path_buf());
        Ok(())
    }

    /// Handle to give to the callback.
    pub fn output(&self) -> Output {
        self.output.clone()
    }

    /// Path of the owned file, if any.
    pub fn owned_path(&self) -> Option<&Path> {
        self.owned.as_deref()
    }

    /// Close the owned file, if there is one and it is still open.
    ///
    /// Returns true only for the call that actually closed it.
    pub fn release_if_owned(&self) -> bool {
        let Some(path) = &self.owned else {
            return false;
        };

        match self.output.close() {
            Some(Ok(())) => {
                debug!(path = ?path, "output file released");
                true
            }
            Some(Err(err)) => {
                warn!(path = ?path, error = %err, "failed to flush output file on release");
                true
            }
            None => false,
        }
    }
}
