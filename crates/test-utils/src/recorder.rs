use std::sync::{Arc, Mutex};
use std::time::Duration;

use tokio::time::Instant;
use tripline::action::{Callback, Output};

/// Records the (tokio clock) instant of every firing.
#[derive(Clone, Default)]
pub struct FiringRecorder {
    times: Arc<Mutex<Vec<Instant>>>,
}

impl FiringRecorder {
    pub fn new() -> Self {
        Self::default()
    }

    /// Callback that records a firing and writes nothing.
    pub fn callback(&self) -> Callback {
        let times = Arc::clone(&self.times);
        Arc::new(move |_out: &mut Output| -> anyhow::Result<()> {
            times.lock().unwrap().push(Instant::now());
            Ok(())
        })
    }

    /// Callback that records a firing and then fails with `message`.
    pub fn failing_callback(&self, message: &'static str) -> Callback {
        let times = Arc::clone(&self.times);
        Arc::new(move |_out: &mut Output| -> anyhow::Result<()> {
            times.lock().unwrap().push(Instant::now());
            anyhow::bail!(message)
        })
    }

    pub fn count(&self) -> usize {
        self.times.lock().unwrap().len()
    }

    pub fn times(&self) -> Vec<Instant> {
        self.times.lock().unwrap().clone()
    }

    /// Firing times relative to `start`.
    pub fn offsets_from(&self, start: Instant) -> Vec<Duration> {
        self.times()
            .into_iter()
            .map(|t| t.saturating_duration_since(start))
            .collect()
    }
}

/// Assert that `actual` is within `tolerance` of `expected`.
pub fn assert_within(actual: Duration, expected: Duration, tolerance: Duration) {
    let diff = if actual > expected {
        actual - expected
    } else {
        expected - actual
    };
    assert!(
        diff <= tolerance,
        "expected {:?} to be within {:?} of {:?} (off by {:?})",
        actual,
        tolerance,
        expected,
        diff
    );
}

/// In-memory sink that can be handed to `to_writer` and read back later.
#[derive(Clone, Default)]
pub struct SharedBuffer {
    bytes: Arc<Mutex<Vec<u8>>>,
}

impl SharedBuffer {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn contents(&self) -> String {
        String::from_utf8_lossy(&self.bytes.lock().unwrap()).into_owned()
    }
}

impl std::io::Write for SharedBuffer {
    fn write(&mut self, buf: &[u8]) -> std::io::Result<usize> {
        self.bytes.lock().unwrap().extend_from_slice(buf);
        Ok(buf.len())
    }

    fn flush(&mut self) -> std::io::Result<()> {
        Ok(())
    }
}
