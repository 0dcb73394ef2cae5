//! Solver console silencing
//!
//! CBC and Gurobi print banners and iteration logs straight to the process
//! stdout, which would interleave with blend reports written to stdout. While a
//! solve runs, stdout is gagged through the `gag` crate unless the caller asked
//! to see the solver log.
//!
//! `gag` allows one live redirect per stream per process, so handles share a
//! single `Gag` through reference counting; the redirect ends when the last
//! handle is dropped.

use gag::Gag;
use std::io;
use std::sync::{Arc, Mutex, PoisonError, Weak};

/// Keeps stdout redirected while alive
pub struct GagHandle {
    _gag: Arc<Gag>,
}

impl GagHandle {
    /// Redirect stdout, sharing an existing redirect if one is active
    pub fn stdout() -> io::Result<Self> {
        STDOUT_GAG.acquire()
    }
}

/// Silence the solver for the duration of a solve unless `show_output` is set
pub fn silence_solver(show_output: bool) -> io::Result<Option<GagHandle>> {
    if show_output {
        Ok(None)
    } else {
        GagHandle::stdout().map(Some)
    }
}

struct SharedGag {
    live: Mutex<Weak<Gag>>,
}

impl SharedGag {
    const fn new() -> Self {
        Self {
            live: Mutex::new(Weak::new()),
        }
    }

    fn acquire(&self) -> io::Result<GagHandle> {
        let mut live = self.live.lock().unwrap_or_else(PoisonError::into_inner);

        if let Some(gag) = live.upgrade() {
            return Ok(GagHandle { _gag: gag });
        }

        let gag = Arc::new(Gag::stdout()?);
        *live = Arc::downgrade(&gag);

        Ok(GagHandle { _gag: gag })
    }
}

static STDOUT_GAG: SharedGag = SharedGag::new();

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    #[test]
    fn test_handles_share_one_gag() {
        let first = match GagHandle::stdout() {
            Ok(handle) => handle,
            // stdout may already be captured by the test harness
            Err(_) => return,
        };
        let second = GagHandle::stdout().expect("live gag should be shared");

        assert!(Arc::ptr_eq(&first._gag, &second._gag));
        let count = Arc::strong_count(&first._gag);
        drop(first);
        assert_eq!(Arc::strong_count(&second._gag), count - 1);
    }

    #[test]
    fn test_show_output_skips_gag() {
        let handle = silence_solver(true).expect("no redirect requested");
        assert!(handle.is_none());
    }

    #[test]
    fn test_concurrent_acquire_does_not_panic() {
        let workers: Vec<_> = (0..3)
            .map(|_| thread::spawn(|| GagHandle::stdout().is_ok()))
            .collect();

        for worker in workers {
            worker.join().expect("thread should not panic");
        }
    }
}
