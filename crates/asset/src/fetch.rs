//! Background file reads with a per-request size cap.
//!
//! Each request reads on its own worker thread. Completions are queued on a
//! channel and only surface when the owner calls [`Fetcher::poll`], so the
//! frame loop decides when results are observed.

use std::fs::File;
use std::io::{self, Read};
use std::path::{Path, PathBuf};
use std::thread;

use thiserror::Error;

/// Buffer cap for skeleton archives.
pub const SKELETON_CAPACITY: usize = 4 * 1024;
/// Buffer cap for animation archives.
pub const ANIMATION_CAPACITY: usize = 32 * 1024;

#[derive(Debug, Error)]
pub enum FetchError {
    #[error("failed to read {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("{path:?} does not fit its {capacity} byte buffer")]
    CapacityExceeded { path: PathBuf, capacity: usize },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub struct FetchId(u32);

#[derive(Debug)]
pub struct FetchResponse {
    pub id: FetchId,
    pub result: Result<Vec<u8>, FetchError>,
}

pub struct Fetcher {
    tx: flume::Sender<FetchResponse>,
    rx: flume::Receiver<FetchResponse>,
    next_id: u32,
    in_flight: usize,
}

impl Default for Fetcher {
    fn default() -> Self {
        Self::new()
    }
}

impl Fetcher {
    pub fn new() -> Self {
        let (tx, rx) = flume::unbounded();
        Self {
            tx,
            rx,
            next_id: 0,
            in_flight: 0,
        }
    }

    /// Start reading `path`; files larger than `capacity` bytes fail.
    pub fn send(&mut self, path: impl Into<PathBuf>, capacity: usize) -> FetchId {
        let path = path.into();
        let id = FetchId(self.next_id);
        self.next_id += 1;
        self.in_flight += 1;
        log::debug!("Fetching {:?} (cap {} bytes)", path, capacity);

        let tx = self.tx.clone();
        let worker_path = path.clone();
        let spawned = thread::Builder::new()
            .name(format!("fetch-{}", id.0))
            .spawn(move || {
                let result = read_capped(&worker_path, capacity);
                // receiver gone means the app is shutting down
                let _ = tx.send(FetchResponse { id, result });
            });

        if let Err(source) = spawned {
            let _ = self.tx.send(FetchResponse {
                id,
                result: Err(FetchError::Io { path, source }),
            });
        }
        id
    }

    /// Drain completions that arrived since the previous call.
    pub fn poll(&mut self) -> Vec<FetchResponse> {
        let done: Vec<FetchResponse> = self.rx.try_iter().collect();
        self.in_flight -= done.len();
        done
    }

    #[inline]
    pub fn in_flight(&self) -> usize {
        self.in_flight
    }
}

/// Read a whole file, failing if it holds more than `capacity` bytes.
pub fn read_capped(path: &Path, capacity: usize) -> Result<Vec<u8>, FetchError> {
    let io_err = |source| FetchError::Io {
        path: path.to_path_buf(),
        source,
    };
    let file = File::open(path).map_err(io_err)?;
    let mut buf = Vec::with_capacity(capacity);
    // one extra byte tells "exactly full" apart from "too big"
    file.take(capacity as u64 + 1)
        .read_to_end(&mut buf)
        .map_err(io_err)?;
    if buf.len() > capacity {
        return Err(FetchError::CapacityExceeded {
            path: path.to_path_buf(),
            capacity,
        });
    }
    Ok(buf)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::{Duration, Instant};

    fn temp_dir(tag: &str) -> PathBuf {
        let dir = std::env::temp_dir().join(format!("svarog-fetch-{tag}-{}", std::process::id()));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    fn wait_for(fetcher: &mut Fetcher, n: usize) -> Vec<FetchResponse> {
        let deadline = Instant::now() + Duration::from_secs(5);
        let mut out = Vec::new();
        while out.len() < n && Instant::now() < deadline {
            out.extend(fetcher.poll());
            thread::sleep(Duration::from_millis(5));
        }
        out
    }

    #[test]
    fn capacity_is_inclusive() {
        let dir = temp_dir("cap");
        let exact = dir.join("exact.bin");
        let over = dir.join("over.bin");
        std::fs::write(&exact, vec![7u8; 16]).unwrap();
        std::fs::write(&over, vec![7u8; 17]).unwrap();

        assert_eq!(read_capped(&exact, 16).unwrap().len(), 16);
        assert!(matches!(
            read_capped(&over, 16),
            Err(FetchError::CapacityExceeded { capacity: 16, .. })
        ));
        std::fs::remove_dir_all(&dir).ok();
    }

    #[test]
    fn completions_arrive_through_poll() {
        let dir = temp_dir("poll");
        let path = dir.join("data.bin");
        std::fs::write(&path, b"hello").unwrap();

        let mut fetcher = Fetcher::new();
        let ok = fetcher.send(&path, 64);
        let missing = fetcher.send(dir.join("missing.bin"), 64);
        assert_eq!(fetcher.in_flight(), 2);

        let done = wait_for(&mut fetcher, 2);
        assert_eq!(done.len(), 2);
        assert_eq!(fetcher.in_flight(), 0);
        for resp in done {
            if resp.id == ok {
                assert_eq!(resp.result.unwrap(), b"hello");
            } else {
                assert_eq!(resp.id, missing);
                assert!(matches!(resp.result, Err(FetchError::Io { .. })));
            }
        }
        std::fs::remove_dir_all(&dir).ok();
    }
}
