// crypto-rs: cryptography primitives and wrappers
// Copyright 2026 Dark Bio AG. All rights reserved.
//
// Use of this source code is governed by a BSD-style
// license that can be found in the LICENSE file.

//! CRL retrieval from distribution points.

use log::{debug, warn};
use std::io;
use std::path::PathBuf;
use std::sync::{Arc, mpsc};
use std::thread;
use std::time::Duration;
use thiserror::Error;

/// Reasons a CRL could not be retrieved. These never escape a chain build;
/// they degrade to revocation-unknown findings.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("no CRL found at {url}")]
    NotFound { url: String },
    #[error("CRL fetch from {url} timed out")]
    Timeout { url: String },
    #[error("CRL fetch I/O error: {details}")]
    Io { details: String },
    #[error("unsupported distribution point URL: {url}")]
    Unsupported { url: String },
}

/// Blocking source of CRL bytes keyed by distribution point URL.
pub trait CrlFetcher: Send + Sync {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError>;
}

/// Resolves distribution point URLs to files under a root directory, using
/// the last path segment of the URL as the file name.
#[derive(Clone, Debug)]
pub struct DirectoryFetcher {
    root: PathBuf,
}

impl DirectoryFetcher {
    pub fn new(root: impl Into<PathBuf>) -> Self {
        Self { root: root.into() }
    }
}

impl CrlFetcher for DirectoryFetcher {
    fn fetch(&self, url: &str) -> Result<Vec<u8>, FetchError> {
        let unsupported = || FetchError::Unsupported {
            url: url.to_string(),
        };
        let path = ["file://", "http://", "https://"]
            .iter()
            .find_map(|scheme| url.strip_prefix(scheme))
            .ok_or_else(unsupported)?;

        let name = path.rsplit('/').next().unwrap_or_default();
        if name.is_empty() || name == "." || name == ".." || name.contains('\\') {
            return Err(unsupported());
        }
        std::fs::read(self.root.join(name)).map_err(|e| match e.kind() {
            io::ErrorKind::NotFound => FetchError::NotFound {
                url: url.to_string(),
            },
            _ => FetchError::Io {
                details: e.to_string(),
            },
        })
    }
}

/// Runs a fetch on a worker thread and waits at most `timeout` for it.
///
/// On timeout the worker is abandoned; its result is dropped when it
/// eventually finishes.
pub(crate) fn fetch_with_timeout(
    fetcher: Arc<dyn CrlFetcher>,
    url: &str,
    timeout: Duration,
) -> Result<Vec<u8>, FetchError> {
    let (tx, rx) = mpsc::channel();
    let target = url.to_string();
    thread::Builder::new()
        .name("crl-fetch".into())
        .spawn(move || {
            // The receiver is gone once the caller timed out
            if tx.send(fetcher.fetch(&target)).is_err() {
                debug!("dropping late CRL fetch result for {target}");
            }
        })
        .map_err(|e| FetchError::Io {
            details: e.to_string(),
        })?;

    match rx.recv_timeout(timeout) {
        Ok(result) => result,
        Err(mpsc::RecvTimeoutError::Timeout) => {
            warn!("CRL fetch from {url} exceeded {timeout:?}");
            Err(FetchError::Timeout {
                url: url.to_string(),
            })
        }
        Err(mpsc::RecvTimeoutError::Disconnected) => Err(FetchError::Io {
            details: "fetch worker exited without a result".into(),
        }),
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use std::time::Instant;

    struct SlowFetcher(Duration);

    impl CrlFetcher for SlowFetcher {
        fn fetch(&self, _url: &str) -> Result<Vec<u8>, FetchError> {
            thread::sleep(self.0);
            Ok(vec![1, 2, 3])
        }
    }

    fn temp_dir(tag: &str) -> PathBuf {
        let mut suffix = [0u8; 8];
        getrandom::fill(&mut suffix).unwrap();
        let dir = std::env::temp_dir().join(format!(
            "certpath-{tag}-{}",
            u64::from_le_bytes(suffix)
        ));
        std::fs::create_dir_all(&dir).unwrap();
        dir
    }

    #[test]
    fn test_directory_fetcher_resolves_last_segment() {
        let dir = temp_dir("fetch");
        std::fs::write(dir.join("GoodCACRL.crl"), b"crl bytes").unwrap();

        let fetcher = DirectoryFetcher::new(&dir);
        assert_eq!(
            fetcher.fetch("http://x500.example.com/crls/GoodCACRL.crl").unwrap(),
            b"crl bytes"
        );
        assert_eq!(
            fetcher.fetch("file:///anything/GoodCACRL.crl").unwrap(),
            b"crl bytes"
        );
        assert!(matches!(
            fetcher.fetch("http://x500.example.com/Missing.crl"),
            Err(FetchError::NotFound { .. })
        ));
        assert!(matches!(
            fetcher.fetch("ldap://x500.example.com/GoodCACRL.crl"),
            Err(FetchError::Unsupported { .. })
        ));
        assert!(matches!(
            fetcher.fetch("http://x500.example.com/crls/"),
            Err(FetchError::Unsupported { .. })
        ));
        std::fs::remove_dir_all(dir).unwrap();
    }

    #[test]
    fn test_fetch_with_timeout_returns_result() {
        let fetcher: Arc<dyn CrlFetcher> = Arc::new(SlowFetcher(Duration::ZERO));
        let data = fetch_with_timeout(fetcher, "http://a/b.crl", Duration::from_secs(5)).unwrap();
        assert_eq!(data, vec![1, 2, 3]);
    }

    #[test]
    fn test_fetch_with_timeout_abandons_slow_fetch() {
        let fetcher: Arc<dyn CrlFetcher> = Arc::new(SlowFetcher(Duration::from_secs(5)));
        let start = Instant::now();
        let result = fetch_with_timeout(fetcher, "http://a/b.crl", Duration::from_millis(50));
        assert!(matches!(result, Err(FetchError::Timeout { .. })));
        assert!(start.elapsed() < Duration::from_secs(4));
    }
}
