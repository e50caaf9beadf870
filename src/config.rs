//! Backend configuration - passed from the caller at wallet creation.
//!
//! Both config types are immutable values. A wallet reads a config while it
//! is being created and never takes ownership; the caller releases configs
//! independently of any wallet that consumed them.

use std::path::PathBuf;

/// Electrum retries before a request is reported as failed.
const DEFAULT_RETRY: u8 = 3;

/// How to reach the Electrum backend.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BlockchainConfig {
    url: String,
    socks5: Option<String>,
    stop_gap: u32,
    timeout_s: u32,
    retry: u8,
}

impl BlockchainConfig {
    /// Endpoint plus scan parameters. Reachability is not checked here; it is
    /// deferred to the first sync.
    pub fn electrum(
        url: impl Into<String>,
        socks5: Option<&str>,
        stop_gap: u32,
        timeout_s: u32,
    ) -> Self {
        Self {
            url: url.into(),
            socks5: socks5.map(str::to_string),
            stop_gap,
            timeout_s,
            retry: DEFAULT_RETRY,
        }
    }

    pub fn with_retry(mut self, retry: u8) -> Self {
        self.retry = retry;
        self
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    pub fn socks5(&self) -> Option<&str> {
        self.socks5.as_deref()
    }

    /// Consecutive unused addresses scanned before sync assumes no further
    /// funds exist ahead.
    pub fn stop_gap(&self) -> u32 {
        self.stop_gap
    }

    pub fn timeout_s(&self) -> u32 {
        self.timeout_s
    }

    pub fn retry(&self) -> u8 {
        self.retry
    }
}

/// Where wallet state lives between runs.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum DatabaseConfig {
    /// State kept in process memory, gone when the wallet is released.
    Memory,
    /// State kept in a flat-file store named `<path>/<id>.dat`.
    Persistent { path: PathBuf, id: String },
}

impl DatabaseConfig {
    pub fn memory() -> Self {
        DatabaseConfig::Memory
    }

    pub fn persistent(path: impl Into<PathBuf>, id: impl Into<String>) -> Self {
        DatabaseConfig::Persistent { path: path.into(), id: id.into() }
    }
}
