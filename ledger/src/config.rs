//! Configuration for the festival ledger.
//!
//! Loads configuration from environment variables with sensible defaults.

use crate::persistence::DEFAULT_DATA_FILE;
use chrono::{FixedOffset, Offset, Utc};
use serde::{Deserialize, Serialize};
use std::env;
use std::path::PathBuf;
use std::time::Duration;

/// Application configuration loaded from environment variables.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Config {
    /// Snapshot file (`LEDGER_DATA_FILE`)
    pub data_file: PathBuf,
    /// Prefix for show identifiers (`LEDGER_FESTIVAL_CODE`)
    pub festival_code: String,
    /// Gate recorded on scans when none is given (`LEDGER_DEFAULT_GATE`)
    pub default_gate: String,
    /// Festival site offset from UTC in minutes (`LEDGER_UTC_OFFSET_MINUTES`)
    pub utc_offset_minutes: i32,
    /// How long a command may wait for its outcome (`LEDGER_REQUEST_TIMEOUT_MS`)
    pub request_timeout_ms: u64,
    /// Graceful shutdown timeout in seconds (`LEDGER_SHUTDOWN_TIMEOUT`)
    pub shutdown_timeout: u64,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_file: PathBuf::from(DEFAULT_DATA_FILE),
            festival_code: "IMP25".to_string(),
            default_gate: "GateA".to_string(),
            utc_offset_minutes: 120,
            request_timeout_ms: 5000,
            shutdown_timeout: 10,
        }
    }
}

impl Config {
    /// Load configuration from environment variables.
    ///
    /// Unset or unparsable variables keep their defaults.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Load configuration through an arbitrary variable lookup.
    #[must_use]
    pub fn from_lookup<F>(lookup: F) -> Self
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();
        let text = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

        Self {
            data_file: text("LEDGER_DATA_FILE").map_or(defaults.data_file, PathBuf::from),
            festival_code: text("LEDGER_FESTIVAL_CODE").unwrap_or(defaults.festival_code),
            default_gate: text("LEDGER_DEFAULT_GATE").unwrap_or(defaults.default_gate),
            utc_offset_minutes: text("LEDGER_UTC_OFFSET_MINUTES")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.utc_offset_minutes),
            request_timeout_ms: text("LEDGER_REQUEST_TIMEOUT_MS")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.request_timeout_ms),
            shutdown_timeout: text("LEDGER_SHUTDOWN_TIMEOUT")
                .and_then(|s| s.trim().parse().ok())
                .unwrap_or(defaults.shutdown_timeout),
        }
    }

    /// Site offset; falls back to UTC when out of range
    #[must_use]
    pub fn utc_offset(&self) -> FixedOffset {
        self.utc_offset_minutes
            .checked_mul(60)
            .and_then(FixedOffset::east_opt)
            .unwrap_or_else(|| Utc.fix())
    }

    /// Command timeout
    #[must_use]
    pub const fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    /// Shutdown timeout
    #[must_use]
    pub const fn shutdown_timeout(&self) -> Duration {
        Duration::from_secs(self.shutdown_timeout)
    }
}
