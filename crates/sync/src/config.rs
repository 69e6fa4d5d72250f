// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Configuration for the coordination primitives
//!
//! Loaded from TOML, every field optional:
//!
//! ```toml
//! [semaphore]
//! name = "inflight-requests"
//! wait_timeout = "30s"
//!
//! [merge]
//! buffer = 1
//! ```

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Top-level configuration
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SyncConfig {
    pub semaphore: SemaphoreConfig,
    pub merge: MergeConfig,
}

impl SyncConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(text: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(text)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_toml_str(&text)
    }
}

/// Semaphore configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SemaphoreConfig {
    /// Name identifying this semaphore in logs and errors
    pub name: String,
    /// Default bound for `Semaphore::wait_configured`; unbounded when unset
    #[serde(with = "humantime_serde")]
    pub wait_timeout: Option<Duration>,
}

impl SemaphoreConfig {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            wait_timeout: None,
        }
    }

    pub fn with_wait_timeout(mut self, timeout: Duration) -> Self {
        self.wait_timeout = Some(timeout);
        self
    }
}

impl Default for SemaphoreConfig {
    fn default() -> Self {
        Self::new("semaphore")
    }
}

/// Stream merge configuration
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct MergeConfig {
    /// Capacity of the merged output queue
    pub buffer: usize,
}

impl MergeConfig {
    pub fn with_buffer(buffer: usize) -> Self {
        Self { buffer }
    }

    /// Output capacity actually used; tokio channels need at least one slot
    pub fn effective_buffer(&self) -> usize {
        self.buffer.max(1)
    }
}

impl Default for MergeConfig {
    fn default() -> Self {
        Self { buffer: 1 }
    }
}

#[cfg(test)]
#[path = "config_tests.rs"]
mod tests;
