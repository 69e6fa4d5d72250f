// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Error types for the coordination primitives

use std::path::PathBuf;
use std::time::Duration;
use thiserror::Error;

/// Errors surfaced by the semaphore
///
/// The map and the merger never fail; absence is reported through `Option`.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SyncError {
    #[error("semaphore {name} has been disposed")]
    Disposed { name: String },
    #[error("semaphore {name} did not become free within {timeout:?}")]
    WaitTimeout { name: String, timeout: Duration },
}

/// Errors loading configuration
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
    #[error("invalid config: {0}")]
    Parse(#[from] toml::de::Error),
}
