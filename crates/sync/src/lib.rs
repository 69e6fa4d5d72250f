// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

// Allow panic!/unwrap/expect in test code
#![cfg_attr(test, allow(clippy::panic))]
#![cfg_attr(test, allow(clippy::unwrap_used))]
#![cfg_attr(test, allow(clippy::expect_used))]

//! knot-sync: coordination primitives for concurrent service code
//!
//! This crate provides:
//! - **ConcurrentMap** - Key/value store shared by many tasks without external locking
//! - **Semaphore** - In-flight work counter with wait-until-free (quiescence) semantics
//! - **merge** - Fan-in of many streams into one, closed when every input is exhausted

pub mod config;
pub mod error;
pub mod map;
pub mod merge;
pub mod semaphore;

pub use config::{MergeConfig, SemaphoreConfig, SyncConfig};
pub use error::{ConfigError, SyncError};
pub use map::ConcurrentMap;
pub use merge::{merge, merge_receivers, merge_with_config, Merged};
pub use semaphore::{Semaphore, WorkGuard};
