// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Counting semaphore for in-flight work
//!
//! Any number of `acquire` calls can be made and none of them block. While the
//! semaphore has been acquired more times than released it is *blocked*,
//! otherwise it is *free*. `wait` suspends until the semaphore is free, which
//! makes it a quiescence barrier rather than a resource limiter: there is no
//! upper bound on concurrent acquires.
//!
//! The lock count is owned by a single coordinator task. Callers never touch
//! it; they enqueue requests that the coordinator services one at a time, in
//! order, until the semaphore is disposed or every handle is dropped.

use crate::config::SemaphoreConfig;
use crate::error::SyncError;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, trace, warn};

/// Requests serviced by the coordinator
#[derive(Debug)]
enum Request {
    Acquire,
    Release,
    /// Reply once the semaphore is free
    Wait(oneshot::Sender<()>),
    /// Reply with the current lock count
    Locks(oneshot::Sender<usize>),
}

/// Handle to a semaphore
///
/// Cloning yields another handle to the same semaphore.
#[derive(Clone, Debug)]
pub struct Semaphore {
    config: Arc<SemaphoreConfig>,
    requests: mpsc::UnboundedSender<Request>,
    stop: Arc<Mutex<Option<oneshot::Sender<()>>>>,
    alive: Arc<AtomicBool>,
}

impl Semaphore {
    /// Create a free semaphore with default configuration
    ///
    /// Spawns the coordinator, so this must be called within a tokio runtime.
    pub fn new() -> Self {
        Self::with_config(SemaphoreConfig::default())
    }

    /// Create a free semaphore
    ///
    /// Spawns the coordinator, so this must be called within a tokio runtime.
    pub fn with_config(config: SemaphoreConfig) -> Self {
        let (requests, inbox) = mpsc::unbounded_channel();
        let (stop, stopped) = oneshot::channel();
        let alive = Arc::new(AtomicBool::new(true));

        let coordinator = Coordinator {
            name: config.name.clone(),
            locks: 0,
            waiters: Vec::new(),
            inbox,
            alive: Arc::clone(&alive),
        };
        tokio::spawn(coordinator.run(stopped));

        Self {
            config: Arc::new(config),
            requests,
            stop: Arc::new(Mutex::new(Some(stop))),
            alive,
        }
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    /// Register one unit of in-flight work
    pub fn acquire(&self) -> Result<(), SyncError> {
        self.send(Request::Acquire)
    }

    /// Deregister one unit of in-flight work
    ///
    /// Every release must match an earlier acquire. A release while already
    /// free is logged and ignored; the count never goes negative.
    pub fn release(&self) -> Result<(), SyncError> {
        self.send(Request::Release)
    }

    /// Acquire now and release when the returned guard is dropped
    pub fn enter(&self) -> Result<WorkGuard, SyncError> {
        self.acquire()?;
        Ok(WorkGuard {
            semaphore: self.clone(),
        })
    }

    /// Wait until the semaphore is free
    ///
    /// Returns immediately when already free. Requests this task issued
    /// before calling `wait` are always taken into account. A waiter is
    /// released as soon as the count reaches zero, even if another task
    /// re-acquires before this one is polled again.
    pub async fn wait(&self) -> Result<(), SyncError> {
        let (tx, rx) = oneshot::channel();
        self.send(Request::Wait(tx))?;
        // Sender dropped without a reply: coordinator stopped
        rx.await.map_err(|_| self.disposed())
    }

    /// Wait until the semaphore is free, giving up after `timeout`
    pub async fn wait_timeout(&self, timeout: Duration) -> Result<(), SyncError> {
        match tokio::time::timeout(timeout, self.wait()).await {
            Ok(result) => result,
            Err(_) => Err(SyncError::WaitTimeout {
                name: self.config.name.clone(),
                timeout,
            }),
        }
    }

    /// Wait using the configured timeout, or without bound when none is set
    pub async fn wait_configured(&self) -> Result<(), SyncError> {
        match self.config.wait_timeout {
            Some(timeout) => self.wait_timeout(timeout).await,
            None => self.wait().await,
        }
    }

    /// Current lock count, after every request this task issued before it
    pub async fn locks(&self) -> Result<usize, SyncError> {
        let (tx, rx) = oneshot::channel();
        self.send(Request::Locks(tx))?;
        rx.await.map_err(|_| self.disposed())
    }

    pub async fn is_free(&self) -> Result<bool, SyncError> {
        Ok(self.locks().await? == 0)
    }

    pub fn is_disposed(&self) -> bool {
        !self.alive.load(Ordering::Acquire)
    }

    /// Stop the coordinator permanently
    ///
    /// Safe to call more than once. Afterwards every operation returns
    /// [`SyncError::Disposed`], and tasks currently in `wait` are woken with
    /// the same error.
    pub fn dispose(&self) {
        self.alive.store(false, Ordering::Release);
        let stop = self.stop.lock().unwrap_or_else(|e| e.into_inner()).take();
        if let Some(stop) = stop {
            debug!(name = %self.config.name, "disposing semaphore");
            let _ = stop.send(());
        }
    }

    fn send(&self, request: Request) -> Result<(), SyncError> {
        if self.is_disposed() {
            return Err(self.disposed());
        }
        self.requests.send(request).map_err(|_| self.disposed())
    }

    fn disposed(&self) -> SyncError {
        SyncError::Disposed {
            name: self.config.name.clone(),
        }
    }
}

impl Default for Semaphore {
    fn default() -> Self {
        Self::new()
    }
}

/// Releases one unit of in-flight work when dropped
#[derive(Debug)]
#[must_use = "dropping the guard releases the semaphore immediately"]
pub struct WorkGuard {
    semaphore: Semaphore,
}

impl Drop for WorkGuard {
    fn drop(&mut self) {
        if let Err(e) = self.semaphore.release() {
            debug!(error = %e, "release on guard drop skipped");
        }
    }
}

/// Sole owner of the lock count
struct Coordinator {
    name: String,
    locks: usize,
    waiters: Vec<oneshot::Sender<()>>,
    inbox: mpsc::UnboundedReceiver<Request>,
    alive: Arc<AtomicBool>,
}

impl Coordinator {
    async fn run(mut self, mut stop: oneshot::Receiver<()>) {
        let reason = loop {
            tokio::select! {
                biased;

                result = &mut stop => {
                    break match result {
                        Ok(()) => "disposed",
                        Err(_) => "all handles dropped",
                    };
                }

                request = self.inbox.recv() => match request {
                    Some(request) => self.handle(request),
                    None => break "all handles dropped",
                },
            }
        };

        self.alive.store(false, Ordering::Release);
        info!(
            name = %self.name,
            locks = self.locks,
            waiters = self.waiters.len(),
            reason,
            "semaphore coordinator stopped"
        );
        // Dropping the pending waiters wakes them with an error
    }

    fn handle(&mut self, request: Request) {
        match request {
            Request::Acquire => {
                self.locks += 1;
                trace!(name = %self.name, locks = self.locks, "acquired");
                if self.locks == 1 {
                    debug!(name = %self.name, "semaphore blocked");
                }
            }

            Request::Release => {
                if self.locks == 0 {
                    warn!(name = %self.name, "release without matching acquire ignored");
                    return;
                }
                self.locks -= 1;
                trace!(name = %self.name, locks = self.locks, "released");
                if self.locks == 0 {
                    debug!(name = %self.name, waiters = self.waiters.len(), "semaphore free");
                    for waiter in self.waiters.drain(..) {
                        let _ = waiter.send(());
                    }
                }
            }

            Request::Wait(reply) => {
                if self.locks == 0 {
                    let _ = reply.send(());
                } else {
                    // Forget waiters that gave up (e.g. timed out)
                    self.waiters.retain(|w| !w.is_closed());
                    self.waiters.push(reply);
                }
            }

            Request::Locks(reply) => {
                let _ = reply.send(self.locks);
            }
        }
    }
}

#[cfg(test)]
#[path = "semaphore_tests.rs"]
mod tests;
