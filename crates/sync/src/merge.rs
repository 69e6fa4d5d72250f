// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Fan-in of many streams into one
//!
//! Each input gets its own forwarding task. Values from one input keep their
//! order; values from different inputs interleave arbitrarily. The merged
//! output closes once, after every input is exhausted.

use crate::config::MergeConfig;
use futures::{Stream, StreamExt};
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::task::{Context, Poll};
use tokio::sync::mpsc;
use tracing::debug;

/// Merged output of several input streams
///
/// Dropping it (or calling [`Merged::close`]) stops every forwarding task,
/// including those still waiting on their input.
#[derive(Debug)]
pub struct Merged<T> {
    rx: mpsc::Receiver<T>,
}

impl<T> Merged<T> {
    /// Receive the next value, or `None` once every input is exhausted
    pub async fn recv(&mut self) -> Option<T> {
        self.rx.recv().await
    }

    /// Stop accepting values; already queued values can still be received
    pub fn close(&mut self) {
        self.rx.close();
    }
}

impl<T> Stream for Merged<T> {
    type Item = T;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<T>> {
        self.rx.poll_recv(cx)
    }
}

/// Merge streams with the default (single slot) output buffer
///
/// Must be called within a tokio runtime.
pub fn merge<I, S, T>(streams: I) -> Merged<T>
where
    I: IntoIterator<Item = S>,
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    merge_with_config(streams, &MergeConfig::default())
}

/// Merge tokio channel receivers
pub fn merge_receivers<I, T>(receivers: I) -> Merged<T>
where
    I: IntoIterator<Item = mpsc::Receiver<T>>,
    T: Send + 'static,
{
    merge(receivers.into_iter().map(|rx| {
        futures::stream::unfold(rx, |mut rx| async move { rx.recv().await.map(|item| (item, rx)) })
    }))
}

/// Merge streams into an output queue sized by `config`
///
/// A consumer that stops reading backpressures every forwarding task once the
/// output queue is full.
pub fn merge_with_config<I, S, T>(streams: I, config: &MergeConfig) -> Merged<T>
where
    I: IntoIterator<Item = S>,
    S: Stream<Item = T> + Send + 'static,
    T: Send + 'static,
{
    let (tx, rx) = mpsc::channel(config.effective_buffer());
    let streams: Vec<S> = streams.into_iter().collect();
    let remaining = Arc::new(AtomicUsize::new(streams.len()));

    debug!(inputs = streams.len(), "merging streams");

    for (input, stream) in streams.into_iter().enumerate() {
        tokio::spawn(forward(input, stream, tx.clone(), Arc::clone(&remaining)));
    }

    // Workers now hold the only senders; the output closes when the last one finishes
    drop(tx);
    Merged { rx }
}

/// Copy one input onto the shared output until either side goes away
async fn forward<S, T>(input: usize, stream: S, out: mpsc::Sender<T>, remaining: Arc<AtomicUsize>)
where
    S: Stream<Item = T>,
{
    tokio::pin!(stream);

    loop {
        let next = tokio::select! {
            biased;
            _ = out.closed() => {
                debug!(input, "merged output dropped, stopping");
                break;
            }
            next = stream.next() => next,
        };

        let Some(item) = next else {
            debug!(input, "input exhausted");
            break;
        };

        if out.send(item).await.is_err() {
            debug!(input, "merged output dropped, stopping");
            break;
        }
    }

    drop(out);
    if remaining.fetch_sub(1, Ordering::AcqRel) == 1 {
        debug!("all inputs finished, merged output closed");
    }
}

#[cfg(test)]
#[path = "merge_tests.rs"]
mod tests;
