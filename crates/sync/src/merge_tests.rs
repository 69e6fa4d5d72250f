// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

use super::*;
use futures::stream;
use std::time::Duration;
use tokio::time::timeout;

const DEADLINE: Duration = Duration::from_secs(5);

async fn drain<T>(merged: Merged<T>) -> Vec<T> {
    timeout(DEADLINE, merged.collect::<Vec<T>>())
        .await
        .expect("merged stream did not close")
}

#[tokio::test]
async fn merges_all_values_preserving_per_input_order() {
    let a = stream::iter(vec![1, 2, 3]);
    let b = stream::iter(vec![4, 5]);

    let out = drain(merge(vec![a, b])).await;

    let mut sorted = out.clone();
    sorted.sort_unstable();
    assert_eq!(sorted, vec![1, 2, 3, 4, 5]);

    let from_a: Vec<_> = out.iter().copied().filter(|v| *v <= 3).collect();
    let from_b: Vec<_> = out.iter().copied().filter(|v| *v > 3).collect();
    assert_eq!(from_a, vec![1, 2, 3]);
    assert_eq!(from_b, vec![4, 5]);
}

#[tokio::test]
async fn zero_inputs_close_immediately() {
    let mut merged = merge(Vec::<stream::Iter<std::vec::IntoIter<u8>>>::new());
    assert_eq!(timeout(DEADLINE, merged.recv()).await.unwrap(), None);
}

#[tokio::test]
async fn empty_inputs_close_output() {
    let inputs = vec![stream::iter(Vec::<u8>::new()), stream::iter(Vec::new())];
    assert!(drain(merge(inputs)).await.is_empty());
}

#[tokio::test]
async fn output_stays_open_until_every_input_closes() {
    let (tx_a, rx_a) = mpsc::channel(4);
    let (tx_b, rx_b) = mpsc::channel(4);
    let mut merged = merge_receivers(vec![rx_a, rx_b]);

    tx_a.send("a").await.unwrap();
    drop(tx_a);
    assert_eq!(timeout(DEADLINE, merged.recv()).await.unwrap(), Some("a"));

    // B is still open, so the output must not close yet
    assert!(timeout(Duration::from_millis(50), merged.recv()).await.is_err());

    tx_b.send("b").await.unwrap();
    drop(tx_b);
    assert_eq!(timeout(DEADLINE, merged.recv()).await.unwrap(), Some("b"));
    assert_eq!(timeout(DEADLINE, merged.recv()).await.unwrap(), None);
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn many_producers_deliver_every_value_once() {
    let receivers: Vec<_> = (0..8u32)
        .map(|producer| {
            let (tx, rx) = mpsc::channel(2);
            tokio::spawn(async move {
                for i in 0..250u32 {
                    tx.send(producer * 1000 + i).await.unwrap();
                }
            });
            rx
        })
        .collect();

    let mut out = drain(merge_receivers(receivers)).await;
    out.sort_unstable();

    let mut expected: Vec<u32> = (0..8u32)
        .flat_map(|p| (0..250u32).map(move |i| p * 1000 + i))
        .collect();
    expected.sort_unstable();
    assert_eq!(out, expected);
}

#[tokio::test]
async fn slow_consumer_backpressures_producers() {
    let (tx, rx) = mpsc::channel(1);
    let merged = merge_with_config(
        vec![stream::unfold(rx, |mut rx: mpsc::Receiver<u32>| async move {
            rx.recv().await.map(|item| (item, rx))
        })],
        &MergeConfig::with_buffer(1),
    );

    // One value in the output queue, one held by the worker, one in the input
    // queue; the next send has nowhere to go
    for i in 0..3 {
        timeout(DEADLINE, tx.send(i)).await.unwrap().unwrap();
    }
    assert!(timeout(Duration::from_millis(50), tx.send(3)).await.is_err());

    drop(tx);
    assert_eq!(drain(merged).await, vec![0, 1, 2]);
}

#[tokio::test]
async fn dropping_output_stops_idle_workers() {
    let (tx, rx) = mpsc::channel::<u32>(1);
    let merged = merge_receivers(vec![rx]);

    drop(merged);

    // The worker notices the closed output and drops its input receiver
    timeout(DEADLINE, tx.closed()).await.unwrap();
}

#[tokio::test]
async fn close_stops_workers_but_keeps_queued_values() {
    let (tx, rx) = mpsc::channel::<u32>(4);
    let mut merged = merge_receivers(vec![rx]);

    tx.send(7).await.unwrap();
    assert_eq!(timeout(DEADLINE, merged.recv()).await.unwrap(), Some(7));

    merged.close();
    timeout(DEADLINE, tx.closed()).await.unwrap();
    assert_eq!(merged.recv().await, None);
}
