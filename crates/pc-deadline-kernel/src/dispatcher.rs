//! Batching dispatcher: the worker-pool half of the deadline kernel
//! contract (§4.10). Requests are collected into fixed-size batches —
//! width 8 on a CPU with AVX2, 4 on SSE4-only, fatal otherwise — flushed
//! either when full or after a per-batch timeout, then fanned out across a
//! worker pool sized to the CPU count.

use std::sync::Arc;
use std::time::Duration;

use tokio::sync::{mpsc, oneshot, Mutex};
use tokio::time::Instant;

use crate::algorithm::compute_deadline;
use crate::domain::types::{DeadlineKernelError, DeadlineRequest};

const DEFAULT_BATCH_TIMEOUT: Duration = Duration::from_secs(2);
const FEED_BUFFER: usize = 1024;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BatchWidth {
    Avx2 = 8,
    Sse4 = 4,
}

impl BatchWidth {
    fn len(self) -> usize {
        self as usize
    }
}

/// Picks the batch width the way the native kernel would, panicking at
/// construction time if neither instruction set is present — the spec
/// treats this as a startup-fatal misconfiguration, not a runtime error.
fn detect_batch_width() -> BatchWidth {
    #[cfg(any(target_arch = "x86", target_arch = "x86_64"))]
    {
        if std::is_x86_feature_detected!("avx2") {
            return BatchWidth::Avx2;
        }
        if std::is_x86_feature_detected!("sse4.1") {
            return BatchWidth::Sse4;
        }
    }
    panic!("deadline kernel requires AVX2 or SSE4 CPU support; none detected");
}

pub struct DispatcherConfig {
    pub worker_count: usize,
    pub batch_timeout: Duration,
}

impl Default for DispatcherConfig {
    fn default() -> Self {
        Self {
            worker_count: num_cpus::get(),
            batch_timeout: DEFAULT_BATCH_TIMEOUT,
        }
    }
}

struct PendingRequest {
    req: DeadlineRequest,
    reply: oneshot::Sender<u64>,
}

/// The production deadline kernel: a bounded worker pool fed by a
/// timeout-flushed batch collector.
pub struct BatchDispatcher {
    tx: mpsc::Sender<PendingRequest>,
    width: BatchWidth,
}

impl BatchDispatcher {
    pub fn new() -> Self {
        Self::with_config(DispatcherConfig::default())
    }

    pub fn with_config(config: DispatcherConfig) -> Self {
        let width = detect_batch_width();
        let (tx, rx) = mpsc::channel(FEED_BUFFER);
        let (batch_tx, batch_rx) = mpsc::channel::<Vec<PendingRequest>>(config.worker_count.max(1));
        let batch_rx = Arc::new(Mutex::new(batch_rx));

        tokio::spawn(collect(rx, batch_tx, width.len(), config.batch_timeout));

        for _ in 0..config.worker_count.max(1) {
            let batch_rx = batch_rx.clone();
            tokio::spawn(work(batch_rx, width.len()));
        }

        tracing::info!(batch_width = width.len(), worker_count = config.worker_count, "deadline kernel started");

        Self { tx, width }
    }

    pub fn batch_width(&self) -> usize {
        self.width.len()
    }

    pub async fn submit(&self, req: DeadlineRequest) -> Result<u64, DeadlineKernelError> {
        let (reply, reply_rx) = oneshot::channel();
        self.tx
            .send(PendingRequest { req, reply })
            .await
            .map_err(|_| DeadlineKernelError::Closed)?;
        reply_rx.await.map_err(|_| DeadlineKernelError::Closed)
    }
}

impl Default for BatchDispatcher {
    fn default() -> Self {
        Self::new()
    }
}

async fn collect(
    mut rx: mpsc::Receiver<PendingRequest>,
    batch_tx: mpsc::Sender<Vec<PendingRequest>>,
    width: usize,
    timeout: Duration,
) {
    let mut batch: Vec<PendingRequest> = Vec::with_capacity(width);
    let mut flush_at: Option<Instant> = None;

    loop {
        if batch.is_empty() {
            match rx.recv().await {
                Some(req) => {
                    flush_at = Some(Instant::now() + timeout);
                    batch.push(req);
                }
                None => break,
            }
        } else {
            let wake_at = flush_at.expect("flush_at set whenever batch is non-empty");
            tokio::select! {
                _ = tokio::time::sleep_until(wake_at) => {
                    flush_at = None;
                    if batch_tx.send(std::mem::take(&mut batch)).await.is_err() {
                        break;
                    }
                }
                maybe_req = rx.recv() => {
                    match maybe_req {
                        Some(req) => {
                            batch.push(req);
                            if batch.len() == width {
                                flush_at = None;
                                if batch_tx.send(std::mem::take(&mut batch)).await.is_err() {
                                    break;
                                }
                            }
                        }
                        None => {
                            let _ = batch_tx.send(std::mem::take(&mut batch)).await;
                            break;
                        }
                    }
                }
            }
        }
    }
}

async fn work(batch_rx: Arc<Mutex<mpsc::Receiver<Vec<PendingRequest>>>>, width: usize) {
    loop {
        let batch = {
            let mut guard = batch_rx.lock().await;
            guard.recv().await
        };
        let Some(batch) = batch else { break };
        if batch.is_empty() {
            continue;
        }
        process_batch(batch, width).await;
    }
}

/// Pads the request list with duplicates of the first real request up to
/// `width` before handing the batch to the compute stage, then discards the
/// padding's results — mirroring the fixed-width native kernel call.
async fn process_batch(batch: Vec<PendingRequest>, width: usize) {
    let (reqs, replies): (Vec<DeadlineRequest>, Vec<oneshot::Sender<u64>>) =
        batch.into_iter().map(|p| (p.req, p.reply)).unzip();

    let real_count = reqs.len();
    let mut padded = reqs.clone();
    while padded.len() < width {
        padded.push(reqs[0]);
    }

    let deadlines = tokio::task::spawn_blocking(move || {
        use rayon::prelude::*;
        padded.par_iter().map(compute_deadline).collect::<Vec<u64>>()
    })
    .await
    .expect("deadline compute task panicked");

    for (reply, deadline) in replies.into_iter().zip(deadlines.into_iter().take(real_count)) {
        let _ = reply.send(deadline);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use shared_types::GenerationSignature;

    fn req(nonce: u64) -> DeadlineRequest {
        DeadlineRequest {
            account_id: 1,
            nonce,
            base_target: 18325193796,
            scoop: 30,
            gen_sig: GenerationSignature([0x2a; 32]),
        }
    }

    #[tokio::test]
    async fn submits_full_batch_without_waiting_for_timeout() {
        let dispatcher = Arc::new(BatchDispatcher::with_config(DispatcherConfig {
            worker_count: 1,
            batch_timeout: Duration::from_secs(30),
        }));
        let width = dispatcher.batch_width();

        let mut handles = Vec::new();
        for n in 0..width {
            let dispatcher = dispatcher.clone();
            handles.push(tokio::spawn(async move { dispatcher.submit(req(n as u64)).await }));
        }

        let result = tokio::time::timeout(Duration::from_secs(5), async {
            for h in handles {
                h.await.unwrap().unwrap();
            }
        })
        .await;
        assert!(result.is_ok(), "batch of exactly `width` requests should flush immediately");
    }

    #[tokio::test]
    async fn flushes_a_partial_batch_after_timeout() {
        let dispatcher = BatchDispatcher::with_config(DispatcherConfig {
            worker_count: 1,
            batch_timeout: Duration::from_millis(50),
        });

        let got = tokio::time::timeout(Duration::from_secs(2), dispatcher.submit(req(1))).await;
        assert!(got.is_ok(), "a lone request should still flush via the timeout path");
    }
}
