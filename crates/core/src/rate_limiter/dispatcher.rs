//! Burst dispatcher behind [`RateLimiter`].

use std::future::Future;
use std::sync::atomic::{AtomicU64, AtomicUsize, Ordering};
use std::sync::Arc;

use futures::future::BoxFuture;
use serde::Serialize;
use tokio::sync::{mpsc, oneshot};
use tokio::time::{sleep_until, Duration, Instant};
use tracing::{debug, trace};

use super::{RateLimitConfig, RateLimiterError};
use crate::metrics;

type Job = Box<dyn FnOnce() -> BoxFuture<'static, ()> + Send>;

#[derive(Debug, Default)]
struct DispatchCounters {
    queued: AtomicUsize,
    dispatched: AtomicU64,
    bursts: AtomicU64,
}

/// Snapshot of the limiter's queue and dispatch counters.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct RateLimiterStatus {
    pub requests_per_second: f64,
    pub burst_size: usize,
    /// Operations waiting to be dispatched (including callers blocked on a full queue).
    pub queued: usize,
    /// Operations handed to the runtime so far.
    pub dispatched: u64,
    /// Bursts released so far.
    pub bursts: u64,
}

/// FIFO execution queue bounding outbound calls to a rate and burst size.
///
/// Operations are dispatched in arrival order. Once the dispatch interval has
/// elapsed since the previous burst, up to `burst_size` queued operations are
/// released together, each on its own task, so one failing or panicking
/// operation never affects its siblings.
///
/// Must be created inside a Tokio runtime: construction spawns the dispatcher
/// task, which exits once the limiter is dropped and the queue is drained.
pub struct RateLimiter {
    tx: mpsc::Sender<Job>,
    config: RateLimitConfig,
    counters: Arc<DispatchCounters>,
}

impl RateLimiter {
    /// Create a limiter and spawn its dispatcher.
    ///
    /// Fails when `requests_per_second` does not describe a usable rate.
    pub fn new(config: RateLimitConfig) -> Result<Self, RateLimiterError> {
        let interval = config.dispatch_interval()?;
        let (tx, rx) = mpsc::channel(config.queue_capacity.max(1));
        let counters = Arc::new(DispatchCounters::default());

        tokio::spawn(run_dispatcher(
            rx,
            interval,
            config.burst_size.max(1),
            Arc::clone(&counters),
        ));

        debug!(
            "Rate limiter started: {} req/s, burst {}, queue {}",
            config.requests_per_second, config.burst_size, config.queue_capacity
        );

        Ok(Self {
            tx,
            config,
            counters,
        })
    }

    /// Queue `operation` and wait for its output.
    ///
    /// Waits for queue space when the queue is full. The operation's own
    /// output (including any `Result` it returns) is passed through untouched.
    pub async fn execute<F, Fut, T>(&self, operation: F) -> Result<T, RateLimiterError>
    where
        F: FnOnce() -> Fut + Send + 'static,
        Fut: Future<Output = T> + Send + 'static,
        T: Send + 'static,
    {
        let (result_tx, result_rx) = oneshot::channel();
        let job: Job = Box::new(move || {
            Box::pin(async move {
                let output = operation().await;
                // The caller may have stopped waiting; nothing to do then.
                let _ = result_tx.send(output);
            })
        });

        // Released if the send fails or the caller stops waiting for space.
        let slot = QueueSlot::reserve(&self.counters);
        if self.tx.send(job).await.is_err() {
            return Err(RateLimiterError::Closed);
        }
        // From here on the dispatcher owns the count.
        slot.commit();

        result_rx.await.map_err(|_| RateLimiterError::Aborted)
    }

    /// Current queue and dispatch counters.
    pub fn status(&self) -> RateLimiterStatus {
        RateLimiterStatus {
            requests_per_second: self.config.requests_per_second,
            burst_size: self.config.burst_size,
            queued: self.counters.queued.load(Ordering::SeqCst),
            dispatched: self.counters.dispatched.load(Ordering::SeqCst),
            bursts: self.counters.bursts.load(Ordering::SeqCst),
        }
    }

    /// The configuration this limiter was built with.
    pub fn config(&self) -> &RateLimitConfig {
        &self.config
    }
}

/// One unit of `queued`, held by a caller until its job is in the channel.
struct QueueSlot<'a> {
    counters: &'a DispatchCounters,
    committed: bool,
}

impl<'a> QueueSlot<'a> {
    fn reserve(counters: &'a DispatchCounters) -> Self {
        let depth = counters.queued.fetch_add(1, Ordering::SeqCst) + 1;
        metrics::RATE_LIMITER_QUEUE_DEPTH.set(depth as i64);
        Self {
            counters,
            committed: false,
        }
    }

    fn commit(mut self) {
        self.committed = true;
    }
}

impl Drop for QueueSlot<'_> {
    fn drop(&mut self) {
        if !self.committed {
            let remaining = self
                .counters
                .queued
                .fetch_sub(1, Ordering::SeqCst)
                .saturating_sub(1);
            metrics::RATE_LIMITER_QUEUE_DEPTH.set(remaining as i64);
        }
    }
}

async fn run_dispatcher(
    mut rx: mpsc::Receiver<Job>,
    interval: Duration,
    burst_size: usize,
    counters: Arc<DispatchCounters>,
) {
    let mut last_dispatch: Option<Instant> = None;

    while let Some(first) = rx.recv().await {
        if let Some(last) = last_dispatch {
            let ready_at = last + interval;
            if ready_at > Instant::now() {
                trace!("Rate limiter waiting {:?}", ready_at - Instant::now());
                sleep_until(ready_at).await;
            }
        }

        // Collect after waiting so that calls queued meanwhile join this burst.
        let mut burst = vec![first];
        while burst.len() < burst_size {
            match rx.try_recv() {
                Ok(job) => burst.push(job),
                Err(_) => break,
            }
        }

        last_dispatch = Some(Instant::now());

        let released = burst.len();
        let remaining = counters
            .queued
            .fetch_sub(released, Ordering::SeqCst)
            .saturating_sub(released);
        counters
            .dispatched
            .fetch_add(released as u64, Ordering::SeqCst);
        counters.bursts.fetch_add(1, Ordering::SeqCst);
        metrics::RATE_LIMITER_QUEUE_DEPTH.set(remaining as i64);

        trace!("Rate limiter releasing burst of {}", released);
        for job in burst {
            tokio::spawn(job());
        }
    }

    debug!("Rate limiter dispatcher shutting down");
}
