//! airclaim queue
//!
//! An elastic FIFO between many producers and a single consumer.
//!
//! Items are buffered internally without limit until `max_length` is
//! reached; at that point the write endpoint stops being selectable, so
//! `send` blocks and `try_send` fails until the consumer catches up.
//! Back-pressure is the only admission-control lever: no item is ever
//! dropped and delivery order always equals enqueue order.
//!
//! ## Usage
//!
//! ```no_run
//! use airclaim_queue::{ElasticQueue, QueueOptions};
//! use tokio_util::sync::CancellationToken;
//!
//! # async fn demo() {
//! let (queue, mut output) = ElasticQueue::new("prover", QueueOptions {
//!     max_length: 1000,
//!     ..QueueOptions::default()
//! });
//! let input = queue.input();
//! let cancel = CancellationToken::new();
//! tokio::spawn(queue.run(cancel.clone()));
//!
//! input.send("job").await.unwrap();
//! let job = output.recv().await.unwrap();
//! # }
//! ```

use std::collections::VecDeque;
use std::time::Instant;

use metrics::{Gauge, Histogram, Label};
use metrics_derive::Metrics;
use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::debug;

#[derive(Metrics, Clone)]
#[metrics(scope = "claim_queue")]
struct QueueMetrics {
    /// Time items spend buffered between enqueue and delivery, in seconds
    waiting_time: Histogram,
    /// Number of items currently buffered
    length: Gauge,
}

/// Queue configuration.
#[derive(Debug, Clone, Copy)]
pub struct QueueOptions {
    /// Buffered items above which the write endpoint stops accepting.
    /// `0` means unbounded.
    pub max_length: usize,
    /// Capacity of the input channel in front of the internal buffer.
    pub input_capacity: usize,
}

impl Default for QueueOptions {
    fn default() -> Self {
        Self { max_length: 0, input_capacity: 1 }
    }
}

/// The worker half of an elastic queue.
///
/// Created together with its read endpoint by [`ElasticQueue::new`];
/// [`run`](ElasticQueue::run) must be spawned for items to flow.
pub struct ElasticQueue<T> {
    name: String,
    max_length: usize,
    input_tx: mpsc::Sender<T>,
    input_rx: mpsc::Receiver<T>,
    output_tx: mpsc::Sender<T>,
    metrics: QueueMetrics,
}

impl<T> ElasticQueue<T> {
    /// Create a queue and its read endpoint.
    pub fn new(name: &str, options: QueueOptions) -> (Self, mpsc::Receiver<T>) {
        let (input_tx, input_rx) = mpsc::channel(options.input_capacity.max(1));
        let (output_tx, output_rx) = mpsc::channel(1);
        let queue = Self {
            name: name.to_string(),
            max_length: options.max_length,
            input_tx,
            input_rx,
            output_tx,
            metrics: QueueMetrics::new_with_labels(vec![Label::new("name", name.to_string())]),
        };
        (queue, output_rx)
    }

    /// A write endpoint. May be cloned freely across producers.
    pub fn input(&self) -> mpsc::Sender<T> {
        self.input_tx.clone()
    }

    /// Drive the queue until `cancel` fires, the read endpoint is
    /// dropped, or every producer is gone and the buffer has drained.
    pub async fn run(mut self, cancel: CancellationToken) {
        // Holding our own write endpoint would keep recv() pending
        // forever after external producers drop theirs.
        drop(self.input_tx);

        let mut buffer: VecDeque<(Instant, T)> = VecDeque::new();
        let mut input_open = true;
        loop {
            let below_cap = self.max_length == 0 || buffer.len() < self.max_length;
            tokio::select! {
                _ = cancel.cancelled() => break,
                item = self.input_rx.recv(), if input_open && below_cap => match item {
                    Some(value) => buffer.push_back((Instant::now(), value)),
                    None if buffer.is_empty() => break,
                    None => input_open = false,
                },
                permit = self.output_tx.reserve(), if !buffer.is_empty() => {
                    let Ok(permit) = permit else { break };
                    if let Some((received, value)) = buffer.pop_front() {
                        self.metrics.waiting_time.record(received.elapsed().as_secs_f64());
                        permit.send(value);
                    }
                    if !input_open && buffer.is_empty() {
                        break;
                    }
                },
            }
            self.metrics.length.set(buffer.len() as f64);
        }
        debug!(queue = %self.name, buffered = buffer.len(), "queue worker stopped");
    }
}
