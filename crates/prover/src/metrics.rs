//! Prover request metrics.

use std::time::Duration;

use metrics::Histogram;
use metrics_derive::Metrics;

#[derive(Metrics, Clone)]
#[metrics(scope = "claim_prover")]
struct RequestMetrics {
    /// Wall-clock time spent serving a request, in seconds
    request_time: Histogram,
}

/// Per-kind wall-time histograms for the prover loop.
#[derive(Clone)]
pub(crate) struct ProverMetrics {
    proof: RequestMetrics,
    enumerate: RequestMetrics,
}

impl ProverMetrics {
    pub(crate) fn new() -> Self {
        Self {
            proof: RequestMetrics::new_with_labels(&[("method", "processProofRequest")]),
            enumerate: RequestMetrics::new_with_labels(&[(
                "method",
                "processEnumerateAccountsRequest",
            )]),
        }
    }

    pub(crate) fn record_proof(&self, elapsed: Duration) {
        self.proof.request_time.record(elapsed.as_secs_f64());
    }

    pub(crate) fn record_enumerate(&self, elapsed: Duration) {
        self.enumerate.request_time.record(elapsed.as_secs_f64());
    }
}
