//! Prover service: owns the loaded trie and serializes access to it.

use std::path::PathBuf;
use std::time::Instant;

use everscale_types::boc::Boc;
use everscale_types::cell::{Cell, HashBytes};
use everscale_types::models::StdAddr;
use tokio::sync::{mpsc, oneshot};
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use airclaim_queue::{ElasticQueue, QueueOptions};

use crate::metrics::ProverMetrics;
use crate::types::{zero_account, AirdropLeaf, WalletAirdrop};
use crate::{prove, walk, ProverError, Result};

/// Queue depth past which producers are pushed back.
const QUEUE_MAX_LENGTH: usize = 1000;

/// Prover configuration.
#[derive(Debug, Clone)]
pub struct ProverConfig {
    /// Path to the airdrop bag-of-cells file.
    pub filename: PathBuf,
}

/// Request for one account's entitlement and Merkle proof.
pub struct ProofRequest {
    pub account: StdAddr,
    /// Buffered reply slot; the caller may abandon it at any time.
    pub reply: oneshot::Sender<Result<WalletAirdrop>>,
}

/// Request for the next page of entitlements at or after `next_from`.
pub struct EnumerateRequest {
    pub next_from: StdAddr,
    pub count: usize,
    /// Buffered reply slot; the caller may abandon it at any time.
    pub reply: oneshot::Sender<Result<EnumeratePage>>,
}

/// One page of an ordered enumeration.
#[derive(Debug, Clone)]
pub struct EnumeratePage {
    pub leaves: Vec<AirdropLeaf>,
    /// Cursor for the following page; the zero account once the
    /// enumeration is exhausted.
    pub next_from: StdAddr,
}

/// A unit of work for the prover loop.
pub enum ProverRequest {
    Proof(ProofRequest),
    Enumerate(EnumerateRequest),
}

/// Read-only prover over a single airdrop trie.
///
/// All trie operations run on the task driving [`Prover::run`];
/// submitters interact only through the queue and their reply
/// channels, so the root cell needs no locking.
pub struct Prover {
    root: Cell,
    merkle_root: HashBytes,
    queue: ElasticQueue<ProverRequest>,
    output: mpsc::Receiver<ProverRequest>,
    metrics: ProverMetrics,
}

impl std::fmt::Debug for Prover {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Prover")
            .field("root", &self.root)
            .field("merkle_root", &self.merkle_root)
            .finish_non_exhaustive()
    }
}

impl Prover {
    /// Load the airdrop file and prepare the request queue.
    pub fn new(config: &ProverConfig) -> Result<Self> {
        let content = std::fs::read(&config.filename)
            .map_err(|e| ProverError::InvalidAirdropFile(e.to_string()))?;
        let root =
            Boc::decode(&content).map_err(|e| ProverError::InvalidAirdropFile(e.to_string()))?;
        let merkle_root = *root.repr_hash();
        info!(file = %config.filename.display(), root = %merkle_root, "airdrop trie loaded");

        let (queue, output) = ElasticQueue::new(
            "prover",
            QueueOptions { max_length: QUEUE_MAX_LENGTH, ..QueueOptions::default() },
        );
        Ok(Self {
            root,
            merkle_root,
            queue,
            output,
            metrics: ProverMetrics::new(),
        })
    }

    /// Write endpoint for submitting requests.
    pub fn queue(&self) -> mpsc::Sender<ProverRequest> {
        self.queue.input()
    }

    /// Hash of the root cell, fixed for the process lifetime.
    pub fn merkle_root(&self) -> HashBytes {
        self.merkle_root
    }

    /// Serve requests until `cancel` fires.
    ///
    /// Requests are dispatched strictly in queue order, one at a time;
    /// a per-request failure is returned through the reply channel and
    /// never stops the loop.
    pub async fn run(self, cancel: CancellationToken) {
        let Self { root, merkle_root: _, queue, mut output, metrics } = self;
        tokio::spawn(queue.run(cancel.clone()));

        loop {
            let request = tokio::select! {
                _ = cancel.cancelled() => break,
                request = output.recv() => match request {
                    Some(request) => request,
                    None => break,
                },
            };
            match request {
                ProverRequest::Proof(req) => {
                    let started = Instant::now();
                    let response = prove::prove(&root, &req.account);
                    metrics.record_proof(started.elapsed());
                    if req.reply.send(response).is_err() {
                        debug!(account = %req.account, "proof reply abandoned");
                    }
                }
                ProverRequest::Enumerate(req) => {
                    let started = Instant::now();
                    let response = enumerate_page(&root, &req.next_from, req.count);
                    metrics.record_enumerate(started.elapsed());
                    if req.reply.send(response).is_err() {
                        debug!(next_from = %req.next_from, "enumerate reply abandoned");
                    }
                }
            }
        }
        debug!("prover loop stopped");
    }
}

/// Walk one page plus a lookahead leaf that, when present, becomes the
/// continuation cursor instead of part of the page.
fn enumerate_page(root: &Cell, next_from: &StdAddr, count: usize) -> Result<EnumeratePage> {
    let lookahead = count.saturating_add(1);
    let mut leaves = walk::enumerate(root, next_from, lookahead)?;

    let mut next_from = zero_account();
    if leaves.len() == lookahead {
        if let Some(last) = leaves.pop() {
            next_from = last.account;
        }
    }
    Ok(EnumeratePage { leaves, next_from })
}

#[cfg(test)]
mod tests {
    use std::io::Write;

    use everscale_types::cell::HashBytes;
    use everscale_types::num::Tokens;

    use super::*;
    use crate::testing::build_trie;
    use crate::types::AirdropEntry;

    fn account(fill: u8) -> StdAddr {
        StdAddr::new(0, HashBytes([fill; 32]))
    }

    fn entry(amount: u128) -> AirdropEntry {
        AirdropEntry {
            amount: Tokens::new(amount),
            start_from: 1_700_000_000,
            expire_at: 1_800_000_000,
        }
    }

    fn write_trie_file(entries: &[(StdAddr, AirdropEntry)]) -> (tempfile::NamedTempFile, Cell) {
        let root = build_trie(entries);
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(&Boc::encode(&root)).unwrap();
        file.flush().unwrap();
        (file, root)
    }

    #[test]
    fn test_new_rejects_missing_file() {
        let config = ProverConfig { filename: PathBuf::from("/nonexistent/airdrop.boc") };
        let err = Prover::new(&config).unwrap_err();
        assert!(matches!(err, ProverError::InvalidAirdropFile(_)));
    }

    #[test]
    fn test_new_rejects_garbage_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        file.write_all(b"definitely not a bag of cells").unwrap();
        let config = ProverConfig { filename: file.path().to_path_buf() };
        let err = Prover::new(&config).unwrap_err();
        assert!(matches!(err, ProverError::InvalidAirdropFile(_)));
    }

    #[test]
    fn test_merkle_root_matches_loaded_cell() {
        let entries = vec![(account(0x01), entry(1)), (account(0x02), entry(2))];
        let (file, root) = write_trie_file(&entries);
        let prover = Prover::new(&ProverConfig { filename: file.path().to_path_buf() }).unwrap();
        assert_eq!(prover.merkle_root(), *root.repr_hash());
    }

    #[tokio::test]
    async fn test_requests_flow_through_queue() {
        let entries = vec![
            (account(0x01), entry(1)),
            (account(0x02), entry(2)),
            (account(0x03), entry(3)),
        ];
        let (file, _) = write_trie_file(&entries);
        let prover = Prover::new(&ProverConfig { filename: file.path().to_path_buf() }).unwrap();
        let queue = prover.queue();
        let cancel = CancellationToken::new();
        let service = tokio::spawn(prover.run(cancel.clone()));

        let (reply, rx) = oneshot::channel();
        queue
            .send(ProverRequest::Enumerate(EnumerateRequest {
                next_from: zero_account(),
                count: 2,
                reply,
            }))
            .await
            .unwrap();
        let page = rx.await.unwrap().unwrap();
        assert_eq!(page.leaves.len(), 2);
        assert_eq!(page.next_from, account(0x03));

        let (reply, rx) = oneshot::channel();
        queue
            .send(ProverRequest::Proof(ProofRequest { account: account(0x02), reply }))
            .await
            .unwrap();
        let airdrop = rx.await.unwrap().unwrap();
        assert_eq!(airdrop.account, account(0x02));
        assert_eq!(airdrop.entry, entry(2));

        cancel.cancel();
        service.await.unwrap();
    }

    #[tokio::test]
    async fn test_error_reply_keeps_loop_alive() {
        let entries = vec![(account(0x01), entry(1))];
        let (file, _) = write_trie_file(&entries);
        let prover = Prover::new(&ProverConfig { filename: file.path().to_path_buf() }).unwrap();
        let queue = prover.queue();
        let cancel = CancellationToken::new();
        let service = tokio::spawn(prover.run(cancel.clone()));

        let (reply, rx) = oneshot::channel();
        queue
            .send(ProverRequest::Proof(ProofRequest { account: account(0x99), reply }))
            .await
            .unwrap();
        assert!(matches!(rx.await.unwrap(), Err(ProverError::KeyNotFound(_))));

        // the loop keeps serving after a per-request failure
        let (reply, rx) = oneshot::channel();
        queue
            .send(ProverRequest::Proof(ProofRequest { account: account(0x01), reply }))
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_ok());

        cancel.cancel();
        service.await.unwrap();
    }

    #[tokio::test]
    async fn test_abandoned_reply_does_not_wedge_worker() {
        let entries = vec![(account(0x01), entry(1))];
        let (file, _) = write_trie_file(&entries);
        let prover = Prover::new(&ProverConfig { filename: file.path().to_path_buf() }).unwrap();
        let queue = prover.queue();
        let cancel = CancellationToken::new();
        let service = tokio::spawn(prover.run(cancel.clone()));

        let (reply, rx) = oneshot::channel();
        drop(rx);
        queue
            .send(ProverRequest::Proof(ProofRequest { account: account(0x01), reply }))
            .await
            .unwrap();

        let (reply, rx) = oneshot::channel();
        queue
            .send(ProverRequest::Proof(ProofRequest { account: account(0x01), reply }))
            .await
            .unwrap();
        assert!(rx.await.unwrap().is_ok());

        cancel.cancel();
        service.await.unwrap();
    }
}
