//! airclaim prover
//!
//! Serves Merkle inclusion proofs and ordered range enumeration over an
//! airdrop distribution stored as a binary Patricia trie in a
//! bag-of-cells file.
//!
//! ## Components
//!
//! - **Prover**: loads the trie once at startup, publishes its root
//!   hash, and serves typed requests from a bounded FIFO on a single
//!   task, so the trie needs no locking
//! - **Trie walk**: lexicographically ordered enumeration with a
//!   resumable cursor
//! - **Proof extraction**: per-account Merkle proofs pruned down to
//!   the root→leaf path
//!
//! ## Requests
//!
//! Requests are submitted through the queue's write endpoint and
//! answered over per-request oneshot channels:
//!
//! - [`ProofRequest`] — entitlement plus Merkle proof for one account
//! - [`EnumerateRequest`] — next page of account/entitlement pairs at
//!   or after a cursor, with a continuation cursor

mod bits;
mod label;
mod metrics;
mod prove;
mod service;
mod types;
mod walk;

#[cfg(any(test, feature = "test-utils"))]
pub mod testing;

pub use bits::{KeyOrder, KeyPath, KEY_BITS};
pub use service::{
    EnumeratePage, EnumerateRequest, ProofRequest, Prover, ProverConfig, ProverRequest,
};
pub use types::{zero_account, AirdropEntry, AirdropLeaf, WalletAirdrop};

use everscale_types::error::Error as CellError;
use everscale_types::models::StdAddr;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ProverError {
    /// The airdrop file could not be read, or it did not deserialize
    /// to exactly one root cell.
    #[error("invalid airdrop file: {0}")]
    InvalidAirdropFile(String),

    /// The trie could not be decoded during a walk.
    #[error("malformed airdrop trie: {0}")]
    MalformedTrie(CellError),

    /// No leaf exists for the requested account.
    #[error("account {0} has no airdrop entry")]
    KeyNotFound(StdAddr),

    /// The account could not be encoded as a 267-bit trie key.
    #[error("account encoding failed: {0}")]
    Encoding(CellError),
}

pub type Result<T> = std::result::Result<T, ProverError>;
