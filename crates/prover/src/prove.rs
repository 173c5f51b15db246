//! Merkle proof extraction.

use everscale_types::boc::Boc;
use everscale_types::cell::{Cell, CellBuilder, DynCell, Load, UsageTree, UsageTreeMode};
use everscale_types::merkle::MerkleProof;
use everscale_types::models::StdAddr;

use crate::bits::{KeyPath, KEY_BITS};
use crate::label::read_label;
use crate::types::{AirdropEntry, WalletAirdrop};
use crate::{ProverError, Result};

/// Produce the entitlement and Merkle proof for one account.
///
/// The key is walked over a usage-tracked view of the root, so only the
/// root→leaf cells are marked as visited; the proof built afterwards
/// prunes every subtree the walk did not touch while preserving the
/// root hash.
pub(crate) fn prove(root: &Cell, account: &StdAddr) -> Result<WalletAirdrop> {
    let key = KeyPath::from_account(account)?;
    let usage_tree = UsageTree::new(UsageTreeMode::OnDataAccess);
    let tracked = usage_tree.track(root);

    let entry = lookup(&key, tracked.as_ref())?
        .ok_or_else(|| ProverError::KeyNotFound(account.clone()))?;

    let proof = MerkleProof::create(root.as_ref(), usage_tree)
        .build()
        .map_err(ProverError::MalformedTrie)?;
    let proof_cell = CellBuilder::build_from(proof).map_err(ProverError::MalformedTrie)?;

    Ok(WalletAirdrop {
        account: account.clone(),
        entry,
        proof: Boc::encode(&proof_cell),
    })
}

/// Follow `key` from `cell` down to its leaf payload.
///
/// Returns `None` when the key diverges from every edge label, i.e.
/// the trie holds no such key.
pub(crate) fn lookup(key: &KeyPath, mut cell: &DynCell) -> Result<Option<AirdropEntry>> {
    let mut depth = 0u16;
    loop {
        let mut slice = cell.as_slice().map_err(ProverError::MalformedTrie)?;
        let label = read_label(&mut slice, KEY_BITS - depth)?;
        for i in 0..label.len() {
            if key.bit(depth + i) != label.bit(i) {
                return Ok(None);
            }
        }
        depth += label.len();

        if depth == KEY_BITS {
            let entry = AirdropEntry::load_from(&mut slice).map_err(ProverError::MalformedTrie)?;
            return Ok(Some(entry));
        }

        // Branch on the next key bit; both references are consumed so
        // the positional cursor stays aligned.
        let left = slice.load_reference().map_err(ProverError::MalformedTrie)?;
        let right = slice.load_reference().map_err(ProverError::MalformedTrie)?;
        cell = if key.bit(depth) { right } else { left };
        depth += 1;
    }
}
