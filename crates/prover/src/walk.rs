//! Ordered trie enumeration.

use everscale_types::cell::{Cell, DynCell, Load};
use everscale_types::models::StdAddr;

use crate::bits::{KeyOrder, KeyPath, KEY_BITS};
use crate::label::read_label;
use crate::types::{AirdropEntry, AirdropLeaf};
use crate::{ProverError, Result};

/// Collect up to `count` leaves with keys at or after `next_from`, in
/// ascending key order.
pub(crate) fn enumerate(
    root: &Cell,
    next_from: &StdAddr,
    count: usize,
) -> Result<Vec<AirdropLeaf>> {
    if count == 0 {
        return Ok(Vec::new());
    }
    let start_key = KeyPath::from_account(next_from)?;
    let mut leaves = Vec::new();
    walk(&start_key, KeyPath::new(), root.as_ref(), count, &mut leaves)?;
    Ok(leaves)
}

/// Depth-first walk, left before right, pruning subtrees that order
/// strictly before the start key.
fn walk(
    start_key: &KeyPath,
    prefix: KeyPath,
    cell: &DynCell,
    target: usize,
    out: &mut Vec<AirdropLeaf>,
) -> Result<()> {
    let mut slice = cell.as_slice().map_err(ProverError::MalformedTrie)?;
    let label = read_label(&mut slice, KEY_BITS - prefix.len())?;
    let mut current = prefix;
    current.extend(&label);

    if current.len() == KEY_BITS {
        if start_key.compare_prefix(&current) == KeyOrder::Greater {
            // leaf behind the cursor
            return Ok(());
        }
        let account = current.to_account()?;
        let entry = AirdropEntry::load_from(&mut slice).map_err(ProverError::MalformedTrie)?;
        out.push(AirdropLeaf { account, entry });
        return Ok(());
    }

    let skip_left = match start_key.compare_prefix(&current) {
        // the whole subtree is behind the cursor
        KeyOrder::Greater => return Ok(()),
        KeyOrder::Less => false,
        // the cursor runs through this subtree; its next bit picks the
        // first child worth visiting
        KeyOrder::StartsWith => start_key.bit(current.len()),
    };

    // References must be consumed in order: the slice's reference
    // cursor is positional, so the left child is loaded even when the
    // walk skips it.
    let left = slice.load_reference().map_err(ProverError::MalformedTrie)?;
    if !skip_left {
        walk(start_key, current.with_bit(false), left, target, out)?;
        if out.len() >= target {
            return Ok(());
        }
    }
    let right = slice.load_reference().map_err(ProverError::MalformedTrie)?;
    walk(start_key, current.with_bit(true), right, target, out)
}
