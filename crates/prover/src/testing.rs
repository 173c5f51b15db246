//! Helpers for constructing airdrop tries in memory.
//!
//! Only compiled for tests (or with the `test-utils` feature): the
//! service itself never builds tries, it only reads them.

use std::cmp::Ordering;

use everscale_types::boc::Boc;
use everscale_types::cell::{Cell, CellBuilder, CellFamily, HashBytes, Store};
use everscale_types::error::Error as CellError;
use everscale_types::models::StdAddr;

use crate::bits::{KeyPath, KEY_BITS};
use crate::label::lim_uint_bits;
use crate::types::AirdropEntry;

/// Build an airdrop trie from account/entry pairs.
///
/// Accounts may come in any order and must be distinct. Each edge
/// label is written in the shortest of the three encodings, so a
/// generated trie exercises every decoder form.
pub fn build_trie(entries: &[(StdAddr, AirdropEntry)]) -> Cell {
    assert!(!entries.is_empty(), "a trie holds at least one entry");
    let mut items: Vec<(KeyPath, AirdropEntry)> = entries
        .iter()
        .map(|(account, entry)| {
            let key = KeyPath::from_account(account).expect("encodable account");
            (key, *entry)
        })
        .collect();
    items.sort_by(|(a, _), (b, _)| key_cmp(a, b));
    for pair in items.windows(2) {
        assert!(pair[0].0 != pair[1].0, "duplicate account in trie input");
    }
    build_node(&items, 0).expect("trie construction")
}

/// Decode a serialized proof: the virtual root hash of its pruned trie
/// and the entry it carries for `account`.
pub fn read_proof_leaf(proof: &[u8], account: &StdAddr) -> (HashBytes, AirdropEntry) {
    let proof_cell = Boc::decode(proof).expect("proof bag-of-cells");
    assert_eq!(
        proof_cell.reference_count(),
        1,
        "a proof cell holds exactly one reference"
    );
    let inner = proof_cell.reference(0).expect("proof reference");
    let key = KeyPath::from_account(account).expect("encodable account");
    let entry = crate::prove::lookup(&key, inner)
        .expect("walkable proof")
        .expect("proven key present");
    (*inner.hash(0), entry)
}

/// Lexicographic order of two full keys.
fn key_cmp(a: &KeyPath, b: &KeyPath) -> Ordering {
    for i in 0..a.len().min(b.len()) {
        match (a.bit(i), b.bit(i)) {
            (x, y) if x == y => continue,
            (false, true) => return Ordering::Less,
            _ => return Ordering::Greater,
        }
    }
    a.len().cmp(&b.len())
}

fn build_node(items: &[(KeyPath, AirdropEntry)], depth: u16) -> Result<Cell, CellError> {
    let (first_key, first_entry) = &items[0];

    // Longest bit run shared by every key below this node.
    let mut label_len = 0u16;
    'scan: while depth + label_len < KEY_BITS {
        let bit = first_key.bit(depth + label_len);
        for (key, _) in items {
            if key.bit(depth + label_len) != bit {
                break 'scan;
            }
        }
        label_len += 1;
    }

    let mut builder = CellBuilder::new();
    store_label(&mut builder, first_key, depth, label_len, KEY_BITS - depth)?;

    if depth + label_len == KEY_BITS {
        debug_assert_eq!(items.len(), 1);
        first_entry.store_into(&mut builder, &mut Cell::empty_context())?;
        return builder.build();
    }

    let fork = depth + label_len;
    let split = items.partition_point(|(key, _)| !key.bit(fork));
    builder.store_reference(build_node(&items[..split], fork + 1)?)?;
    builder.store_reference(build_node(&items[split..], fork + 1)?)?;
    builder.build()
}

/// Write `len` bits of `key` starting at `offset`, using the shortest
/// of the three label encodings.
fn store_label(
    builder: &mut CellBuilder,
    key: &KeyPath,
    offset: u16,
    len: u16,
    capacity: u16,
) -> Result<(), CellError> {
    let lim_bits = lim_uint_bits(capacity);
    let short_bits = 1 + (len + 1) + len;
    let long_bits = 2 + lim_bits + len;
    let same_bits = 3 + lim_bits;

    let value = len > 0 && key.bit(offset);
    let uniform = len > 1 && (1..len).all(|i| key.bit(offset + i) == value);

    if uniform && same_bits < short_bits.min(long_bits) {
        // hml_same$11 v:Bit n:(#<= m)
        builder.store_bit(true)?;
        builder.store_bit(true)?;
        builder.store_bit(value)?;
        store_lim_uint(builder, len, lim_bits)?;
    } else if short_bits <= long_bits {
        // hml_short$0 len:(unary ~n) s:(n * Bit)
        builder.store_bit(false)?;
        for _ in 0..len {
            builder.store_bit(true)?;
        }
        builder.store_bit(false)?;
        for i in 0..len {
            builder.store_bit(key.bit(offset + i))?;
        }
    } else {
        // hml_long$10 n:(#<= m) s:(n * Bit)
        builder.store_bit(true)?;
        builder.store_bit(false)?;
        store_lim_uint(builder, len, lim_bits)?;
        for i in 0..len {
            builder.store_bit(key.bit(offset + i))?;
        }
    }
    Ok(())
}

fn store_lim_uint(builder: &mut CellBuilder, value: u16, bits: u16) -> Result<(), CellError> {
    if bits == 0 {
        return Ok(());
    }
    builder.store_uint(u64::from(value), bits)
}
