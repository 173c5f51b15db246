//! Trie edge-label decoding.
//!
//! Every edge of the trie carries a bit prefix in one of three
//! encodings:
//!
//! - `hml_short$0 len:(unary ~n) s:(n * Bit)`
//! - `hml_long$10 n:(#<= m) s:(n * Bit)`
//! - `hml_same$11 v:Bit n:(#<= m)`
//!
//! where `m` is the number of key bits still unconsumed on the current
//! path. `m` sizes the `#<= m` limited integers, so the decoder must
//! always be told the remaining capacity.

use everscale_types::cell::CellSlice;
use everscale_types::error::Error as CellError;

use crate::bits::KeyPath;
use crate::{ProverError, Result};

/// Decode the edge label at the slice cursor.
///
/// `capacity` is the number of key bits remaining on this path. Bit
/// underflow and labels longer than `capacity` surface as
/// [`ProverError::MalformedTrie`].
pub(crate) fn read_label(slice: &mut CellSlice<'_>, capacity: u16) -> Result<KeyPath> {
    read_label_inner(slice, capacity).map_err(ProverError::MalformedTrie)
}

fn read_label_inner(
    slice: &mut CellSlice<'_>,
    capacity: u16,
) -> std::result::Result<KeyPath, CellError> {
    // hml_short$0
    if !slice.load_bit()? {
        let mut len = 0u16;
        while slice.load_bit()? {
            len += 1;
            if len > capacity {
                return Err(CellError::InvalidData);
            }
        }
        return KeyPath::load_from(slice, len);
    }
    // hml_long$10
    if !slice.load_bit()? {
        let len = load_lim_uint(slice, capacity)?;
        if len > capacity {
            return Err(CellError::InvalidData);
        }
        return KeyPath::load_from(slice, len);
    }
    // hml_same$11: the value bit comes before the length
    let value = slice.load_bit()?;
    let len = load_lim_uint(slice, capacity)?;
    if len > capacity {
        return Err(CellError::InvalidData);
    }
    let mut label = KeyPath::new();
    for _ in 0..len {
        label.push(value);
    }
    Ok(label)
}

/// Bit width of a `#<= max` limited integer.
pub(crate) fn lim_uint_bits(max: u16) -> u16 {
    16 - max.leading_zeros() as u16
}

fn load_lim_uint(
    slice: &mut CellSlice<'_>,
    max: u16,
) -> std::result::Result<u16, CellError> {
    let bits = lim_uint_bits(max);
    if bits == 0 {
        return Ok(0);
    }
    Ok(slice.load_uint(bits)? as u16)
}
