//! Packed bitstrings for trie keys and edge labels.

use everscale_types::cell::{Cell, CellBuilder, CellSlice, Load};
use everscale_types::error::Error as CellError;
use everscale_types::models::StdAddr;

use crate::{ProverError, Result};

/// Bit length of a trie key: the TLB encoding of
/// `addr_std$10 anycast:nothing wc:int8 address:bits256`.
pub const KEY_BITS: u16 = 267;

/// Capacity of a [`KeyPath`], a full key rounded up to a byte boundary.
const MAX_BITS: u16 = 272;

/// A bitstring of at most [`KEY_BITS`] bits, packed MSB-first.
///
/// Used both for full 267-bit keys and for the partial paths and edge
/// labels met while walking the trie. Cheap to copy, so walk recursion
/// passes paths by value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct KeyPath {
    bytes: [u8; 34],
    len: u16,
}

/// Outcome of comparing a full key against a path prefix.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyOrder {
    /// The key begins with the prefix.
    StartsWith,
    /// The key orders strictly before the prefix.
    Less,
    /// The key orders strictly after the prefix.
    Greater,
}

impl KeyPath {
    pub const fn new() -> Self {
        Self { bytes: [0; 34], len: 0 }
    }

    pub const fn len(&self) -> u16 {
        self.len
    }

    pub const fn is_empty(&self) -> bool {
        self.len == 0
    }

    /// Bit at `index`, which must be below `len`.
    pub fn bit(&self, index: u16) -> bool {
        debug_assert!(index < self.len);
        self.bytes[usize::from(index / 8)] & (0x80 >> (index % 8)) != 0
    }

    pub fn push(&mut self, bit: bool) {
        assert!(self.len < MAX_BITS, "key path overflow");
        if bit {
            self.bytes[usize::from(self.len / 8)] |= 0x80 >> (self.len % 8);
        }
        self.len += 1;
    }

    /// Append every bit of `other`, producing `self || other`.
    pub fn extend(&mut self, other: &KeyPath) {
        for i in 0..other.len {
            self.push(other.bit(i));
        }
    }

    /// A copy of the path with one extra bit appended.
    pub fn with_bit(mut self, bit: bool) -> Self {
        self.push(bit);
        self
    }

    /// Compare this key against a path `prefix`.
    ///
    /// The prefix must not be longer than the key: the walk only ever
    /// compares full keys against partial paths.
    pub fn compare_prefix(&self, prefix: &KeyPath) -> KeyOrder {
        debug_assert!(prefix.len <= self.len);
        for i in 0..prefix.len.min(self.len) {
            match (self.bit(i), prefix.bit(i)) {
                (a, b) if a == b => continue,
                (false, true) => return KeyOrder::Less,
                _ => return KeyOrder::Greater,
            }
        }
        KeyOrder::StartsWith
    }

    /// Read `count` bits from a cell slice.
    pub fn load_from(
        slice: &mut CellSlice<'_>,
        count: u16,
    ) -> std::result::Result<Self, CellError> {
        let mut path = Self::new();
        for _ in 0..count {
            path.push(slice.load_bit()?);
        }
        Ok(path)
    }

    /// Store every bit into a cell builder.
    pub fn store_into(&self, builder: &mut CellBuilder) -> std::result::Result<(), CellError> {
        for i in 0..self.len {
            builder.store_bit(self.bit(i))?;
        }
        Ok(())
    }

    fn to_cell(&self) -> std::result::Result<Cell, CellError> {
        let mut builder = CellBuilder::new();
        self.store_into(&mut builder)?;
        builder.build()
    }

    /// The 267-bit trie key of an account.
    ///
    /// Addresses carrying an anycast prefix do not fit the fixed key
    /// width and are rejected.
    pub fn from_account(account: &StdAddr) -> Result<Self> {
        let cell = CellBuilder::build_from(account).map_err(ProverError::Encoding)?;
        let mut slice = cell.as_slice().map_err(ProverError::Encoding)?;
        if slice.size_bits() != KEY_BITS {
            return Err(ProverError::Encoding(CellError::InvalidData));
        }
        Self::load_from(&mut slice, KEY_BITS).map_err(ProverError::Encoding)
    }

    /// Decode a full 267-bit path back into an account address.
    pub fn to_account(&self) -> Result<StdAddr> {
        let cell = self.to_cell().map_err(ProverError::MalformedTrie)?;
        let mut slice = cell.as_slice().map_err(ProverError::MalformedTrie)?;
        StdAddr::load_from(&mut slice).map_err(ProverError::MalformedTrie)
    }
}

impl Default for KeyPath {
    fn default() -> Self {
        Self::new()
    }
}
