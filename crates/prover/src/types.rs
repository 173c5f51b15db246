//! Airdrop payload types.

use everscale_types::cell::{CellBuilder, CellContext, CellSlice, HashBytes, Load, Store};
use everscale_types::error::Error as CellError;
use everscale_types::models::StdAddr;
use everscale_types::num::Tokens;

/// Per-account entitlement stored in a trie leaf.
///
/// Leaf layout: `amount:Coins start_from:uint48 expire_at:uint48`.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AirdropEntry {
    /// Claimable amount in indivisible units.
    pub amount: Tokens,
    /// Unix time at which the claim opens.
    pub start_from: u64,
    /// Unix time after which the claim is void.
    pub expire_at: u64,
}

impl<'a> Load<'a> for AirdropEntry {
    fn load_from(slice: &mut CellSlice<'a>) -> std::result::Result<Self, CellError> {
        Ok(Self {
            amount: Tokens::load_from(slice)?,
            start_from: slice.load_uint(48)?,
            expire_at: slice.load_uint(48)?,
        })
    }
}

impl Store for AirdropEntry {
    fn store_into(
        &self,
        builder: &mut CellBuilder,
        context: &mut dyn CellContext,
    ) -> std::result::Result<(), CellError> {
        self.amount.store_into(builder, context)?;
        builder.store_uint(self.start_from, 48)?;
        builder.store_uint(self.expire_at, 48)
    }
}

/// One enumerated leaf: an account and its entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AirdropLeaf {
    pub account: StdAddr,
    pub entry: AirdropEntry,
}

/// A proven entitlement.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct WalletAirdrop {
    pub account: StdAddr,
    pub entry: AirdropEntry,
    /// Bag-of-cells serialization of a Merkle proof cell. Its single
    /// reference is the trie pruned down to the root→leaf path for
    /// `account`; the pruned trie still hashes to the published root.
    pub proof: Vec<u8>,
}

/// The all-zero account, used as the "start of the key space" cursor
/// and as the end-of-enumeration sentinel.
pub fn zero_account() -> StdAddr {
    StdAddr::new(0, HashBytes::ZERO)
}
