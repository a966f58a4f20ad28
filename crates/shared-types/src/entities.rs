//! # Core Domain Entities
//!
//! Identifier and numeric aliases used across the governance subsystems.

use serde::{Deserialize, Serialize};
use sha2::{Digest, Sha256};

// Re-export U256 from primitive-types for threshold arithmetic
pub use primitive_types::U256;

/// A 32-byte object identifier.
pub type Hash = [u8; 32];

/// A 32-byte account address.
pub type Address = [u8; 32];

/// Identifier of a DAO.
pub type DaoId = Hash;

/// Identifier of a proposal.
pub type ProposalId = Hash;

/// Identifier of a per-proposal market state object.
pub type MarketId = Hash;

/// Identifier of an AMM pool.
pub type PoolId = Hash;

/// Timestamp in milliseconds since UNIX epoch.
pub type Timestamp = u64;

/// Fewest outcomes a proposal may carry (the baseline plus one challenger).
pub const MIN_OUTCOMES: usize = 2;

/// Most outcomes a proposal may carry.
pub const MAX_OUTCOMES: usize = 10;

/// Derives a domain-separated identifier from a tag and a list of parts.
///
/// `derive_id(b"market", &[&dao_id, &proposal_id])` is stable across runs,
/// so objects created from the same inputs always share the same id.
pub fn derive_id(tag: &[u8], parts: &[&[u8]]) -> Hash {
    let mut hasher = Sha256::new();
    hasher.update((tag.len() as u32).to_le_bytes());
    hasher.update(tag);
    for part in parts {
        hasher.update((part.len() as u32).to_le_bytes());
        hasher.update(part);
    }
    hasher.finalize().into()
}

/// Short, log-friendly rendering of an identifier (first 4 bytes, hex).
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShortId(pub [u8; 4]);

impl ShortId {
    pub fn of(id: &Hash) -> Self {
        Self([id[0], id[1], id[2], id[3]])
    }
}

impl std::fmt::Display for ShortId {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        for byte in self.0 {
            write!(f, "{:02x}", byte)?;
        }
        Ok(())
    }
}
