//! Claim reconciliation and proof generation.
//!
//! `claim_status` reads on-chain state, `pending` joins it with snapshot
//! reports, `merkle` rebuilds the distribution trees and `payload` packs
//! the proofs for `claimDistributions`.

pub mod claim_status;
pub mod merkle;
pub mod payload;
pub mod pending;

pub use claim_status::ClaimStatusResolver;
pub use merkle::{leaf_hash, MerkleTree};
pub use payload::{compute_claim_proofs, multi_token_claim_arguments};
pub use pending::{load_snapshot, PendingClaimsAggregator};
