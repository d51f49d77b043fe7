pub mod adapters;
pub mod claims;
pub mod cli;
pub mod config;
pub mod contracts;
pub mod domain;
pub mod error;
pub mod persistence;
pub mod runner;

pub use adapters::{BatchCall, BatchCaller, HttpSnapshotFetcher, MulticallClient, SnapshotSource};
pub use claims::{
    multi_token_claim_arguments, ClaimStatusResolver, MerkleTree, PendingClaimsAggregator,
};
pub use config::AppConfig;
pub use domain::{
    ClaimProofTuple, ClaimsArguments, MultiTokenPendingClaims, PendingClaim, Report, Snapshot,
    TokenClaimInfo,
};
pub use error::{ClaimError, FetchError, Result};
pub use runner::{ClaimRun, RunOutcome};
