//! Which epochs of a token are finalized on-chain and already claimed.

use alloy::primitives::{Address, Bytes, B256, U256};
use std::sync::Arc;
use tracing::{debug, warn};

use crate::adapters::{decode_slot, BatchCall, BatchCaller};
use crate::contracts::IMerkleOrchard;
use crate::domain::{EpochClaimStatus, TokenClaimInfo};

/// Resolves per-epoch claim status for one account through a batch caller
#[derive(Clone)]
pub struct ClaimStatusResolver {
    caller: Arc<dyn BatchCaller>,
    merkle_orchard: Address,
}

impl ClaimStatusResolver {
    pub fn new(caller: Arc<dyn BatchCaller>, merkle_orchard: Address) -> Self {
        Self {
            caller,
            merkle_orchard,
        }
    }

    /// `isClaimed` calls for every epoch, followed by `getDistributionRoot`
    /// calls for the same epochs in the same order.
    pub fn build_calls(
        &self,
        total_epochs: usize,
        account: Address,
        info: &TokenClaimInfo,
    ) -> Vec<BatchCall> {
        let epochs = || (0..total_epochs as u64).map(|i| U256::from(info.week_start + i));

        let claimed_calls = epochs().map(|epoch| {
            BatchCall::new(
                self.merkle_orchard,
                &IMerkleOrchard::isClaimedCall {
                    token: info.token,
                    distributor: info.distributor,
                    distributionId: epoch,
                    claimer: account,
                },
            )
        });
        let root_calls = epochs().map(|epoch| {
            BatchCall::new(
                self.merkle_orchard,
                &IMerkleOrchard::getDistributionRootCall {
                    token: info.token,
                    distributor: info.distributor,
                    distributionId: epoch,
                },
            )
        });

        claimed_calls.chain(root_calls).collect()
    }

    /// Claim status of every finalized epoch in `week_start..week_start + total_epochs`.
    ///
    /// Epochs without a distribution root are left out entirely. Any failure of
    /// the batch resolves to an empty status list, which yields no claims.
    pub async fn resolve(
        &self,
        total_epochs: usize,
        account: Address,
        info: &TokenClaimInfo,
    ) -> Vec<EpochClaimStatus> {
        if total_epochs == 0 {
            return vec![];
        }

        let calls = self.build_calls(total_epochs, account, info);
        let results = match self.caller.try_aggregate(false, calls).await {
            Ok(results) => results,
            Err(e) => {
                warn!("[Claim] Claim status error for token {}: {}", info.token, e);
                return vec![];
            }
        };

        if results.len() != total_epochs * 2 {
            warn!(
                "[Claim] Expected {} claim status results for token {}, got {}",
                total_epochs * 2,
                info.token,
                results.len()
            );
            return vec![];
        }

        let (claimed, roots) = results.split_at(total_epochs);
        let statuses = finalized_statuses(info.week_start, claimed, roots);
        debug!(
            "Token {}: {} of {} epochs finalized on-chain",
            info.token,
            statuses.len(),
            total_epochs
        );
        statuses
    }
}

/// Pair claimed flags with roots position by position and keep only epochs
/// whose root is known and non-zero.
///
/// An epoch whose claimed flag could not be read is dropped as well: it can't
/// be proven unclaimed, so it must not produce a claim.
pub fn finalized_statuses(
    week_start: u64,
    claimed: &[Option<Bytes>],
    roots: &[Option<Bytes>],
) -> Vec<EpochClaimStatus> {
    claimed
        .iter()
        .zip(roots)
        .enumerate()
        .filter_map(|(i, (claimed_slot, root_slot))| {
            let epoch = week_start + i as u64;
            let root = decode_slot::<IMerkleOrchard::getDistributionRootCall>(root_slot.as_ref())?;
            if root == B256::ZERO {
                return None;
            }
            match decode_slot::<IMerkleOrchard::isClaimedCall>(claimed_slot.as_ref()) {
                Some(claimed) => Some(EpochClaimStatus { epoch, claimed }),
                None => {
                    warn!("[Claim] isClaimed unavailable for epoch {}, skipping", epoch);
                    None
                }
            }
        })
        .collect()
}
