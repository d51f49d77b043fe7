//! Reconcile snapshots against on-chain claim status into pending claims.

use alloy::primitives::{Address, U256};
use futures::future::join_all;
use std::collections::BTreeMap;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

use super::claim_status::ClaimStatusResolver;
use crate::adapters::SnapshotSource;
use crate::domain::{
    format_amount, scale_amount, EpochClaimStatus, MultiTokenPendingClaims, PendingClaim, Report,
    Snapshot, TokenClaimInfo,
};
use crate::error::{ClaimError, Result};

/// Fetch a manifest, treating any failure as "no known epochs"
pub async fn load_snapshot(source: &dyn SnapshotSource, manifest: &str) -> Snapshot {
    match source.fetch_snapshot(manifest).await {
        Ok(snapshot) => snapshot,
        Err(e) => {
            warn!("Snapshot unavailable at {}: {}", manifest, e);
            Snapshot::default()
        }
    }
}

/// Absolute ids of finalized epochs the account has not claimed yet
pub fn pending_epochs(statuses: &[EpochClaimStatus]) -> Vec<u64> {
    statuses
        .iter()
        .filter(|status| !status.claimed)
        .map(|status| status.epoch)
        .collect()
}

/// Claims for `account` across `reports`, with their exact total in base units
pub fn collect_claims(
    reports: &BTreeMap<u64, Report>,
    account: &Address,
    decimals: u8,
) -> Result<(Vec<PendingClaim>, U256)> {
    let mut claims = Vec::new();
    let mut total = U256::ZERO;

    for (epoch, report) in reports {
        let Some(amount) = report.amount_for(account) else {
            continue;
        };
        total = total
            .checked_add(scale_amount(amount, decimals)?)
            .ok_or_else(|| ClaimError::InvalidAmount(format!("total overflow at epoch {epoch}")))?;
        claims.push(PendingClaim {
            id: *epoch,
            amount: amount.to_string(),
        });
    }

    Ok((claims, total))
}

/// Builds the pending-claim set for one or many tokens
#[derive(Clone)]
pub struct PendingClaimsAggregator {
    resolver: ClaimStatusResolver,
    source: Arc<dyn SnapshotSource>,
}

impl PendingClaimsAggregator {
    pub fn new(resolver: ClaimStatusResolver, source: Arc<dyn SnapshotSource>) -> Self {
        Self { resolver, source }
    }

    /// Pending claims of `account` for one token.
    ///
    /// Network failures degrade to fewer (or no) claims; only malformed
    /// report data for the account itself is an error.
    pub async fn token_pending_claims(
        &self,
        info: &TokenClaimInfo,
        account: Address,
    ) -> Result<MultiTokenPendingClaims> {
        let snapshot = load_snapshot(self.source.as_ref(), &info.manifest).await;
        if snapshot.is_empty() {
            debug!("Token {}: no known epochs", info.token);
            return Ok(MultiTokenPendingClaims {
                token_claim_info: info.clone(),
                reports: BTreeMap::new(),
                claims: vec![],
                available_to_claim: format_amount(U256::ZERO, info.decimals)?,
                available_base_units: U256::ZERO,
            });
        }

        let statuses = self.resolver.resolve(snapshot.len(), account, info).await;
        let pending = pending_epochs(&statuses);

        debug!(
            "Token {}: {} snapshot epochs, {} finalized, {} unclaimed",
            info.token,
            snapshot.len(),
            statuses.len(),
            pending.len()
        );

        let reports = self.fetch_reports(&snapshot, &pending).await;
        let (claims, total) = collect_claims(&reports, &account, info.decimals)?;

        Ok(MultiTokenPendingClaims {
            token_claim_info: info.clone(),
            reports,
            claims,
            available_to_claim: format_amount(total, info.decimals)?,
            available_base_units: total,
        })
    }

    /// Pending claims for every token, computed concurrently.
    ///
    /// Tokens with nothing to claim are dropped. A token whose computation
    /// fails is logged and dropped without affecting the others.
    pub async fn multi_token_pending_claims(
        &self,
        infos: &[TokenClaimInfo],
        account: Address,
    ) -> Vec<MultiTokenPendingClaims> {
        let results = join_all(
            infos
                .iter()
                .map(|info| self.token_pending_claims(info, account)),
        )
        .await;

        results
            .into_iter()
            .zip(infos)
            .filter_map(|(result, info)| match result {
                Ok(pending) if pending.has_rewards() => {
                    info!(
                        "Token {}: {} pending claim(s), {} claimable",
                        info.token,
                        pending.claims.len(),
                        pending.available_to_claim
                    );
                    Some(pending)
                }
                Ok(_) => {
                    debug!("Token {}: nothing to claim", info.token);
                    None
                }
                Err(e) => {
                    error!("Token {}: pending claims failed: {}", info.token, e);
                    None
                }
            })
            .collect()
    }

    /// Reports for the pending epochs that the snapshot knows about
    async fn fetch_reports(&self, snapshot: &Snapshot, epochs: &[u64]) -> BTreeMap<u64, Report> {
        let fetches = epochs.iter().filter_map(|&epoch| {
            let hash = snapshot.report_hash(epoch)?;
            let source = Arc::clone(&self.source);
            Some(async move { (epoch, hash, source.fetch_report(hash).await) })
        });

        join_all(fetches)
            .await
            .into_iter()
            .filter_map(|(epoch, hash, result)| match result {
                Ok(report) => Some((epoch, report)),
                Err(e) => {
                    warn!("Report {} for epoch {} unavailable: {}", hash, epoch, e);
                    None
                }
            })
            .collect()
    }
}
