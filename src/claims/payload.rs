//! Assemble `claimDistributions` arguments from pending claims.

use alloy::primitives::{Address, Bytes, U256};
use alloy::sol_types::SolCall;
use std::collections::BTreeMap;
use tracing::debug;

use super::merkle::{leaf_hash, MerkleTree};
use crate::contracts::IMerkleOrchard;
use crate::domain::{scale_amount, ClaimProofTuple, ClaimsArguments, MultiTokenPendingClaims};
use crate::error::{ClaimError, Result};

/// Proofs for every pending claim of every token, in token order.
///
/// The token list holds each token's address once, and every tuple's
/// `token_index` points at its token in that list. Any claim that cannot be
/// proven against its report fails the whole assembly.
pub fn multi_token_claim_arguments(
    account: Address,
    pending: &[MultiTokenPendingClaims],
) -> Result<ClaimsArguments> {
    let mut tokens: Vec<Address> = Vec::new();
    let mut claims = Vec::new();
    for token_pending in pending {
        let token = token_pending.token_claim_info.token;
        // one token may be distributed by several distributors
        let token_index = match tokens.iter().position(|t| *t == token) {
            Some(index) => index,
            None => {
                tokens.push(token);
                tokens.len() - 1
            }
        };
        claims.extend(compute_claim_proofs(token_pending, account, token_index)?);
    }

    Ok(ClaimsArguments {
        account,
        claims,
        tokens,
    })
}

/// Tuples for one token's pending claims, in claim order
pub fn compute_claim_proofs(
    token_pending: &MultiTokenPendingClaims,
    account: Address,
    token_index: usize,
) -> Result<Vec<ClaimProofTuple>> {
    let info = &token_pending.token_claim_info;
    let mut trees: BTreeMap<u64, MerkleTree> = BTreeMap::new();

    token_pending
        .claims
        .iter()
        .map(|claim| -> Result<ClaimProofTuple> {
            let not_found = || ClaimError::ProofNotFound {
                account: account.to_string(),
                amount: claim.amount.clone(),
                epoch: claim.id,
            };

            if !trees.contains_key(&claim.id) {
                let report = token_pending.reports.get(&claim.id).ok_or_else(not_found)?;
                trees.insert(claim.id, MerkleTree::from_report(report, info.decimals)?);
            }
            let tree = &trees[&claim.id];

            let balance = scale_amount(&claim.amount, info.decimals)?;
            let merkle_proof = tree.claim_proof(account, &claim.amount, info.decimals, claim.id)?;
            if !MerkleTree::verify(&merkle_proof, tree.root(), leaf_hash(account, balance)) {
                return Err(not_found());
            }

            debug!(
                "Proof for token {} epoch {}: {} node(s) over {} leaves",
                info.token,
                claim.id,
                merkle_proof.len(),
                tree.leaf_count()
            );

            Ok(ClaimProofTuple {
                distribution_id: claim.id,
                balance,
                distributor: info.distributor,
                token_index,
                merkle_proof,
            })
        })
        .collect()
}

impl ClaimsArguments {
    /// Typed `claimDistributions` call for these arguments
    pub fn to_call(&self) -> IMerkleOrchard::claimDistributionsCall {
        IMerkleOrchard::claimDistributionsCall {
            claimer: self.account,
            claims: self
                .claims
                .iter()
                .map(|claim| IMerkleOrchard::Claim {
                    distributionId: U256::from(claim.distribution_id),
                    balance: claim.balance,
                    distributor: claim.distributor,
                    tokenIndex: U256::from(claim.token_index),
                    merkleProof: claim.merkle_proof.clone(),
                })
                .collect(),
            tokens: self.tokens.clone(),
        }
    }

    /// ABI-encoded calldata (selector included)
    pub fn calldata(&self) -> Bytes {
        Bytes::from(self.to_call().abi_encode())
    }
}
