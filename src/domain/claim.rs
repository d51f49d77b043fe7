use alloy::primitives::{Address, B256, U256};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::amount::u256_decimal;

/// Claim parameters for one reward token, fixed for the whole run
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TokenClaimInfo {
    pub token: Address,
    pub distributor: Address,
    /// Absolute epoch index of the first distribution
    pub week_start: u64,
    /// Locator of the epoch -> report manifest
    pub manifest: String,
    pub decimals: u8,
}

/// Epoch index -> content hash of that epoch's report
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Snapshot(pub BTreeMap<u64, String>);

impl Snapshot {
    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn report_hash(&self, epoch: u64) -> Option<&str> {
        self.0.get(&epoch).map(String::as_str)
    }
}

/// Beneficiary address -> decimal amount owed for one epoch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Report(pub BTreeMap<String, String>);

impl Report {
    /// Amount owed to `account`, matching keys by address value rather than
    /// by string so checksum casing never hides an entry.
    pub fn amount_for(&self, account: &Address) -> Option<&str> {
        self.0.iter().find_map(|(key, amount)| {
            key.parse::<Address>()
                .ok()
                .filter(|addr| addr == account)
                .map(|_| amount.as_str())
        })
    }
}

/// Whether one finalized epoch has already been claimed by the account
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EpochClaimStatus {
    pub epoch: u64,
    pub claimed: bool,
}

/// One unclaimed epoch the account has an entry for
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PendingClaim {
    /// Absolute epoch id
    pub id: u64,
    /// Raw decimal amount as it appears in the report
    pub amount: String,
}

/// Everything claimable for one token
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MultiTokenPendingClaims {
    pub token_claim_info: TokenClaimInfo,
    pub reports: BTreeMap<u64, Report>,
    pub claims: Vec<PendingClaim>,
    /// Claimable total as a human-readable decimal string
    pub available_to_claim: String,
    /// Claimable total in base units
    #[serde(skip)]
    pub available_base_units: U256,
}

impl MultiTokenPendingClaims {
    pub fn has_rewards(&self) -> bool {
        self.available_base_units > U256::ZERO
    }
}

/// One entry of the `claims` array passed to `claimDistributions`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ClaimProofTuple {
    pub distribution_id: u64,
    #[serde(with = "u256_decimal")]
    pub balance: U256,
    pub distributor: Address,
    /// Position of this claim's token in `ClaimsArguments::tokens`
    pub token_index: usize,
    pub merkle_proof: Vec<B256>,
}

/// Argument triple for `claimDistributions(account, claims, tokens)`
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ClaimsArguments {
    pub account: Address,
    pub claims: Vec<ClaimProofTuple>,
    pub tokens: Vec<Address>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::address;

    #[test]
    fn test_snapshot_parses_string_epoch_keys() {
        let snapshot: Snapshot =
            serde_json::from_str(r#"{"52": "QmA", "53": "QmB"}"#).unwrap();
        assert_eq!(snapshot.len(), 2);
        assert_eq!(snapshot.report_hash(53), Some("QmB"));
        assert_eq!(snapshot.report_hash(54), None);
    }

    #[test]
    fn test_report_lookup_ignores_checksum_case() {
        let report: Report = serde_json::from_str(
            r#"{"0xba100000625a3754423978a60c9317c58a424e3d": "12.5"}"#,
        )
        .unwrap();
        let account = address!("0xba100000625a3754423978a60c9317c58a424e3D");
        assert_eq!(report.amount_for(&account), Some("12.5"));
        assert_eq!(report.amount_for(&Address::ZERO), None);
    }

    #[test]
    fn test_claim_tuple_serializes_balance_as_decimal() {
        let tuple = ClaimProofTuple {
            distribution_id: 3,
            balance: U256::from(1_500_000_000_000_000_000u64),
            distributor: Address::ZERO,
            token_index: 0,
            merkle_proof: vec![],
        };
        let json = serde_json::to_value(&tuple).unwrap();
        assert_eq!(json["balance"], "1500000000000000000");
        assert_eq!(json["distributionId"], 3);
        assert_eq!(json["tokenIndex"], 0);
    }
}
