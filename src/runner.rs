//! One claim run: reconcile, persist the findings, assemble calldata.

use alloy::primitives::{Address, Bytes};
use std::path::Path;
use std::sync::Arc;
use tracing::{info, warn};

use crate::adapters::{HttpSnapshotFetcher, MulticallClient};
use crate::claims::{multi_token_claim_arguments, ClaimStatusResolver, PendingClaimsAggregator};
use crate::cli::Cli;
use crate::config::AppConfig;
use crate::domain::{ClaimsArguments, TokenClaimInfo};
use crate::error::{ClaimError, Result};
use crate::persistence::write_pending_claims;

/// Both variants are successful runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RunOutcome {
    NoPendingClaims,
    Claims {
        /// MerkleOrchard contract the calldata targets
        orchard: Address,
        arguments: ClaimsArguments,
        calldata: Bytes,
    },
}

/// Parse an account address; mixed-case input must carry a valid checksum
pub fn parse_account(raw: &str) -> Result<Address> {
    let raw = raw.trim();
    let digits = raw.strip_prefix("0x").unwrap_or(raw);
    let mixed_case = digits.chars().any(|c| c.is_ascii_uppercase())
        && digits.chars().any(|c| c.is_ascii_lowercase());

    let parsed = if mixed_case {
        Address::parse_checksummed(raw, None).map_err(|e| e.to_string())
    } else {
        raw.parse::<Address>().map_err(|e| e.to_string())
    };
    parsed.map_err(|e| ClaimError::AddressParsing(format!("account '{raw}': {e}")))
}

/// Pipeline with its collaborators already wired
pub struct ClaimRun {
    aggregator: PendingClaimsAggregator,
    orchard: Address,
}

impl ClaimRun {
    pub fn new(aggregator: PendingClaimsAggregator, orchard: Address) -> Self {
        Self {
            aggregator,
            orchard,
        }
    }

    /// Wire the HTTP/RPC collaborators for `chain_id` from `config`
    pub fn from_config(config: &AppConfig, chain_id: u64) -> Result<Self> {
        let chain = config.chain(chain_id)?;
        let orchard = chain.merkle_orchard_address()?;
        let caller = Arc::new(MulticallClient::new(&chain.rpc, chain.multicall_address()?)?);
        let source = Arc::new(HttpSnapshotFetcher::new(&config.ipfs_gateway)?);

        let aggregator =
            PendingClaimsAggregator::new(ClaimStatusResolver::new(caller, orchard), source);
        Ok(Self::new(aggregator, orchard))
    }

    /// Find pending claims for `account`, write them to `output` and build
    /// the `claimDistributions` payload.
    ///
    /// The output file is written before proofs are generated; a proof
    /// failure still aborts the run without producing calldata.
    pub async fn execute(
        &self,
        account: Address,
        tokens: &[TokenClaimInfo],
        output: &Path,
    ) -> Result<RunOutcome> {
        info!("Fetching reports and claimable amounts for {} token(s)", tokens.len());
        let pending = self
            .aggregator
            .multi_token_pending_claims(tokens, account)
            .await;

        if pending.is_empty() {
            info!("No pending claims for {}", account);
            return Ok(RunOutcome::NoPendingClaims);
        }

        write_pending_claims(output, &pending).await?;

        info!("Generating call arguments for {} token(s)", pending.len());
        let arguments = multi_token_claim_arguments(account, &pending)?;
        let calldata = arguments.calldata();

        Ok(RunOutcome::Claims {
            orchard: self.orchard,
            arguments,
            calldata,
        })
    }
}

/// Claim definitions for `chain_id`; a chain with no entry has none
fn token_claims_for(config: &AppConfig, chain_id: u64) -> Result<Vec<TokenClaimInfo>> {
    match config.chain(chain_id) {
        Ok(chain) => chain.token_claims(),
        Err(_) => {
            warn!("No claim definitions configured for chain {}", chain_id);
            Ok(vec![])
        }
    }
}

/// Run the whole pipeline for the CLI arguments against a loaded config
pub async fn run(config: &AppConfig, cli: &Cli) -> Result<RunOutcome> {
    if let Err(errors) = config.validate() {
        return Err(ClaimError::InvalidConfig(errors.join("; ")));
    }

    let account = parse_account(&cli.account)?;
    let tokens = token_claims_for(config, cli.chain_id)?;
    if tokens.is_empty() {
        return Ok(RunOutcome::NoPendingClaims);
    }

    let claim_run = ClaimRun::from_config(config, cli.chain_id)?;
    claim_run.execute(account, &tokens, &cli.output).await
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_account_accepts_checksum_and_lowercase() {
        let checksummed = parse_account("0xba100000625a3754423978a60c9317c58a424e3D").unwrap();
        let lower = parse_account("0xba100000625a3754423978a60c9317c58a424e3d").unwrap();
        assert_eq!(checksummed, lower);
    }

    #[test]
    fn test_parse_account_rejects_bad_checksum() {
        assert!(matches!(
            parse_account("0xBa100000625a3754423978a60c9317c58a424e3D"),
            Err(ClaimError::AddressParsing(_))
        ));
        assert!(parse_account("0x1234").is_err());
    }

    #[tokio::test]
    async fn test_unconfigured_chain_has_nothing_to_claim() {
        let config = AppConfig::from_toml("").unwrap();
        let cli = Cli {
            account: "0xba100000625a3754423978a60c9317c58a424e3d".to_string(),
            chain_id: 42161,
            output: std::env::temp_dir().join("orchard-never-written.json"),
            config_dir: "config".into(),
        };
        assert_eq!(run(&config, &cli).await.unwrap(), RunOutcome::NoPendingClaims);
        assert!(matches!(
            ClaimRun::from_config(&config, 42161),
            Err(ClaimError::InvalidConfig(_))
        ));
    }

    #[tokio::test]
    async fn test_chain_without_tokens_has_nothing_to_claim() {
        let config = AppConfig::from_toml(
            r#"
[chains.1]
name = "mainnet"
rpc = "http://127.0.0.1:9"
merkle_orchard = "0xdAE7e32ADc5d490a43cCba1f0c736033F2b4eFca"
multicall = "0x5BA1e12693Dc8F9c48aAD8770482f4739bEeD696"
"#,
        )
        .unwrap();
        let cli = Cli {
            account: "0xba100000625a3754423978a60c9317c58a424e3d".to_string(),
            chain_id: 1,
            output: std::env::temp_dir().join("orchard-never-written.json"),
            config_dir: "config".into(),
        };
        assert_eq!(run(&config, &cli).await.unwrap(), RunOutcome::NoPendingClaims);
    }
}
