use alloy::primitives::Address;
use config::{Config, ConfigError, Environment, File, FileFormat};
use serde::Deserialize;
use std::collections::HashMap;
use std::path::Path;
use tracing::warn;

use crate::domain::amount::MAX_DECIMALS;
use crate::domain::TokenClaimInfo;
use crate::error::{ClaimError, Result};

const DEFAULT_IPFS_GATEWAY: &str = "https://ipfs.io/ipfs/";
const DEFAULT_DECIMALS: u8 = 18;

/// Main configuration structure
#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    /// URL prefix a report's content hash is appended to
    pub ipfs_gateway: String,
    #[serde(default)]
    pub logging: LoggingConfig,
    /// Per-chain network parameters and token claim definitions, keyed by chain id
    #[serde(default)]
    pub chains: HashMap<String, ChainConfig>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ChainConfig {
    pub name: String,
    /// JSON-RPC endpoint
    pub rpc: String,
    /// MerkleOrchard contract
    pub merkle_orchard: String,
    /// Multicall2 contract (must expose `tryAggregate`)
    pub multicall: String,
    #[serde(default)]
    pub tokens: Vec<TokenClaimEntry>,
    /// Token address -> decimals, for entries without an explicit value
    #[serde(default)]
    pub token_decimals: HashMap<String, u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct TokenClaimEntry {
    pub token: String,
    pub distributor: String,
    /// First distribution id of this token/distributor pair
    pub week_start: u64,
    /// URL of the epoch -> report manifest
    pub manifest: String,
    #[serde(default)]
    pub decimals: Option<u8>,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// Log level (trace, debug, info, warn, error)
    #[serde(default = "default_log_level")]
    pub level: String,
    /// Enable JSON formatted logs
    #[serde(default)]
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

fn default_log_level() -> String {
    "info".to_string()
}

fn parse_address(field: &str, raw: &str) -> Result<Address> {
    raw.trim()
        .parse()
        .map_err(|e| ClaimError::AddressParsing(format!("{field} '{raw}': {e}")))
}

impl AppConfig {
    /// Load configuration from a specific directory
    pub fn load_from<P: AsRef<Path>>(config_dir: P) -> std::result::Result<Self, ConfigError> {
        let config_dir = config_dir.as_ref();

        let builder = Self::defaults()?
            // Load default config file
            .add_source(File::from(config_dir.join("default.toml")).required(false))
            // Load environment-specific config (e.g., config/production.toml)
            .add_source(
                File::from(config_dir.join(
                    std::env::var("ORCHARD_ENV").unwrap_or_else(|_| "development".to_string()),
                ))
                .required(false),
            )
            // Override with environment variables (ORCHARD__CHAINS__1__RPC, etc.)
            .add_source(
                Environment::with_prefix("ORCHARD")
                    .separator("__")
                    .try_parsing(true),
            );

        builder.build()?.try_deserialize()
    }

    /// Load configuration from an in-memory TOML document
    pub fn from_toml(toml: &str) -> std::result::Result<Self, ConfigError> {
        Self::defaults()?
            .add_source(File::from_str(toml, FileFormat::Toml))
            .build()?
            .try_deserialize()
    }

    fn defaults() -> std::result::Result<
        config::ConfigBuilder<config::builder::DefaultState>,
        ConfigError,
    > {
        Config::builder()
            .set_default("ipfs_gateway", DEFAULT_IPFS_GATEWAY)?
            .set_default("logging.level", "info")?
            .set_default("logging.json", false)
    }

    /// Network parameters for `chain_id`
    pub fn chain(&self, chain_id: u64) -> Result<&ChainConfig> {
        self.chains.get(&chain_id.to_string()).ok_or_else(|| {
            ClaimError::InvalidConfig(format!("no network configured for chain {chain_id}"))
        })
    }

    /// Validate configuration values, reporting every problem at once
    pub fn validate(&self) -> std::result::Result<(), Vec<String>> {
        let mut errors = Vec::new();

        if self.ipfs_gateway.trim().is_empty() {
            errors.push("ipfs_gateway must not be empty".to_string());
        }

        for (chain_id, chain) in &self.chains {
            if chain_id.parse::<u64>().is_err() {
                errors.push(format!("chain key '{chain_id}' is not a chain id"));
            }
            if chain.rpc.trim().is_empty() {
                errors.push(format!("chain {chain_id}: rpc must not be empty"));
            }
            for (field, raw) in [
                ("merkle_orchard", &chain.merkle_orchard),
                ("multicall", &chain.multicall),
            ] {
                if let Err(e) = parse_address(field, raw) {
                    errors.push(format!("chain {chain_id}: {e}"));
                }
            }
            for (i, entry) in chain.tokens.iter().enumerate() {
                for (field, raw) in [("token", &entry.token), ("distributor", &entry.distributor)] {
                    if let Err(e) = parse_address(field, raw) {
                        errors.push(format!("chain {chain_id} token #{i}: {e}"));
                    }
                }
                if entry.decimals.is_some_and(|d| d > MAX_DECIMALS) {
                    errors.push(format!(
                        "chain {chain_id} token #{i}: decimals must be at most {MAX_DECIMALS}"
                    ));
                }
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

impl ChainConfig {
    pub fn merkle_orchard_address(&self) -> Result<Address> {
        parse_address("merkle_orchard", &self.merkle_orchard)
    }

    pub fn multicall_address(&self) -> Result<Address> {
        parse_address("multicall", &self.multicall)
    }

    /// Decimals for `token`: explicit table entry, else 18
    pub fn decimals_for(&self, token: &Address) -> u8 {
        self.token_decimals
            .iter()
            .find(|(raw, _)| raw.trim().parse::<Address>().ok().as_ref() == Some(token))
            .map(|(_, decimals)| *decimals)
            .unwrap_or(DEFAULT_DECIMALS)
    }

    /// Claim parameters for every configured token.
    ///
    /// An empty list means there is nothing to claim on this chain.
    pub fn token_claims(&self) -> Result<Vec<TokenClaimInfo>> {
        if self.tokens.is_empty() {
            warn!("No token claims configured for {}", self.name);
            return Ok(vec![]);
        }

        self.tokens
            .iter()
            .map(|entry| {
                let token = parse_address("token", &entry.token)?;
                Ok(TokenClaimInfo {
                    token,
                    distributor: parse_address("distributor", &entry.distributor)?,
                    week_start: entry.week_start,
                    manifest: entry.manifest.trim().to_string(),
                    decimals: entry.decimals.unwrap_or_else(|| self.decimals_for(&token)),
                })
            })
            .collect()
    }
}
