use thiserror::Error;

/// Main error type for a claim run
#[derive(Error, Debug)]
pub enum ClaimError {
    // Configuration errors
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),

    #[error("Invalid configuration: {0}")]
    InvalidConfig(String),

    // Input errors
    #[error("Address parsing error: {0}")]
    AddressParsing(String),

    #[error("Invalid amount: {0}")]
    InvalidAmount(String),

    // Merkle errors
    #[error("Cannot build a Merkle tree from an empty report")]
    EmptyReport,

    #[error("No Merkle leaf for account {account} with amount {amount} (epoch {epoch})")]
    ProofNotFound {
        account: String,
        amount: String,
        epoch: u64,
    },

    // Retrieval errors that were not degraded by the caller
    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    // Serialization errors
    #[error("JSON serialization error: {0}")]
    Json(#[from] serde_json::Error),

    // IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type alias for ClaimError
pub type Result<T> = std::result::Result<T, ClaimError>;

/// Transient retrieval failures from the chain node or the snapshot store.
///
/// Callers decide whether a failure degrades to an empty result or propagates.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("RPC transport error: {0}")]
    Transport(String),

    #[error("Batch call aborted: {0}")]
    BatchAborted(String),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("HTTP {status} from {url}")]
    Status { url: String, status: u16 },

    #[error("Decode error: {0}")]
    Decode(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn proof_not_found_names_account_and_amount() {
        let err = ClaimError::ProofNotFound {
            account: "0xabc".to_string(),
            amount: "1.5".to_string(),
            epoch: 3,
        };
        let msg = err.to_string();
        assert!(msg.contains("0xabc"));
        assert!(msg.contains("1.5"));
        assert!(msg.contains("epoch 3"));
    }

    #[test]
    fn fetch_error_converts_into_claim_error() {
        let err: ClaimError = FetchError::BatchAborted("revert".to_string()).into();
        assert!(matches!(err, ClaimError::Fetch(FetchError::BatchAborted(_))));
    }
}
