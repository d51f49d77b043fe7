//! Batch read calls through a Multicall2 `tryAggregate` contract.
//!
//! Many independent view calls are packed into one `eth_call`. With
//! `require_success = false` a failing inner call leaves `None` in its slot and
//! the rest of the batch is still returned; with `require_success = true` any
//! inner failure reverts the aggregator and the whole batch fails.

use alloy::contract::Error as ContractError;
use alloy::primitives::{Address, Bytes};
use alloy::providers::{DynProvider, Provider, ProviderBuilder};
use alloy::sol_types::SolCall;
use async_trait::async_trait;
use tracing::debug;

use crate::contracts::IMulticall2;
use crate::error::{ClaimError, FetchError, Result};

/// One encoded read call
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BatchCall {
    pub target: Address,
    pub call_data: Bytes,
}

impl BatchCall {
    pub fn new<C: SolCall>(target: Address, call: &C) -> Self {
        Self {
            target,
            call_data: Bytes::from(call.abi_encode()),
        }
    }
}

/// Executes a batch of read calls in one round trip, results in call order
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait BatchCaller: Send + Sync {
    async fn try_aggregate(
        &self,
        require_success: bool,
        calls: Vec<BatchCall>,
    ) -> std::result::Result<Vec<Option<Bytes>>, FetchError>;
}

/// Decode one batch slot with the return shape of `C`.
///
/// Single-value returns come back as the bare value, multi-value returns as
/// the generated return struct. A failed slot or undecodable data is `None`.
pub fn decode_slot<C: SolCall>(slot: Option<&Bytes>) -> Option<C::Return> {
    let data = slot?;
    match C::abi_decode_returns(data) {
        Ok(value) => Some(value),
        Err(e) => {
            debug!("Failed to decode {} return data: {}", C::SIGNATURE, e);
            None
        }
    }
}

/// A node error response means the aggregator call reverted; anything else
/// never reached the contract.
fn batch_error(err: ContractError) -> FetchError {
    match &err {
        ContractError::TransportError(rpc) if rpc.as_error_resp().is_some() => {
            FetchError::BatchAborted(err.to_string())
        }
        _ => FetchError::Transport(err.to_string()),
    }
}

/// `BatchCaller` backed by a Multicall2 contract over HTTP JSON-RPC
#[derive(Clone)]
pub struct MulticallClient {
    provider: DynProvider,
    multicall_address: Address,
}

impl MulticallClient {
    pub fn new(rpc_url: &str, multicall_address: Address) -> Result<Self> {
        let url: url::Url = rpc_url
            .parse()
            .map_err(|e| ClaimError::InvalidConfig(format!("Invalid RPC URL {rpc_url}: {e}")))?;
        let provider = ProviderBuilder::new().connect_http(url).erased();

        Ok(Self::with_provider(provider, multicall_address))
    }

    pub fn with_provider(provider: DynProvider, multicall_address: Address) -> Self {
        Self {
            provider,
            multicall_address,
        }
    }
}

#[async_trait]
impl BatchCaller for MulticallClient {
    async fn try_aggregate(
        &self,
        require_success: bool,
        calls: Vec<BatchCall>,
    ) -> std::result::Result<Vec<Option<Bytes>>, FetchError> {
        if calls.is_empty() {
            return Ok(vec![]);
        }

        let call_count = calls.len();
        let multicall = IMulticall2::new(self.multicall_address, self.provider.clone());
        let encoded: Vec<IMulticall2::Call> = calls
            .into_iter()
            .map(|call| IMulticall2::Call {
                target: call.target,
                callData: call.call_data,
            })
            .collect();

        let results = multicall
            .tryAggregate(require_success, encoded)
            .call()
            .await
            .map_err(batch_error)?;

        if results.len() != call_count {
            return Err(FetchError::Decode(format!(
                "tryAggregate returned {} results for {} calls",
                results.len(),
                call_count
            )));
        }

        debug!(
            "tryAggregate: {} calls, {} failed",
            call_count,
            results.iter().filter(|r| !r.success).count()
        );

        Ok(results
            .into_iter()
            .map(|r| r.success.then_some(r.returnData))
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::contracts::IMerkleOrchard;
    use alloy::primitives::{B256, U256};
    use alloy::sol_types::SolValue;
    use alloy::transports::mock::Asserter;

    fn mocked_client(asserter: &Asserter) -> MulticallClient {
        let provider = ProviderBuilder::new()
            .disable_recommended_fillers()
            .connect_mocked_client(asserter.clone())
            .erased();
        MulticallClient::with_provider(provider, Address::repeat_byte(0x5b))
    }

    fn root_calls(count: u64) -> Vec<BatchCall> {
        (0..count)
            .map(|id| {
                BatchCall::new(
                    Address::repeat_byte(0x11),
                    &IMerkleOrchard::getDistributionRootCall {
                        token: Address::repeat_byte(0x22),
                        distributor: Address::repeat_byte(0x33),
                        distributionId: U256::from(id),
                    },
                )
            })
            .collect()
    }

    fn aggregate_response(results: Vec<IMulticall2::CallResult>) -> Bytes {
        Bytes::from((results,).abi_encode_params())
    }

    #[test]
    fn test_batch_call_encodes_selector_and_target() {
        let target = Address::repeat_byte(0x11);
        let call = BatchCall::new(
            target,
            &IMerkleOrchard::getDistributionRootCall {
                token: Address::repeat_byte(0x22),
                distributor: Address::repeat_byte(0x33),
                distributionId: U256::from(7u64),
            },
        );
        assert_eq!(call.target, target);
        assert_eq!(
            &call.call_data[..4],
            IMerkleOrchard::getDistributionRootCall::SELECTOR.as_slice()
        );
    }

    #[test]
    fn test_decode_slot_unwraps_single_value() {
        let root = B256::repeat_byte(0xab);
        let data = Bytes::from(root.to_vec());
        let decoded = decode_slot::<IMerkleOrchard::getDistributionRootCall>(Some(&data));
        assert_eq!(decoded, Some(root));
    }

    #[test]
    fn test_decode_slot_failed_or_garbage_is_none() {
        assert_eq!(decode_slot::<IMerkleOrchard::isClaimedCall>(None), None);
        let short = Bytes::from(vec![0x01, 0x02]);
        assert_eq!(decode_slot::<IMerkleOrchard::isClaimedCall>(Some(&short)), None);
    }

    #[test]
    fn test_client_rejects_bad_rpc_url() {
        let result = MulticallClient::new("not a url", Address::ZERO);
        assert!(matches!(result, Err(ClaimError::InvalidConfig(_))));
    }

    #[tokio::test]
    async fn test_failed_inner_call_leaves_empty_slot_in_order() {
        let asserter = Asserter::new();
        asserter.push_success(&aggregate_response(vec![
            IMulticall2::CallResult {
                success: true,
                returnData: Bytes::from(vec![0xaa; 32]),
            },
            IMulticall2::CallResult {
                success: false,
                returnData: Bytes::new(),
            },
            IMulticall2::CallResult {
                success: true,
                returnData: Bytes::from(vec![0xcc; 32]),
            },
        ]));

        let results = mocked_client(&asserter)
            .try_aggregate(false, root_calls(3))
            .await
            .unwrap();

        assert_eq!(
            results,
            vec![
                Some(Bytes::from(vec![0xaa; 32])),
                None,
                Some(Bytes::from(vec![0xcc; 32])),
            ]
        );
        assert_eq!(
            decode_slot::<IMerkleOrchard::getDistributionRootCall>(results[2].as_ref()),
            Some(B256::repeat_byte(0xcc))
        );
    }

    #[tokio::test]
    async fn test_reverted_aggregate_is_batch_aborted() {
        let asserter = Asserter::new();
        asserter.push_failure_msg("execution reverted: Multicall2 aggregate: call failed");

        let result = mocked_client(&asserter).try_aggregate(true, root_calls(2)).await;
        assert!(matches!(result, Err(FetchError::BatchAborted(_))));
    }

    #[tokio::test]
    async fn test_unreachable_node_is_transport_error() {
        let client = MulticallClient::new("http://127.0.0.1:9", Address::ZERO).unwrap();
        let result = client.try_aggregate(true, root_calls(1)).await;
        assert!(matches!(result, Err(FetchError::Transport(_))));
    }

    #[tokio::test]
    async fn test_result_count_mismatch_is_decode_error() {
        let asserter = Asserter::new();
        asserter.push_success(&aggregate_response(vec![IMulticall2::CallResult {
            success: true,
            returnData: Bytes::new(),
        }]));

        let result = mocked_client(&asserter).try_aggregate(false, root_calls(2)).await;
        assert!(matches!(result, Err(FetchError::Decode(_))));
    }

    #[tokio::test]
    async fn test_empty_batch_skips_rpc() {
        // Port 9 is discard; any request would fail, so Ok proves no call was made
        let client = MulticallClient::new("http://127.0.0.1:9", Address::ZERO).unwrap();
        let results = client.try_aggregate(false, vec![]).await.unwrap();
        assert!(results.is_empty());
    }
}
