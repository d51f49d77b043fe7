//! Solidity bindings for the contracts this tool reads from or encodes for.

use alloy::sol;

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IMerkleOrchard {
        struct Claim {
            uint256 distributionId;
            uint256 balance;
            address distributor;
            uint256 tokenIndex;
            bytes32[] merkleProof;
        }

        /// Whether `claimer` already claimed distribution `distributionId`
        function isClaimed(
            address token,
            address distributor,
            uint256 distributionId,
            address claimer
        ) external view returns (bool);

        /// Merkle root committed for one distribution; zero if not created yet
        function getDistributionRoot(
            address token,
            address distributor,
            uint256 distributionId
        ) external view returns (bytes32);

        /// Claim several distributions across several tokens at once
        function claimDistributions(
            address claimer,
            Claim[] calldata claims,
            address[] calldata tokens
        ) external;
    }
}

sol! {
    #[allow(missing_docs)]
    #[sol(rpc)]
    interface IMulticall2 {
        struct Call {
            address target;
            bytes callData;
        }

        struct CallResult {
            bool success;
            bytes returnData;
        }

        /// Execute `calls` in order; reverts on the first failure only when
        /// `requireSuccess` is set
        function tryAggregate(bool requireSuccess, Call[] calldata calls)
            external
            returns (CallResult[] memory returnData);
    }
}

/// Human-readable signature printed next to the encoded calldata
pub const CLAIM_DISTRIBUTIONS_SIGNATURE: &str = "claimDistributions(address,Claim[],address[])";
