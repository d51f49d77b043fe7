//! Merkle tree over one epoch report, bit-compatible with the MerkleOrchard
//! verifier (OpenZeppelin `MerkleProof` with sorted pair hashing).
//!
//! Leaves are `keccak256(abi.encodePacked(address, uint256 balance))`. The leaf
//! set is sorted and deduplicated, layers are built pairwise with
//! `keccak256(min(a, b) ++ max(a, b))`, and an odd trailing node is carried up
//! to the next layer unchanged.

use alloy::primitives::{keccak256, Address, B256, U256};
use std::collections::HashMap;

use crate::domain::{scale_amount, Report};
use crate::error::{ClaimError, Result};

/// Leaf hash for one (account, balance) pair
pub fn leaf_hash(account: Address, balance: U256) -> B256 {
    let mut data = Vec::with_capacity(20 + 32);
    data.extend_from_slice(account.as_slice());
    data.extend_from_slice(&balance.to_be_bytes::<32>());
    keccak256(&data)
}

fn combine(a: &B256, b: &B256) -> B256 {
    let (first, second) = if a <= b { (a, b) } else { (b, a) };
    let mut data = [0u8; 64];
    data[..32].copy_from_slice(first.as_slice());
    data[32..].copy_from_slice(second.as_slice());
    keccak256(data)
}

#[derive(Debug, Clone)]
pub struct MerkleTree {
    /// layers[0] are the sorted leaves, the last layer holds the root
    layers: Vec<Vec<B256>>,
    positions: HashMap<B256, usize>,
}

impl MerkleTree {
    pub fn new(mut leaves: Vec<B256>) -> Result<Self> {
        if leaves.is_empty() {
            return Err(ClaimError::EmptyReport);
        }

        leaves.sort();
        leaves.dedup();

        let positions = leaves
            .iter()
            .enumerate()
            .map(|(i, leaf)| (*leaf, i))
            .collect();

        let mut layers = vec![leaves];
        while let Some(last) = layers.last().filter(|layer| layer.len() > 1) {
            let next = last
                .chunks(2)
                .map(|pair| match pair {
                    [a, b] => combine(a, b),
                    _ => pair[0],
                })
                .collect();
            layers.push(next);
        }

        Ok(Self { layers, positions })
    }

    /// Tree over every entry of `report`, amounts scaled by `decimals`
    pub fn from_report(report: &Report, decimals: u8) -> Result<Self> {
        let leaves = report
            .0
            .iter()
            .map(|(address, amount)| -> Result<B256> {
                let account: Address = address.parse().map_err(|e| {
                    ClaimError::AddressParsing(format!("report key {address}: {e}"))
                })?;
                Ok(leaf_hash(account, scale_amount(amount, decimals)?))
            })
            .collect::<Result<Vec<_>>>()?;

        Self::new(leaves)
    }

    pub fn root(&self) -> B256 {
        self.layers
            .last()
            .and_then(|layer| layer.first())
            .copied()
            .unwrap_or_default()
    }

    pub fn leaf_count(&self) -> usize {
        self.layers.first().map_or(0, Vec::len)
    }

    /// Sibling hashes from leaf to root, `None` if `leaf` is not in the tree
    pub fn proof(&self, leaf: &B256) -> Option<Vec<B256>> {
        let mut index = *self.positions.get(leaf)?;
        let mut proof = Vec::with_capacity(self.layers.len());

        for layer in &self.layers {
            let sibling = if index % 2 == 0 { index + 1 } else { index - 1 };
            if let Some(hash) = layer.get(sibling) {
                proof.push(*hash);
            }
            index /= 2;
        }

        Some(proof)
    }

    /// Proof for `account` owed `amount` (decimal string) in `epoch`
    pub fn claim_proof(
        &self,
        account: Address,
        amount: &str,
        decimals: u8,
        epoch: u64,
    ) -> Result<Vec<B256>> {
        let not_found = || ClaimError::ProofNotFound {
            account: account.to_string(),
            amount: amount.to_string(),
            epoch,
        };

        let balance = scale_amount(amount, decimals).map_err(|_| not_found())?;
        self.proof(&leaf_hash(account, balance)).ok_or_else(not_found)
    }

    /// Fold `proof` over `leaf` and compare with `root`
    pub fn verify(proof: &[B256], root: B256, leaf: B256) -> bool {
        proof.iter().fold(leaf, |acc, sibling| combine(&acc, sibling)) == root
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use alloy::primitives::{address, b256};

    fn report(entries: &[(&str, &str)]) -> Report {
        Report(
            entries
                .iter()
                .map(|(a, v)| (a.to_string(), v.to_string()))
                .collect(),
        )
    }

    #[test]
    fn test_leaf_hash_is_packed_address_and_uint256() {
        let account = address!("0x1111111111111111111111111111111111111111");
        let balance = U256::from(1000u64);
        let mut packed = account.to_vec();
        packed.extend_from_slice(&balance.to_be_bytes::<32>());
        assert_eq!(packed.len(), 52);
        assert_eq!(leaf_hash(account, balance), keccak256(&packed));
    }

    #[test]
    fn test_combine_is_order_independent() {
        let a = b256!("0x0000000000000000000000000000000000000000000000000000000000000001");
        let b = b256!("0x0000000000000000000000000000000000000000000000000000000000000002");
        assert_eq!(combine(&a, &b), combine(&b, &a));

        let mut expected = a.to_vec();
        expected.extend_from_slice(b.as_slice());
        assert_eq!(combine(&b, &a), keccak256(&expected));
    }

    #[test]
    fn test_single_leaf_root_is_leaf() {
        let leaf = leaf_hash(Address::repeat_byte(1), U256::from(5u64));
        let tree = MerkleTree::new(vec![leaf]).unwrap();
        assert_eq!(tree.root(), leaf);
        assert_eq!(tree.proof(&leaf), Some(vec![]));
        assert!(MerkleTree::verify(&[], tree.root(), leaf));
    }

    #[test]
    fn test_every_report_entry_proves_against_root() {
        let r = report(&[
            ("0x1111111111111111111111111111111111111111", "1000"),
            ("0x2222222222222222222222222222222222222222", "2500.25"),
            ("0x3333333333333333333333333333333333333333", "500"),
            ("0x4444444444444444444444444444444444444444", "0.75"),
            ("0x5555555555555555555555555555555555555555", "12345678901234567890.5"),
        ]);
        let tree = MerkleTree::from_report(&r, 18).unwrap();
        assert_eq!(tree.leaf_count(), 5);

        for (address, amount) in &r.0 {
            let account: Address = address.parse().unwrap();
            let proof = tree.claim_proof(account, amount, 18, 1).unwrap();
            let leaf = leaf_hash(account, scale_amount(amount, 18).unwrap());
            assert!(MerkleTree::verify(&proof, tree.root(), leaf), "{address}");
        }
    }

    #[test]
    fn test_odd_node_is_promoted_without_self_pairing() {
        let leaves: Vec<B256> = (1u8..=3)
            .map(|i| leaf_hash(Address::repeat_byte(i), U256::from(i)))
            .collect();
        let tree = MerkleTree::new(leaves.clone()).unwrap();

        let mut sorted = leaves;
        sorted.sort();
        let expected = combine(&combine(&sorted[0], &sorted[1]), &sorted[2]);
        assert_eq!(tree.root(), expected);
        // The promoted leaf has a single sibling on the way up
        assert_eq!(tree.proof(&sorted[2]).unwrap().len(), 1);
    }

    #[test]
    fn test_leaf_order_does_not_change_root() {
        let leaves: Vec<B256> = (1u8..=6)
            .map(|i| leaf_hash(Address::repeat_byte(i), U256::from(i)))
            .collect();
        let mut reversed = leaves.clone();
        reversed.reverse();
        assert_eq!(
            MerkleTree::new(leaves).unwrap().root(),
            MerkleTree::new(reversed).unwrap().root()
        );
    }

    #[test]
    fn test_mismatched_amount_is_proof_not_found() {
        let r = report(&[
            ("0x1111111111111111111111111111111111111111", "1.5"),
            ("0x2222222222222222222222222222222222222222", "2"),
        ]);
        let tree = MerkleTree::from_report(&r, 18).unwrap();
        let account = address!("0x1111111111111111111111111111111111111111");
        let err = tree.claim_proof(account, "1.6", 18, 3).unwrap_err();
        assert!(matches!(err, ClaimError::ProofNotFound { epoch: 3, .. }));
    }

    #[test]
    fn test_empty_report_is_rejected() {
        assert!(matches!(
            MerkleTree::from_report(&Report::default(), 18),
            Err(ClaimError::EmptyReport)
        ));
    }

    #[test]
    fn test_bad_report_key_is_address_error() {
        let r = report(&[("not-an-address", "1")]);
        assert!(matches!(
            MerkleTree::from_report(&r, 18),
            Err(ClaimError::AddressParsing(_))
        ));
    }
}
