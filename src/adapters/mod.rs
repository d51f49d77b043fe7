pub mod ipfs;
pub mod multicall;

pub use ipfs::{HttpSnapshotFetcher, SnapshotSource};
pub use multicall::{decode_slot, BatchCall, BatchCaller, MulticallClient};
