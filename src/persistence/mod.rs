//! Persistence of run output
//!
//! The pending-claims audit file is written once per run, before the
//! calldata is assembled.

pub mod claims_file;

pub use claims_file::write_pending_claims;
