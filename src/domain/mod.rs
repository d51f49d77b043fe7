pub mod amount;
pub mod claim;

pub use amount::{format_amount, scale_amount};
pub use claim::*;
