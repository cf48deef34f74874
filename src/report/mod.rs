//! Report computation: settlement resolution and tax aggregation

pub mod settlement;
pub mod transaction_taxes;

pub use settlement::*;
pub use transaction_taxes::*;
