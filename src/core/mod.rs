pub mod arbitrage;
pub mod collector;
pub mod report;
pub mod scanner;
pub mod scheduler;

pub use crate::domain::model::{ArbitrageOpportunity, FundingRate, ScanOutcome};
pub use crate::domain::ports::{ExchangeClient, Storage};
pub use crate::utils::error::Result;
