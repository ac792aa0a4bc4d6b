pub mod config;
pub mod core;
pub mod docs;
pub mod domain;
pub mod exchanges;
pub mod utils;

pub use config::{cli::LocalStorage, toml_config::ScannerConfig, CliArgs, Command};
pub use core::{collector::FundingRateCollector, scanner::ScanEngine, scheduler::Scheduler};
pub use domain::model::{ArbitrageOpportunity, Exchange, FundingRate, ScanOutcome};
pub use utils::error::{Result, ScanError};
