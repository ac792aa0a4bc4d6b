pub mod cli;
pub mod toml_config;

use crate::domain::model::Exchange;
use crate::utils::error::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use toml_config::ScannerConfig;

#[derive(Debug, Clone, Parser)]
#[command(name = "funding-scanner")]
#[command(version)]
#[command(about = "Scan perpetual futures exchanges for funding rate arbitrage opportunities")]
pub struct CliArgs {
    /// Path to TOML configuration file (built-in defaults when omitted)
    #[arg(short, long)]
    pub config: Option<PathBuf>,

    /// Base assets to scan, e.g. BTC,ETH,SOL
    #[arg(long, value_delimiter = ',')]
    pub symbols: Option<Vec<String>>,

    /// Exchanges to query, e.g. binance,okx
    #[arg(long, value_delimiter = ',')]
    pub exchanges: Option<Vec<Exchange>>,

    /// Minimum net profit per 8h as a decimal (0.005 = 0.5%)
    #[arg(long)]
    pub threshold: Option<f64>,

    /// Position size in USD used to estimate profit
    #[arg(long)]
    pub position_size: Option<f64>,

    /// Minutes between scans in continuous mode
    #[arg(long)]
    pub interval: Option<u64>,

    /// Directory for saved opportunities
    #[arg(long)]
    pub data_dir: Option<String>,

    /// Also export collected funding rates as CSV
    #[arg(long)]
    pub export_rates: bool,

    /// Enable verbose output
    #[arg(short, long)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Debug, Clone, Subcommand)]
pub enum Command {
    /// Run a single scan
    Scan,
    /// Scan now and then on every interval until Ctrl+C
    Continuous,
    /// Check that every enabled exchange answers
    Connectivity,
    /// Check the issue template and changelog structure
    LintDocs {
        #[arg(long, default_value = ".github/ISSUE_TEMPLATE/bug_report.md")]
        template: PathBuf,

        #[arg(long, default_value = "CHANGELOG.md")]
        changelog: PathBuf,
    },
}

impl CliArgs {
    /// 載入設定檔（若有）並套用命令列覆蓋設定
    pub fn load_config(&self) -> Result<ScannerConfig> {
        let mut config = match &self.config {
            Some(path) => ScannerConfig::from_file(path)?,
            None => ScannerConfig::default(),
        };
        self.apply_overrides(&mut config);
        config.normalize();
        Ok(config)
    }

    pub fn apply_overrides(&self, config: &mut ScannerConfig) {
        if let Some(symbols) = &self.symbols {
            config.scanner.symbols = symbols.clone();
        }
        if let Some(exchanges) = &self.exchanges {
            config.scanner.enabled_exchanges = exchanges.clone();
        }
        if let Some(threshold) = self.threshold {
            config.scanner.min_profit_threshold = threshold;
        }
        if let Some(position_size) = self.position_size {
            config.scanner.position_size = position_size;
        }
        if let Some(interval) = self.interval {
            config.scanner.scan_interval_minutes = interval;
        }
        if let Some(data_dir) = &self.data_dir {
            config.storage.data_dir = data_dir.clone();
        }
        if self.export_rates {
            config.scanner.export_rates = true;
        }
        if self.verbose {
            config.logging.level = "DEBUG".to_string();
        }
    }
}
