use crate::config::toml_config::{ScanSettings, ScannerConfig};
use crate::core::arbitrage::{self, ArbitrageCalculator};
use crate::core::collector::FundingRateCollector;
use crate::core::report;
use crate::domain::model::{ArbitrageOpportunity, FundingRate, OpportunityRecord, ScanOutcome};
use crate::domain::ports::Storage;
use crate::utils::error::Result;
use chrono::{DateTime, Utc};

const TOP_PROFITABLE: usize = 5;
const TOP_BELOW_THRESHOLD: usize = 3;

/// 一次完整掃描：收集 -> 計算 -> 篩選 -> 顯示 -> 存檔
pub struct ScanEngine<S: Storage> {
    collector: FundingRateCollector,
    calculator: ArbitrageCalculator,
    storage: S,
    settings: ScanSettings,
}

impl<S: Storage> ScanEngine<S> {
    pub fn new(collector: FundingRateCollector, storage: S, config: &ScannerConfig) -> Self {
        Self {
            collector,
            calculator: ArbitrageCalculator::new(config.costs.clone()),
            storage,
            settings: config.scanner.clone(),
        }
    }

    pub fn collector(&self) -> &FundingRateCollector {
        &self.collector
    }

    pub async fn scan_once(&self) -> Result<ScanOutcome> {
        tracing::info!("🎯 Scanning for funding rate arbitrage opportunities");
        println!("{}", "=".repeat(80));

        let rates = self.collector.collect(&self.settings.symbols).await;
        if rates.is_empty() {
            tracing::warn!("❌ No data collected");
            return Ok(ScanOutcome::NoData);
        }

        println!("{}", report::funding_summary(&rates));

        let now = Utc::now();
        let opportunities = self.calculator.find_opportunities(&rates);
        let profitable = arbitrage::profitable(&opportunities, self.settings.min_profit_threshold);
        tracing::debug!(
            "{} opportunities after costs, {} above threshold",
            opportunities.len(),
            profitable.len()
        );

        if profitable.is_empty() {
            println!(
                "\n❌ No profitable opportunity found (threshold: {})",
                report::pct(self.settings.min_profit_threshold, 3)
            );
            let best: Vec<ArbitrageOpportunity> =
                opportunities.into_iter().take(TOP_BELOW_THRESHOLD).collect();
            if !best.is_empty() {
                println!("📊 Best current opportunities:");
                println!("{}", report::opportunities(&best, self.settings.position_size));
            }
            self.export_rates(&rates, now).await;
            return Ok(ScanOutcome::BelowThreshold {
                rates: rates.len(),
                best,
            });
        }

        println!("\n💰 {} PROFITABLE OPPORTUNITIES FOUND:", profitable.len());
        let top = &profitable[..profitable.len().min(TOP_PROFITABLE)];
        println!("{}", report::opportunities(top, self.settings.position_size));

        let saved_to = self.save_opportunities(&profitable, now).await?;
        self.export_rates(&rates, now).await;

        Ok(ScanOutcome::Profitable {
            rates: rates.len(),
            opportunities: profitable,
            saved_to,
        })
    }

    /// 將所有達標機會寫入 opportunities_YYYYMMDD_HHMMSS.json
    pub async fn save_opportunities(
        &self,
        opportunities: &[ArbitrageOpportunity],
        at: DateTime<Utc>,
    ) -> Result<String> {
        let records: Vec<OpportunityRecord> = opportunities
            .iter()
            .map(|op| OpportunityRecord::from_opportunity(op, self.settings.position_size, at))
            .collect();

        let filename = format!("opportunities_{}.json", at.format("%Y%m%d_%H%M%S"));
        let json = serde_json::to_string_pretty(&records)?;
        self.storage.write_file(&filename, json.as_bytes()).await?;

        let location = self.storage.location(&filename);
        tracing::info!("💾 Opportunities saved: {}", location);
        Ok(location)
    }

    /// CSV 匯出失敗不影響掃描結果
    async fn export_rates(&self, rates: &[FundingRate], at: DateTime<Utc>) {
        if !self.settings.export_rates {
            return;
        }
        if let Err(e) = self.save_rates(rates, at).await {
            tracing::error!("❌ Funding rate export failed: {}", e);
        }
    }

    async fn save_rates(&self, rates: &[FundingRate], at: DateTime<Utc>) -> Result<String> {
        let filename = format!("rates_{}.csv", at.format("%Y%m%d_%H%M%S"));
        let csv = report::rates_to_csv(rates)?;
        self.storage.write_file(&filename, csv.as_bytes()).await?;

        let location = self.storage.location(&filename);
        tracing::info!("💾 Funding rates exported: {}", location);
        Ok(location)
    }
}
