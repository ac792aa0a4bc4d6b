use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 支援的永續合約交易所
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Exchange {
    Binance,
    Bybit,
    Okx,
    Bitget,
    Kucoin,
}

impl Exchange {
    pub const ALL: [Exchange; 5] = [
        Exchange::Binance,
        Exchange::Bybit,
        Exchange::Okx,
        Exchange::Bitget,
        Exchange::Kucoin,
    ];

    /// 設定檔中使用的小寫鍵值
    pub fn key(&self) -> &'static str {
        match self {
            Exchange::Binance => "binance",
            Exchange::Bybit => "bybit",
            Exchange::Okx => "okx",
            Exchange::Bitget => "bitget",
            Exchange::Kucoin => "kucoin",
        }
    }

    pub fn display_name(&self) -> &'static str {
        match self {
            Exchange::Binance => "Binance",
            Exchange::Bybit => "Bybit",
            Exchange::Okx => "OKX",
            Exchange::Bitget => "Bitget",
            Exchange::Kucoin => "KuCoin",
        }
    }

    pub fn default_base_url(&self) -> &'static str {
        match self {
            Exchange::Binance => "https://fapi.binance.com",
            Exchange::Bybit => "https://api.bybit.com",
            Exchange::Okx => "https://www.okx.com",
            Exchange::Bitget => "https://api.bitget.com",
            Exchange::Kucoin => "https://api-futures.kucoin.com",
        }
    }

    /// 將基礎幣種（例如 BTC）轉為交易所的 USDT 永續合約代號
    pub fn instrument_id(&self, base: &str) -> String {
        let base = base.trim().to_uppercase();
        match self {
            Exchange::Binance | Exchange::Bybit => format!("{}USDT", base),
            Exchange::Okx => format!("{}-USDT-SWAP", base),
            Exchange::Bitget => format!("{}USDT_UMCBL", base),
            Exchange::Kucoin => {
                // KuCoin 以 XBT 表示比特幣
                let base = if base == "BTC" { "XBT".to_string() } else { base };
                format!("{}USDTM", base)
            }
        }
    }
}

impl fmt::Display for Exchange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.display_name())
    }
}

impl FromStr for Exchange {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let wanted = s.trim().to_lowercase();
        Exchange::ALL
            .iter()
            .copied()
            .find(|ex| ex.key() == wanted)
            .ok_or_else(|| {
                format!(
                    "unknown exchange '{}' (expected one of: {})",
                    s,
                    Exchange::ALL
                        .iter()
                        .map(|ex| ex.key())
                        .collect::<Vec<_>>()
                        .join(", ")
                )
            })
    }
}

/// 單一交易所、單一幣種的資金費率快照
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct FundingRate {
    pub exchange: Exchange,
    pub symbol: String,
    /// 每個資金週期（8 小時）的費率，小數表示：0.0001 = 0.01%
    pub rate: f64,
    pub timestamp: DateTime<Utc>,
    pub next_funding_time: Option<DateTime<Utc>>,
    pub mark_price: Option<f64>,
}

impl FundingRate {
    pub fn new(exchange: Exchange, symbol: impl Into<String>, rate: f64) -> Self {
        Self {
            exchange,
            symbol: symbol.into(),
            rate,
            timestamp: Utc::now(),
            next_funding_time: None,
            mark_price: None,
        }
    }

    pub fn with_next_funding_time(mut self, next: Option<DateTime<Utc>>) -> Self {
        self.next_funding_time = next;
        self
    }

    pub fn with_mark_price(mut self, mark_price: Option<f64>) -> Self {
        self.mark_price = mark_price;
        self
    }
}

/// 跨交易所資金費率套利機會：在低費率交易所做多、高費率交易所做空
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArbitrageOpportunity {
    pub symbol: String,
    pub long_exchange: Exchange,
    pub short_exchange: Exchange,
    pub long_rate: f64,
    pub short_rate: f64,
    pub rate_difference: f64,
    pub potential_profit_8h: f64,
    pub estimated_fees: f64,
    pub net_profit_8h: f64,
    pub next_funding_time: Option<DateTime<Utc>>,
}

/// 寫入 JSON 檔的機會紀錄
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct OpportunityRecord {
    pub timestamp: DateTime<Utc>,
    pub symbol: String,
    pub long_exchange: String,
    pub short_exchange: String,
    pub long_rate: f64,
    pub short_rate: f64,
    pub rate_difference: f64,
    pub net_profit_8h_pct: f64,
    pub estimated_profit_usd: f64,
    pub next_funding_time: Option<DateTime<Utc>>,
}

impl OpportunityRecord {
    pub fn from_opportunity(
        op: &ArbitrageOpportunity,
        position_size: f64,
        timestamp: DateTime<Utc>,
    ) -> Self {
        Self {
            timestamp,
            symbol: op.symbol.clone(),
            long_exchange: op.long_exchange.display_name().to_string(),
            short_exchange: op.short_exchange.display_name().to_string(),
            long_rate: op.long_rate,
            short_rate: op.short_rate,
            rate_difference: op.rate_difference,
            net_profit_8h_pct: op.net_profit_8h,
            estimated_profit_usd: op.net_profit_8h * position_size,
            next_funding_time: op.next_funding_time,
        }
    }
}

/// 一次掃描的結果
#[derive(Debug, Clone, PartialEq)]
pub enum ScanOutcome {
    /// 沒有任何交易所回傳資料
    NoData,
    /// 找到達到門檻的機會，並已存檔
    Profitable {
        rates: usize,
        opportunities: Vec<ArbitrageOpportunity>,
        saved_to: String,
    },
    /// 沒有達到門檻的機會，附上目前最佳的幾筆
    BelowThreshold {
        rates: usize,
        best: Vec<ArbitrageOpportunity>,
    },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_instrument_ids() {
        assert_eq!(Exchange::Binance.instrument_id("BTC"), "BTCUSDT");
        assert_eq!(Exchange::Bybit.instrument_id("eth"), "ETHUSDT");
        assert_eq!(Exchange::Okx.instrument_id("SOL"), "SOL-USDT-SWAP");
        assert_eq!(Exchange::Bitget.instrument_id("ADA"), "ADAUSDT_UMCBL");
        assert_eq!(Exchange::Kucoin.instrument_id("BTC"), "XBTUSDTM");
        assert_eq!(Exchange::Kucoin.instrument_id("DOT"), "DOTUSDTM");
    }

    #[test]
    fn test_exchange_from_str() {
        assert_eq!("OKX".parse::<Exchange>().unwrap(), Exchange::Okx);
        assert_eq!(" kucoin ".parse::<Exchange>().unwrap(), Exchange::Kucoin);
        let err = "ftx".parse::<Exchange>().unwrap_err();
        assert!(err.contains("binance, bybit, okx, bitget, kucoin"));
    }

    #[test]
    fn test_record_estimates_usd_profit() {
        let op = ArbitrageOpportunity {
            symbol: "BTC".to_string(),
            long_exchange: Exchange::Binance,
            short_exchange: Exchange::Kucoin,
            long_rate: -0.001,
            short_rate: 0.01,
            rate_difference: 0.011,
            potential_profit_8h: 0.011,
            estimated_fees: 0.0039,
            net_profit_8h: 0.0071,
            next_funding_time: None,
        };

        let record = OpportunityRecord::from_opportunity(&op, 1000.0, Utc::now());
        assert_eq!(record.long_exchange, "Binance");
        assert_eq!(record.short_exchange, "KuCoin");
        assert!((record.estimated_profit_usd - 7.1).abs() < 1e-9);

        let json = serde_json::to_value(&record).unwrap();
        assert!(json.get("net_profit_8h_pct").is_some());
        assert!(json.get("next_funding_time").unwrap().is_null());
    }
}
