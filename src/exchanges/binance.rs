use super::{de, instrument_map, HttpExchange};
use crate::domain::model::{Exchange, FundingRate};
use crate::domain::ports::ExchangeClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

/// Binance USD-M Futures premiumIndex 回應項目
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PremiumIndex {
    symbol: String,
    #[serde(default, deserialize_with = "de::opt_f64")]
    last_funding_rate: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_millis")]
    next_funding_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    mark_price: Option<f64>,
}

pub struct BinanceClient {
    http: HttpExchange,
}

impl BinanceClient {
    pub fn new(http: HttpExchange) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ExchangeClient for BinanceClient {
    fn exchange(&self) -> Exchange {
        Exchange::Binance
    }

    async fn fetch_funding_rates(&self, symbols: &[String]) -> Result<Vec<FundingRate>> {
        let wanted = instrument_map(Exchange::Binance, symbols);

        // 一次取得所有合約
        let items: Vec<PremiumIndex> = self.http.get_json("fapi/v1/premiumIndex", &[]).await?;

        let rates = items
            .into_iter()
            .filter_map(|item| {
                let base = wanted.get(&item.symbol)?;
                let Some(rate) = item.last_funding_rate else {
                    tracing::debug!("Binance: {} has no funding rate", item.symbol);
                    return None;
                };
                Some(
                    FundingRate::new(Exchange::Binance, base.clone(), rate)
                        .with_next_funding_time(item.next_funding_time)
                        .with_mark_price(item.mark_price.filter(|p| *p > 0.0)),
                )
            })
            .collect();

        Ok(rates)
    }
}
