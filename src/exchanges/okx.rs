use super::{de, HttpExchange, SymbolResults};
use crate::domain::model::{Exchange, FundingRate};
use crate::domain::ports::ExchangeClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct FundingRateResponse {
    #[serde(default)]
    data: Vec<FundingRateEntry>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct FundingRateEntry {
    #[serde(default, deserialize_with = "de::opt_f64")]
    funding_rate: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_millis")]
    next_funding_time: Option<DateTime<Utc>>,
}

pub struct OkxClient {
    http: HttpExchange,
}

impl OkxClient {
    pub fn new(http: HttpExchange) -> Self {
        Self { http }
    }

    async fn fetch_one(&self, symbol: &str) -> Result<Option<FundingRate>> {
        let inst_id = Exchange::Okx.instrument_id(symbol);
        let response: FundingRateResponse = self
            .http
            .get_json("api/v5/public/funding-rate", &[("instId", inst_id.as_str())])
            .await?;

        Ok(response.data.into_iter().next().and_then(|entry| {
            let rate = entry.funding_rate?;
            Some(
                FundingRate::new(Exchange::Okx, symbol.to_uppercase(), rate)
                    .with_next_funding_time(entry.next_funding_time),
            )
        }))
    }
}

#[async_trait]
impl ExchangeClient for OkxClient {
    fn exchange(&self) -> Exchange {
        Exchange::Okx
    }

    /// OKX 需要逐一查詢合約；單一幣種失敗只記錄並略過，全部失敗才回傳錯誤
    async fn fetch_funding_rates(&self, symbols: &[String]) -> Result<Vec<FundingRate>> {
        let mut results = SymbolResults::new(Exchange::Okx);
        for symbol in symbols {
            results.record(symbol, self.fetch_one(symbol).await);
        }
        results.finish()
    }
}
