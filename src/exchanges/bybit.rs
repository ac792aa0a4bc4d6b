use super::{de, instrument_map, HttpExchange};
use crate::domain::model::{Exchange, FundingRate};
use crate::domain::ports::ExchangeClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct TickersResponse {
    result: Option<TickersResult>,
}

#[derive(Debug, Deserialize)]
struct TickersResult {
    #[serde(default)]
    list: Vec<Ticker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    symbol: String,
    #[serde(default, deserialize_with = "de::opt_f64")]
    funding_rate: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_millis")]
    next_funding_time: Option<DateTime<Utc>>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    mark_price: Option<f64>,
}

pub struct BybitClient {
    http: HttpExchange,
}

impl BybitClient {
    pub fn new(http: HttpExchange) -> Self {
        Self { http }
    }
}

#[async_trait]
impl ExchangeClient for BybitClient {
    fn exchange(&self) -> Exchange {
        Exchange::Bybit
    }

    async fn fetch_funding_rates(&self, symbols: &[String]) -> Result<Vec<FundingRate>> {
        let wanted = instrument_map(Exchange::Bybit, symbols);

        let response: TickersResponse = self
            .http
            .get_json("v5/market/tickers", &[("category", "linear")])
            .await?;
        let result = response
            .result
            .ok_or_else(|| self.http.payload_error("missing 'result' in tickers response"))?;

        let rates = result
            .list
            .into_iter()
            .filter_map(|ticker| {
                let base = wanted.get(&ticker.symbol)?;
                let rate = ticker.funding_rate?;
                Some(
                    FundingRate::new(Exchange::Bybit, base.clone(), rate)
                        .with_next_funding_time(ticker.next_funding_time)
                        .with_mark_price(ticker.mark_price.filter(|p| *p > 0.0)),
                )
            })
            .collect();

        Ok(rates)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::exchanges::test_support::config_for;
    use crate::utils::error::ScanError;
    use httpmock::prelude::*;

    #[tokio::test]
    async fn test_fetch_linear_tickers() {
        let server = MockServer::start();
        let api_mock = server.mock(|when, then| {
            when.method(GET)
                .path("/v5/market/tickers")
                .query_param("category", "linear");
            then.status(200).json_body(serde_json::json!({
                "retCode": 0,
                "retMsg": "OK",
                "result": {
                    "category": "linear",
                    "list": [
                        {"symbol": "SOLUSDT", "markPrice": "150.2", "fundingRate": "0.0003", "nextFundingTime": "1700006400000"},
                        {"symbol": "BTCUSDT", "markPrice": "64000", "fundingRate": "", "nextFundingTime": "0"},
                        {"symbol": "XRPUSDT", "markPrice": "0.5", "fundingRate": "0.0001", "nextFundingTime": "1700006400000"}
                    ]
                }
            }));
        });

        let config = config_for(Exchange::Bybit, &server.base_url());
        let client = BybitClient::new(HttpExchange::new(Exchange::Bybit, &config).unwrap());

        let rates = client
            .fetch_funding_rates(&["SOL".to_string(), "BTC".to_string()])
            .await
            .unwrap();

        api_mock.assert();
        // BTC 無費率資料，略過
        assert_eq!(rates.len(), 1);
        assert_eq!(rates[0].symbol, "SOL");
        assert_eq!(rates[0].rate, 0.0003);
        assert_eq!(rates[0].mark_price, Some(150.2));
        assert!(rates[0].next_funding_time.is_some());
    }

    #[tokio::test]
    async fn test_missing_result_is_payload_error() {
        let server = MockServer::start();
        server.mock(|when, then| {
            when.method(GET).path("/v5/market/tickers");
            then.status(200)
                .json_body(serde_json::json!({"retCode": 10001, "retMsg": "params error"}));
        });

        let config = config_for(Exchange::Bybit, &server.base_url());
        let client = BybitClient::new(HttpExchange::new(Exchange::Bybit, &config).unwrap());

        let result = client.fetch_funding_rates(&["BTC".to_string()]).await;
        assert!(matches!(result, Err(ScanError::PayloadError { .. })));
    }
}
