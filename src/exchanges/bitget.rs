use super::{de, instrument_map, HttpExchange, SymbolResults};
use crate::domain::model::{Exchange, FundingRate};
use crate::domain::ports::ExchangeClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
struct ContractsResponse {
    data: Option<Vec<Contract>>,
}

#[derive(Debug, Deserialize)]
struct Contract {
    symbol: String,
}

#[derive(Debug, Deserialize)]
struct TickerResponse {
    data: Option<Ticker>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Ticker {
    #[serde(default, deserialize_with = "de::opt_f64")]
    funding_rate: Option<f64>,
}

pub struct BitgetClient {
    http: HttpExchange,
}

impl BitgetClient {
    pub fn new(http: HttpExchange) -> Self {
        Self { http }
    }

    async fn fetch_ticker(&self, contract: &str, base: &str) -> Result<Option<FundingRate>> {
        let response: TickerResponse = self
            .http
            .get_json("api/mix/v1/market/ticker", &[("symbol", contract)])
            .await?;

        Ok(response.data.and_then(|ticker| {
            let rate = ticker.funding_rate?;
            Some(FundingRate::new(Exchange::Bitget, base, rate))
        }))
    }
}

#[async_trait]
impl ExchangeClient for BitgetClient {
    fn exchange(&self) -> Exchange {
        Exchange::Bitget
    }

    /// 先列出 USDT 永續合約，再逐一查詢有上架的合約行情
    async fn fetch_funding_rates(&self, symbols: &[String]) -> Result<Vec<FundingRate>> {
        let wanted = instrument_map(Exchange::Bitget, symbols);

        let contracts: ContractsResponse = self
            .http
            .get_json("api/mix/v1/market/contracts", &[("productType", "umcbl")])
            .await?;
        let contracts = contracts
            .data
            .ok_or_else(|| self.http.payload_error("missing 'data' in contracts response"))?;

        let mut results = SymbolResults::new(Exchange::Bitget);
        for contract in contracts {
            let Some(base) = wanted.get(&contract.symbol) else {
                continue;
            };
            results.record(base, self.fetch_ticker(&contract.symbol, base).await);
        }
        results.finish()
    }
}
