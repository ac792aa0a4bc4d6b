use super::{de, HttpExchange, SymbolResults};
use crate::domain::model::{Exchange, FundingRate};
use crate::domain::ports::ExchangeClient;
use crate::utils::error::Result;
use async_trait::async_trait;
use serde::Deserialize;

const KUCOIN_OK: &str = "200000";

#[derive(Debug, Deserialize)]
struct KucoinResponse<T> {
    code: String,
    data: Option<T>,
}

impl<T> KucoinResponse<T> {
    fn into_data(self) -> Option<T> {
        if self.code == KUCOIN_OK {
            self.data
        } else {
            None
        }
    }
}

#[derive(Debug, Deserialize)]
struct CurrentFundingRate {
    #[serde(default, deserialize_with = "de::opt_f64")]
    value: Option<f64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ContractDetail {
    #[serde(default, deserialize_with = "de::opt_f64")]
    funding_fee_rate: Option<f64>,
    #[serde(default, deserialize_with = "de::opt_f64")]
    mark_price: Option<f64>,
}

pub struct KucoinClient {
    http: HttpExchange,
}

impl KucoinClient {
    pub fn new(http: HttpExchange) -> Self {
        Self { http }
    }

    async fn fetch_one(&self, symbol: &str) -> Result<Option<FundingRate>> {
        let contract = Exchange::Kucoin.instrument_id(symbol);

        let current: KucoinResponse<CurrentFundingRate> = self
            .http
            .get_json(&format!("api/v1/funding-rate/{}/current", contract), &[])
            .await?;
        let Some(mut rate) = current.into_data().and_then(|d| d.value) else {
            return Ok(None);
        };

        // 合約資訊中的 fundingFeeRate 較即時，若有則覆蓋
        let mut mark_price = None;
        match self
            .http
            .get_json::<KucoinResponse<ContractDetail>>(&format!("api/v1/contracts/{}", contract), &[])
            .await
        {
            Ok(response) => {
                if let Some(detail) = response.into_data() {
                    if let Some(fee_rate) = detail.funding_fee_rate {
                        rate = fee_rate;
                    }
                    mark_price = detail.mark_price.filter(|p| *p > 0.0);
                }
            }
            Err(e) => tracing::debug!("KuCoin contract detail unavailable for {}: {}", contract, e),
        }

        Ok(Some(
            FundingRate::new(Exchange::Kucoin, symbol.to_uppercase(), rate).with_mark_price(mark_price),
        ))
    }
}

#[async_trait]
impl ExchangeClient for KucoinClient {
    fn exchange(&self) -> Exchange {
        Exchange::Kucoin
    }

    async fn fetch_funding_rates(&self, symbols: &[String]) -> Result<Vec<FundingRate>> {
        let mut results = SymbolResults::new(Exchange::Kucoin);
        for symbol in symbols {
            results.record(symbol, self.fetch_one(symbol).await);
        }
        results.finish()
    }
}
