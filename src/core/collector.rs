use crate::config::toml_config::ScannerConfig;
use crate::domain::model::{Exchange, FundingRate};
use crate::domain::ports::ExchangeClient;
use crate::exchanges;
use crate::utils::error::Result;
use std::sync::Arc;
use tokio::task::JoinSet;

/// 單一交易所的連線測試結果
#[derive(Debug, Clone, PartialEq)]
pub enum ConnectivityStatus {
    Ok(usize),
    NoData,
    Failed(String),
}

pub struct FundingRateCollector {
    clients: Vec<Arc<dyn ExchangeClient>>,
}

impl FundingRateCollector {
    pub fn new(clients: Vec<Arc<dyn ExchangeClient>>) -> Self {
        Self { clients }
    }

    /// 依設定建立已啟用的交易所
    pub fn from_config(config: &ScannerConfig) -> Result<Self> {
        Ok(Self::new(exchanges::build_clients(config)?))
    }

    /// 同時向所有交易所查詢；失敗的交易所記錄後略過，結果依設定順序排列
    pub async fn collect(&self, symbols: &[String]) -> Vec<FundingRate> {
        tracing::info!("🔍 Collecting funding rates for {:?}", symbols);

        let results = self.query_all(symbols).await;

        let mut all_rates = Vec::new();
        for (exchange, result) in results {
            match result {
                Ok(rates) => {
                    tracing::info!("✅ {}: {} rates collected", exchange, rates.len());
                    all_rates.extend(rates);
                }
                Err(e) => tracing::error!("❌ {} error: {}", exchange, e),
            }
        }

        tracing::info!("📊 Total: {} funding rates collected", all_rates.len());
        all_rates
    }

    /// 以 BTC 測試每個交易所是否可用
    pub async fn check_connectivity(&self) -> Vec<(Exchange, ConnectivityStatus)> {
        let symbols = vec!["BTC".to_string()];
        self.query_all(&symbols)
            .await
            .into_iter()
            .map(|(exchange, result)| {
                let status = match result {
                    Ok(rates) if rates.is_empty() => ConnectivityStatus::NoData,
                    Ok(rates) => ConnectivityStatus::Ok(rates.len()),
                    Err(e) => ConnectivityStatus::Failed(e.to_string()),
                };
                (exchange, status)
            })
            .collect()
    }

    async fn query_all(&self, symbols: &[String]) -> Vec<(Exchange, Result<Vec<FundingRate>>)> {
        let mut tasks = JoinSet::new();
        for (index, client) in self.clients.iter().enumerate() {
            let client = Arc::clone(client);
            let symbols = symbols.to_vec();
            tasks.spawn(async move {
                tracing::info!("📡 Fetching from {}...", client.exchange());
                let result = client.fetch_funding_rates(&symbols).await;
                (index, client.exchange(), result)
            });
        }

        let mut results = Vec::with_capacity(self.clients.len());
        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok(result) => results.push(result),
                Err(e) => tracing::error!("❌ Exchange task aborted: {}", e),
            }
        }

        results.sort_by_key(|(index, _, _)| *index);
        results
            .into_iter()
            .map(|(_, exchange, result)| (exchange, result))
            .collect()
    }
}

#[cfg(test)]
pub(crate) mod test_support {
    use super::*;
    use crate::utils::error::ScanError;
    use async_trait::async_trait;
    use std::time::Duration;

    /// 回傳固定費率的假交易所
    pub struct StaticExchange {
        pub exchange: Exchange,
        pub rates: Vec<(String, f64)>,
        pub fail: bool,
        pub delay: Duration,
    }

    impl StaticExchange {
        pub fn new(exchange: Exchange, rates: &[(&str, f64)]) -> Self {
            Self {
                exchange,
                rates: rates.iter().map(|(s, r)| (s.to_string(), *r)).collect(),
                fail: false,
                delay: Duration::ZERO,
            }
        }

        pub fn failing(exchange: Exchange) -> Self {
            Self {
                fail: true,
                ..Self::new(exchange, &[])
            }
        }

        pub fn with_delay(mut self, delay: Duration) -> Self {
            self.delay = delay;
            self
        }
    }

    #[async_trait]
    impl ExchangeClient for StaticExchange {
        fn exchange(&self) -> Exchange {
            self.exchange
        }

        async fn fetch_funding_rates(&self, symbols: &[String]) -> Result<Vec<FundingRate>> {
            tokio::time::sleep(self.delay).await;
            if self.fail {
                return Err(ScanError::ExchangeStatus {
                    exchange: self.exchange.display_name().to_string(),
                    status: 500,
                });
            }
            Ok(self
                .rates
                .iter()
                .filter(|(symbol, _)| symbols.contains(symbol))
                .map(|(symbol, rate)| FundingRate::new(self.exchange, symbol.clone(), *rate))
                .collect())
        }
    }
}
