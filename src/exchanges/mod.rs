pub mod binance;
pub mod bitget;
pub mod bybit;
pub mod de;
pub mod kucoin;
pub mod okx;

use crate::config::toml_config::ScannerConfig;
use crate::domain::model::{Exchange, FundingRate};
use crate::domain::ports::ExchangeClient;
use crate::utils::error::{Result, ScanError};
use reqwest::Client;
use serde::de::DeserializeOwned;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::Mutex;
use tokio::time::Instant;

pub use binance::BinanceClient;
pub use bitget::BitgetClient;
pub use bybit::BybitClient;
pub use kucoin::KucoinClient;
pub use okx::OkxClient;

/// 各交易所共用的 HTTP 基底：固定 User-Agent、逾時與請求間隔
pub struct HttpExchange {
    exchange: Exchange,
    base_url: String,
    client: Client,
    min_interval: Duration,
    last_request: Mutex<Option<Instant>>,
}

impl HttpExchange {
    pub fn new(exchange: Exchange, config: &ScannerConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.http.user_agent.as_str())
            .timeout(config.request_timeout())
            .build()?;

        Ok(Self {
            exchange,
            base_url: config.base_url(exchange).trim_end_matches('/').to_string(),
            client,
            min_interval: config.request_interval(),
            last_request: Mutex::new(None),
        })
    }

    /// 與上一次請求至少間隔 min_interval
    async fn throttle(&self) {
        let mut last = self.last_request.lock().await;
        if let Some(previous) = *last {
            let elapsed = previous.elapsed();
            if elapsed < self.min_interval {
                tokio::time::sleep(self.min_interval - elapsed).await;
            }
        }
        *last = Some(Instant::now());
    }

    pub async fn get_json<T: DeserializeOwned>(&self, path: &str, query: &[(&str, &str)]) -> Result<T> {
        self.throttle().await;

        let url = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        tracing::debug!("📡 {} GET {} {:?}", self.exchange, url, query);

        let response = self.client.get(&url).query(query).send().await?;
        let status = response.status();

        if !status.is_success() {
            tracing::warn!("{} API error: {}", self.exchange, status.as_u16());
            return Err(ScanError::ExchangeStatus {
                exchange: self.exchange.display_name().to_string(),
                status: status.as_u16(),
            });
        }

        let body = response.bytes().await?;
        serde_json::from_slice(&body).map_err(|e| self.payload_error(format!("{} ({})", e, path)))
    }

    pub fn payload_error(&self, message: impl Into<String>) -> ScanError {
        ScanError::PayloadError {
            exchange: self.exchange.display_name().to_string(),
            message: message.into(),
        }
    }
}

/// 逐一查詢幣種時的結果彙整；每個幣種都失敗時回傳最後一個錯誤
pub(crate) struct SymbolResults {
    exchange: Exchange,
    rates: Vec<FundingRate>,
    attempted: usize,
    failed: usize,
    last_error: Option<ScanError>,
}

impl SymbolResults {
    pub(crate) fn new(exchange: Exchange) -> Self {
        Self {
            exchange,
            rates: Vec::new(),
            attempted: 0,
            failed: 0,
            last_error: None,
        }
    }

    pub(crate) fn record(&mut self, symbol: &str, result: Result<Option<FundingRate>>) {
        self.attempted += 1;
        match result {
            Ok(Some(rate)) => self.rates.push(rate),
            Ok(None) => tracing::debug!("{}: no funding data for {}", self.exchange, symbol),
            Err(e) => {
                tracing::error!("{} funding rate error for {}: {}", self.exchange, symbol, e);
                self.failed += 1;
                self.last_error = Some(e);
            }
        }
    }

    pub(crate) fn finish(self) -> Result<Vec<FundingRate>> {
        match self.last_error {
            Some(e) if self.failed == self.attempted => Err(e),
            _ => Ok(self.rates),
        }
    }
}

/// 交易所合約代號 -> 基礎幣種
pub fn instrument_map(exchange: Exchange, symbols: &[String]) -> HashMap<String, String> {
    symbols
        .iter()
        .map(|symbol| (exchange.instrument_id(symbol), symbol.trim().to_uppercase()))
        .collect()
}

pub fn build_client(exchange: Exchange, config: &ScannerConfig) -> Result<Arc<dyn ExchangeClient>> {
    let http = HttpExchange::new(exchange, config)?;
    let client: Arc<dyn ExchangeClient> = match exchange {
        Exchange::Binance => Arc::new(BinanceClient::new(http)),
        Exchange::Bybit => Arc::new(BybitClient::new(http)),
        Exchange::Okx => Arc::new(OkxClient::new(http)),
        Exchange::Bitget => Arc::new(BitgetClient::new(http)),
        Exchange::Kucoin => Arc::new(KucoinClient::new(http)),
    };
    Ok(client)
}

/// 只建立設定中啟用的交易所，順序與設定相同
pub fn build_clients(config: &ScannerConfig) -> Result<Vec<Arc<dyn ExchangeClient>>> {
    let mut seen = Vec::new();
    let mut clients = Vec::new();
    for exchange in &config.scanner.enabled_exchanges {
        if seen.contains(exchange) {
            continue;
        }
        seen.push(*exchange);
        clients.push(build_client(*exchange, config)?);
    }
    Ok(clients)
}
