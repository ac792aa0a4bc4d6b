use crate::domain::model::Exchange;
use crate::utils::error::{Result, ScanError};
use crate::utils::validation::{self, Validate};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// 連續模式的最長間隔（一週）
pub const MAX_SCAN_INTERVAL_MINUTES: u64 = 10_080;

pub const DEFAULT_USER_AGENT: &str =
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36";

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct ScannerConfig {
    pub scanner: ScanSettings,
    pub costs: CostConfig,
    pub http: HttpConfig,
    pub logging: LoggingConfig,
    pub storage: StorageConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct ScanSettings {
    pub symbols: Vec<String>,
    pub enabled_exchanges: Vec<Exchange>,
    /// 最低淨利（小數，0.005 = 0.5%）
    pub min_profit_threshold: f64,
    /// 以 USD 計的部位大小
    pub position_size: f64,
    pub scan_interval_minutes: u64,
    pub error_backoff_seconds: u64,
    pub export_rates: bool,
}

impl Default for ScanSettings {
    fn default() -> Self {
        Self {
            symbols: ["BTC", "ETH", "SOL", "ADA", "MATIC", "DOT", "AVAX"]
                .iter()
                .map(|s| s.to_string())
                .collect(),
            enabled_exchanges: Exchange::ALL.to_vec(),
            min_profit_threshold: 0.005,
            position_size: 1000.0,
            scan_interval_minutes: 30,
            error_backoff_seconds: 300,
            export_rates: false,
        }
    }
}

/// 手續費與滑價以百分比表示（0.08 = 0.08%）
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct CostConfig {
    /// 以交易所鍵值（binance、okx…）為索引
    pub exchange_fees: BTreeMap<String, f64>,
    pub slippage: BTreeMap<String, f64>,
    pub default_fee_pct: f64,
    pub default_slippage_pct: f64,
    /// 固定的安全緩衝（小數）
    pub fixed_buffer: f64,
    /// 低於此費率差的組合不計算
    pub min_rate_difference: f64,
}

impl Default for CostConfig {
    fn default() -> Self {
        let exchange_fees = [
            (Exchange::Binance, 0.08),
            (Exchange::Bybit, 0.08),
            (Exchange::Okx, 0.09),
            (Exchange::Bitget, 0.10),
            (Exchange::Kucoin, 0.09),
        ]
        .iter()
        .map(|(exchange, pct)| (exchange.key().to_string(), *pct))
        .collect();
        let slippage = [
            ("BTC", 0.01),
            ("ETH", 0.02),
            ("SOL", 0.03),
            ("ADA", 0.04),
            ("MATIC", 0.04),
            ("DOT", 0.03),
            ("AVAX", 0.03),
        ]
        .iter()
        .map(|(symbol, pct)| (symbol.to_string(), *pct))
        .collect();

        Self {
            exchange_fees,
            slippage,
            default_fee_pct: 0.1,
            default_slippage_pct: 0.05,
            fixed_buffer: 0.002,
            min_rate_difference: 0.0001,
        }
    }
}

impl CostConfig {
    pub fn fee_pct(&self, exchange: Exchange) -> f64 {
        self.exchange_fees
            .get(exchange.key())
            .copied()
            .unwrap_or(self.default_fee_pct)
    }

    pub fn slippage_pct(&self, symbol: &str) -> f64 {
        self.slippage
            .get(symbol)
            .copied()
            .unwrap_or(self.default_slippage_pct)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_seconds: u64,
    pub request_interval_ms: u64,
    pub user_agent: String,
    pub base_urls: BTreeMap<String, String>,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_seconds: 10,
            request_interval_ms: 500,
            user_agent: DEFAULT_USER_AGENT.to_string(),
            base_urls: BTreeMap::new(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct LoggingConfig {
    pub level: String,
    pub file: Option<String>,
    /// 以 JSON 格式輸出到終端（不寫檔）
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: "INFO".to_string(),
            file: Some("funding_rate_bot.log".to_string()),
            json: false,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct StorageConfig {
    pub data_dir: String,
}

impl Default for StorageConfig {
    fn default() -> Self {
        Self {
            data_dir: "data".to_string(),
        }
    }
}

impl ScannerConfig {
    /// 從 TOML 檔案載入配置
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let content = std::fs::read_to_string(&path).map_err(ScanError::IoError)?;
        Self::from_toml_str(&content)
    }

    /// 從 TOML 字串解析配置，未提供的欄位使用預設值
    pub fn from_toml_str(content: &str) -> Result<Self> {
        let processed_content = Self::substitute_env_vars(content)?;

        toml::from_str(&processed_content).map_err(|e| ScanError::ConfigError {
            message: format!("TOML parsing error: {}", e),
        })
    }

    /// 替換環境變數 (例如 ${BINANCE_URL})
    fn substitute_env_vars(content: &str) -> Result<String> {
        let re = Regex::new(r"\$\{([^}]+)\}").map_err(|e| ScanError::ConfigError {
            message: format!("invalid substitution pattern: {}", e),
        })?;

        let result = re.replace_all(content, |caps: &regex::Captures| {
            let var_name = &caps[1];
            std::env::var(var_name).unwrap_or_else(|_| format!("${{{}}}", var_name))
        });

        Ok(result.to_string())
    }

    pub fn fee_pct(&self, exchange: Exchange) -> f64 {
        self.costs.fee_pct(exchange)
    }

    pub fn slippage_pct(&self, symbol: &str) -> f64 {
        self.costs.slippage_pct(symbol)
    }

    pub fn base_url(&self, exchange: Exchange) -> &str {
        self.http
            .base_urls
            .get(exchange.key())
            .map(String::as_str)
            .unwrap_or_else(|| exchange.default_base_url())
    }

    pub fn request_interval(&self) -> Duration {
        Duration::from_millis(self.http.request_interval_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.http.timeout_seconds)
    }

    pub fn scan_interval(&self) -> Duration {
        Duration::from_secs(self.scanner.scan_interval_minutes.saturating_mul(60))
    }

    pub fn error_backoff(&self) -> Duration {
        Duration::from_secs(self.scanner.error_backoff_seconds)
    }

    pub fn data_dir(&self) -> PathBuf {
        PathBuf::from(&self.storage.data_dir)
    }

    /// 統一鍵值大小寫：交易所小寫、幣種大寫
    pub fn normalize(&mut self) {
        self.costs.exchange_fees = std::mem::take(&mut self.costs.exchange_fees)
            .into_iter()
            .map(|(key, pct)| (key.trim().to_lowercase(), pct))
            .collect();
        self.http.base_urls = std::mem::take(&mut self.http.base_urls)
            .into_iter()
            .map(|(key, url)| (key.trim().to_lowercase(), url))
            .collect();
        for symbol in &mut self.scanner.symbols {
            *symbol = symbol.trim().to_uppercase();
        }
        self.costs.slippage = std::mem::take(&mut self.costs.slippage)
            .into_iter()
            .map(|(symbol, pct)| (symbol.trim().to_uppercase(), pct))
            .collect();
    }

    /// 驗證配置的合理性
    pub fn validate_config(&self) -> Result<()> {
        validation::validate_unique_list("scanner.symbols", &self.scanner.symbols)?;

        if self.scanner.enabled_exchanges.is_empty() {
            return Err(ScanError::InvalidConfigValueError {
                field: "scanner.enabled_exchanges".to_string(),
                value: "[]".to_string(),
                reason: "At least one exchange must be enabled".to_string(),
            });
        }

        validation::validate_range(
            "scanner.min_profit_threshold",
            self.scanner.min_profit_threshold,
            0.0,
            1.0,
        )?;
        validation::validate_range(
            "scanner.position_size",
            self.scanner.position_size,
            f64::MIN_POSITIVE,
            f64::MAX,
        )?;
        validation::validate_range(
            "scanner.scan_interval_minutes",
            self.scanner.scan_interval_minutes,
            1,
            MAX_SCAN_INTERVAL_MINUTES,
        )?;
        validation::validate_positive_number("http.timeout_seconds", self.http.timeout_seconds, 1)?;

        for (key, pct) in &self.costs.exchange_fees {
            key.parse::<Exchange>()
                .map_err(|reason| ScanError::InvalidConfigValueError {
                    field: "costs.exchange_fees".to_string(),
                    value: key.clone(),
                    reason,
                })?;
            validation::validate_range(&format!("costs.exchange_fees.{}", key), *pct, 0.0, 100.0)?;
        }
        for (symbol, pct) in &self.costs.slippage {
            validation::validate_range(&format!("costs.slippage.{}", symbol), *pct, 0.0, 100.0)?;
        }
        validation::validate_range("costs.default_fee_pct", self.costs.default_fee_pct, 0.0, 100.0)?;
        validation::validate_range(
            "costs.default_slippage_pct",
            self.costs.default_slippage_pct,
            0.0,
            100.0,
        )?;
        validation::validate_range("costs.fixed_buffer", self.costs.fixed_buffer, 0.0, 1.0)?;
        validation::validate_range(
            "costs.min_rate_difference",
            self.costs.min_rate_difference,
            0.0,
            1.0,
        )?;

        for exchange in &self.scanner.enabled_exchanges {
            validation::validate_url(
                &format!("http.base_urls.{}", exchange.key()),
                self.base_url(*exchange),
            )?;
        }

        validation::validate_non_empty_string("logging.level", &self.logging.level)?;
        if !["TRACE", "DEBUG", "INFO", "WARN", "ERROR"]
            .contains(&self.logging.level.to_uppercase().as_str())
        {
            return Err(ScanError::InvalidConfigValueError {
                field: "logging.level".to_string(),
                value: self.logging.level.clone(),
                reason: "Valid levels: TRACE, DEBUG, INFO, WARN, ERROR".to_string(),
            });
        }

        validation::validate_path("storage.data_dir", &self.storage.data_dir)?;

        Ok(())
    }
}

impl Validate for ScannerConfig {
    fn validate(&self) -> Result<()> {
        self.validate_config()
    }
}
