use thiserror::Error;

#[derive(Error, Debug)]
pub enum ScanError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("{exchange} API error: HTTP {status}")]
    ExchangeStatus { exchange: String, status: u16 },

    #[error("{exchange} returned an unexpected payload: {message}")]
    PayloadError { exchange: String, message: String },

    #[error("Configuration error: {message}")]
    ConfigError { message: String },

    #[error("Invalid value '{value}' for {field}: {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },

    #[error("Document error in {document}: {message}")]
    DocumentError { document: String, message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorCategory {
    Network,
    Configuration,
    Data,
    Storage,
    Documentation,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum ErrorSeverity {
    Low,
    Medium,
    High,
    Critical,
}

impl ScanError {
    pub fn category(&self) -> ErrorCategory {
        match self {
            ScanError::ApiError(_) | ScanError::ExchangeStatus { .. } => ErrorCategory::Network,
            ScanError::ConfigError { .. }
            | ScanError::InvalidConfigValueError { .. } => ErrorCategory::Configuration,
            ScanError::PayloadError { .. }
            | ScanError::SerializationError(_)
            | ScanError::ProcessingError { .. } => ErrorCategory::Data,
            ScanError::IoError(_) | ScanError::CsvError(_) => ErrorCategory::Storage,
            ScanError::DocumentError { .. } => ErrorCategory::Documentation,
        }
    }

    pub fn severity(&self) -> ErrorSeverity {
        match self {
            // 交易所暫時性錯誤，下一輪掃描會重試
            ScanError::ApiError(_) | ScanError::ExchangeStatus { .. } => ErrorSeverity::Medium,
            ScanError::PayloadError { .. } | ScanError::ProcessingError { .. } => {
                ErrorSeverity::Medium
            }
            ScanError::SerializationError(_) | ScanError::DocumentError { .. } => {
                ErrorSeverity::High
            }
            ScanError::ConfigError { .. }
            | ScanError::InvalidConfigValueError { .. } => ErrorSeverity::High,
            ScanError::IoError(_) | ScanError::CsvError(_) => ErrorSeverity::Critical,
        }
    }

    pub fn recovery_suggestion(&self) -> String {
        match self {
            ScanError::ApiError(_) => {
                "Check your network connection; the exchange may be unreachable".to_string()
            }
            ScanError::ExchangeStatus { exchange, status } if *status == 429 => format!(
                "{} is rate limiting requests; increase request_interval_ms",
                exchange
            ),
            ScanError::ExchangeStatus { exchange, .. } => format!(
                "{} rejected the request; disable it with --exchanges or retry later",
                exchange
            ),
            ScanError::PayloadError { exchange, .. } => format!(
                "{} may have changed its public API; check the endpoint in the config",
                exchange
            ),
            ScanError::ConfigError { .. }
            | ScanError::InvalidConfigValueError { .. } => {
                "Review the configuration file and command line overrides".to_string()
            }
            ScanError::IoError(_) | ScanError::CsvError(_) => {
                "Make sure data_dir exists and is writable".to_string()
            }
            ScanError::SerializationError(_) => {
                "The JSON payload could not be processed; run with --verbose".to_string()
            }
            ScanError::DocumentError { document, .. } => {
                format!("Fix the structure of {} and run lint-docs again", document)
            }
            ScanError::ProcessingError { .. } => "Run with --verbose for details".to_string(),
        }
    }

    pub fn user_friendly_message(&self) -> String {
        match self.category() {
            ErrorCategory::Network => format!("Exchange unreachable: {}", self),
            ErrorCategory::Configuration => format!("Invalid configuration: {}", self),
            ErrorCategory::Data => format!("Unexpected market data: {}", self),
            ErrorCategory::Storage => format!("Could not save results: {}", self),
            ErrorCategory::Documentation => format!("Documentation check failed: {}", self),
        }
    }

    /// 依嚴重程度對應的行程結束碼
    pub fn exit_code(&self) -> i32 {
        match self.severity() {
            ErrorSeverity::Low => 0,
            ErrorSeverity::Medium => 2,
            ErrorSeverity::High => 1,
            ErrorSeverity::Critical => 3,
        }
    }
}

pub type Result<T> = std::result::Result<T, ScanError>;
