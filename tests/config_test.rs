use clap::Parser;
use funding_scanner::utils::validation::Validate;
use funding_scanner::{CliArgs, Exchange, ScanError, ScannerConfig};
use std::time::Duration;
use tempfile::TempDir;

const CONFIG: &str = r#"
[scanner]
symbols = ["btc", "eth", "sol"]
enabled_exchanges = ["binance", "okx"]
min_profit_threshold = 0.003
scan_interval_minutes = 15

[costs]
fixed_buffer = 0.001

[costs.exchange_fees]
Binance = 0.05
okx = 0.07

[http]
request_interval_ms = 250

[http.base_urls]
okx = "${FUNDING_SCANNER_TEST_OKX_URL}"

[logging]
level = "debug"
file = "logs/scanner.log"

[storage]
data_dir = "out"
"#;

#[test]
fn test_load_config_file_with_env_substitution() {
    std::env::set_var("FUNDING_SCANNER_TEST_OKX_URL", "https://okx.example.com");

    let temp_dir = TempDir::new().unwrap();
    let path = temp_dir.path().join("scanner.toml");
    std::fs::write(&path, CONFIG).unwrap();

    let args = CliArgs::parse_from([
        "funding-scanner",
        "--config",
        path.to_str().unwrap(),
        "--position-size",
        "2500",
        "scan",
    ]);
    let config = args.load_config().unwrap();

    assert_eq!(config.scanner.symbols, vec!["BTC", "ETH", "SOL"]);
    assert_eq!(
        config.scanner.enabled_exchanges,
        vec![Exchange::Binance, Exchange::Okx]
    );
    assert_eq!(config.scanner.min_profit_threshold, 0.003);
    assert_eq!(config.scanner.position_size, 2500.0);
    assert_eq!(config.scan_interval(), Duration::from_secs(15 * 60));
    assert_eq!(config.request_interval(), Duration::from_millis(250));

    // 未列出的交易所回到預設費率
    assert_eq!(config.fee_pct(Exchange::Binance), 0.05);
    assert_eq!(config.fee_pct(Exchange::Okx), 0.07);
    assert_eq!(config.fee_pct(Exchange::Bybit), 0.1);
    assert_eq!(config.costs.fixed_buffer, 0.001);
    assert_eq!(config.slippage_pct("DOGE"), 0.05);

    assert_eq!(config.base_url(Exchange::Okx), "https://okx.example.com");
    assert_eq!(config.base_url(Exchange::Binance), Exchange::Binance.default_base_url());
    assert_eq!(config.logging.file.as_deref(), Some("logs/scanner.log"));
    assert_eq!(config.data_dir(), std::path::PathBuf::from("out"));

    assert!(config.validate().is_ok());
}

#[test]
fn test_invalid_values_are_rejected() {
    let config = ScannerConfig::from_toml_str(
        r#"
[scanner]
enabled_exchanges = []
"#,
    )
    .unwrap();
    let err = config.validate().unwrap_err();
    assert!(matches!(err, ScanError::InvalidConfigValueError { .. }));
    assert_eq!(err.exit_code(), 1);

    let config = ScannerConfig::from_toml_str(
        r#"
[costs.exchange_fees]
ftx = 0.1
"#,
    )
    .unwrap();
    assert!(config.validate().is_err());
}

#[test]
fn test_unknown_exchange_in_file_is_a_config_error() {
    let err = ScannerConfig::from_toml_str(
        r#"
[scanner]
enabled_exchanges = ["binance", "ftx"]
"#,
    )
    .unwrap_err();
    assert!(matches!(err, ScanError::ConfigError { .. }));
}

#[test]
fn test_missing_config_file() {
    let args = CliArgs::parse_from(["funding-scanner", "--config", "/nonexistent/scanner.toml"]);
    let err = args.load_config().unwrap_err();
    assert!(matches!(err, ScanError::IoError(_)));
}

#[test]
fn test_non_finite_and_oversized_overrides_fail_validation() {
    let args = CliArgs::parse_from(["funding-scanner", "--threshold", "NaN", "scan"]);
    let config = args.load_config().unwrap();
    assert!(config.scanner.min_profit_threshold.is_nan());
    assert!(matches!(
        config.validate(),
        Err(ScanError::InvalidConfigValueError { .. })
    ));

    let args = CliArgs::parse_from(["funding-scanner", "--position-size", "inf", "scan"]);
    assert!(args.load_config().unwrap().validate().is_err());

    let args = CliArgs::parse_from([
        "funding-scanner",
        "--interval",
        "1844674407370955161",
        "continuous",
    ]);
    let config = args.load_config().unwrap();
    assert!(config.validate().is_err());
}
