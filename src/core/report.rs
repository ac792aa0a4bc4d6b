use crate::domain::model::{ArbitrageOpportunity, Exchange, FundingRate};
use crate::utils::error::{Result, ScanError};
use serde::Serialize;
use std::fmt::Write;

/// 小數轉百分比字串：pct(0.0001, 4) == "0.0100%"
pub fn pct(value: f64, decimals: usize) -> String {
    format!("{:.*}%", decimals, value * 100.0)
}

pub fn banner() -> String {
    let line = "=".repeat(60);
    format!(
        "🎯 FUNDING RATE ARBITRAGE SCANNER - DIRECT APIS\n{line}\n\
         ✅ Supported exchanges: {}\n\
         ✅ No API key required\n\
         ✅ Live data straight from the exchanges\n{line}",
        Exchange::ALL
            .iter()
            .map(|ex| ex.display_name())
            .collect::<Vec<_>>()
            .join(", "),
    )
}

/// 每個交易所收集到的數量
pub fn funding_summary(rates: &[FundingRate]) -> String {
    let mut counts: Vec<(Exchange, usize)> = Vec::new();
    for rate in rates {
        match counts.iter_mut().find(|(ex, _)| *ex == rate.exchange) {
            Some((_, count)) => *count += 1,
            None => counts.push((rate.exchange, 1)),
        }
    }

    let mut out = String::new();
    let _ = writeln!(out, "\n📊 FUNDING RATES COLLECTED:");
    let _ = writeln!(out, "{}", "-".repeat(50));
    for (exchange, count) in counts {
        let _ = writeln!(out, "{}: {} symbols", exchange, count);
    }
    let _ = write!(out, "\nTotal: {} funding rates", rates.len());
    out
}

pub fn opportunities(ops: &[ArbitrageOpportunity], position_size: f64) -> String {
    let mut out = String::new();
    let _ = writeln!(out, "\n{}", "=".repeat(80));
    let _ = writeln!(out, "🎯 TOP ARBITRAGE OPPORTUNITIES");
    let _ = writeln!(out, "{}", "=".repeat(80));

    for (i, op) in ops.iter().enumerate() {
        let profit_usd = op.net_profit_8h * position_size;

        let _ = writeln!(out, "\n{}. 🪙 {}", i + 1, op.symbol);
        let _ = writeln!(out, "   📈 Long:  {} ({})", op.long_exchange, pct(op.long_rate, 4));
        let _ = writeln!(out, "   📉 Short: {} ({})", op.short_exchange, pct(op.short_rate, 4));
        let _ = writeln!(out, "   💵 Spread: {}", pct(op.rate_difference, 4));
        let _ = writeln!(
            out,
            "   💰 Net profit (8h): {} = ${:.2}",
            pct(op.net_profit_8h, 3),
            profit_usd
        );
        let _ = writeln!(out, "   💸 Estimated fees: {}", pct(op.estimated_fees, 3));
        if let Some(next) = op.next_funding_time {
            let _ = writeln!(out, "   ⏰ Next funding: {} UTC", next.format("%H:%M:%S"));
        }
        let _ = writeln!(out, "{}", "-".repeat(50));
    }

    out
}

#[derive(Serialize)]
struct RateRow<'a> {
    timestamp: String,
    exchange: &'a str,
    symbol: &'a str,
    rate: f64,
    rate_pct: String,
    next_funding_time: Option<String>,
    mark_price: Option<f64>,
}

/// 將收集到的費率輸出成 CSV
pub fn rates_to_csv(rates: &[FundingRate]) -> Result<String> {
    let mut writer = csv::Writer::from_writer(Vec::new());
    for rate in rates {
        writer.serialize(RateRow {
            timestamp: rate.timestamp.to_rfc3339(),
            exchange: rate.exchange.display_name(),
            symbol: &rate.symbol,
            rate: rate.rate,
            rate_pct: pct(rate.rate, 4),
            next_funding_time: rate.next_funding_time.map(|t| t.to_rfc3339()),
            mark_price: rate.mark_price,
        })?;
    }

    let bytes = writer.into_inner().map_err(|e| ScanError::ProcessingError {
        message: format!("CSV flush failed: {}", e),
    })?;
    String::from_utf8(bytes).map_err(|e| ScanError::ProcessingError {
        message: format!("CSV output is not UTF-8: {}", e),
    })
}
