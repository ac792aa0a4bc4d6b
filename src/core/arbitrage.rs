use crate::config::toml_config::CostConfig;
use crate::domain::model::{ArbitrageOpportunity, FundingRate};
use std::collections::BTreeMap;

/// 計算跨交易所資金費率價差與扣除成本後的淨利
///
/// 做空費率較高的一邊、做多費率較低的一邊：正費率時空方收取資金費，
/// 每 8 小時的毛利即為兩邊費率差。成本包含兩邊手續費、兩次滑價與固定緩衝。
#[derive(Debug, Clone)]
pub struct ArbitrageCalculator {
    costs: CostConfig,
}

impl ArbitrageCalculator {
    pub fn new(costs: CostConfig) -> Self {
        Self { costs }
    }

    /// 找出所有淨利為正的機會，依淨利由高到低排序
    pub fn find_opportunities(&self, rates: &[FundingRate]) -> Vec<ArbitrageOpportunity> {
        let mut by_symbol: BTreeMap<&str, Vec<&FundingRate>> = BTreeMap::new();
        for rate in rates {
            by_symbol.entry(rate.symbol.as_str()).or_default().push(rate);
        }

        let mut opportunities = Vec::new();
        for (symbol, quotes) in by_symbol {
            if quotes.len() < 2 {
                continue;
            }

            for i in 0..quotes.len() {
                for j in (i + 1)..quotes.len() {
                    let (a, b) = (quotes[i], quotes[j]);
                    if a.exchange == b.exchange {
                        continue;
                    }

                    let (long, short) = if a.rate > b.rate { (b, a) } else { (a, b) };
                    if short.rate - long.rate <= self.costs.min_rate_difference {
                        continue;
                    }

                    let opportunity = self.evaluate(symbol, long, short);
                    if opportunity.net_profit_8h > 0.0 {
                        opportunities.push(opportunity);
                    }
                }
            }
        }

        opportunities.sort_by(|a, b| b.net_profit_8h.total_cmp(&a.net_profit_8h));
        opportunities
    }

    /// 計算單一組合的成本與淨利
    pub fn evaluate(&self, symbol: &str, long: &FundingRate, short: &FundingRate) -> ArbitrageOpportunity {
        let rate_difference = short.rate - long.rate;

        let long_fees = self.costs.fee_pct(long.exchange) / 100.0;
        let short_fees = self.costs.fee_pct(short.exchange) / 100.0;
        let slippage = self.costs.slippage_pct(symbol) / 100.0;
        let estimated_fees = long_fees + short_fees + 2.0 * slippage + self.costs.fixed_buffer;

        let next_funding_time = match (long.next_funding_time, short.next_funding_time) {
            (Some(a), Some(b)) => Some(a.min(b)),
            (a, b) => a.or(b),
        };

        ArbitrageOpportunity {
            symbol: symbol.to_string(),
            long_exchange: long.exchange,
            short_exchange: short.exchange,
            long_rate: long.rate,
            short_rate: short.rate,
            rate_difference,
            potential_profit_8h: rate_difference,
            estimated_fees,
            net_profit_8h: rate_difference - estimated_fees,
            next_funding_time,
        }
    }
}

/// 依門檻過濾（門檻含等於）
pub fn profitable(opportunities: &[ArbitrageOpportunity], min_profit: f64) -> Vec<ArbitrageOpportunity> {
    opportunities
        .iter()
        .filter(|op| op.net_profit_8h >= min_profit)
        .cloned()
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::model::Exchange;
    use chrono::{TimeZone, Utc};

    fn calculator() -> ArbitrageCalculator {
        ArbitrageCalculator::new(CostConfig::default())
    }

    fn rate(exchange: Exchange, symbol: &str, value: f64) -> FundingRate {
        FundingRate::new(exchange, symbol, value)
    }

    fn approx(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-12
    }

    #[test]
    fn test_profit_includes_fees_slippage_and_buffer() {
        let rates = vec![
            rate(Exchange::Binance, "BTC", -0.001),
            rate(Exchange::Kucoin, "BTC", 0.01),
        ];

        let ops = calculator().find_opportunities(&rates);

        assert_eq!(ops.len(), 1);
        let op = &ops[0];
        assert_eq!(op.long_exchange, Exchange::Binance);
        assert_eq!(op.short_exchange, Exchange::Kucoin);
        assert!(approx(op.rate_difference, 0.011));
        // 0.08% + 0.09% 手續費 + 2 * 0.01% 滑價 + 0.002 緩衝
        assert!(approx(op.estimated_fees, 0.0008 + 0.0009 + 0.0002 + 0.002));
        assert!(approx(op.net_profit_8h, 0.011 - 0.0039));
        assert!(approx(op.potential_profit_8h, op.rate_difference));
    }

    #[test]
    fn test_unknown_exchange_and_symbol_use_default_costs() {
        let mut costs = CostConfig::default();
        costs.exchange_fees.clear();
        let calculator = ArbitrageCalculator::new(costs);

        let op = calculator.evaluate(
            "PEPE",
            &rate(Exchange::Okx, "PEPE", 0.0),
            &rate(Exchange::Bybit, "PEPE", 0.01),
        );

        // 0.1% * 2 + 0.05% * 2 + 0.002
        assert!(approx(op.estimated_fees, 0.001 + 0.001 + 0.001 + 0.002));
    }

    #[test]
    fn test_small_spreads_and_single_quotes_are_ignored() {
        let rates = vec![
            rate(Exchange::Binance, "ETH", 0.0001),
            rate(Exchange::Bybit, "ETH", 0.00019),
            rate(Exchange::Okx, "SOL", 0.05),
        ];

        assert!(calculator().find_opportunities(&rates).is_empty());
    }

    #[test]
    fn test_unprofitable_after_costs_is_dropped() {
        // 費率差 0.002 低於成本
        let rates = vec![
            rate(Exchange::Binance, "BTC", 0.0),
            rate(Exchange::Bybit, "BTC", 0.002),
        ];

        assert!(calculator().find_opportunities(&rates).is_empty());
    }

    #[test]
    fn test_results_sorted_by_net_profit() {
        let rates = vec![
            rate(Exchange::Binance, "BTC", 0.0),
            rate(Exchange::Bybit, "BTC", 0.008),
            rate(Exchange::Okx, "BTC", 0.012),
            rate(Exchange::Binance, "ETH", -0.01),
            rate(Exchange::Okx, "ETH", 0.01),
        ];

        let ops = calculator().find_opportunities(&rates);

        assert_eq!(ops.len(), 4);
        assert_eq!(ops[0].symbol, "ETH");
        for pair in ops.windows(2) {
            assert!(pair[0].net_profit_8h >= pair[1].net_profit_8h);
        }
        assert!(ops.iter().all(|op| op.short_rate > op.long_rate));
    }

    #[test]
    fn test_next_funding_time_is_earliest_known() {
        let early = Utc.with_ymd_and_hms(2026, 1, 1, 8, 0, 0).unwrap();
        let late = Utc.with_ymd_and_hms(2026, 1, 1, 16, 0, 0).unwrap();

        let long = rate(Exchange::Binance, "BTC", 0.0).with_next_funding_time(Some(late));
        let short = rate(Exchange::Okx, "BTC", 0.02).with_next_funding_time(Some(early));
        assert_eq!(calculator().evaluate("BTC", &long, &short).next_funding_time, Some(early));

        let bitget = rate(Exchange::Bitget, "BTC", 0.02);
        assert_eq!(calculator().evaluate("BTC", &long, &bitget).next_funding_time, Some(late));
    }

    #[test]
    fn test_threshold_is_inclusive() {
        let op = calculator().evaluate(
            "BTC",
            &rate(Exchange::Binance, "BTC", 0.0),
            &rate(Exchange::Bybit, "BTC", 0.01),
        );
        let net = op.net_profit_8h;
        let ops = vec![op];

        assert_eq!(profitable(&ops, net).len(), 1);
        assert!(profitable(&ops, net + 1e-9).is_empty());
    }
}
