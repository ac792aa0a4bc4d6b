//! 交易所常以字串傳回數值（"0.0001"、"1700000000000"），這裡同時接受字串與數字。

use chrono::{DateTime, TimeZone, Utc};
use serde::de::{self, Deserializer};
use serde::Deserialize;

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexFloat {
    Num(f64),
    Text(String),
}

#[derive(Deserialize)]
#[serde(untagged)]
enum FlexInt {
    Int(i64),
    Text(String),
}

pub fn opt_f64<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<FlexFloat>::deserialize(deserializer)? {
        None => Ok(None),
        Some(FlexFloat::Num(n)) => Ok(Some(n)),
        Some(FlexFloat::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                Ok(None)
            } else {
                s.parse::<f64>().map(Some).map_err(de::Error::custom)
            }
        }
    }
}

/// 毫秒時間戳；0 或空字串視為未知
pub fn opt_millis<'de, D>(deserializer: D) -> Result<Option<DateTime<Utc>>, D::Error>
where
    D: Deserializer<'de>,
{
    let millis = match Option::<FlexInt>::deserialize(deserializer)? {
        None => return Ok(None),
        Some(FlexInt::Int(n)) => n,
        Some(FlexInt::Text(s)) => {
            let s = s.trim();
            if s.is_empty() {
                return Ok(None);
            }
            s.parse::<i64>().map_err(de::Error::custom)?
        }
    };

    if millis <= 0 {
        return Ok(None);
    }
    Ok(Utc.timestamp_millis_opt(millis).single())
}
