//! Decoding helpers for numbers the API sends either as JSON numbers or as
//! strings (Postgres `numeric` columns arrive as `"1500.00"`).

use rust_decimal::Decimal;
use serde::{de, Deserialize, Deserializer};
use std::str::FromStr;

#[derive(Deserialize)]
#[serde(untagged)]
enum WireNumber {
    Number(serde_json::Number),
    Text(String),
}

impl WireNumber {
    fn into_decimal<E: de::Error>(self) -> Result<Decimal, E> {
        let text = match self {
            WireNumber::Number(n) => n.to_string(),
            WireNumber::Text(s) => s.trim().to_string(),
        };
        parse_decimal(&text).ok_or_else(|| E::custom(format!("invalid decimal value: {:?}", text)))
    }
}

/// Parse plain (`"42.50"`) or scientific (`"1e3"`) notation
pub fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text)
        .or_else(|_| Decimal::from_scientific(text))
        .ok()
}

pub fn decimal<'de, D>(deserializer: D) -> Result<Decimal, D::Error>
where
    D: Deserializer<'de>,
{
    WireNumber::deserialize(deserializer)?.into_decimal()
}

pub fn optional_decimal<'de, D>(deserializer: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<WireNumber>::deserialize(deserializer)? {
        Some(value) => value.into_decimal().map(Some),
        None => Ok(None),
    }
}
