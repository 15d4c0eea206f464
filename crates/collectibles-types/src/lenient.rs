//! Lenient numeric deserialization
//!
//! Clients send money and quantity fields either as JSON numbers or as
//! strings (`499.0` vs `"499.00"`). These helpers accept both forms and
//! reject anything that does not coerce cleanly.

use rust_decimal::Decimal;
use serde::{Deserialize, Deserializer};

#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RawNumber {
    Int(i64),
    Float(f64),
    Text(String),
}

fn decimal_from(raw: RawNumber) -> Result<Decimal, String> {
    match raw {
        RawNumber::Int(v) => Ok(Decimal::from(v)),
        RawNumber::Float(v) => {
            Decimal::try_from(v).map_err(|e| format!("not a valid decimal: {}", e))
        }
        RawNumber::Text(s) => s
            .trim()
            .parse::<Decimal>()
            .map_err(|e| format!("not a valid decimal: {}", e)),
    }
}

fn integer_from(raw: RawNumber) -> Result<i64, String> {
    match raw {
        RawNumber::Int(v) => Ok(v),
        RawNumber::Float(v) if v.fract() == 0.0 => Ok(v as i64),
        RawNumber::Float(_) => Err("not an integer".to_string()),
        RawNumber::Text(s) => s
            .trim()
            .parse::<i64>()
            .map_err(|e| format!("not a valid integer: {}", e)),
    }
}

/// Optional decimal accepting a JSON number or string; `null` counts as absent.
pub fn opt_decimal<'de, D>(de: D) -> Result<Option<Decimal>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(de)?;
    raw.map(decimal_from)
        .transpose()
        .map_err(serde::de::Error::custom)
}

/// Optional integer accepting a JSON number or numeric string; `null` counts as absent.
pub fn opt_integer<'de, D>(de: D) -> Result<Option<i64>, D::Error>
where
    D: Deserializer<'de>,
{
    let raw = Option::<RawNumber>::deserialize(de)?;
    raw.map(integer_from)
        .transpose()
        .map_err(serde::de::Error::custom)
}

#[cfg(test)]
mod tests {
    use rust_decimal::Decimal;
    use serde::Deserialize;

    #[derive(Deserialize)]
    struct Probe {
        #[serde(default, deserialize_with = "super::opt_decimal")]
        price: Option<Decimal>,
        #[serde(default, deserialize_with = "super::opt_integer")]
        stock: Option<i64>,
    }

    #[test]
    fn accepts_string_and_number_forms() {
        let p: Probe = serde_json::from_str(r#"{"price":"499.00","stock":10}"#).unwrap();
        assert_eq!(p.price, Some("499.00".parse().unwrap()));
        assert_eq!(p.stock, Some(10));

        let p: Probe = serde_json::from_str(r#"{"price":499,"stock":"7"}"#).unwrap();
        assert_eq!(p.price, Some(Decimal::from(499)));
        assert_eq!(p.stock, Some(7));
    }

    #[test]
    fn absent_and_null_mean_none() {
        let p: Probe = serde_json::from_str("{}").unwrap();
        assert!(p.price.is_none());
        assert!(p.stock.is_none());

        let p: Probe = serde_json::from_str(r#"{"price":null,"stock":null}"#).unwrap();
        assert!(p.price.is_none());
        assert!(p.stock.is_none());
    }

    #[test]
    fn rejects_garbage() {
        assert!(serde_json::from_str::<Probe>(r#"{"price":"abc"}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"stock":"ten"}"#).is_err());
        assert!(serde_json::from_str::<Probe>(r#"{"stock":1.5}"#).is_err());
    }
}
