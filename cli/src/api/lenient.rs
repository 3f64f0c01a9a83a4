//! Field deserializers for loosely typed server payloads.
//!
//! Some endpoints send `null` for fields that are normally present, and
//! money amounts arrive either as JSON numbers or as decimal strings.

use serde::de::Error as _;
use serde::{Deserialize, Deserializer};

/// Deserialize `T`, mapping an explicit `null` to `T::default()`.
pub(crate) fn null_as_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: Deserialize<'de> + Default,
{
    Ok(Option::<T>::deserialize(deserializer)?.unwrap_or_default())
}

#[derive(Deserialize)]
#[serde(untagged)]
enum RawAmount {
    Number(f64),
    Text(String),
}

/// An amount given as a number or a decimal string. `null` and blank
/// strings read as zero.
pub(crate) fn amount<'de, D>(deserializer: D) -> Result<f64, D::Error>
where
    D: Deserializer<'de>,
{
    Ok(optional_amount(deserializer)?.unwrap_or_default())
}

/// Like [`amount`], but keeps a missing value as `None`.
pub(crate) fn optional_amount<'de, D>(deserializer: D) -> Result<Option<f64>, D::Error>
where
    D: Deserializer<'de>,
{
    match Option::<RawAmount>::deserialize(deserializer)? {
        None => Ok(None),
        Some(RawAmount::Number(value)) => Ok(Some(value)),
        Some(RawAmount::Text(text)) if text.trim().is_empty() => Ok(None),
        Some(RawAmount::Text(text)) => text
            .trim()
            .parse()
            .map(Some)
            .map_err(|_| D::Error::custom(format!("invalid amount: {:?}", text))),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Sample {
        #[serde(default, deserialize_with = "null_as_default")]
        name: String,
        #[serde(default, deserialize_with = "amount")]
        amount: f64,
        #[serde(default, deserialize_with = "optional_amount")]
        pending: Option<f64>,
    }

    fn parse(json: &str) -> Result<Sample, serde_json::Error> {
        serde_json::from_str(json)
    }

    #[test]
    fn test_null_and_missing_fields_use_defaults() {
        let sample = parse(r#"{"name":null,"amount":null,"pending":null}"#).unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.amount, 0.0);
        assert_eq!(sample.pending, None);

        let sample = parse("{}").unwrap();
        assert_eq!(sample.name, "");
        assert_eq!(sample.pending, None);
    }

    #[test]
    fn test_amount_accepts_numbers_and_decimal_strings() {
        let sample = parse(r#"{"amount":"1250.50","pending":12}"#).unwrap();
        assert_eq!(sample.amount, 1250.5);
        assert_eq!(sample.pending, Some(12.0));

        assert_eq!(parse(r#"{"amount":" "}"#).unwrap().amount, 0.0);
    }

    #[test]
    fn test_amount_rejects_non_numeric_text() {
        let err = parse(r#"{"amount":"lots"}"#).unwrap_err();
        assert!(err.to_string().contains("invalid amount"));
    }
}
