//! Status records as delivered by `GET /status/latest`, and the per-record validation pass that
//! turns raw JSON values into [`StatusRecord`]s.

use crate::error::{ConfigError, MalformedRecordError};
use serde::{Deserialize, Serialize};
use std::{collections::HashMap, str::FromStr};

/// Latest known quote for one identity.
///
/// Records are immutable once received: a newer record for the same identity replaces the old
/// one wholesale.
#[derive(Debug, Clone, PartialEq, Deserialize, Serialize)]
pub struct StatusRecord {
    pub identity: String,
    pub bid_price: f64,
    pub ask_price: f64,
    /// Nanoseconds since the Unix epoch (UTC).
    pub timestamp_ns: u64,
    pub consumer_id: String,
}

/// Which wire field identifies a record.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum IdentityScheme {
    /// `{"symbol": "btcusdt", ...}`
    #[default]
    Symbol,
    /// `{"id": 290, ...}`
    Id,
}

impl FromStr for IdentityScheme {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "symbol" => Ok(Self::Symbol),
            "id" => Ok(Self::Id),
            _ => Err(ConfigError::InvalidValue {
                key: "IDENTITY_KEY",
                value: s.to_string(),
            }),
        }
    }
}

/// Wire shape shared by both identity schemes.
///
/// Identity fields stay untyped here; only the one selected by the active scheme is checked.
#[derive(Debug, Deserialize)]
struct WireRecord {
    #[serde(default)]
    symbol: Option<serde_json::Value>,
    #[serde(default)]
    id: Option<serde_json::Value>,
    bid_price: f64,
    ask_price: f64,
    timestamp_ns: u64,
    consumer_id: String,
}

/// Normalise a symbol so config keys and wire symbols compare equal regardless of case.
pub fn normalise_symbol(symbol: &str) -> String {
    symbol.trim().to_ascii_lowercase()
}

/// Outcome of validating one fetched batch.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidatedBatch {
    pub records: Vec<StatusRecord>,
    pub rejected: Vec<MalformedRecordError>,
}

/// Validates raw records and resolves their identity according to an [`IdentityScheme`].
#[derive(Debug, Clone, Default)]
pub struct RecordValidator {
    scheme: IdentityScheme,
    /// Reverse symbol map used by [`IdentityScheme::Id`] to label numeric ids.
    labels: HashMap<i64, String>,
}

impl RecordValidator {
    pub fn new(scheme: IdentityScheme) -> Self {
        Self {
            scheme,
            labels: HashMap::new(),
        }
    }

    /// Attach a `symbol -> id` map; numeric ids found in it resolve to their symbol.
    pub fn with_labels<'a, I>(mut self, symbols: I) -> Self
    where
        I: IntoIterator<Item = (&'a String, &'a i64)>,
    {
        self.labels = symbols
            .into_iter()
            .map(|(symbol, id)| (*id, normalise_symbol(symbol)))
            .collect();
        self
    }

    /// Validate a single raw record.
    pub fn validate(&self, value: serde_json::Value) -> Result<StatusRecord, MalformedRecordError> {
        let hint = identity_hint(&value);

        let wire = serde_json::from_value::<WireRecord>(value)
            .map_err(|error| MalformedRecordError::new(hint.clone(), error.to_string()))?;

        let identity = match self.scheme {
            IdentityScheme::Symbol => {
                let symbol = match wire.symbol {
                    None => return Err(MalformedRecordError::new(hint, "missing field `symbol`")),
                    Some(serde_json::Value::String(symbol)) => normalise_symbol(&symbol),
                    Some(_) => return Err(MalformedRecordError::new(hint, "`symbol` is not a string")),
                };
                if symbol.is_empty() {
                    return Err(MalformedRecordError::new(hint, "empty `symbol`"));
                }
                symbol
            }
            IdentityScheme::Id => {
                let id = match wire.id {
                    None => return Err(MalformedRecordError::new(hint, "missing field `id`")),
                    Some(id) => id.as_i64().ok_or_else(|| {
                        MalformedRecordError::new(hint.clone(), "`id` is not an integer")
                    })?,
                };
                self.labels
                    .get(&id)
                    .cloned()
                    .unwrap_or_else(|| id.to_string())
            }
        };

        Ok(StatusRecord {
            identity,
            bid_price: wire.bid_price,
            ask_price: wire.ask_price,
            timestamp_ns: wire.timestamp_ns,
            consumer_id: wire.consumer_id,
        })
    }

    /// Validate every record of a batch, keeping well-formed records in their original order.
    pub fn validate_batch(&self, values: Vec<serde_json::Value>) -> ValidatedBatch {
        values
            .into_iter()
            .fold(ValidatedBatch::default(), |mut batch, value| {
                match self.validate(value) {
                    Ok(record) => batch.records.push(record),
                    Err(error) => {
                        tracing::debug!(%error, "dropping malformed status record");
                        batch.rejected.push(error);
                    }
                }
                batch
            })
    }
}

/// Best-effort identity of a raw record, used only for error reporting.
fn identity_hint(value: &serde_json::Value) -> Option<String> {
    value
        .get("symbol")
        .and_then(serde_json::Value::as_str)
        .map(normalise_symbol)
        .or_else(|| {
            let id = value.get("id")?;
            id.as_i64()
                .map(|id| id.to_string())
                .or_else(|| id.as_str().map(str::to_string))
        })
}

#[cfg(test)]
mod tests {
    use super::*;
    use indexmap::IndexMap;
    use serde_json::json;

    fn btc_record() -> StatusRecord {
        StatusRecord {
            identity: "btcusdt".to_string(),
            bid_price: 65000.12,
            ask_price: 65000.50,
            timestamp_ns: 1_700_000_000_000_000_000,
            consumer_id: "c1".to_string(),
        }
    }

    #[test]
    fn test_validate_symbol_scheme() {
        struct TestCase {
            input: serde_json::Value,
            expected: Result<StatusRecord, Option<String>>,
        }

        let tests = vec![
            TestCase {
                // TC0: well-formed symbol record
                input: json!({
                    "symbol": "btcusdt",
                    "bid_price": 65000.12,
                    "ask_price": 65000.50,
                    "timestamp_ns": 1_700_000_000_000_000_000u64,
                    "consumer_id": "c1"
                }),
                expected: Ok(btc_record()),
            },
            TestCase {
                // TC1: symbol is case-normalised
                input: json!({
                    "symbol": "BTCUSDT",
                    "bid_price": 65000.12,
                    "ask_price": 65000.50,
                    "timestamp_ns": 1_700_000_000_000_000_000u64,
                    "consumer_id": "c1"
                }),
                expected: Ok(btc_record()),
            },
            TestCase {
                // TC2: missing bid_price is rejected, identity still reported
                input: json!({
                    "symbol": "btcusdt",
                    "ask_price": 65000.50,
                    "timestamp_ns": 1_700_000_000_000_000_000u64,
                    "consumer_id": "c1"
                }),
                expected: Err(Some("btcusdt".to_string())),
            },
            TestCase {
                // TC3: string price is rejected
                input: json!({
                    "symbol": "ethusdt",
                    "bid_price": "3000.1",
                    "ask_price": 3000.2,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Err(Some("ethusdt".to_string())),
            },
            TestCase {
                // TC4: negative timestamp is rejected
                input: json!({
                    "symbol": "ethusdt",
                    "bid_price": 3000.1,
                    "ask_price": 3000.2,
                    "timestamp_ns": -5,
                    "consumer_id": "c1"
                }),
                expected: Err(Some("ethusdt".to_string())),
            },
            TestCase {
                // TC5: id-keyed record without symbol is rejected in symbol scheme
                input: json!({
                    "id": 290,
                    "bid_price": 1.0,
                    "ask_price": 2.0,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Err(Some("290".to_string())),
            },
            TestCase {
                // TC6: not an object
                input: json!(42),
                expected: Err(None),
            },
            TestCase {
                // TC7: blank symbol
                input: json!({
                    "symbol": "  ",
                    "bid_price": 1.0,
                    "ask_price": 2.0,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Err(Some(String::new())),
            },
            TestCase {
                // TC8: string id is ignored in symbol scheme
                input: json!({
                    "symbol": "btcusdt",
                    "id": "290",
                    "bid_price": 65000.12,
                    "ask_price": 65000.50,
                    "timestamp_ns": 1_700_000_000_000_000_000u64,
                    "consumer_id": "c1"
                }),
                expected: Ok(btc_record()),
            },
            TestCase {
                // TC9: fractional id is ignored in symbol scheme
                input: json!({
                    "symbol": "btcusdt",
                    "id": 290.0,
                    "bid_price": 65000.12,
                    "ask_price": 65000.50,
                    "timestamp_ns": 1_700_000_000_000_000_000u64,
                    "consumer_id": "c1"
                }),
                expected: Ok(btc_record()),
            },
            TestCase {
                // TC10: numeric symbol is rejected
                input: json!({
                    "symbol": 7,
                    "bid_price": 1.0,
                    "ask_price": 2.0,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Err(None),
            },
        ];

        let validator = RecordValidator::new(IdentityScheme::Symbol);

        for (index, test) in tests.into_iter().enumerate() {
            let actual = validator.validate(test.input).map_err(|error| error.identity);
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_validate_id_scheme() {
        struct TestCase {
            input: serde_json::Value,
            expected: Result<&'static str, Option<&'static str>>,
        }

        let tests = vec![
            TestCase {
                // TC0: numeric symbol is ignored in id scheme
                input: json!({
                    "id": 290,
                    "symbol": 7,
                    "bid_price": 1.0,
                    "ask_price": 2.0,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Ok("btcusdt"),
            },
            TestCase {
                // TC1: string id is rejected, hint carries the bare text
                input: json!({
                    "id": "abc",
                    "bid_price": 1.0,
                    "ask_price": 2.0,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Err(Some("abc")),
            },
            TestCase {
                // TC2: fractional id is rejected
                input: json!({
                    "id": 290.5,
                    "bid_price": 1.0,
                    "ask_price": 2.0,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Err(None),
            },
            TestCase {
                // TC3: unlabelled id falls back to its decimal text
                input: json!({
                    "id": 12,
                    "bid_price": 1.0,
                    "ask_price": 2.0,
                    "timestamp_ns": 1,
                    "consumer_id": "c1"
                }),
                expected: Ok("12"),
            },
        ];

        let symbols: IndexMap<String, i64> = IndexMap::from([("btcusdt".to_string(), 290)]);
        let validator = RecordValidator::new(IdentityScheme::Id).with_labels(&symbols);

        for (index, test) in tests.into_iter().enumerate() {
            let actual = validator.validate(test.input);
            let actual = actual
                .as_ref()
                .map(|record| record.identity.as_str())
                .map_err(|error| error.identity.as_deref());
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }

    #[test]
    fn test_validate_id_scheme_resolves_labels() {
        let symbols: IndexMap<String, i64> =
            IndexMap::from([("BTCUSDT".to_string(), 290), ("ethusdt".to_string(), 476)]);
        let validator = RecordValidator::new(IdentityScheme::Id).with_labels(&symbols);

        let mapped = validator
            .validate(json!({
                "id": 290,
                "bid_price": 65000.12,
                "ask_price": 65000.50,
                "timestamp_ns": 1_700_000_000_000_000_000u64,
                "consumer_id": "c1"
            }))
            .unwrap();
        assert_eq!(mapped, btc_record());

        let unmapped = validator
            .validate(json!({
                "id": 7,
                "bid_price": 1.0,
                "ask_price": 2.0,
                "timestamp_ns": 1,
                "consumer_id": "c2"
            }))
            .unwrap();
        assert_eq!(unmapped.identity, "7");

        let missing_id = validator.validate(json!({
            "symbol": "btcusdt",
            "bid_price": 1.0,
            "ask_price": 2.0,
            "timestamp_ns": 1,
            "consumer_id": "c2"
        }));
        assert_eq!(
            missing_id,
            Err(MalformedRecordError::new(
                Some("btcusdt".to_string()),
                "missing field `id`"
            ))
        );
    }

    #[test]
    fn test_validate_batch_isolates_malformed_records() {
        let validator = RecordValidator::new(IdentityScheme::Symbol);

        let batch = validator.validate_batch(vec![
            json!({"symbol": "btcusdt", "bid_price": 1.0, "ask_price": 2.0, "timestamp_ns": 1, "consumer_id": "c1"}),
            json!({"symbol": "ethusdt", "bid_price": null, "ask_price": 2.0, "timestamp_ns": 1, "consumer_id": "c1"}),
            json!({"symbol": "solusdt", "bid_price": 3.0, "ask_price": 4.0, "timestamp_ns": 2, "consumer_id": "c1"}),
            json!({"symbol": "xrpusdt", "bid_price": 5.0, "ask_price": 6.0, "timestamp_ns": 3, "consumer_id": "c1"}),
        ]);

        let applied = batch
            .records
            .iter()
            .map(|record| record.identity.as_str())
            .collect::<Vec<_>>();
        assert_eq!(applied, vec!["btcusdt", "solusdt", "xrpusdt"]);
        assert_eq!(batch.rejected.len(), 1);
        assert_eq!(batch.rejected[0].identity.as_deref(), Some("ethusdt"));
    }

    #[test]
    fn test_identity_scheme_from_str() {
        assert_eq!("symbol".parse::<IdentityScheme>().unwrap(), IdentityScheme::Symbol);
        assert_eq!(" ID ".parse::<IdentityScheme>().unwrap(), IdentityScheme::Id);
        assert!("isin".parse::<IdentityScheme>().is_err());
    }
}
