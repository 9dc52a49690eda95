//! Where status batches come from.

use super::PollerConfig;
use crate::error::{ConfigError, DecodeError, FetchError};
use async_trait::async_trait;
use url::Url;

/// Path of the latest-status endpoint, relative to the configured base URL.
pub const LATEST_STATUS_PATH: &str = "status/latest";

/// A single-shot producer of raw status records.
///
/// Implementations return the undecoded per-record JSON values; validation happens in the
/// [`RecordValidator`](crate::record::RecordValidator) so one malformed record cannot fail the
/// whole batch.
#[async_trait]
pub trait StatusSource: Send + Sync {
    async fn fetch_once(&self) -> Result<Vec<serde_json::Value>, FetchError>;
}

/// [`StatusSource`] backed by `GET <base_url>/status/latest`.
#[derive(Debug, Clone)]
pub struct HttpStatusSource {
    client: reqwest::Client,
    url: Url,
}

impl HttpStatusSource {
    pub fn from_config(config: &PollerConfig) -> Result<Self, ConfigError> {
        let url = latest_status_url(&config.base_url)?;

        let client = reqwest::Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|error| ConfigError::HttpClient(error.to_string()))?;

        Ok(Self { client, url })
    }

    pub fn url(&self) -> &Url {
        &self.url
    }
}

#[async_trait]
impl StatusSource for HttpStatusSource {
    async fn fetch_once(&self) -> Result<Vec<serde_json::Value>, FetchError> {
        let response = self.client.get(self.url.clone()).send().await?;

        let status = response.status();
        if !status.is_success() {
            return Err(FetchError::Http(status.as_u16()));
        }

        let body = response.bytes().await?;
        decode_batch(&body)
    }
}

/// Resolve the latest-status endpoint from a base URL, keeping any base path prefix.
pub fn latest_status_url(base_url: &str) -> Result<Url, ConfigError> {
    let invalid = |reason: String| ConfigError::InvalidUrl {
        url: base_url.to_string(),
        reason,
    };

    let mut base = Url::parse(base_url.trim()).map_err(|error| invalid(error.to_string()))?;
    if !matches!(base.scheme(), "http" | "https") {
        return Err(invalid(format!("unsupported scheme {}", base.scheme())));
    }
    if !base.path().ends_with('/') {
        let path = format!("{}/", base.path());
        base.set_path(&path);
    }

    base.join(LATEST_STATUS_PATH)
        .map_err(|error| invalid(error.to_string()))
}

/// Decode a response body into the raw records of one batch.
pub fn decode_batch(body: &[u8]) -> Result<Vec<serde_json::Value>, FetchError> {
    let value = serde_json::from_slice::<serde_json::Value>(body)
        .map_err(|error| DecodeError::InvalidJson(error.to_string()))?;

    match value {
        serde_json::Value::Array(records) => Ok(records),
        _ => Err(FetchError::Decode(DecodeError::NotAnArray)),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_latest_status_url() {
        struct TestCase {
            input: &'static str,
            expected: Option<&'static str>,
        }

        let tests = vec![
            TestCase {
                // TC0: bare host
                input: "http://localhost:8000",
                expected: Some("http://localhost:8000/status/latest"),
            },
            TestCase {
                // TC1: trailing slash
                input: "http://localhost:8000/",
                expected: Some("http://localhost:8000/status/latest"),
            },
            TestCase {
                // TC2: base path prefix is kept
                input: "https://example.com/api",
                expected: Some("https://example.com/api/status/latest"),
            },
            TestCase {
                // TC3: not a URL
                input: "localhost",
                expected: None,
            },
            TestCase {
                // TC4: unsupported scheme
                input: "ws://127.0.0.1:9001",
                expected: None,
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = latest_status_url(test.input).ok().map(String::from);
            assert_eq!(
                actual.as_deref(),
                test.expected,
                "TC{} failed",
                index
            );
        }
    }

    #[test]
    fn test_decode_batch() {
        struct TestCase {
            input: &'static str,
            expected: Result<usize, Option<DecodeError>>,
        }

        let tests = vec![
            TestCase {
                // TC0: array of records
                input: r#"[{"symbol":"btcusdt"},{"symbol":"ethusdt"}]"#,
                expected: Ok(2),
            },
            TestCase {
                // TC1: empty array
                input: "[]",
                expected: Ok(0),
            },
            TestCase {
                // TC2: object is explicitly not an array
                input: r#"{"symbol":"btcusdt"}"#,
                expected: Err(Some(DecodeError::NotAnArray)),
            },
            TestCase {
                // TC3: null is not an array
                input: "null",
                expected: Err(Some(DecodeError::NotAnArray)),
            },
            TestCase {
                // TC4: invalid JSON
                input: "<html>502 Bad Gateway</html>",
                expected: Err(None),
            },
        ];

        for (index, test) in tests.into_iter().enumerate() {
            let actual = decode_batch(test.input.as_bytes())
                .map(|records| records.len())
                .map_err(|error| match error {
                    FetchError::Decode(DecodeError::NotAnArray) => Some(DecodeError::NotAnArray),
                    FetchError::Decode(DecodeError::InvalidJson(_)) => None,
                    other => panic!("TC{index} unexpected error: {other}"),
                });
            assert_eq!(actual, test.expected, "TC{} failed", index);
        }
    }
}
