use std::borrow::Cow;
use std::time::Duration;

use encoding_rs::Encoding;
use futures::StreamExt;
use reqwest::header::{HeaderMap, CONTENT_TYPE};
use thiserror::Error;

/// Client signature sent with every feed request.
pub const USER_AGENT: &str = "newsfeed-rss-client/1.0 (+https://example.invalid)";

const MAX_FEED_SIZE: usize = 10 * 1024 * 1024; // 10MB

/// Errors that can occur while retrieving a feed.
///
/// Every variant is a transport failure from the aggregator's point of
/// view: the feed contributes nothing this cycle and a warning is recorded.
#[derive(Debug, Error)]
pub enum FetchError {
    /// Network-level error (DNS, connection, TLS, etc.)
    #[error("Request failed: {0}")]
    Network(#[from] reqwest::Error),
    /// HTTP response with non-2xx status code
    #[error("HTTP error: status {0}")]
    HttpStatus(u16),
    /// Request exceeded the configured timeout
    #[error("Request timed out")]
    Timeout,
    /// Response body exceeded the 10MB size limit
    #[error("Response too large")]
    ResponseTooLarge,
}

impl FetchError {
    fn from_transport(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::Network(err)
        }
    }
}

/// Retrieves feed documents over HTTP(S).
///
/// One request per call: no retries and no backoff. The timeout covers the
/// whole exchange, from connect to the last body byte.
#[derive(Debug, Clone)]
pub struct FeedFetcher {
    client: reqwest::Client,
}

impl FeedFetcher {
    /// Builds a fetcher with the given per-request timeout.
    ///
    /// `verify_tls = false` accepts any server certificate. It is an explicit
    /// opt-in for feeds behind broken TLS and is never the default.
    ///
    /// # Errors
    ///
    /// Returns [`FetchError::Network`] if the TLS backend cannot be initialised.
    pub fn new(timeout: Duration, verify_tls: bool) -> Result<Self, FetchError> {
        let mut builder = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .timeout(timeout);

        if !verify_tls {
            tracing::warn!("TLS certificate verification disabled for feed requests");
            builder = builder.danger_accept_invalid_certs(true);
        }

        Ok(Self {
            client: builder.build()?,
        })
    }

    /// Fetches `url` and decodes the body to text.
    ///
    /// The body is decoded with the charset from the `Content-Type` header.
    /// Unknown charsets and undecodable bytes fall back to lossy UTF-8.
    ///
    /// # Errors
    ///
    /// - [`FetchError::Network`] - Connection, DNS or TLS errors
    /// - [`FetchError::Timeout`] - Request exceeded the timeout
    /// - [`FetchError::HttpStatus`] - Non-2xx HTTP response
    /// - [`FetchError::ResponseTooLarge`] - Body exceeded 10MB
    pub async fn fetch(&self, url: &str) -> Result<String, FetchError> {
        let response = self
            .client
            .get(url)
            .send()
            .await
            .map_err(FetchError::from_transport)?;

        if !response.status().is_success() {
            return Err(FetchError::HttpStatus(response.status().as_u16()));
        }

        let charset = charset_from_headers(response.headers());
        let bytes = read_limited_bytes(response, MAX_FEED_SIZE).await?;

        tracing::debug!(
            url = %url,
            bytes = bytes.len(),
            charset = charset.as_deref().unwrap_or("-"),
            "Fetched feed"
        );

        Ok(decode_body(&bytes, charset.as_deref()).into_owned())
    }
}

async fn read_limited_bytes(
    response: reqwest::Response,
    limit: usize,
) -> Result<Vec<u8>, FetchError> {
    // Fast path: check Content-Length header
    if let Some(len) = response.content_length() {
        if len > limit as u64 {
            return Err(FetchError::ResponseTooLarge);
        }
    }

    let mut bytes = Vec::new();
    let mut stream = response.bytes_stream();

    while let Some(chunk) = stream.next().await {
        let chunk = chunk.map_err(FetchError::from_transport)?;
        if bytes.len().saturating_add(chunk.len()) > limit {
            return Err(FetchError::ResponseTooLarge);
        }
        bytes.extend_from_slice(&chunk);
    }

    Ok(bytes)
}

/// Extracts the `charset` parameter from a `Content-Type` header.
fn charset_from_headers(headers: &HeaderMap) -> Option<String> {
    let content_type = headers.get(CONTENT_TYPE)?.to_str().ok()?;

    content_type.split(';').skip(1).find_map(|param| {
        let (name, value) = param.split_once('=')?;
        if !name.trim().eq_ignore_ascii_case("charset") {
            return None;
        }
        let value = value.trim().trim_matches('"').trim();
        (!value.is_empty()).then(|| value.to_string())
    })
}

/// Decodes a response body using a charset label.
///
/// No label means UTF-8. An unknown label, or bytes that are invalid in the
/// declared encoding, fall back to UTF-8 with U+FFFD substitution.
pub fn decode_body<'a>(bytes: &'a [u8], charset: Option<&str>) -> Cow<'a, str> {
    let decoded = charset
        .and_then(|label| Encoding::for_label(label.as_bytes()))
        .and_then(|encoding| encoding.decode_without_bom_handling_and_without_replacement(bytes));

    match decoded {
        Some(text) => text,
        None => {
            if let Some(label) = charset {
                tracing::debug!(charset = %label, "Falling back to lossy UTF-8 decoding");
            }
            String::from_utf8_lossy(bytes)
        }
    }
}
