//! Remote file fetching
//!
//! Downloads the content behind a user-supplied URL with a single GET request.
//! Many public data portals reject obvious bots, so requests carry the headers a
//! desktop browser would send, including a `Referer` pointing at the URL's
//! parent directory.

use crate::config::FetchConfig;
use crate::error::{Error, FetchError, Result};
use reqwest::header::{ACCEPT, ACCEPT_LANGUAGE, CONNECTION, CONTENT_TYPE, HeaderMap, HeaderValue, REFERER};
use reqwest::StatusCode;
use url::Url;

/// Accept header sent with every request
const ACCEPT_VALUE: &str = "application/json, text/csv, text/plain, */*";

/// Response of a successful fetch
#[derive(Clone, Debug)]
pub struct FetchedContent {
    /// The URL that was requested
    pub url: String,
    /// Declared `Content-Type` of the response, if any
    pub content_type: Option<String>,
    /// HTTP status of the final response
    pub status: u16,
    /// Complete response body (decompressed)
    pub body: Vec<u8>,
}

/// HTTP client for downloading remote data files
///
/// The underlying connection pool is shared by every request.
#[derive(Clone, Debug)]
pub struct RemoteFetcher {
    client: reqwest::Client,
    max_body_bytes: u64,
}

impl RemoteFetcher {
    /// Build the client from the fetch settings
    ///
    /// # Errors
    /// Returns [`Error::Config`] if a header value is invalid or the client cannot be built
    pub fn new(config: &FetchConfig) -> Result<Self> {
        let mut headers = HeaderMap::new();
        headers.insert(ACCEPT, HeaderValue::from_static(ACCEPT_VALUE));
        headers.insert(
            ACCEPT_LANGUAGE,
            HeaderValue::from_str(&config.accept_language).map_err(|e| Error::Config {
                message: format!("invalid Accept-Language value: {}", e),
                key: Some("fetch.accept_language".to_string()),
            })?,
        );
        headers.insert(CONNECTION, HeaderValue::from_static("keep-alive"));

        let client = reqwest::Client::builder()
            .timeout(config.timeout)
            .redirect(reqwest::redirect::Policy::limited(config.max_redirects))
            .user_agent(config.user_agent.as_str())
            .default_headers(headers)
            .build()
            .map_err(|e| Error::Config {
                message: format!("failed to create HTTP client: {}", e),
                key: Some("fetch".to_string()),
            })?;

        Ok(Self {
            client,
            max_body_bytes: config.max_body_bytes,
        })
    }

    /// Download `url`
    ///
    /// # Errors
    /// - [`Error::InvalidInput`] if `url` is not an absolute http(s) URL
    /// - [`Error::Fetch`] for non-success statuses, network failures and oversized bodies
    /// - [`Error::EmptyContent`] if the body is empty
    pub async fn fetch(&self, url: &str) -> Result<FetchedContent> {
        let parsed = parse_url(url)?;
        tracing::info!(url, "downloading file from URL");

        let mut request = self.client.get(parsed.clone());
        if let Some(referer) = referer_for(&parsed)
            && let Ok(value) = HeaderValue::from_str(referer.as_str())
        {
            request = request.header(REFERER, value);
        }

        let mut response = request.send().await.map_err(|e| network_error(url, &e))?;

        let status = response.status();
        if !status.is_success() {
            tracing::warn!(url, status = status.as_u16(), "remote server returned an error");
            return Err(status_error(url, status).into());
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .map(str::to_string);

        if let Some(length) = response.content_length()
            && length > self.max_body_bytes
        {
            return Err(self.too_large(url));
        }

        let mut body = Vec::new();
        while let Some(chunk) = response.chunk().await.map_err(|e| network_error(url, &e))? {
            if (body.len() + chunk.len()) as u64 > self.max_body_bytes {
                return Err(self.too_large(url));
            }
            body.extend_from_slice(&chunk);
        }

        if body.is_empty() {
            return Err(Error::EmptyContent(format!("no content received from {}", url)));
        }

        tracing::info!(
            url,
            status = status.as_u16(),
            content_type = ?content_type,
            bytes = body.len(),
            "file downloaded"
        );

        Ok(FetchedContent {
            url: url.to_string(),
            content_type,
            status: status.as_u16(),
            body,
        })
    }

    fn too_large(&self, url: &str) -> Error {
        tracing::warn!(url, limit = self.max_body_bytes, "remote file exceeds size limit");
        FetchError::TooLarge {
            url: url.to_string(),
            limit: self.max_body_bytes,
        }
        .into()
    }
}

/// Parse and check that `url` is an absolute http(s) URL
pub fn parse_url(url: &str) -> Result<Url> {
    let parsed = Url::parse(url.trim())
        .map_err(|e| Error::InvalidInput(format!("invalid URL '{}': {}", url, e)))?;

    match parsed.scheme() {
        "http" | "https" => Ok(parsed),
        scheme => Err(Error::InvalidInput(format!(
            "unsupported URL scheme '{}', only http and https are allowed",
            scheme
        ))),
    }
}

/// The URL's parent directory, used as the `Referer`
///
/// `https://host/a/b/data.csv?x=1` becomes `https://host/a/b/`.
pub fn referer_for(url: &Url) -> Option<Url> {
    url.join("./").ok()
}

fn status_error(url: &str, status: StatusCode) -> FetchError {
    let url = url.to_string();
    match status {
        StatusCode::FORBIDDEN => FetchError::AccessDenied { url },
        StatusCode::NOT_FOUND => FetchError::NotFound { url },
        other => FetchError::Status {
            url,
            status: other.as_u16(),
        },
    }
}

fn network_error(url: &str, e: &reqwest::Error) -> Error {
    let reason = if e.is_timeout() {
        "request timed out".to_string()
    } else if e.is_connect() {
        format!("connection failed: {}", e)
    } else if e.is_redirect() {
        format!("too many redirects: {}", e)
    } else {
        e.to_string()
    };
    tracing::warn!(url, reason = %reason, "request failed");
    FetchError::Network {
        url: url.to_string(),
        reason,
    }
    .into()
}

#[allow(clippy::unwrap_used, clippy::expect_used)]
#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;
    use wiremock::matchers::{header, header_exists, method, path};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    fn fetcher() -> RemoteFetcher {
        RemoteFetcher::new(&FetchConfig::default()).unwrap()
    }

    #[test]
    fn test_referer_for() {
        let url = Url::parse("https://data.go.id/dataset/x/penduduk.csv?page=2").unwrap();
        assert_eq!(
            referer_for(&url).unwrap().as_str(),
            "https://data.go.id/dataset/x/"
        );

        let url = Url::parse("https://data.go.id").unwrap();
        assert_eq!(referer_for(&url).unwrap().as_str(), "https://data.go.id/");
    }

    #[test]
    fn test_parse_url_rejects_other_schemes() {
        assert!(parse_url("https://x.com/a.csv").is_ok());
        assert!(matches!(parse_url("ftp://x.com/a.csv"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_url("file:///etc/passwd"), Err(Error::InvalidInput(_))));
        assert!(matches!(parse_url("not a url"), Err(Error::InvalidInput(_))));
    }

    #[tokio::test]
    async fn test_fetch_success_sends_browser_headers() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/files/data.csv"))
            .and(header_exists("user-agent"))
            .and(header_exists("accept"))
            .and(header_exists("accept-language"))
            .and(header("referer", format!("{}/files/", server.uri()).as_str()))
            .respond_with(
                ResponseTemplate::new(200).set_body_raw("a,b\n1,2\n", "text/csv"),
            )
            .expect(1)
            .mount(&server)
            .await;

        let url = format!("{}/files/data.csv", server.uri());
        let content = fetcher().fetch(&url).await.unwrap();

        assert_eq!(content.status, 200);
        assert_eq!(content.content_type.as_deref(), Some("text/csv"));
        assert_eq!(content.body, b"a,b\n1,2\n");
        assert_eq!(content.url, url);
    }

    #[tokio::test]
    async fn test_fetch_maps_forbidden_and_not_found() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/blocked.json"))
            .respond_with(ResponseTemplate::new(403))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/gone.json"))
            .respond_with(ResponseTemplate::new(404))
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/broken.json"))
            .respond_with(ResponseTemplate::new(502))
            .mount(&server)
            .await;

        let fetcher = fetcher();

        let err = fetcher.fetch(&format!("{}/blocked.json", server.uri())).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::AccessDenied { .. })));

        let err = fetcher.fetch(&format!("{}/gone.json", server.uri())).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::NotFound { .. })));

        let err = fetcher.fetch(&format!("{}/broken.json", server.uri())).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Status { status: 502, .. })));
    }

    #[tokio::test]
    async fn test_fetch_empty_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200))
            .mount(&server)
            .await;

        let err = fetcher().fetch(&format!("{}/empty.csv", server.uri())).await.unwrap_err();
        assert!(matches!(err, Error::EmptyContent(_)));
    }

    #[tokio::test]
    async fn test_fetch_rejects_oversized_body() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(ResponseTemplate::new(200).set_body_bytes(vec![b'a'; 4096]))
            .mount(&server)
            .await;

        let config = FetchConfig {
            max_body_bytes: 1024,
            ..FetchConfig::default()
        };
        let fetcher = RemoteFetcher::new(&config).unwrap();

        let err = fetcher.fetch(&format!("{}/big.csv", server.uri())).await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::TooLarge { limit: 1024, .. })));
    }

    #[tokio::test]
    async fn test_fetch_timeout_is_network_error() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .respond_with(
                ResponseTemplate::new(200)
                    .set_body_string("a,b")
                    .set_delay(Duration::from_secs(5)),
            )
            .mount(&server)
            .await;

        let config = FetchConfig {
            timeout: Duration::from_millis(200),
            ..FetchConfig::default()
        };
        let fetcher = RemoteFetcher::new(&config).unwrap();

        let err = fetcher.fetch(&format!("{}/slow.csv", server.uri())).await.unwrap_err();
        match err {
            Error::Fetch(e) => {
                assert!(matches!(e, FetchError::Network { .. }));
                assert_eq!(e.status(), None);
            }
            other => panic!("unexpected error: {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_fetch_connection_refused() {
        let err = fetcher().fetch("http://127.0.0.1:1/data.csv").await.unwrap_err();
        assert!(matches!(err, Error::Fetch(FetchError::Network { .. })));
    }
}
