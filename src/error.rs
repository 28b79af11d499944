use thiserror::Error;

/// Failure of a single GET against one of the catalog endpoints.
#[derive(Debug, Error)]
pub enum FetchError {
    #[error("HTTP error: {0}")]
    HttpError(u16),
    #[error("Invalid content type: {0}")]
    InvalidContentType(String),
    #[error("Response too large: {0} bytes")]
    TooLarge(u64),
    #[error("Request timed out")]
    Timeout,
    #[error("Request error: {0}")]
    RequestError(reqwest::Error),
}

impl From<reqwest::Error> for FetchError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            FetchError::Timeout
        } else {
            FetchError::RequestError(err)
        }
    }
}

#[derive(Debug, Error)]
pub enum CrawlError {
    #[error("invalid configuration: {0}")]
    Configuration(String),
    #[error("could not fetch {url}: {source}")]
    Network {
        url: String,
        #[source]
        source: FetchError,
    },
    #[error("could not decode response from {url}: {source}")]
    Decode {
        url: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("invalid endpoint url {url}: {source}")]
    Url {
        url: String,
        #[source]
        source: url::ParseError,
    },
}

impl CrawlError {
    pub fn network(url: &str, source: FetchError) -> Self {
        CrawlError::Network {
            url: url.to_string(),
            source,
        }
    }

    pub fn decode(url: &str, source: serde_json::Error) -> Self {
        CrawlError::Decode {
            url: url.to_string(),
            source,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn network_error_names_the_url() {
        let err = CrawlError::network("https://example.com/search", FetchError::HttpError(503));
        assert_eq!(
            err.to_string(),
            "could not fetch https://example.com/search: HTTP error: 503"
        );
    }

    #[test]
    fn decode_error_keeps_its_source() {
        let source = serde_json::from_str::<u32>("{").unwrap_err();
        let err = CrawlError::decode("https://example.com/p", source);
        assert!(std::error::Error::source(&err).is_some());
    }
}
