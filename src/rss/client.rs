//! HTTP client creation and request handling for feeds and article pages.

use reqwest::{cookie::Jar, header};
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

use super::types::{FeedError, USER_AGENT};
use crate::TARGET_WEB_REQUEST;

/// Builds a cookie-aware, gzip-capable client with a browser user agent.
pub fn create_http_client(request_timeout: Duration) -> Result<reqwest::Client, reqwest::Error> {
    let cookie_store = Jar::default();
    reqwest::Client::builder()
        .cookie_store(true)
        .cookie_provider(Arc::new(cookie_store))
        .gzip(true)
        .user_agent(USER_AGENT)
        .timeout(request_timeout)
        .redirect(reqwest::redirect::Policy::default())
        .build()
}

/// GETs `url` and returns the body, mapping transport failures and non-2xx statuses.
pub async fn fetch_text(
    client: &reqwest::Client,
    url: &str,
    accept: &str,
) -> Result<String, FeedError> {
    debug!(target: TARGET_WEB_REQUEST, "GET {}", url);

    let response = client
        .get(url)
        .header(header::ACCEPT, accept)
        .send()
        .await
        .map_err(|e| map_reqwest_error(url, e))?;

    let status = response.status();
    if !status.is_success() {
        return Err(FeedError::Status {
            url: url.to_string(),
            status,
        });
    }

    response
        .text()
        .await
        .map_err(|e| map_reqwest_error(url, e))
}

fn map_reqwest_error(url: &str, err: reqwest::Error) -> FeedError {
    if err.is_timeout() {
        FeedError::Timeout {
            url: url.to_string(),
        }
    } else {
        FeedError::Http {
            url: url.to_string(),
            source: err,
        }
    }
}
