use std::sync::Arc;

use reqwest::Url;
use serde_json::Value;
use tracing::debug;

use crate::classify::{UPSTREAM_DETAIL_FIELDS, classify};
use crate::error::TrackingError;
use crate::transport::HttpTransport;

pub const BROWSER_USER_AGENT: &str = concat!(
    "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 ",
    "(KHTML, like Gecko) Chrome/120.0.0.0 Safari/537.36",
);

/// Calls the KlikResi tracking API
pub struct UpstreamClient {
    base_url: String,
    transport: Arc<dyn HttpTransport>,
}

impl UpstreamClient {
    pub fn new(base_url: impl Into<String>, transport: Arc<dyn HttpTransport>) -> Self {
        Self {
            base_url: base_url.into(),
            transport,
        }
    }

    /// `{base}/api/trackings/{awb}/couriers/{courier}` with each segment encoded
    pub fn tracking_url(&self, awb: &str, courier: &str) -> Result<String, TrackingError> {
        segment_url(&self.base_url, &["api", "trackings", awb, "couriers", courier])
    }

    /// The API key plus headers that make the request look like the
    /// upstream site's own frontend.
    pub fn request_headers(&self, api_key: &str) -> Vec<(String, String)> {
        let site = self.base_url.trim_end_matches('/');
        [
            ("x-api-key", api_key.to_string()),
            ("User-Agent", BROWSER_USER_AGENT.to_string()),
            ("Accept", "application/json, text/plain, */*".to_string()),
            ("Accept-Language", "en-US,en;q=0.9".to_string()),
            ("Referer", format!("{site}/")),
            ("Origin", site.to_string()),
            ("Sec-Fetch-Dest", "empty".to_string()),
            ("Sec-Fetch-Mode", "cors".to_string()),
            ("Sec-Fetch-Site", "same-origin".to_string()),
        ]
        .into_iter()
        .map(|(name, value)| (name.to_string(), value))
        .collect()
    }

    pub async fn fetch_tracking(
        &self,
        api_key: &str,
        awb: &str,
        courier: &str,
    ) -> Result<Value, TrackingError> {
        let url = self.tracking_url(awb, courier)?;
        debug!(%url, "Querying upstream tracking API");

        let response = self
            .transport
            .get(&url, &self.request_headers(api_key))
            .await?;

        debug!(status = response.status, "Upstream responded");

        classify(&response, UPSTREAM_DETAIL_FIELDS)
    }
}

/// Append `segments` to `base`, percent-encoding each one on its own.
pub(crate) fn segment_url(base: &str, segments: &[&str]) -> Result<String, TrackingError> {
    let mut url = Url::parse(base)
        .map_err(|e| TrackingError::Transport(format!("Invalid base URL {base}: {e}")))?;

    url.path_segments_mut()
        .map_err(|_| TrackingError::Transport(format!("Base URL cannot carry a path: {base}")))?
        .pop_if_empty()
        .extend(segments);

    Ok(url.into())
}
