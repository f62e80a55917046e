use std::sync::Arc;

use tracing::{error, info, warn};

use crate::classify::{PROXY_DETAIL_FIELDS, classify};
use crate::error::TrackingError;
use crate::models::{LastUsedQuery, TrackingData, TrackingPayload};
use crate::store::LastUsedStore;
use crate::transport::HttpTransport;
use crate::upstream::segment_url;

/// Placeholder value shipped in sample env files
const API_KEY_PLACEHOLDER: &str = "your_api_key_here";

/// Tracks packages through the proxy and remembers the last good query.
pub struct TrackingClient {
    proxy_url: String,
    api_key: Option<String>,
    transport: Arc<dyn HttpTransport>,
    store: Arc<dyn LastUsedStore>,
}

impl TrackingClient {
    pub fn new(
        proxy_url: impl Into<String>,
        transport: Arc<dyn HttpTransport>,
        store: Arc<dyn LastUsedStore>,
    ) -> Self {
        Self {
            proxy_url: proxy_url.into(),
            api_key: None,
            transport,
            store,
        }
    }

    /// Send `key` as `x-api-key` with every request.
    pub fn with_api_key(mut self, key: Option<String>) -> Self {
        self.api_key = key.filter(|k| !k.is_empty() && k != API_KEY_PLACEHOLDER);
        self
    }

    pub fn last_used(&self) -> Option<LastUsedQuery> {
        self.store.load().unwrap_or_else(|e| {
            warn!("Could not read last used query: {e:#}");
            None
        })
    }

    pub async fn track(&self, awb: &str, courier: &str) -> Result<TrackingData, TrackingError> {
        // Trimming only decides blankness; the query is sent and saved as given
        if awb.trim().is_empty() || courier.trim().is_empty() {
            return Err(TrackingError::Validation);
        }

        let result = self.fetch(awb, courier).await;

        match &result {
            Ok(data) => {
                info!(awb, courier, status = %data.status, "Tracked package");
                let query = LastUsedQuery {
                    awb: awb.to_string(),
                    courier: courier.to_string(),
                };
                if let Err(e) = self.store.save(&query) {
                    warn!("Could not save last used query: {e:#}");
                }
            }
            Err(e) => error!(awb, courier, "Tracking error: {e}"),
        }

        result
    }

    async fn fetch(&self, awb: &str, courier: &str) -> Result<TrackingData, TrackingError> {
        let url = segment_url(&self.proxy_url, &["trackings", awb, "couriers", courier])?;

        let headers: Vec<(String, String)> = self
            .api_key
            .iter()
            .map(|key| ("x-api-key".to_string(), key.clone()))
            .collect();

        let response = self.transport.get(&url, &headers).await?;
        let body = classify(&response, PROXY_DETAIL_FIELDS)?;

        Ok(TrackingData::from_payload(awb, courier, TrackingPayload::from_json(body)))
    }
}
