use anyhow::{Context, Result, bail};
use std::env;
use std::path::PathBuf;

pub const DEFAULT_UPSTREAM_URL: &str = "https://klikresi.com";
pub const DEFAULT_PROXY_URL: &str = "http://127.0.0.1:3000";

/// Application configuration loaded from environment variables
#[derive(Debug, Clone)]
pub struct Config {
    pub klikresi_api_key: Option<String>,
    pub klikresi_url: String,
    pub bind_address: String,
    pub port: u16,
    pub proxy_url: String,
    pub last_used_path: Option<PathBuf>,
}

impl Config {
    /// Load configuration from environment variables
    ///
    /// # Environment Variables
    /// - `KLIKRESI_API_KEY`: Optional at startup - checked on every proxied request
    /// - `KLIKRESI_URL`: Optional - Upstream base URL (default: "https://klikresi.com")
    /// - `BIND_ADDRESS`: Optional - Proxy listen address (default: "0.0.0.0")
    /// - `PORT`: Optional - Proxy listen port (default: 3000)
    /// - `TRACKING_PROXY_URL`: Optional - Proxy base URL used by `track`
    ///   (default: "http://127.0.0.1:3000")
    /// - `LAST_USED_PATH`: Optional - Where the last successful query is stored
    pub fn from_env() -> Result<Self> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Same as [`Config::from_env`], reading values through `lookup`.
    pub fn from_lookup<F>(lookup: F) -> Result<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        // Blank key is treated as missing; the proxy reports it per request
        let klikresi_api_key = lookup("KLIKRESI_API_KEY")
            .map(|key| key.trim().to_string())
            .filter(|key| !key.is_empty());

        let klikresi_url = lookup("KLIKRESI_URL")
            .unwrap_or_else(|| DEFAULT_UPSTREAM_URL.to_string());

        if klikresi_url.trim().is_empty() {
            bail!("KLIKRESI_URL cannot be empty");
        }

        let bind_address = lookup("BIND_ADDRESS")
            .unwrap_or_else(|| "0.0.0.0".to_string());

        if bind_address.trim().is_empty() {
            bail!("BIND_ADDRESS cannot be empty");
        }

        let port = match lookup("PORT") {
            Some(raw) => raw
                .trim()
                .parse::<u16>()
                .with_context(|| format!("PORT is not a valid port number: {raw}"))?,
            None => 3000,
        };

        let proxy_url = lookup("TRACKING_PROXY_URL")
            .unwrap_or_else(|| DEFAULT_PROXY_URL.to_string());

        if proxy_url.trim().is_empty() {
            bail!("TRACKING_PROXY_URL cannot be empty");
        }

        let last_used_path = lookup("LAST_USED_PATH")
            .filter(|path| !path.trim().is_empty())
            .map(PathBuf::from);

        Ok(Config {
            klikresi_api_key,
            klikresi_url: klikresi_url.trim_end_matches('/').to_string(),
            bind_address,
            port,
            proxy_url: proxy_url.trim_end_matches('/').to_string(),
            last_used_path,
        })
    }

    pub fn listen_address(&self) -> String {
        format!("{}:{}", self.bind_address, self.port)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn config_from(pairs: &[(&str, &str)]) -> Result<Config> {
        let vars: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        Config::from_lookup(|key| vars.get(key).cloned())
    }

    #[test]
    fn defaults_apply_when_nothing_is_set() {
        let config = config_from(&[]).unwrap();
        assert!(config.klikresi_api_key.is_none());
        assert_eq!(config.klikresi_url, DEFAULT_UPSTREAM_URL);
        assert_eq!(config.listen_address(), "0.0.0.0:3000");
        assert_eq!(config.proxy_url, DEFAULT_PROXY_URL);
        assert!(config.last_used_path.is_none());
    }

    #[test]
    fn blank_api_key_counts_as_missing() {
        let config = config_from(&[("KLIKRESI_API_KEY", "   ")]).unwrap();
        assert!(config.klikresi_api_key.is_none());
    }

    #[test]
    fn trailing_slashes_are_stripped() {
        let config = config_from(&[
            ("KLIKRESI_URL", "http://localhost:9000/"),
            ("TRACKING_PROXY_URL", "http://proxy.local/api/"),
        ])
        .unwrap();
        assert_eq!(config.klikresi_url, "http://localhost:9000");
        assert_eq!(config.proxy_url, "http://proxy.local/api");
    }

    #[test]
    fn invalid_port_is_rejected() {
        let err = config_from(&[("PORT", "eighty")]).unwrap_err();
        assert!(err.to_string().contains("PORT"));
    }

    #[test]
    fn empty_upstream_url_is_rejected() {
        assert!(config_from(&[("KLIKRESI_URL", "")]).is_err());
    }
}
