//! Webshare proxy list client

use std::time::Duration;

use async_trait::async_trait;
use reqwest::{header, Client, StatusCode};
use serde::Deserialize;
use serde_json::Value;
use tracing::{debug, info, instrument};
use url::Url;

use super::ProxyProvider;
use crate::config::ProviderConfig;
use crate::error::{PoolError, Result};
use crate::models::ProvisionedProxy;

const PROXY_LIST_PATH: &str = "api/proxy/list/";

#[derive(Debug, Deserialize)]
struct ProxyListResponse {
    results: Option<Vec<Value>>,
}

#[derive(Debug, Deserialize)]
struct ProxyListEntry {
    username: String,
    password: String,
    proxy_address: String,
    ports: ProxyPorts,
}

#[derive(Debug, Deserialize)]
struct ProxyPorts {
    http: u16,
}

impl From<ProxyListEntry> for ProvisionedProxy {
    fn from(entry: ProxyListEntry) -> Self {
        Self {
            username: entry.username,
            password: entry.password,
            address: entry.proxy_address,
            port: entry.ports.http,
            valid: true,
        }
    }
}

/// Fetches the first page of the account's proxy list
#[derive(Clone)]
pub struct WebshareProvider {
    client: Client,
    list_url: Url,
    api_key: Option<String>,
}

impl WebshareProvider {
    pub fn new(config: &ProviderConfig, timeout: Duration) -> Result<Self> {
        let client = Client::builder()
            .connect_timeout(Duration::from_secs(10))
            .timeout(timeout)
            .user_agent(concat!("proxypool/", env!("CARGO_PKG_VERSION")))
            .build()
            .map_err(|e| PoolError::Internal(format!("Failed to build HTTP client: {}", e)))?;

        let mut list_url = config.base_url.join(PROXY_LIST_PATH)?;
        list_url.set_query(Some("page=1"));

        Ok(Self {
            client,
            list_url,
            api_key: config.api_key.clone(),
        })
    }

    pub fn list_url(&self) -> &Url {
        &self.list_url
    }
}

#[async_trait]
impl ProxyProvider for WebshareProvider {
    #[instrument(skip(self))]
    async fn fetch(&self) -> Result<Vec<ProvisionedProxy>> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            PoolError::ProvisioningFailure("provider API key is not configured".to_string())
        })?;

        let response = self
            .client
            .get(self.list_url.clone())
            .header(header::AUTHORIZATION, api_key)
            .send()
            .await?;

        let status = response.status();
        if status != StatusCode::OK {
            return Err(PoolError::ProvisioningFailure(format!(
                "provider responded with status {}",
                status
            )));
        }

        let content_type = response
            .headers()
            .get(header::CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or_default()
            .to_string();
        if !content_type.contains("json") {
            return Err(PoolError::ProvisioningFailure(format!(
                "provider returned non-JSON content type '{}'",
                content_type
            )));
        }

        let body = response.text().await?;
        let proxies = parse_proxy_list(&body)?;

        info!(count = proxies.len(), "Fetched proxy list from provider");
        Ok(proxies)
    }

    fn name(&self) -> &'static str {
        "webshare"
    }
}

/// Decode the valid entries of a proxy list payload.
///
/// A missing `results` field, or a valid entry without credentials, address
/// or http port, is a failure. Invalid entries are skipped unread.
pub fn parse_proxy_list(body: &str) -> Result<Vec<ProvisionedProxy>> {
    let response: ProxyListResponse = serde_json::from_str(body).map_err(|e| {
        PoolError::ProvisioningFailure(format!("malformed provider response: {}", e))
    })?;

    let results = response.results.ok_or_else(|| {
        PoolError::ProvisioningFailure("provider response has no results field".to_string())
    })?;

    let offered = results.len();
    let proxies = results
        .into_iter()
        .filter(|entry| entry.get("valid").and_then(Value::as_bool).unwrap_or(false))
        .map(|entry| {
            serde_json::from_value::<ProxyListEntry>(entry)
                .map(ProvisionedProxy::from)
                .map_err(|e| {
                    PoolError::ProvisioningFailure(format!("malformed provider entry: {}", e))
                })
        })
        .collect::<Result<Vec<_>>>()?;

    debug!(offered, valid = proxies.len(), "Decoded provider results");
    Ok(proxies)
}

#[cfg(test)]
mod tests {
    use super::*;

    const SAMPLE: &str = r#"{
        "count": 2,
        "next": null,
        "results": [
            {
                "username": "alice",
                "password": "s3cret",
                "proxy_address": "10.0.0.1",
                "ports": {"http": 8080, "socks5": 1080},
                "valid": true,
                "country_code": "US"
            },
            {
                "username": "bob",
                "password": "hunter2",
                "proxy_address": "10.0.0.2",
                "ports": {"http": 3128},
                "valid": false
            }
        ]
    }"#;

    #[test]
    fn test_parse_proxy_list() {
        let proxies = parse_proxy_list(SAMPLE).unwrap();
        assert_eq!(proxies.len(), 1);

        assert_eq!(proxies[0].identity(), "alice:s3cret@10.0.0.1:8080");
        assert!(proxies[0].valid);
    }

    #[test]
    fn test_parse_proxy_list_skips_malformed_invalid_entries() {
        let body = r#"{"results": [
            {"valid": false},
            {"valid": false, "username": 42, "ports": "none"},
            {"username": "carol", "password": "pw", "proxy_address": "10.0.0.3", "ports": {"http": 80}, "valid": true}
        ]}"#;

        let proxies = parse_proxy_list(body).unwrap();
        assert_eq!(proxies.len(), 1);
        assert_eq!(proxies[0].identity(), "carol:pw@10.0.0.3:80");
    }

    #[test]
    fn test_parse_proxy_list_rejects_incomplete_valid_entry() {
        let body = r#"{"results": [{"valid": true, "username": "u", "password": "p", "ports": {"http": 80}}]}"#;
        assert!(matches!(
            parse_proxy_list(body),
            Err(PoolError::ProvisioningFailure(_))
        ));
    }

    #[test]
    fn test_parse_proxy_list_missing_results() {
        let err = parse_proxy_list(r#"{"detail": "Invalid token."}"#).unwrap_err();
        assert!(matches!(err, PoolError::ProvisioningFailure(_)));
    }

    #[test]
    fn test_parse_proxy_list_malformed() {
        assert!(matches!(
            parse_proxy_list("<html>"),
            Err(PoolError::ProvisioningFailure(_))
        ));
    }

    #[test]
    fn test_list_url() {
        let config = ProviderConfig {
            api_key: Some("key".to_string()),
            base_url: Url::parse("https://proxy.webshare.io/").unwrap(),
        };
        let provider = WebshareProvider::new(&config, Duration::from_secs(5)).unwrap();
        assert_eq!(
            provider.list_url().as_str(),
            "https://proxy.webshare.io/api/proxy/list/?page=1"
        );
    }

    #[tokio::test]
    async fn test_fetch_without_api_key() {
        let config = ProviderConfig {
            api_key: None,
            base_url: Url::parse("http://127.0.0.1:9/").unwrap(),
        };
        let provider = WebshareProvider::new(&config, Duration::from_secs(1)).unwrap();

        let err = provider.fetch().await.unwrap_err();
        assert!(matches!(err, PoolError::ProvisioningFailure(_)));
    }
}
