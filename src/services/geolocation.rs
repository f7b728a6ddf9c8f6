//! ipgeolocation.io client.

use std::time::Duration;

use crate::config::ProviderConfig;
use crate::errors::AppError;
use crate::models::LocationData;
use crate::services::cache::ResponseCache;
use crate::services::parser::parse_location;
use crate::services::provider_get;

const PROVIDER: &str = "ipgeolocation";

/// Resolves IP addresses to locations. Results are cached per IP.
#[derive(Debug, Clone)]
pub struct GeolocationClient {
    client: reqwest::Client,
    api_key: String,
    api_url: String,
    cache: ResponseCache<LocationData>,
}

impl GeolocationClient {
    pub fn new(
        config: &ProviderConfig,
        timeout: Duration,
        cache: ResponseCache<LocationData>,
    ) -> Result<Self, AppError> {
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .map_err(|e| AppError::Unexpected(format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            api_key: config.api_key.clone(),
            api_url: config.api_url.clone(),
            cache,
        })
    }

    pub async fn location_by_ip(&self, ip_address: &str) -> Result<LocationData, AppError> {
        if let Some(hit) = self.cache.get(ip_address).await {
            tracing::debug!("Cache hit for location of IP {}", ip_address);
            return Ok(hit);
        }

        tracing::debug!("Calling IP Geolocation API for IP: {}", ip_address);
        let request = self
            .client
            .get(&self.api_url)
            .query(&[("apiKey", self.api_key.as_str()), ("ip", ip_address)]);
        let body = provider_get(PROVIDER, request).await?;
        let location = parse_location(&body, ip_address)?;

        self.cache
            .insert(ip_address.to_string(), location.clone())
            .await;
        let entries = self.cache.len().await;
        tracing::debug!(
            cache = self.cache.name(),
            entries,
            "Stored location for IP {}",
            ip_address
        );
        Ok(location)
    }
}

#[cfg(test)]
pub(crate) mod tests {
    use super::*;
    use crate::services::cache::CachePolicy;
    use crate::services::parser::samples::location_json;
    use wiremock::matchers::{method, path, query_param};
    use wiremock::{Mock, MockServer, ResponseTemplate};

    /// Client pointed at `{base_url}/ipgeo` with a one-hour cache.
    pub(crate) fn test_client(base_url: &str) -> GeolocationClient {
        GeolocationClient::new(
            &ProviderConfig {
                api_key: "geo-key".to_string(),
                api_url: format!("{}/ipgeo", base_url),
            },
            Duration::from_secs(5),
            ResponseCache::new(
                "ipLocation",
                CachePolicy {
                    max_entries: 100,
                    ttl: Duration::from_secs(3600),
                },
            ),
        )
        .unwrap()
    }

    #[tokio::test]
    async fn test_location_by_ip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ipgeo"))
            .and(query_param("apiKey", "geo-key"))
            .and(query_param("ip", "203.0.113.5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(location_json("Oslo")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let location = client.location_by_ip("203.0.113.5").await.unwrap();

        assert_eq!(location.city, "Oslo");
        assert_eq!(location.country_code, "NO");
        assert_eq!(location.latitude, 59.91273);
        assert_eq!(location.ip_address, "203.0.113.5");
    }

    #[tokio::test]
    async fn test_location_is_cached_per_ip() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ipgeo"))
            .and(query_param("ip", "203.0.113.5"))
            .respond_with(ResponseTemplate::new(200).set_body_json(location_json("Oslo")))
            .expect(1)
            .mount(&server)
            .await;
        Mock::given(method("GET"))
            .and(path("/ipgeo"))
            .and(query_param("ip", "198.51.100.7"))
            .respond_with(ResponseTemplate::new(200).set_body_json(location_json("Bergen")))
            .expect(1)
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        client.location_by_ip("203.0.113.5").await.unwrap();
        client.location_by_ip("203.0.113.5").await.unwrap();
        let other = client.location_by_ip("198.51.100.7").await.unwrap();
        assert_eq!(other.city, "Bergen");
    }

    #[tokio::test]
    async fn test_unparsable_coordinates_are_data_format() {
        let server = MockServer::start().await;
        let mut body = location_json("Oslo");
        body["longitude"] = serde_json::json!("");
        Mock::given(method("GET"))
            .and(path("/ipgeo"))
            .respond_with(ResponseTemplate::new(200).set_body_json(body))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.location_by_ip("203.0.113.5").await.unwrap_err();
        assert!(matches!(err, AppError::DataFormat { ref path, .. } if path == "/longitude"));
    }

    #[tokio::test]
    async fn test_provider_rejection_is_upstream_failure() {
        let server = MockServer::start().await;
        Mock::given(method("GET"))
            .and(path("/ipgeo"))
            .respond_with(ResponseTemplate::new(401).set_body_string("invalid API key"))
            .mount(&server)
            .await;

        let client = test_client(&server.uri());
        let err = client.location_by_ip("203.0.113.5").await.unwrap_err();
        assert!(matches!(
            err,
            AppError::UpstreamTransport {
                provider: "ipgeolocation",
                status: Some(s),
                ..
            } if s == reqwest::StatusCode::UNAUTHORIZED
        ));
    }
}
