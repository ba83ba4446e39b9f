//! HTTP JSON geo resolver.

use super::service::{GeoError, GeoLocation, GeoResolver};
use async_trait::async_trait;
use reqwest::{Client, StatusCode};
use serde::Deserialize;
use std::net::IpAddr;
use std::time::Duration;
use tracing::debug;

const REQUEST_TIMEOUT: Duration = Duration::from_secs(10);

/// Response shape of ipapi-style lookup services.
#[derive(Debug, Deserialize)]
struct GeoResponse {
    #[serde(default)]
    error: bool,
    #[serde(default)]
    country_name: Option<String>,
    #[serde(default, alias = "region_name", alias = "subdivision_name")]
    region: Option<String>,
    #[serde(default)]
    city: Option<String>,
}

/// Resolves addresses against an HTTP endpoint template.
///
/// The template must contain an `{ip}` placeholder, for example
/// `https://ipapi.co/{ip}/json/`.
pub struct HttpGeoResolver {
    client: Client,
    endpoint: String,
}

impl HttpGeoResolver {
    pub fn new(endpoint: impl Into<String>) -> Result<Self, GeoError> {
        let client = Client::builder()
            .timeout(REQUEST_TIMEOUT)
            .build()
            .map_err(|e| GeoError::Request(e.to_string()))?;

        Ok(Self {
            client,
            endpoint: endpoint.into(),
        })
    }

    fn url_for(&self, ip: &IpAddr) -> String {
        self.endpoint.replace("{ip}", &ip.to_string())
    }
}

#[async_trait]
impl GeoResolver for HttpGeoResolver {
    async fn resolve(&self, ip: &str) -> Result<Option<GeoLocation>, GeoError> {
        let addr: IpAddr = ip
            .trim()
            .parse()
            .map_err(|_| GeoError::InvalidAddress(ip.to_string()))?;

        let response = self
            .client
            .get(self.url_for(&addr))
            .send()
            .await
            .map_err(|e| GeoError::Request(e.without_url().to_string()))?;

        if response.status() == StatusCode::NOT_FOUND {
            debug!(ip = %addr, "Address unknown to geo service");
            return Ok(None);
        }

        let response = response
            .error_for_status()
            .map_err(|e| GeoError::Request(e.without_url().to_string()))?;

        let body: GeoResponse = response
            .json()
            .await
            .map_err(|e| GeoError::Decode(e.without_url().to_string()))?;

        if body.error {
            return Ok(None);
        }

        let country = body.country_name.unwrap_or_default();
        if country.is_empty() {
            return Ok(None);
        }

        Ok(Some(GeoLocation {
            country,
            region: body.region.unwrap_or_default(),
            city: body.city.unwrap_or_default(),
        }))
    }
}
