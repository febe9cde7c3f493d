//! Distance-from-reference-point resolution.
//!
//! The scorer depends only on the [`DistanceResolver`] capability. This module
//! also ships the production collaborator: a postcode geocoder guarded by a
//! circuit breaker, and a cache-first wrapper around any resolver.

use async_trait::async_trait;
use failsafe::futures::CircuitBreaker;
use moka::future::Cache;
use regex::Regex;
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::LazyLock;
use std::time::Duration;

use crate::circuit_breaker::{create_geocoder_circuit_breaker, GeocoderCircuitBreaker};
use crate::config::Config;
use crate::errors::{AppError, ResultExt};
use crate::models::{round2, StructuredAddress};

const EARTH_RADIUS_KM: f64 = 6371.0;

static UK_POSTCODE_RE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?i)\b([A-Z]{1,2}[0-9][A-Z0-9]?)\s*([0-9][A-Z]{2})\b").unwrap()
});

/// Resolves a company address to a distance (km) from the reference point.
///
/// Implementations absorb every failure (network errors, no match, rate
/// limiting) and return `None`; they never panic or propagate errors into
/// the scorer. Retry and timeout policy, if any, belongs to the implementation.
#[async_trait]
pub trait DistanceResolver: Send + Sync {
    async fn resolve_distance(
        &self,
        address_text: Option<&str>,
        structured: Option<&StructuredAddress>,
    ) -> Option<f64>;
}

/// Latitude/longitude in decimal degrees.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct GeoPoint {
    pub latitude: f64,
    pub longitude: f64,
}

impl GeoPoint {
    pub fn new(latitude: f64, longitude: f64) -> Self {
        Self {
            latitude,
            longitude,
        }
    }
}

/// Great-circle distance between two points, in kilometres.
pub fn haversine_km(a: GeoPoint, b: GeoPoint) -> f64 {
    let lat1 = a.latitude.to_radians();
    let lat2 = b.latitude.to_radians();
    let d_lat = (b.latitude - a.latitude).to_radians();
    let d_lon = (b.longitude - a.longitude).to_radians();

    let h = (d_lat / 2.0).sin().powi(2) + lat1.cos() * lat2.cos() * (d_lon / 2.0).sin().powi(2);
    2.0 * EARTH_RADIUS_KM * h.sqrt().asin()
}

/// Extracts a normalised UK postcode ("SW1A 1AA"), preferring the structured field.
pub fn extract_postcode(
    address_text: Option<&str>,
    structured: Option<&StructuredAddress>,
) -> Option<String> {
    let from_structured = structured
        .and_then(|s| s.postal_code.as_deref())
        .and_then(normalise_postcode);

    from_structured.or_else(|| address_text.and_then(normalise_postcode))
}

fn normalise_postcode(raw: &str) -> Option<String> {
    UK_POSTCODE_RE.captures(raw).map(|caps| {
        format!(
            "{} {}",
            caps[1].to_uppercase(),
            caps[2].to_uppercase()
        )
    })
}

#[derive(Debug, Deserialize)]
struct PostcodeResponse {
    status: u16,
    result: Option<PostcodeResult>,
}

#[derive(Debug, Deserialize)]
struct PostcodeResult {
    latitude: Option<f64>,
    longitude: Option<f64>,
}

/// Geocodes UK postcodes via a postcodes.io-compatible API and measures the
/// distance to a fixed reference point.
pub struct PostcodeGeocoder {
    client: Client,
    base_url: String,
    reference_point: GeoPoint,
    breaker: GeocoderCircuitBreaker,
}

impl PostcodeGeocoder {
    pub fn new(
        base_url: impl Into<String>,
        reference_point: GeoPoint,
        timeout: Duration,
        failure_threshold: u32,
    ) -> Result<Self, AppError> {
        let client = Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to build geocoder HTTP client")?;

        Ok(Self {
            client,
            base_url: base_url.into().trim_end_matches('/').to_string(),
            reference_point,
            breaker: create_geocoder_circuit_breaker(failure_threshold),
        })
    }

    pub fn from_config(config: &Config) -> Result<Self, AppError> {
        Self::new(
            config.postcodes_base_url.clone(),
            config.reference_point,
            config.geocoder_timeout(),
            config.geocoder_failure_threshold,
        )
    }

    /// Looks up the coordinates of a normalised postcode.
    pub async fn lookup_postcode(&self, postcode: &str) -> Result<GeoPoint, AppError> {
        let mut url = reqwest::Url::parse(&self.base_url)
            .map_err(|e| AppError::Config(format!("Invalid geocoder base URL: {}", e)))?;
        url.path_segments_mut()
            .map_err(|_| AppError::Config("Geocoder base URL cannot be a base".to_string()))?
            .pop_if_empty()
            .push("postcodes")
            .push(postcode);

        tracing::debug!("Geocoding postcode: {}", postcode);

        let response = self
            .client
            .get(url)
            .send()
            .await
            .context("Geocoder request failed")?;

        if response.status() == reqwest::StatusCode::NOT_FOUND {
            return Err(AppError::NotFound(format!("postcode {}", postcode)));
        }

        if !response.status().is_success() {
            let status = response.status();
            let error_text = response
                .text()
                .await
                .unwrap_or_else(|_| "Unknown error".to_string());
            return Err(AppError::ExternalApiError(format!(
                "Geocoder returned status {}: {}",
                status, error_text
            )));
        }

        let body: PostcodeResponse = response
            .json()
            .await
            .context("Failed to parse geocoder response")?;

        match body.result {
            Some(PostcodeResult {
                latitude: Some(latitude),
                longitude: Some(longitude),
            }) if body.status == 200 => Ok(GeoPoint::new(latitude, longitude)),
            _ => Err(AppError::NotFound(format!(
                "no coordinates for postcode {}",
                postcode
            ))),
        }
    }
}

#[async_trait]
impl DistanceResolver for PostcodeGeocoder {
    async fn resolve_distance(
        &self,
        address_text: Option<&str>,
        structured: Option<&StructuredAddress>,
    ) -> Option<f64> {
        let postcode = match extract_postcode(address_text, structured) {
            Some(p) => p,
            None => {
                tracing::debug!("No postcode found in address; distance unresolved");
                return None;
            }
        };

        // An unknown postcode is a data problem, not a service failure, so it
        // does not count against the breaker.
        let result = self
            .breaker
            .call(async {
                match self.lookup_postcode(&postcode).await {
                    Err(e) if matches!(e.root(), AppError::NotFound(_)) => Ok(None),
                    Err(e) => Err(e),
                    Ok(point) => Ok(Some(point)),
                }
            })
            .await;

        match result {
            Ok(Some(point)) => {
                let km = round2(haversine_km(self.reference_point, point));
                tracing::info!("✓ Resolved {} to {} km from reference", postcode, km);
                Some(km)
            }
            Ok(None) => {
                tracing::warn!("Postcode {} not found by geocoder", postcode);
                None
            }
            Err(failsafe::Error::Rejected) => {
                tracing::warn!("Geocoder circuit open; skipping lookup for {}", postcode);
                None
            }
            Err(failsafe::Error::Inner(e)) => {
                tracing::warn!("Geocoding failed for {}: {}", postcode, e);
                None
            }
        }
    }
}

/// Cache-first wrapper: repeated addresses are resolved once per TTL window.
///
/// Only successful resolutions are cached, so transient failures are retried
/// on the next request for the same address.
pub struct CachedDistanceResolver<R> {
    inner: R,
    cache: Cache<String, f64>,
}

impl<R: DistanceResolver> CachedDistanceResolver<R> {
    pub fn new(inner: R, ttl: Duration, max_capacity: u64) -> Self {
        let cache = Cache::builder()
            .time_to_live(ttl)
            .max_capacity(max_capacity)
            .build();
        Self { inner, cache }
    }

    fn cache_key(
        address_text: Option<&str>,
        structured: Option<&StructuredAddress>,
    ) -> Option<String> {
        if let Some(postcode) = extract_postcode(address_text, structured) {
            return Some(format!("postcode:{}", postcode));
        }
        address_text
            .map(|t| t.split_whitespace().collect::<Vec<_>>().join(" ").to_lowercase())
            .filter(|t| !t.is_empty())
            .map(|t| format!("address:{}", t))
    }
}

#[async_trait]
impl<R: DistanceResolver> DistanceResolver for CachedDistanceResolver<R> {
    async fn resolve_distance(
        &self,
        address_text: Option<&str>,
        structured: Option<&StructuredAddress>,
    ) -> Option<f64> {
        let key = Self::cache_key(address_text, structured);

        if let Some(ref key) = key {
            if let Some(km) = self.cache.get(key).await {
                tracing::debug!("Distance cache hit for {}", key);
                return Some(km);
            }
        }

        let resolved = self.inner.resolve_distance(address_text, structured).await;

        if let (Some(key), Some(km)) = (key, resolved) {
            self.cache.insert(key, km).await;
        }

        resolved
    }
}
