use std::time::Duration;

use crate::distance::GeoPoint;

/// Runtime configuration for the screening binary and its geocoding collaborator.
#[derive(Debug, Clone)]
pub struct Config {
    /// Reference point that location scores are measured from.
    pub reference_point: GeoPoint,
    /// Label for the reference point, used in logs only.
    pub reference_label: String,
    pub postcodes_base_url: String,
    pub geocoder_timeout_secs: u64,
    pub distance_cache_ttl_secs: u64,
    pub distance_cache_capacity: u64,
    /// Consecutive geocoder failures before the circuit opens.
    pub geocoder_failure_threshold: u32,
}

impl Config {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let latitude = parse_coordinate("REFERENCE_LATITUDE", 90.0)?;
        let longitude = parse_coordinate("REFERENCE_LONGITUDE", 180.0)?;

        let config = Self {
            reference_point: GeoPoint::new(latitude, longitude),
            reference_label: std::env::var("REFERENCE_LABEL")
                .ok()
                .filter(|s| !s.trim().is_empty())
                .unwrap_or_else(|| "reference point".to_string()),
            postcodes_base_url: std::env::var("POSTCODES_BASE_URL")
                .unwrap_or_else(|_| "https://api.postcodes.io".to_string())
                .trim_end_matches('/')
                .to_string(),
            geocoder_timeout_secs: parse_or_default("GEOCODER_TIMEOUT_SECS", 10)?,
            distance_cache_ttl_secs: parse_or_default("DISTANCE_CACHE_TTL_SECS", 86_400)?,
            distance_cache_capacity: parse_or_default("DISTANCE_CACHE_CAPACITY", 10_000)?,
            geocoder_failure_threshold: parse_or_default("GEOCODER_FAILURE_THRESHOLD", 5)?,
        };

        if !config.postcodes_base_url.starts_with("http://")
            && !config.postcodes_base_url.starts_with("https://")
        {
            anyhow::bail!("POSTCODES_BASE_URL must start with http:// or https://");
        }
        if config.geocoder_failure_threshold == 0 {
            anyhow::bail!("GEOCODER_FAILURE_THRESHOLD must be at least 1");
        }

        tracing::info!("Configuration loaded successfully");
        tracing::debug!(
            "Reference point '{}': ({}, {})",
            config.reference_label,
            config.reference_point.latitude,
            config.reference_point.longitude
        );
        tracing::debug!("Postcodes base URL: {}", config.postcodes_base_url);
        tracing::debug!(
            "Distance cache: {}s TTL, {} entries",
            config.distance_cache_ttl_secs,
            config.distance_cache_capacity
        );

        Ok(config)
    }

    pub fn geocoder_timeout(&self) -> Duration {
        Duration::from_secs(self.geocoder_timeout_secs)
    }

    pub fn distance_cache_ttl(&self) -> Duration {
        Duration::from_secs(self.distance_cache_ttl_secs)
    }
}

fn parse_coordinate(key: &str, limit: f64) -> anyhow::Result<f64> {
    let raw = std::env::var(key)
        .map_err(|_| anyhow::anyhow!("{} environment variable required", key))?;
    let value: f64 = raw
        .trim()
        .parse()
        .map_err(|_| anyhow::anyhow!("{} must be a decimal number", key))?;
    if !value.is_finite() || value.abs() > limit {
        anyhow::bail!("{} must be between -{} and {}", key, limit, limit);
    }
    Ok(value)
}

fn parse_or_default<T: std::str::FromStr>(key: &str, default: T) -> anyhow::Result<T> {
    match std::env::var(key) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse()
            .map_err(|_| anyhow::anyhow!("{} must be a valid number", key)),
        _ => Ok(default),
    }
}
