//! Best-effort network probes: connectivity/latency, geolocation, and the
//! update-manifest check. Every probe degrades to a placeholder on failure
//! and never blocks the rest of the app.

use reqwest::Client;
use serde::Deserialize;
use std::time::{Duration, Instant};
use tracing::debug;

use chrono::Utc;

const PING_URL: &str = "https://www.google.com/favicon.ico";
const GEO_URL: &str = "https://ipapi.co/json/";

pub const PING_INTERVAL_SECS: u64 = 15;
pub const UPDATE_INTERVAL_SECS: u64 = 5;
pub const ROLLOVER_INTERVAL_SECS: u64 = 60;

/// Shared client for probes; kept separate from the generation client so a
/// slow answer never delays a ping.
pub fn probe_client() -> Client {
    Client::builder()
        .timeout(Duration::from_secs(10))
        .build()
        .expect("Failed to create HTTP client")
}

#[derive(Debug, Clone, Copy, Default)]
pub struct ConnectionStatus {
    pub online: bool,
    pub ping_ms: Option<u64>,
}

/// Round-trip a tiny request against a fixed endpoint. Failure means
/// offline with unknown latency.
pub async fn check_connection(client: &Client) -> ConnectionStatus {
    let start = Instant::now();
    match client.get(PING_URL).send().await {
        Ok(_) => ConnectionStatus {
            online: true,
            ping_ms: Some(start.elapsed().as_millis() as u64),
        },
        Err(e) => {
            debug!(error = %e, "connectivity probe failed");
            ConnectionStatus {
                online: false,
                ping_ms: None,
            }
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeoResponse {
    ip: Option<String>,
    city: Option<String>,
    country_name: Option<String>,
}

#[derive(Debug, Clone)]
pub struct Location {
    pub ip: String,
    pub city: String,
}

impl Default for Location {
    fn default() -> Self {
        Self {
            ip: "Unknown".to_string(),
            city: "Unknown".to_string(),
        }
    }
}

/// Look up the public IP and city for display. Failure degrades to the
/// "Unknown" placeholder.
pub async fn fetch_location(client: &Client) -> Location {
    let response = match client.get(GEO_URL).send().await {
        Ok(r) => r,
        Err(e) => {
            debug!(error = %e, "geolocation lookup failed");
            return Location::default();
        }
    };

    match response.json::<GeoResponse>().await {
        Ok(geo) => Location {
            ip: geo.ip.unwrap_or_else(|| "Unknown".to_string()),
            city: match (geo.city, geo.country_name) {
                (Some(city), Some(country)) => format!("{}, {}", city, country),
                (Some(city), None) => city,
                _ => "Unknown".to_string(),
            },
        },
        Err(e) => {
            debug!(error = %e, "geolocation response unreadable");
            Location::default()
        }
    }
}

#[derive(Debug, Deserialize)]
struct VersionManifest {
    timestamp: i64,
}

/// Fetch the timestamp of the published version manifest, with a
/// cache-busting query parameter. None on any failure.
pub async fn fetch_version_timestamp(client: &Client, update_url: &str) -> Option<i64> {
    let url = format!("{}?t={}", update_url, Utc::now().timestamp_millis());

    let response = match client.get(&url).send().await {
        Ok(r) if r.status().is_success() => r,
        Ok(r) => {
            debug!(status = %r.status(), "version probe rejected");
            return None;
        }
        Err(e) => {
            debug!(error = %e, "version probe failed");
            return None;
        }
    };

    match response.json::<VersionManifest>().await {
        Ok(manifest) => Some(manifest.timestamp),
        Err(e) => {
            debug!(error = %e, "version manifest unreadable");
            None
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_location_is_unknown() {
        let location = Location::default();
        assert_eq!(location.ip, "Unknown");
        assert_eq!(location.city, "Unknown");
    }

    #[test]
    fn test_geo_response_tolerates_partial_payload() {
        let geo: GeoResponse = serde_json::from_str(r#"{"ip": "1.2.3.4"}"#).unwrap();
        assert_eq!(geo.ip.as_deref(), Some("1.2.3.4"));
        assert!(geo.city.is_none());
        assert!(geo.country_name.is_none());
    }
}
