//! HTTP client for the bin registry and the hotspot overlay.

use std::collections::HashSet;

use reqwest::header::AUTHORIZATION;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::error::RegistryError;
use crate::geo::{Bin, GeoPoint};
use crate::traits::BinSource;

#[derive(Debug, Clone)]
pub struct RegistryConfig {
    pub base_url: String,
    /// Sent verbatim as the `Authorization` header when present.
    pub auth_token: Option<String>,
    pub timeout_secs: u64,
}

impl Default for RegistryConfig {
    fn default() -> Self {
        Self {
            base_url: "http://127.0.0.1:8000".to_string(),
            auth_token: None,
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct RegistryClient {
    config: RegistryConfig,
    client: reqwest::blocking::Client,
}

/// Suggested site for a new bin, computed by the hotspot service.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Hotspot {
    pub latitude: f64,
    pub longitude: f64,
    #[serde(default)]
    pub cluster_id: Option<i64>,
    #[serde(default)]
    pub average_importance_score: Option<f64>,
    #[serde(default)]
    pub num_bins_in_hotspot: Option<u32>,
}

impl Hotspot {
    pub fn location(&self) -> GeoPoint {
        GeoPoint::new(self.latitude, self.longitude)
    }
}

impl RegistryClient {
    pub fn new(config: RegistryConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Advisory overlay; not used for routing.
    pub fn fetch_hotspots(&self) -> Result<Vec<Hotspot>, RegistryError> {
        let body: HotspotsPayload = self.get_json("/ml/hotspots")?;
        Ok(body
            .hotspot_centers
            .into_iter()
            .filter(|hotspot| hotspot.location().is_finite())
            .collect())
    }

    fn get_json<T: serde::de::DeserializeOwned>(&self, path: &str) -> Result<T, RegistryError> {
        let url = format!("{}{}", self.config.base_url.trim_end_matches('/'), path);
        let mut request = self.client.get(url);
        if let Some(token) = &self.config.auth_token {
            request = request.header(AUTHORIZATION, token);
        }

        let response = request.send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(RegistryError::Status(status.as_u16()));
        }

        let text = response.text()?;
        serde_json::from_str(&text).map_err(|err| RegistryError::Decode(err.to_string()))
    }
}

impl BinSource for RegistryClient {
    fn fetch_bins(&self) -> Result<Vec<Bin>, RegistryError> {
        let payload: BinsPayload = self.get_json("/bins")?;
        Ok(payload.into_bins())
    }
}

/// `GET /bins` answers either a bare list or `{ "bins": [...] }`.
#[derive(Debug, Deserialize)]
#[serde(untagged)]
pub(crate) enum BinsPayload {
    List(Vec<BinRecord>),
    Wrapped { bins: Vec<BinRecord> },
}

#[derive(Debug, Deserialize)]
pub(crate) struct BinRecord {
    bin_id: String,
    latitude: Option<f64>,
    longitude: Option<f64>,
    #[serde(default)]
    current_fill_pct: Option<f64>,
    #[serde(default)]
    capacity_litres: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct HotspotsPayload {
    #[serde(default)]
    hotspot_centers: Vec<Hotspot>,
}

impl BinsPayload {
    /// Drops records without finite coordinates and repeated ids.
    pub(crate) fn into_bins(self) -> Vec<Bin> {
        let records = match self {
            BinsPayload::List(records) | BinsPayload::Wrapped { bins: records } => records,
        };

        let mut seen = HashSet::new();
        let mut bins = Vec::with_capacity(records.len());
        for record in records {
            let location = match (record.latitude, record.longitude) {
                (Some(lat), Some(lng)) => GeoPoint::new(lat, lng),
                _ => {
                    debug!(bin_id = %record.bin_id, "bin has no coordinates, skipped");
                    continue;
                }
            };
            if !location.is_finite() {
                debug!(bin_id = %record.bin_id, "bin has non-finite coordinates, skipped");
                continue;
            }
            if !seen.insert(record.bin_id.clone()) {
                warn!(bin_id = %record.bin_id, "duplicate bin id in registry, keeping first");
                continue;
            }
            bins.push(Bin {
                bin_id: record.bin_id,
                location,
                current_fill_pct: record.current_fill_pct,
                capacity_litres: record.capacity_litres,
            });
        }
        bins
    }
}
