//! OSRM HTTP adapter for per-leg road geometry.

use serde::Deserialize;
use tracing::debug;

use crate::error::LegFetchError;
use crate::geo::GeoPoint;
use crate::polyline::Polyline;
use crate::traits::RouteProvider;

/// Where and how legs are routed.
///
/// The default points at the public OSRM demo server, which is rate limited
/// and meant for light use only. Use [`LegFetchMode::Sequential`] against it,
/// or point `base_url` at a self-hosted instance for concurrent fetches.
///
/// [`LegFetchMode::Sequential`]: crate::compose::LegFetchMode::Sequential
#[derive(Debug, Clone)]
pub struct OsrmConfig {
    pub base_url: String,
    /// OSRM profile segment of the URL, e.g. `driving` or `foot`.
    pub profile: String,
    /// Upper bound on a single leg request, connect through body.
    pub timeout_secs: u64,
}

impl Default for OsrmConfig {
    fn default() -> Self {
        Self {
            base_url: "https://router.project-osrm.org".to_string(),
            profile: "driving".to_string(),
            timeout_secs: 10,
        }
    }
}

#[derive(Debug, Clone)]
pub struct OsrmClient {
    config: OsrmConfig,
    client: reqwest::blocking::Client,
}

impl OsrmClient {
    pub fn new(config: OsrmConfig) -> Result<Self, reqwest::Error> {
        let client = reqwest::blocking::Client::builder()
            .timeout(std::time::Duration::from_secs(config.timeout_secs))
            .build()?;

        Ok(Self { config, client })
    }

    /// Route request URL. OSRM expects (longitude, latitude) pairs.
    pub fn route_url(&self, from: GeoPoint, to: GeoPoint) -> String {
        format!(
            "{}/route/v1/{}/{:.6},{:.6};{:.6},{:.6}?overview=full&geometries=geojson",
            self.config.base_url.trim_end_matches('/'),
            self.config.profile,
            from.longitude,
            from.latitude,
            to.longitude,
            to.latitude
        )
    }
}

impl RouteProvider for OsrmClient {
    fn route(&self, from: GeoPoint, to: GeoPoint) -> Result<Polyline, LegFetchError> {
        let url = self.route_url(from, to);
        debug!(%url, "requesting route leg");

        let response = self.client.get(url).send()?;
        let status = response.status();
        if !status.is_success() {
            return Err(LegFetchError::Status(status.as_u16()));
        }

        let body = response.json::<OsrmRouteResponse>()?;
        body.into_polyline()
    }
}

#[derive(Debug, Deserialize)]
pub(crate) struct OsrmRouteResponse {
    code: String,
    #[serde(default)]
    message: Option<String>,
    #[serde(default)]
    routes: Vec<OsrmRoute>,
}

#[derive(Debug, Deserialize)]
struct OsrmRoute {
    geometry: Option<OsrmGeometry>,
}

#[derive(Debug, Deserialize)]
struct OsrmGeometry {
    coordinates: Vec<[f64; 2]>,
}

impl OsrmRouteResponse {
    /// Takes the first route's geometry, converted to (latitude, longitude).
    pub(crate) fn into_polyline(self) -> Result<Polyline, LegFetchError> {
        if self.code != "Ok" {
            let detail = match self.message {
                Some(message) => format!("{}: {}", self.code, message),
                None => self.code,
            };
            return Err(LegFetchError::NoGeometry(detail));
        }

        let coordinates = self
            .routes
            .into_iter()
            .next()
            .and_then(|route| route.geometry)
            .map(|geometry| geometry.coordinates)
            .unwrap_or_default();

        if coordinates.is_empty() {
            return Err(LegFetchError::NoGeometry("empty route list".to_string()));
        }

        Ok(Polyline::from_lng_lat(&coordinates))
    }
}
