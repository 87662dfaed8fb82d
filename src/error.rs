use serde::Serialize;
use thiserror::Error;

/// A single routing-provider call that produced no usable geometry.
///
/// Recovered locally: the leg is kept in the tour without geometry.
#[derive(Error, Debug)]
pub enum LegFetchError {
    #[error("routing request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("routing provider answered with status {0}")]
    Status(u16),
    #[error("routing provider returned no route geometry ({0})")]
    NoGeometry(String),
    #[error("leg fetch abandoned")]
    Cancelled,
}

/// Positioning failed or was denied. Surfaced once per watch.
#[derive(Error, Debug, Clone, PartialEq, Eq, Serialize)]
pub enum LocationError {
    #[error("location permission denied")]
    PermissionDenied,
    #[error("position unavailable: {0}")]
    PositionUnavailable(String),
    #[error("no position fix within the acquire timeout")]
    Timeout,
}

#[derive(Error, Debug)]
pub enum RegistryError {
    #[error("bin registry request failed: {0}")]
    Http(#[from] reqwest::Error),
    #[error("bin registry answered with status {0}")]
    Status(u16),
    #[error("bin registry payload not understood: {0}")]
    Decode(String),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("invalid value {value:?} for {key}")]
    InvalidValue { key: &'static str, value: String },
}

#[derive(Error, Debug)]
pub enum PlannerError {
    #[error("failed to spawn {0} thread: {1}")]
    Spawn(&'static str, #[source] std::io::Error),
    #[error("http client construction failed: {0}")]
    HttpClient(#[from] reqwest::Error),
    #[error(transparent)]
    Registry(#[from] RegistryError),
    #[error(transparent)]
    Config(#[from] ConfigError),
}

/// Conditions surfaced to the presentation layer.
///
/// Only `LocationUnavailable` blocks the plan; the others describe a
/// degraded but usable result.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub enum PlanCondition {
    LocationUnavailable(LocationError),
    NoRouteFound,
    EmptyTargetSet,
}
