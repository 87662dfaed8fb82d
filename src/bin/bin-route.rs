//! One-shot route planning from the command line.
//!
//! Fetches the bin registry, plans from the given position and prints the
//! plan as JSON.

use anyhow::{Context, Result, anyhow, bail};
use serde::Serialize;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

use bin_route_planner::cancel::CancelToken;
use bin_route_planner::config::PlannerConfig;
use bin_route_planner::distance::StraightLineProvider;
use bin_route_planner::error::PlanCondition;
use bin_route_planner::markers::{Marker, plan_markers};
use bin_route_planner::osrm::OsrmClient;
use bin_route_planner::plan::{Plan, PlanMode, TargetSelection, compute_plan};
use bin_route_planner::registry::{Hotspot, RegistryClient};
use bin_route_planner::traits::{BinSource, RouteProvider, SystemClock};
use bin_route_planner::GeoPoint;

const USAGE: &str = "Usage: bin-route --lat <deg> --lng <deg> [--bins <id,id,...>] \
[--nearest] [--offline] [--hotspots]\n\nEnvironment: BIN_REGISTRY_URL, BIN_REGISTRY_TOKEN, \
OSRM_BASE_URL, OSRM_PROFILE, OSRM_TIMEOUT_SECS, LEG_FETCH_MODE, RUST_LOG";

struct Args {
    start: GeoPoint,
    targets: TargetSelection,
    mode: PlanMode,
    offline: bool,
    hotspots: bool,
}

impl Args {
    fn parse(args: &[String]) -> Result<Self> {
        let mut lat: Option<f64> = None;
        let mut lng: Option<f64> = None;
        let mut targets = TargetSelection::All;
        let mut mode = PlanMode::Tour;
        let mut offline = false;
        let mut hotspots = false;

        let mut idx = 1;
        while idx < args.len() {
            match args[idx].as_str() {
                "--lat" => {
                    idx += 1;
                    lat = Some(parse_degrees(args.get(idx), "--lat")?);
                }
                "--lng" => {
                    idx += 1;
                    lng = Some(parse_degrees(args.get(idx), "--lng")?);
                }
                "--bins" => {
                    idx += 1;
                    let list = args
                        .get(idx)
                        .ok_or_else(|| anyhow!("--bins requires a value"))?;
                    targets = TargetSelection::Assigned(
                        list.split(',')
                            .map(str::trim)
                            .filter(|id| !id.is_empty())
                            .map(String::from)
                            .collect(),
                    );
                }
                "--nearest" => mode = PlanMode::NearestBin,
                "--offline" => offline = true,
                "--hotspots" => hotspots = true,
                "-h" | "--help" => bail!(USAGE),
                other => bail!("unknown argument {other}\n\n{USAGE}"),
            }
            idx += 1;
        }

        let (Some(lat), Some(lng)) = (lat, lng) else {
            bail!(USAGE);
        };

        Ok(Self {
            start: GeoPoint::new(lat, lng),
            targets,
            mode,
            offline,
            hotspots,
        })
    }
}

fn parse_degrees(value: Option<&String>, flag: &str) -> Result<f64> {
    let value = value.ok_or_else(|| anyhow!("{flag} requires a value"))?;
    let degrees: f64 = value
        .parse()
        .with_context(|| format!("{flag} expects decimal degrees, got {value:?}"))?;
    if !degrees.is_finite() {
        bail!("{flag} must be finite");
    }
    Ok(degrees)
}

#[derive(Serialize)]
struct Output<'a> {
    plan: &'a Plan,
    condition: Option<PlanCondition>,
    markers: Vec<Marker>,
}

fn main() {
    if let Err(err) = run() {
        eprintln!("{err:?}");
        std::process::exit(1);
    }
}

fn run() -> Result<()> {
    let _ = tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::from_default_env())
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = std::env::args().collect();
    let args = Args::parse(&args)?;
    let config = PlannerConfig::from_env()?;

    let registry = RegistryClient::new(config.registry.clone())?;
    let bins = registry
        .fetch_bins()
        .context("failed to load bins from the registry")?;
    let targets = args.targets.select(&bins);
    info!(registry = bins.len(), targets = targets.len(), "bins loaded");

    let hotspots: Vec<Hotspot> = if args.hotspots {
        registry.fetch_hotspots().unwrap_or_else(|err| {
            warn!(error = %err, "hotspot overlay unavailable");
            Vec::new()
        })
    } else {
        Vec::new()
    };

    let provider: Box<dyn RouteProvider + Sync> = if args.offline {
        Box::new(StraightLineProvider)
    } else {
        Box::new(OsrmClient::new(config.osrm.clone())?)
    };

    let mut options = config.refresh.plan;
    options.mode = args.mode;
    let plan = compute_plan(
        args.start,
        &targets,
        options,
        provider.as_ref(),
        &CancelToken::new(),
        &SystemClock,
    )
    .ok_or_else(|| anyhow!("planning was cancelled"))?;

    let output = Output {
        condition: plan.condition(),
        markers: plan_markers(&plan, &hotspots),
        plan: &plan,
    };
    println!("{}", serde_json::to_string_pretty(&output)?);
    Ok(())
}
