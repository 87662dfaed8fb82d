//! Route composition tests: ordering under concurrency and partial failure.

mod fixtures;

use std::time::Duration;

use bin_route_planner::cancel::CancelToken;
use bin_route_planner::compose::{LegFetchMode, compose_route};
use bin_route_planner::{GeoPoint, build_tour};

use fixtures::{FakeRouter, meridian_bins};

const ORIGIN: GeoPoint = GeoPoint::new(0.0, 0.0);
const A: GeoPoint = GeoPoint::new(0.0, 10.0);
const B: GeoPoint = GeoPoint::new(0.0, 1.0);
const C: GeoPoint = GeoPoint::new(0.0, 5.0);

fn leg(from: GeoPoint, to: GeoPoint) -> Vec<GeoPoint> {
    vec![from, FakeRouter::midpoint(from, to), to]
}

#[test]
fn combined_route_follows_tour_order() {
    let tour = build_tour(ORIGIN, &meridian_bins());
    let route = compose_route(&tour, &FakeRouter::new(), LegFetchMode::Sequential, &CancelToken::new());

    let expected: Vec<GeoPoint> = [leg(ORIGIN, B), leg(B, C), leg(C, A)].concat();
    assert_eq!(route.combined, expected);
    assert_eq!(route.combined.first(), Some(&ORIGIN));
    assert_eq!(route.combined.last(), Some(&A));
    assert_eq!(route.failed_legs(), 0);
}

#[test]
fn out_of_order_completion_keeps_tour_order() {
    // The first leg finishes last.
    let router = FakeRouter::new()
        .delay_to(B, Duration::from_millis(300))
        .delay_to(C, Duration::from_millis(100));
    let tour = build_tour(ORIGIN, &meridian_bins());

    let route = compose_route(&tour, &router, LegFetchMode::Concurrent, &CancelToken::new());

    assert_eq!(router.calls(), 3);
    assert_eq!(router.completion_order().last(), Some(&B));
    let expected: Vec<GeoPoint> = [leg(ORIGIN, B), leg(B, C), leg(C, A)].concat();
    assert_eq!(route.combined, expected);

    let destinations: Vec<GeoPoint> = route.legs.iter().map(|leg| leg.to.point).collect();
    assert_eq!(destinations, vec![B, C, A]);
}

#[test]
fn failed_leg_leaves_gap_but_keeps_order() {
    let router = FakeRouter::new().fail_to(C);
    let tour = build_tour(ORIGIN, &meridian_bins());

    let route = compose_route(&tour, &router, LegFetchMode::Concurrent, &CancelToken::new());

    assert_eq!(route.legs.len(), 3);
    assert!(route.legs[0].is_resolved());
    assert!(!route.legs[1].is_resolved());
    assert!(route.legs[2].is_resolved());
    assert_eq!(route.legs[1].to.bin_id.as_deref(), Some("C"));
    assert_eq!(route.failed_legs(), 1);

    let expected: Vec<GeoPoint> = [leg(ORIGIN, B), leg(C, A)].concat();
    assert_eq!(route.combined, expected);
}

#[test]
fn all_legs_failing_yields_empty_route() {
    let router = FakeRouter::new().fail_to(A).fail_to(B).fail_to(C);
    let tour = build_tour(ORIGIN, &meridian_bins());

    let route = compose_route(&tour, &router, LegFetchMode::Sequential, &CancelToken::new());

    assert_eq!(route.legs.len(), 3);
    assert!(route.combined.is_empty());
}

#[test]
fn sequential_mode_fetches_in_tour_order() {
    let router = FakeRouter::new()
        .delay_to(B, Duration::from_millis(50))
        .delay_to(C, Duration::from_millis(10));
    let tour = build_tour(ORIGIN, &meridian_bins());

    compose_route(&tour, &router, LegFetchMode::Sequential, &CancelToken::new());

    assert_eq!(router.completion_order(), vec![B, C, A]);
}
