//! Test fixtures for bin-route-planner.
//!
//! Provides:
//! - Bin sites around central Agartala (routable with the OSRM north-eastern India extract)
//! - Fake collaborators: route provider, bin registry, position feed, clock

#![allow(dead_code)]

pub mod agartala_bins;
pub mod fakes;

pub use agartala_bins::*;
pub use fakes::*;
