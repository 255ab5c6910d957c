//! Per-area orchestrators. Each operation takes a typed parameter bundle
//! and returns exactly one [`Outcome`](crate::Outcome).

pub mod clients;
pub mod costs;
pub mod plugins;
pub mod sites;
pub mod tags;
pub mod updates;
