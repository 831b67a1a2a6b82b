//! Live tram departures server.
//!
//! Loads the Metrolink open data feed into a short-lived cache and answers
//! "what leaves from this stop (or every platform of this station) next?"
//! with a deterministic, display-ready ordering.

pub mod config;
pub mod departures;
pub mod domain;
pub mod error;
pub mod feed;
pub mod logging;
pub mod naptan;
pub mod platforms;
pub mod schedule;
pub mod store;
pub mod web;
