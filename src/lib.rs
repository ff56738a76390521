//! sitewatch - HTTP Site Monitoring Service
//!
//! Polls a dynamic set of URLs, keeps a short check history per site and
//! serves the current state over a JSON API.

pub mod checker;
pub mod config;
pub mod metrics;
pub mod probe;
pub mod scheduler;
pub mod service;
pub mod state;
#[cfg(test)]
mod testutil;
pub mod web;
