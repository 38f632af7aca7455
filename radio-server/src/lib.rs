//! Resilient radio directory client and server.
//!
//! Talks to a set of interchangeable radio-browser mirrors: probes them on
//! startup and adopts the fastest, fails over between them per call, and
//! caches idempotent reads. A thin JSON web facade exposes the client.

pub mod cache;
pub mod client;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod models;
pub mod providers;
pub mod query;
pub mod recommend;
pub mod transport;
pub mod web;
