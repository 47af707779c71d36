//! Photovoltaic performance monitoring: telemetry storage, power estimation
//! and fleet scoring behind a small HTTP API.

pub mod analysis;
pub mod api;
pub mod auth;
pub mod config;
pub mod domain;
pub mod ingest;
pub mod repo;
pub mod state;
pub mod telemetry;
