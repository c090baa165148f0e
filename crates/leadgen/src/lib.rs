//! Lead-generation data model, its admin registrations, and the contractor
//! audit sampler.

pub mod admin;
pub mod audit;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod telemetry;
