//! MSP Acquisition Screening Library
//!
//! This library screens business-registry records against an acquisition
//! thesis for IT managed-service providers. Given a validated company record,
//! optional multi-year financials and web-derived enrichment text, it derives
//! an attractiveness score, an MSP likelihood classification, a thesis match
//! report and a financial trend summary.
//!
//! # Modules
//!
//! - `circuit_breaker`: Failure policy guarding the geocoder.
//! - `classifier`: MSP likelihood classifier.
//! - `config`: Configuration management.
//! - `distance`: Distance resolution capability, postcode geocoder and cache.
//! - `errors`: Error handling types.
//! - `models`: Input records and output types.
//! - `scoring`: Size/age/location attractiveness scorer.
//! - `screening`: Explicit screening workflow and ranking.
//! - `thesis`: Acquisition profile and thesis criteria matcher.
//! - `trends`: Multi-year financial trend calculator.
//! - `vocabulary`: Versioned classifier vocabulary table.

pub mod circuit_breaker;
pub mod classifier;
pub mod config;
pub mod distance;
pub mod errors;
pub mod models;
pub mod scoring;
pub mod screening;
pub mod thesis;
pub mod trends;
pub mod vocabulary;
