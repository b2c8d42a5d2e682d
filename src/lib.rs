//! Live Roulette Result Collector
//!
//! Polls a rendered casino page for winning numbers and fans each confirmed
//! result out to independent downstream sinks.
//!
//! ## Architecture
//!
//! ```text
//! Collector loop ─→ SessionManager (expiry / block recovery)
//!        │                  │
//!        │           PageHandle (Chrome DevTools)
//!        ▼                  │
//!    Detector ──────────────┘   ordered selector scan + dedup
//!        │
//!        ▼
//!   Distributor ─→ Discord webhook
//!               ─→ local HTTP endpoint
//!               ─→ day-partitioned JSON log
//! ```

pub mod browser;
pub mod collector;
pub mod config;
pub mod detector;
pub mod error;
pub mod outcome;
pub mod session;
pub mod sink;

#[cfg(test)]
mod outcome_tests;
