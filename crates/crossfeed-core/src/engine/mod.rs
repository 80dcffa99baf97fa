//! # Engine Module
//!
//! This module implements the scoring engine for community metabolic interaction
//! analysis in crossfeed, providing the computational framework that turns
//! (community model, environment) pairs into interaction scores.
//!
//! ## Overview
//!
//! The engine module coordinates the constrained linear optimizations behind every
//! score. It manages scoring configuration, phrases the task-specific LP
//! formulations, and aggregates solver verdicts into typed results, leaving the
//! actual simplex to the [`crate::core::lp::LpOracle`] seam.
//!
//! ## Architecture
//!
//! - **Configuration** ([`config`]) - Growth floors, uptake limits, sampling depth, seeds
//! - **Error Handling** ([`error`]) - Engine-specific error types and propagation
//! - **Scoring Tasks** ([`tasks`]) - Flux balance analysis, minimal-medium search,
//!   interaction potential, resource overlap, and alternate-optima sampling
//!
//! ## Key Capabilities
//!
//! - **Growth-floored formulations** keeping every member viable during scoring
//! - **Indicator-style minimal-medium search** via bounded continuous relaxation
//! - **Seeded objective perturbation** making degenerate-optimum sampling replayable
//! - **Typed solver verdicts** so infeasibility is a score outcome, not a crash

pub mod config;
pub mod error;
pub mod tasks;
