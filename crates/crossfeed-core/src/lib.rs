//! # crossfeed Core Library
//!
//! A library for scoring metabolic cross-feeding in microbial communities,
//! based on constraint-based (flux balance) analysis of genome-scale models.
//!
//! ## Architectural Philosophy
//!
//! The library is designed with a strict three-layer architecture to ensure a clear separation of
//! concerns, making it modular, testable, and extensible.
//!
//! - **[`core`]: The Foundation.** Contains stateless data models (`MetabolicModel`,
//!   `CommunityModel`, `Environment`) and the linear-programming seam (`core::lp`): problem
//!   formulation plus the `LpOracle` trait through which solver backends are consumed.
//!
//! - **[`engine`]: The Logic Core.** This stateful layer holds the scoring logic proper:
//!   configuration, error types, and the task functions that turn a (model, environment) pair
//!   into verdicts — flux balance analysis, minimal-medium search, interaction potential,
//!   resource overlap, and alternate-optima sampling.
//!
//! - **[`workflows`]: The Public API.** The highest-level, user-facing layer. It ties the
//!   `engine` and `core` together to evaluate one community on one growth medium and return an
//!   immutable [`workflows::score::ScoreResult`].

pub mod core;
pub mod engine;
pub mod workflows;
