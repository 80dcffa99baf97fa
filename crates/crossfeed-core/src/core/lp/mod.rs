//! # Linear Programming Module
//!
//! Problem formulation and the solver seam for crossfeed.
//!
//! ## Overview
//!
//! Every score in this library is computed from one or more linear programs over a
//! metabolic model's flux space. This module phrases those programs
//! ([`problem::LinearProblem`]) and consumes solver verdicts through the
//! [`LpOracle`] trait. The library never implements a simplex itself: the bundled
//! [`oracle::MiniLpOracle`] adapts the external `minilp` crate, and alternative
//! backends plug in behind the same trait.
//!
//! Solver outcomes are data, not errors: an infeasible or unbounded program comes
//! back as a [`SolverStatus`] inside an [`LpSolution`], and downstream scores decide
//! what an undefined cell means.

pub mod oracle;
pub mod problem;

pub use oracle::MiniLpOracle;
pub use problem::{Constraint, ConstraintOp, LinearProblem, VariableSpec};

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Optimization direction of a linear program.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum Sense {
    Maximize,
    Minimize,
}

/// Verdict of an LP solve. Non-optimal statuses are typed results, never errors.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum SolverStatus {
    Optimal,
    Suboptimal,
    Infeasible,
    Unbounded,
    InfeasibleOrUnbounded,
    Unknown,
}

impl SolverStatus {
    pub fn is_optimal(&self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }
}

impl fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Suboptimal => "suboptimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::InfeasibleOrUnbounded => "infeasible-or-unbounded",
            SolverStatus::Unknown => "unknown",
        };
        write!(f, "{label}")
    }
}

/// Outcome of one oracle call: verdict, objective value, and the flux vector.
#[derive(Debug, Clone, PartialEq)]
pub struct LpSolution {
    pub status: SolverStatus,
    pub objective: Option<f64>,
    pub fluxes: IndexMap<String, f64>,
}

impl LpSolution {
    /// A solution carrying only a failure verdict.
    pub fn failed(status: SolverStatus) -> Self {
        Self {
            status,
            objective: None,
            fluxes: IndexMap::new(),
        }
    }

    /// The flux of one variable, defaulting to zero when absent.
    pub fn value(&self, id: &str) -> f64 {
        self.fluxes.get(id).copied().unwrap_or(0.0)
    }
}

/// The external LP solver, consumed as a black box.
///
/// Calls are blocking and potentially expensive; all failure modes surface as
/// [`SolverStatus`] values in the returned solution.
pub trait LpOracle {
    fn optimize(&self, problem: &LinearProblem) -> LpSolution;
}
