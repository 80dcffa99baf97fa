use super::problem::{ConstraintOp, LinearProblem};
use super::{LpOracle, LpSolution, Sense, SolverStatus};
use indexmap::IndexMap;
use tracing::trace;

/// LP oracle backed by the pure-Rust `minilp` simplex solver.
///
/// Stateless; every call translates the problem afresh, so the adapter is safe to
/// share across sequential solves.
#[derive(Debug, Clone, Copy, Default)]
pub struct MiniLpOracle;

impl MiniLpOracle {
    pub fn new() -> Self {
        Self
    }
}

impl LpOracle for MiniLpOracle {
    fn optimize(&self, problem: &LinearProblem) -> LpSolution {
        let direction = match problem.sense {
            Sense::Maximize => minilp::OptimizationDirection::Maximize,
            Sense::Minimize => minilp::OptimizationDirection::Minimize,
        };

        // crossed bounds (e.g. a growth floor above the variable's ceiling)
        // make the program trivially infeasible; the backend would reject them
        if problem.variables().any(|(_, spec)| spec.lower > spec.upper) {
            return LpSolution::failed(SolverStatus::Infeasible);
        }

        let mut lp = minilp::Problem::new(direction);
        let mut handles: IndexMap<&str, minilp::Variable> =
            IndexMap::with_capacity(problem.num_variables());
        for (id, spec) in problem.variables() {
            let handle = lp.add_var(spec.objective, (spec.lower, spec.upper));
            handles.insert(id, handle);
        }

        for constraint in problem.constraints() {
            let mut expr = minilp::LinearExpr::empty();
            let mut populated = false;
            for (id, coeff) in &constraint.terms {
                debug_assert!(handles.contains_key(id.as_str()), "unknown term '{id}'");
                if let Some(&handle) = handles.get(id.as_str()) {
                    expr.add(handle, *coeff);
                    populated = true;
                }
            }
            if !populated {
                continue;
            }
            let op = match constraint.op {
                ConstraintOp::Eq => minilp::ComparisonOp::Eq,
                ConstraintOp::Le => minilp::ComparisonOp::Le,
                ConstraintOp::Ge => minilp::ComparisonOp::Ge,
            };
            lp.add_constraint(expr, op, constraint.rhs);
        }

        match lp.solve() {
            Ok(solution) => {
                trace!(objective = solution.objective(), "lp solve optimal");
                LpSolution {
                    status: SolverStatus::Optimal,
                    objective: Some(solution.objective()),
                    fluxes: handles
                        .iter()
                        .map(|(id, &handle)| (id.to_string(), solution[handle]))
                        .collect(),
                }
            }
            Err(minilp::Error::Infeasible) => LpSolution::failed(SolverStatus::Infeasible),
            Err(minilp::Error::Unbounded) => LpSolution::failed(SolverStatus::Unbounded),
        }
    }
}
