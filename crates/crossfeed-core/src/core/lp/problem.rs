use super::Sense;
use crate::core::models::model::MetabolicModel;
use indexmap::IndexMap;

/// Bounds and objective coefficient of one LP variable.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VariableSpec {
    pub lower: f64,
    pub upper: f64,
    pub objective: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConstraintOp {
    Eq,
    Le,
    Ge,
}

/// One linear constraint: `terms · x  op  rhs`.
#[derive(Debug, Clone, PartialEq)]
pub struct Constraint {
    pub terms: Vec<(String, f64)>,
    pub op: ConstraintOp,
    pub rhs: f64,
}

/// A linear program over named variables.
///
/// Variables are insertion-ordered so formulation is deterministic. Models map
/// onto programs with one variable per reaction and one steady-state equality per
/// metabolite; scoring tasks then override bounds and attach auxiliary variables
/// and constraints for indicator-style formulations.
#[derive(Debug, Clone, PartialEq)]
pub struct LinearProblem {
    pub sense: Sense,
    variables: IndexMap<String, VariableSpec>,
    constraints: Vec<Constraint>,
}

impl LinearProblem {
    pub fn new(sense: Sense) -> Self {
        Self {
            sense,
            variables: IndexMap::new(),
            constraints: Vec::new(),
        }
    }

    /// The steady-state flux polytope of a model, with no objective set.
    ///
    /// One variable per reaction, bounded by the reaction's flux bounds; one
    /// `S·v = 0` mass-balance equality per metabolite that appears in any
    /// reaction.
    pub fn from_model(model: &MetabolicModel) -> Self {
        let mut problem = Self::new(Sense::Maximize);
        for reaction in model.reactions.values() {
            problem.add_variable(&reaction.id, reaction.lower_bound, reaction.upper_bound);
        }

        let mut balances: IndexMap<&str, Vec<(String, f64)>> = IndexMap::new();
        for metabolite in model.metabolites.keys() {
            balances.insert(metabolite.as_str(), Vec::new());
        }
        for reaction in model.reactions.values() {
            for (metabolite, &coeff) in &reaction.stoichiometry {
                if let Some(terms) = balances.get_mut(metabolite.as_str()) {
                    terms.push((reaction.id.clone(), coeff));
                }
            }
        }
        for (_, terms) in balances {
            if !terms.is_empty() {
                problem.add_constraint(terms, ConstraintOp::Eq, 0.0);
            }
        }
        problem
    }

    /// Adds a variable with zero objective coefficient.
    pub fn add_variable(&mut self, id: impl Into<String>, lower: f64, upper: f64) {
        self.variables.insert(
            id.into(),
            VariableSpec {
                lower,
                upper,
                objective: 0.0,
            },
        );
    }

    /// Overrides the bounds of an existing variable. Unknown ids are a
    /// formulation bug, not a runtime condition.
    pub fn set_bounds(&mut self, id: &str, lower: f64, upper: f64) {
        debug_assert!(self.variables.contains_key(id), "unknown variable '{id}'");
        if let Some(spec) = self.variables.get_mut(id) {
            spec.lower = lower;
            spec.upper = upper;
        }
    }

    /// Tightens the lower bound of an existing variable upward.
    pub fn floor(&mut self, id: &str, lower: f64) {
        debug_assert!(self.variables.contains_key(id), "unknown variable '{id}'");
        if let Some(spec) = self.variables.get_mut(id) {
            spec.lower = spec.lower.max(lower);
        }
    }

    pub fn bounds(&self, id: &str) -> Option<(f64, f64)> {
        self.variables.get(id).map(|s| (s.lower, s.upper))
    }

    /// Replaces the objective with the given coefficients.
    pub fn set_objective<I, S>(&mut self, coefficients: I)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: AsRef<str>,
    {
        self.clear_objective();
        for (id, coeff) in coefficients {
            self.set_objective_coeff(id.as_ref(), coeff);
        }
    }

    pub fn set_objective_coeff(&mut self, id: &str, coefficient: f64) {
        debug_assert!(self.variables.contains_key(id), "unknown variable '{id}'");
        if let Some(spec) = self.variables.get_mut(id) {
            spec.objective = coefficient;
        }
    }

    pub fn clear_objective(&mut self) {
        for spec in self.variables.values_mut() {
            spec.objective = 0.0;
        }
    }

    pub fn add_constraint<I, S>(&mut self, terms: I, op: ConstraintOp, rhs: f64)
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        self.constraints.push(Constraint {
            terms: terms.into_iter().map(|(id, c)| (id.into(), c)).collect(),
            op,
            rhs,
        });
    }

    pub fn variables(&self) -> impl Iterator<Item = (&str, &VariableSpec)> {
        self.variables.iter().map(|(id, spec)| (id.as_str(), spec))
    }

    pub fn constraints(&self) -> &[Constraint] {
        &self.constraints
    }

    pub fn num_variables(&self) -> usize {
        self.variables.len()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::reaction::Reaction;

    #[test]
    fn from_model_builds_one_balance_per_metabolite() {
        let mut model = MetabolicModel::new("toy");
        model.add_reaction(Reaction::exchange("R_EX_a_e", "M_a_e", -10.0, 1000.0));
        model.add_reaction(Reaction::new(
            "R_conv",
            [("M_a_e", -1.0), ("M_b_c", 1.0)],
            0.0,
            1000.0,
        ));

        let problem = LinearProblem::from_model(&model);
        assert_eq!(problem.num_variables(), 2);
        assert_eq!(problem.constraints().len(), 2);
        assert!(
            problem
                .constraints()
                .iter()
                .all(|c| c.op == ConstraintOp::Eq && c.rhs == 0.0)
        );
        assert_eq!(problem.bounds("R_EX_a_e"), Some((-10.0, 1000.0)));
    }

    #[test]
    fn objective_replacement_clears_previous_coefficients() {
        let mut problem = LinearProblem::new(Sense::Maximize);
        problem.add_variable("x", 0.0, 1.0);
        problem.add_variable("y", 0.0, 1.0);
        problem.set_objective([("x", 1.0)]);
        problem.set_objective([("y", 2.0)]);
        let coeffs: Vec<f64> = problem.variables().map(|(_, s)| s.objective).collect();
        assert_eq!(coeffs, vec![0.0, 2.0]);
    }

    #[test]
    fn floor_only_tightens_upward() {
        let mut problem = LinearProblem::new(Sense::Maximize);
        problem.add_variable("x", 0.1, 1.0);
        problem.floor("x", 0.05);
        assert_eq!(problem.bounds("x"), Some((0.1, 1.0)));
        problem.floor("x", 0.5);
        assert_eq!(problem.bounds("x"), Some((0.5, 1.0)));
    }
}
