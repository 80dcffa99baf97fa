//! Minimum-cardinality (or minimum-mass) growth-medium search.
//!
//! The exact problem is a MILP; since the oracle is a pure LP solver, opening
//! decisions are approximated with continuous indicator variables in `[0, 1]`
//! coupled to uptake (`v + max_uptake·y ≥ 0`), followed by a greedy pruning pass
//! that removes every exchange the growth floor can do without, and an optional
//! validation solve restricted to exactly the returned selection.

use crate::core::lp::{ConstraintOp, LinearProblem, LpOracle, Sense, SolverStatus};
use crate::core::models::model::MetabolicModel;
use crate::engine::config::ScoreConfig;
use tracing::{debug, instrument, warn};

/// Outcome of a minimal-medium search.
#[derive(Debug, Clone, PartialEq)]
pub struct MinimalMedium {
    /// Selected exchange reactions, in candidate order. Empty on failure.
    pub exchanges: Vec<String>,
    pub status: SolverStatus,
    /// Selection cost: count, or summed molecular mass when mass-weighted.
    pub objective: Option<f64>,
}

impl MinimalMedium {
    pub fn failed(status: SolverStatus) -> Self {
        Self {
            exchanges: Vec::new(),
            status,
            objective: None,
        }
    }

    pub fn contains(&self, exchange: &str) -> bool {
        self.exchanges.iter().any(|e| e == exchange)
    }
}

/// Finds a minimal subset of `candidates` that must stay open, each up to
/// `max_uptake`, for every reaction in `growth` to reach the growth floor.
///
/// Candidates outside the returned selection end up closed for uptake; exchange
/// reactions that are not candidates keep whatever bounds the applied
/// environment gave them. An infeasible search returns an empty selection with
/// the solver's verdict — callers must treat that as data, not as a crash.
#[instrument(skip_all, name = "minimal_medium_task", fields(model = %model.id, candidates = candidates.len()))]
pub fn run(
    model: &MetabolicModel,
    growth: &[String],
    candidates: &[String],
    config: &ScoreConfig,
    oracle: &dyn LpOracle,
) -> MinimalMedium {
    let mut problem = LinearProblem::from_model(model);
    problem.sense = Sense::Minimize;
    for g in growth {
        problem.floor(g, config.min_growth);
    }

    for candidate in candidates {
        let upper = problem.bounds(candidate).map(|(_, ub)| ub).unwrap_or(0.0);
        problem.set_bounds(candidate, -config.max_uptake, upper);
        let indicator = indicator_id(candidate);
        problem.add_variable(&indicator, 0.0, 1.0);
        problem.set_objective_coeff(&indicator, weight_of(model, candidate, config));
        // y = 0 closes uptake; y = 1 admits the full uptake magnitude
        problem.add_constraint(
            [(candidate.clone(), 1.0), (indicator, config.max_uptake)],
            ConstraintOp::Ge,
            0.0,
        );
    }

    let relaxed = oracle.optimize(&problem);
    if !relaxed.status.is_optimal() {
        debug!(status = %relaxed.status, "no feasible medium selection");
        return MinimalMedium::failed(relaxed.status);
    }

    let mut selected: Vec<String> = candidates
        .iter()
        .filter(|c| relaxed.value(&indicator_id(c)) > config.flux_epsilon)
        .cloned()
        .collect();

    // The relaxation can open fractional spares; drop every exchange the growth
    // floor survives without, in deterministic candidate order.
    let mut index = 0;
    while index < selected.len() {
        let mut trial = selected.clone();
        trial.remove(index);
        if grows_on(model, growth, candidates, &trial, config, oracle) {
            selected.remove(index);
        } else {
            index += 1;
        }
    }

    let mut status = SolverStatus::Optimal;
    if config.validate && !grows_on(model, growth, candidates, &selected, config, oracle) {
        warn!(
            model = %model.id,
            "validation solve failed to reproduce growth on the selected medium"
        );
        status = SolverStatus::Suboptimal;
    }

    let objective = selected
        .iter()
        .map(|c| weight_of(model, c, config))
        .sum::<f64>();
    debug!(selected = selected.len(), objective, "minimal medium found");
    MinimalMedium {
        exchanges: selected,
        status,
        objective: Some(objective),
    }
}

/// Whether the growth floor is attainable with exactly `open` candidates open.
fn grows_on(
    model: &MetabolicModel,
    growth: &[String],
    candidates: &[String],
    open: &[String],
    config: &ScoreConfig,
    oracle: &dyn LpOracle,
) -> bool {
    let mut problem = LinearProblem::from_model(model);
    for candidate in candidates {
        let upper = problem.bounds(candidate).map(|(_, ub)| ub).unwrap_or(0.0);
        let lower = if open.contains(candidate) {
            -config.max_uptake
        } else {
            0.0
        };
        problem.set_bounds(candidate, lower, upper);
    }
    for g in growth {
        problem.floor(g, config.min_growth);
    }
    problem.set_objective(growth.iter().map(|g| (g.as_str(), 1.0)));
    matches!(
        oracle.optimize(&problem).status,
        SolverStatus::Optimal | SolverStatus::Unbounded
    )
}

fn indicator_id(candidate: &str) -> String {
    format!("open::{candidate}")
}

fn weight_of(model: &MetabolicModel, candidate: &str, config: &ScoreConfig) -> f64 {
    if !config.mass_weighted {
        return 1.0;
    }
    model
        .reaction(candidate)
        .and_then(|r| r.exchange_metabolite())
        .and_then(|m| model.metabolite(m))
        .and_then(|m| m.weight)
        .unwrap_or(1.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::Environment;
    use crate::core::lp::MiniLpOracle;
    use crate::core::models::model::Metabolite;
    use crate::core::models::reaction::Reaction;

    /// An organism that strictly requires compounds A and B; C is a decoy.
    fn picky_organism() -> MetabolicModel {
        let mut model = MetabolicModel::new("picky");
        model.add_reaction(Reaction::exchange("R_EX_a_e", "M_a_e", -10.0, 1000.0));
        model.add_reaction(Reaction::exchange("R_EX_b_e", "M_b_e", -10.0, 1000.0));
        model.add_reaction(Reaction::exchange("R_EX_c_e", "M_c_e", -10.0, 1000.0));
        model.add_reaction(Reaction::new(
            "R_biomass",
            [("M_a_e", -1.0), ("M_b_e", -1.0)],
            0.0,
            1000.0,
        ));
        model.detect_biomass().unwrap();
        model
    }

    fn config() -> ScoreConfig {
        ScoreConfig::builder().build().unwrap()
    }

    #[test]
    fn finds_the_exact_required_set() {
        let mut model = picky_organism();
        let candidates: Vec<String> = ["R_EX_a_e", "R_EX_b_e", "R_EX_c_e"]
            .map(String::from)
            .to_vec();
        Environment::from_reactions(candidates.clone(), 10.0).apply(&mut model);

        let medium = run(
            &model,
            &["R_biomass".to_string()],
            &candidates,
            &config(),
            &MiniLpOracle::new(),
        );
        assert_eq!(medium.status, SolverStatus::Optimal);
        assert_eq!(medium.exchanges, vec!["R_EX_a_e", "R_EX_b_e"]);
        assert_eq!(medium.objective, Some(2.0));
    }

    #[test]
    fn insufficient_candidates_fail_without_a_selection() {
        let mut model = picky_organism();
        // compound B cannot be opened, so no selection supports growth
        let candidates = vec!["R_EX_a_e".to_string(), "R_EX_c_e".to_string()];
        Environment::from_reactions(candidates.clone(), 10.0).apply(&mut model);

        let medium = run(
            &model,
            &["R_biomass".to_string()],
            &candidates,
            &config(),
            &MiniLpOracle::new(),
        );
        assert_ne!(medium.status, SolverStatus::Optimal);
        assert!(medium.exchanges.is_empty());
        assert_eq!(medium.objective, None);
    }

    #[test]
    fn mass_weighting_prefers_the_lighter_route() {
        // growth runs on either heavy H or light L; mass weighting must pick L
        let mut model = MetabolicModel::new("chooser");
        model.add_metabolite(Metabolite::new("M_h_e").with_weight(180.0));
        model.add_metabolite(Metabolite::new("M_l_e").with_weight(18.0));
        model.add_reaction(Reaction::exchange("R_EX_h_e", "M_h_e", -10.0, 1000.0));
        model.add_reaction(Reaction::exchange("R_EX_l_e", "M_l_e", -10.0, 1000.0));
        model.add_reaction(Reaction::new(
            "R_h_to_x",
            [("M_h_e", -1.0), ("M_x_c", 1.0)],
            0.0,
            1000.0,
        ));
        model.add_reaction(Reaction::new(
            "R_l_to_x",
            [("M_l_e", -1.0), ("M_x_c", 1.0)],
            0.0,
            1000.0,
        ));
        model.add_reaction(Reaction::new(
            "R_biomass",
            [("M_x_c", -1.0)],
            0.0,
            1000.0,
        ));
        model.detect_biomass().unwrap();

        let candidates = vec!["R_EX_h_e".to_string(), "R_EX_l_e".to_string()];
        Environment::from_reactions(candidates.clone(), 10.0).apply(&mut model);
        let config = ScoreConfig::builder().mass_weighted(true).build().unwrap();

        let medium = run(
            &model,
            &["R_biomass".to_string()],
            &candidates,
            &config,
            &MiniLpOracle::new(),
        );
        assert_eq!(medium.status, SolverStatus::Optimal);
        assert_eq!(medium.exchanges, vec!["R_EX_l_e"]);
        assert_eq!(medium.objective, Some(18.0));
    }
}
