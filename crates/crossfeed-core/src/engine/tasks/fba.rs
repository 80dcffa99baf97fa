use crate::core::lp::{LinearProblem, LpOracle, LpSolution};
use crate::core::models::community::CommunityModel;
use crate::core::models::model::MetabolicModel;
use crate::engine::error::EngineError;
use tracing::{debug, instrument};

/// Maximizes a single-organism model's biomass objective.
#[instrument(skip_all, name = "fba_task", fields(model = %model.id))]
pub fn run(model: &MetabolicModel, oracle: &dyn LpOracle) -> Result<LpSolution, EngineError> {
    let biomass = model
        .biomass_reaction
        .as_deref()
        .ok_or_else(|| EngineError::MissingObjective {
            model: model.id.clone(),
        })?;
    let mut problem = LinearProblem::from_model(model);
    problem.set_objective([(biomass, 1.0)]);
    let solution = oracle.optimize(&problem);
    debug!(status = %solution.status, objective = ?solution.objective, "fba finished");
    Ok(solution)
}

/// Maximizes the summed biomass of every community member.
#[instrument(skip_all, name = "community_fba_task", fields(community = %community.id))]
pub fn run_community(community: &CommunityModel, oracle: &dyn LpOracle) -> LpSolution {
    let mut problem = LinearProblem::from_model(&community.model);
    problem.set_objective(community.biomass_of.values().map(|id| (id.as_str(), 1.0)));
    let solution = oracle.optimize(&problem);
    debug!(status = %solution.status, objective = ?solution.objective, "community fba finished");
    solution
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lp::{MiniLpOracle, SolverStatus};
    use crate::core::models::reaction::Reaction;
    use approx::assert_relative_eq;

    fn glucose_grower() -> MetabolicModel {
        let mut model = MetabolicModel::new("grower");
        model.add_reaction(Reaction::exchange("R_EX_glc_e", "M_glc_e", -10.0, 1000.0));
        model.add_reaction(Reaction::new(
            "R_biomass",
            [("M_glc_e", -1.0)],
            0.0,
            1000.0,
        ));
        model.detect_biomass().unwrap();
        model
    }

    #[test]
    fn growth_is_limited_by_uptake() {
        let model = glucose_grower();
        let solution = run(&model, &MiniLpOracle::new()).unwrap();
        assert_eq!(solution.status, SolverStatus::Optimal);
        assert_relative_eq!(solution.objective.unwrap(), 10.0, epsilon = 1e-9);
        assert_relative_eq!(solution.value("R_EX_glc_e"), -10.0, epsilon = 1e-9);
    }

    #[test]
    fn missing_objective_is_a_typed_error() {
        let mut model = glucose_grower();
        model.biomass_reaction = None;
        assert!(matches!(
            run(&model, &MiniLpOracle::new()),
            Err(EngineError::MissingObjective { .. })
        ));
    }
}
