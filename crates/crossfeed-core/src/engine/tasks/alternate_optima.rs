//! Alternate-optima sampling of exchange activity.
//!
//! Optimal flux distributions are degenerate: many solutions reach the same
//! growth optimum, and a single point solution understates which exchanges *can*
//! be active. Each score below therefore repeats `n_solutions` perturbed solves
//! and reports activity frequencies in `[0, 1]`.
//!
//! The perturbation sequence is part of the public contract: trial `t` of a run
//! configured with base seed `s` draws its objective weights from
//! `StdRng::seed_from_u64(s + t)`, uniformly in `(0, 1]`, in the deterministic
//! iteration order of the weighted variables. Equal configuration therefore
//! replays equal trials.
//!
//! A score cell is `None` — failed, never zero — whenever the underlying
//! organism cannot reach the growth floor in the tested environment.

use crate::core::lp::{ConstraintOp, LinearProblem, LpOracle, Sense, SolverStatus};
use crate::core::models::community::CommunityModel;
use crate::engine::config::ScoreConfig;
use indexmap::{IndexMap, IndexSet};
use rand::rngs::StdRng;
use rand::{Rng, SeedableRng};
use tracing::{debug, instrument, warn};

/// Per-organism score map: outer key is the organism (receiver), `None` marks an
/// organism whose growth LP was infeasible; inner keys are donors or pool
/// metabolites depending on the score.
pub type ScoreMap = IndexMap<String, Option<IndexMap<String, f64>>>;

fn trial_rng(config: &ScoreConfig, trial: usize) -> StdRng {
    StdRng::seed_from_u64(config.seed.wrapping_add(trial as u64))
}

/// A weight in `(0, 1]`, never zero, so every term keeps minimization pressure.
fn perturbation_weight(rng: &mut StdRng) -> f64 {
    1.0 - rng.gen_range(0.0..1.0)
}

/// Species Coupling Score: how often a receiver's viability requires each donor.
///
/// For each receiver, its biomass is floored at the growth floor and each trial
/// minimizes the randomly weighted biomass of all other members. Donors whose
/// biomass stays active under that minimization pressure are required in that
/// trial; the score is the required-trial fraction.
#[instrument(skip_all, name = "species_coupling_task", fields(community = %community.id))]
pub fn species_coupling(
    community: &CommunityModel,
    config: &ScoreConfig,
    oracle: &dyn LpOracle,
) -> ScoreMap {
    let base = LinearProblem::from_model(&community.model);
    let mut scores = ScoreMap::new();

    for receiver in &community.organisms {
        let receiver_biomass = &community.biomass_of[receiver.as_str()];
        let mut floored = base.clone();
        floored.floor(receiver_biomass, config.min_growth);

        if !feasible(&floored, receiver_biomass, oracle) {
            warn!(receiver = %receiver, "growth floor infeasible; coupling undefined");
            scores.insert(receiver.clone(), None);
            continue;
        }

        let donors: Vec<&String> = community
            .organisms
            .iter()
            .filter(|o| *o != receiver)
            .collect();
        let mut counts: IndexMap<String, usize> =
            donors.iter().map(|d| (d.to_string(), 0)).collect();
        let mut successful = 0usize;

        for trial in 0..config.n_solutions {
            let mut rng = trial_rng(config, trial);
            let mut problem = floored.clone();
            problem.sense = Sense::Minimize;
            for donor in &donors {
                let weight = perturbation_weight(&mut rng);
                problem.set_objective_coeff(&community.biomass_of[donor.as_str()], weight);
            }

            let solution = oracle.optimize(&problem);
            if !solution.status.is_optimal() {
                continue;
            }
            successful += 1;
            for donor in &donors {
                if solution.value(&community.biomass_of[donor.as_str()]) > config.flux_epsilon {
                    if let Some(count) = counts.get_mut(donor.as_str()) {
                        *count += 1;
                    }
                }
            }
        }

        if successful == 0 {
            scores.insert(receiver.clone(), None);
            continue;
        }
        debug!(receiver = %receiver, trials = successful, "coupling sampled");
        scores.insert(
            receiver.clone(),
            Some(
                counts
                    .into_iter()
                    .map(|(donor, count)| (donor, count as f64 / successful as f64))
                    .collect(),
            ),
        );
    }
    scores
}

/// Metabolite Uptake Score: how often a growing organism imports each pool
/// metabolite.
///
/// Each trial minimizes randomly weighted uptake magnitudes (auxiliary
/// `u ≥ −v, u ≥ 0` per shuttle), so only imports the growth floor genuinely
/// needs stay active; the score is the active-trial fraction per metabolite.
#[instrument(skip_all, name = "metabolite_uptake_task", fields(community = %community.id))]
pub fn metabolite_uptake(
    community: &CommunityModel,
    config: &ScoreConfig,
    oracle: &dyn LpOracle,
) -> ScoreMap {
    let base = LinearProblem::from_model(&community.model);
    let mut scores = ScoreMap::new();

    for organism in &community.organisms {
        let biomass = &community.biomass_of[organism.as_str()];
        let shuttles = &community.organism_exchanges[organism.as_str()];
        let mut floored = base.clone();
        floored.floor(biomass, config.min_growth);

        if !feasible(&floored, biomass, oracle) {
            warn!(organism = %organism, "growth floor infeasible; uptake undefined");
            scores.insert(organism.clone(), None);
            continue;
        }

        let mut augmented = floored;
        for shuttle_id in shuttles.keys() {
            let magnitude = uptake_id(shuttle_id);
            augmented.add_variable(&magnitude, 0.0, f64::INFINITY);
            augmented.add_constraint(
                [(magnitude, 1.0), (shuttle_id.clone(), 1.0)],
                ConstraintOp::Ge,
                0.0,
            );
        }
        augmented.sense = Sense::Minimize;

        let mut counts: IndexMap<String, usize> = shuttles
            .values()
            .map(|d| (d.pool_metabolite.clone(), 0))
            .collect();
        let mut successful = 0usize;

        for trial in 0..config.n_solutions {
            let mut rng = trial_rng(config, trial);
            let mut problem = augmented.clone();
            for shuttle_id in shuttles.keys() {
                let weight = perturbation_weight(&mut rng);
                problem.set_objective_coeff(&uptake_id(shuttle_id), weight);
            }

            let solution = oracle.optimize(&problem);
            if !solution.status.is_optimal() {
                continue;
            }
            successful += 1;
            let mut active: IndexSet<&str> = IndexSet::new();
            for (shuttle_id, descriptor) in shuttles {
                if solution.value(shuttle_id) < -config.flux_epsilon {
                    active.insert(descriptor.pool_metabolite.as_str());
                }
            }
            for metabolite in active {
                if let Some(count) = counts.get_mut(metabolite) {
                    *count += 1;
                }
            }
        }

        if successful == 0 {
            scores.insert(organism.clone(), None);
            continue;
        }
        debug!(organism = %organism, trials = successful, "uptake sampled");
        scores.insert(
            organism.clone(),
            Some(
                counts
                    .into_iter()
                    .map(|(met, count)| (met, count as f64 / successful as f64))
                    .collect(),
            ),
        );
    }
    scores
}

/// Metabolite Production Score: whether a growing organism can export each pool
/// metabolite anywhere in the feasible space (binary per metabolite).
#[instrument(skip_all, name = "metabolite_production_task", fields(community = %community.id))]
pub fn metabolite_production(
    community: &CommunityModel,
    config: &ScoreConfig,
    oracle: &dyn LpOracle,
) -> ScoreMap {
    let base = LinearProblem::from_model(&community.model);
    let mut scores = ScoreMap::new();

    for organism in &community.organisms {
        let biomass = &community.biomass_of[organism.as_str()];
        let shuttles = &community.organism_exchanges[organism.as_str()];
        let mut floored = base.clone();
        floored.floor(biomass, config.min_growth);

        if !feasible(&floored, biomass, oracle) {
            warn!(organism = %organism, "growth floor infeasible; production undefined");
            scores.insert(organism.clone(), None);
            continue;
        }

        let mut produced: IndexMap<String, f64> = shuttles
            .values()
            .map(|d| (d.pool_metabolite.clone(), 0.0))
            .collect();
        for (shuttle_id, descriptor) in shuttles {
            let mut problem = floored.clone();
            problem.sense = Sense::Maximize;
            problem.set_objective([(shuttle_id.as_str(), 1.0)]);
            let solution = oracle.optimize(&problem);
            let exports = match solution.status {
                SolverStatus::Optimal => {
                    solution.objective.unwrap_or(0.0) > config.flux_epsilon
                }
                SolverStatus::Unbounded => true,
                _ => false,
            };
            if exports {
                produced.insert(descriptor.pool_metabolite.clone(), 1.0);
            }
        }
        scores.insert(organism.clone(), Some(produced));
    }
    scores
}

/// Whether a floored problem still admits any solution.
fn feasible(floored: &LinearProblem, probe_objective: &str, oracle: &dyn LpOracle) -> bool {
    let mut probe = floored.clone();
    probe.sense = Sense::Maximize;
    probe.set_objective([(probe_objective, 1.0)]);
    matches!(
        oracle.optimize(&probe).status,
        SolverStatus::Optimal | SolverStatus::Unbounded
    )
}

fn uptake_id(shuttle: &str) -> String {
    format!("uptake::{shuttle}")
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::environment::Environment;
    use crate::core::lp::MiniLpOracle;
    use crate::core::models::model::MetabolicModel;
    use crate::core::models::reaction::Reaction;
    use approx::assert_relative_eq;

    /// Producer A grows on glucose and secretes acid as an obligatory
    /// by-product; consumer B can only grow on that acid.
    fn cross_feeding_pair() -> CommunityModel {
        let mut a = MetabolicModel::new("A");
        a.add_reaction(Reaction::exchange("R_EX_glc_e", "M_glc_e", -10.0, 1000.0));
        a.add_reaction(Reaction::exchange("R_EX_ac_e", "M_ac_e", -10.0, 1000.0));
        a.add_reaction(Reaction::new(
            "R_biomass",
            [("M_glc_e", -1.0), ("M_ac_e", 1.0)],
            0.0,
            1000.0,
        ));
        a.detect_biomass().unwrap();

        let mut b = MetabolicModel::new("B");
        b.add_reaction(Reaction::exchange("R_EX_ac_e", "M_ac_e", -10.0, 1000.0));
        b.add_reaction(Reaction::new(
            "R_biomass",
            [("M_ac_e", -1.0)],
            0.0,
            1000.0,
        ));
        b.detect_biomass().unwrap();

        CommunityModel::merge("pair", &[a, b]).unwrap()
    }

    /// Only glucose comes from outside; acid moves between the members.
    fn glucose_only(community: &mut CommunityModel) {
        Environment::from_reactions(["R_EX_glc_e"], 10.0).apply(&mut community.model);
    }

    fn config(n_solutions: usize) -> ScoreConfig {
        ScoreConfig::builder().n_solutions(n_solutions).build().unwrap()
    }

    #[test]
    fn obligate_cross_feeding_couples_consumer_to_producer() {
        let mut community = cross_feeding_pair();
        glucose_only(&mut community);
        let scores = species_coupling(&community, &config(1), &MiniLpOracle::new());

        let of_b = scores["B"].as_ref().expect("B grows on secreted acid");
        assert_relative_eq!(of_b["A"], 1.0);
        // A needs no one: minimizing B's biomass shuts B off entirely
        let of_a = scores["A"].as_ref().expect("A grows on glucose");
        assert_relative_eq!(of_a["B"], 0.0);
    }

    #[test]
    fn consumer_uptakes_the_secreted_metabolite() {
        let mut community = cross_feeding_pair();
        glucose_only(&mut community);
        let scores = metabolite_uptake(&community, &config(1), &MiniLpOracle::new());

        let of_b = scores["B"].as_ref().expect("B grows");
        assert_relative_eq!(of_b["M_ac_e"], 1.0);
        let of_a = scores["A"].as_ref().expect("A grows");
        assert_relative_eq!(of_a["M_glc_e"], 1.0);
        // A never needs to import acid
        assert_relative_eq!(of_a["M_ac_e"], 0.0);
    }

    #[test]
    fn producer_can_export_the_by_product() {
        let mut community = cross_feeding_pair();
        glucose_only(&mut community);
        let scores = metabolite_production(&community, &config(1), &MiniLpOracle::new());

        let of_a = scores["A"].as_ref().expect("A grows");
        assert_relative_eq!(of_a["M_ac_e"], 1.0);
        // B consumes acid; it has nothing to export through its only shuttle
        let of_b = scores["B"].as_ref().expect("B grows");
        assert_relative_eq!(of_b["M_ac_e"], 0.0);
    }

    #[test]
    fn starved_organism_yields_failed_cells_not_zeros() {
        let mut community = cross_feeding_pair();
        // nothing from outside at all: neither organism can reach the floor
        Environment::empty().apply(&mut community.model);
        let oracle = MiniLpOracle::new();
        let cfg = config(1);

        assert!(species_coupling(&community, &cfg, &oracle)["B"].is_none());
        assert!(metabolite_uptake(&community, &cfg, &oracle)["A"].is_none());
        assert!(metabolite_production(&community, &cfg, &oracle)["A"].is_none());
    }

    #[test]
    fn sampling_is_replayable_for_a_fixed_seed() {
        let mut community = cross_feeding_pair();
        glucose_only(&mut community);
        let oracle = MiniLpOracle::new();
        let cfg = config(7);

        let first = species_coupling(&community, &cfg, &oracle);
        let second = species_coupling(&community, &cfg, &oracle);
        assert_eq!(first, second);
    }
}
