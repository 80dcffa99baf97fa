use crate::core::environment::Environment;
use crate::core::lp::{LpOracle, SolverStatus};
use crate::core::models::community::CommunityModel;
use crate::core::models::model::MetabolicModel;
use crate::engine::config::{ScoreConfig, ScoreSelection};
use crate::engine::error::EngineError;
use crate::engine::tasks::alternate_optima::{self, ScoreMap};
use crate::engine::tasks::fba;
use crate::engine::tasks::interaction_potential;
use crate::engine::tasks::minimal_medium::{self, MinimalMedium};
use crate::engine::tasks::resource_overlap;
use indexmap::{IndexMap, IndexSet};
use tracing::{info, instrument};

/// One SMETANA cross-feeding triple: the likelihood that `donor` feeds
/// `metabolite` to `receiver`.
#[derive(Debug, Clone, PartialEq)]
pub struct SmetanaTriple {
    pub receiver: String,
    pub donor: String,
    pub metabolite: String,
    pub scs: Option<f64>,
    pub mus: Option<f64>,
    pub mps: Option<f64>,
    /// `scs · mus · mps`; `None` when any factor is undefined.
    pub score: Option<f64>,
}

/// Immutable scores of one (community, medium) evaluation.
#[derive(Debug, Clone, PartialEq)]
pub struct ScoreResult {
    pub community: String,
    pub medium: String,
    pub organisms: Vec<String>,
    pub fba_status: SolverStatus,
    pub fba_objective: Option<f64>,
    /// Each member's biomass flux in the community FBA optimum.
    pub organism_growth: IndexMap<String, f64>,
    pub minimal_medium: MinimalMedium,
    pub mip: Option<f64>,
    pub nip: Option<f64>,
    pub mro: Option<f64>,
    pub scs: ScoreMap,
    pub mus: ScoreMap,
    pub mps: ScoreMap,
    pub smetana: Vec<SmetanaTriple>,
    /// Sum over all defined triples; `None` when no pair had defined factors.
    pub smetana_total: Option<f64>,
}

/// Evaluates one community on one growth medium.
///
/// Solves are strictly sequential: community FBA, then the community and
/// isolated minimal media, then MIP/MRO, and only then alternate-optima
/// sampling on the reduced medium (community minimal medium plus the
/// always-present compounds). `members` must be the single-organism models the
/// community was merged from, in merge order.
#[instrument(skip_all, name = "score_workflow", fields(community = %community.id, medium = medium_id))]
pub fn run(
    community: &CommunityModel,
    members: &[MetabolicModel],
    medium_id: &str,
    environment: &Environment,
    always_present: &Environment,
    selection: ScoreSelection,
    config: &ScoreConfig,
    oracle: &dyn LpOracle,
) -> Result<ScoreResult, EngineError> {
    for member in members {
        if !community.biomass_of.contains_key(&member.id) {
            return Err(EngineError::UnknownOrganism {
                organism: member.id.clone(),
                community: community.id.clone(),
            });
        }
    }

    let mut working = community.clone();
    environment.apply(&mut working.model);

    // community growth on the full medium
    let fba = fba::run_community(&working, oracle);
    let organism_growth: IndexMap<String, f64> = working
        .biomass_of
        .iter()
        .map(|(organism, biomass)| (organism.clone(), fba.value(biomass)))
        .collect();

    // minimal medium feeds both score families
    let growth: Vec<String> = working.biomass_of.values().cloned().collect();
    let candidates: Vec<String> = working
        .community_exchanges
        .keys()
        .filter(|id| environment.contains(id))
        .cloned()
        .collect();
    let medium = minimal_medium::run(&working.model, &growth, &candidates, config, oracle);

    let (mip, nip, mro) = if selection.global() {
        let isolated = interaction_potential::isolated_media(members, environment, config, oracle)?;
        let potential = interaction_potential::run(&medium, &isolated);
        (potential.mip, potential.nip, resource_overlap::run(&isolated))
    } else {
        (None, None, None)
    };

    let (scs, mus, mps) = if selection.detailed() {
        // sampling must see the already-reduced medium
        let reduced = Environment::from_reactions(medium.exchanges.iter().cloned(), config.max_uptake)
            .union(always_present);
        let mut sampled = community.clone();
        reduced.apply(&mut sampled.model);
        (
            alternate_optima::species_coupling(&sampled, config, oracle),
            alternate_optima::metabolite_uptake(&sampled, config, oracle),
            alternate_optima::metabolite_production(&sampled, config, oracle),
        )
    } else {
        (ScoreMap::new(), ScoreMap::new(), ScoreMap::new())
    };

    let (smetana, smetana_total) = aggregate(&community.organisms, &scs, &mus, &mps);

    info!(
        fba = %fba.status,
        medium = %medium.status,
        triples = smetana.len(),
        "community evaluation finished"
    );
    Ok(ScoreResult {
        community: community.id.clone(),
        medium: medium_id.to_string(),
        organisms: community.organisms.clone(),
        fba_status: fba.status,
        fba_objective: fba.objective,
        organism_growth,
        minimal_medium: medium,
        mip,
        nip,
        mro,
        scs,
        mus,
        mps,
        smetana,
        smetana_total,
    })
}

/// Combines SCS, MUS, and MPS into SMETANA triples.
///
/// For every ordered pair `(receiver, donor)` and every metabolite either the
/// receiver can take up or the donor can produce, the triple score is the
/// product of the three factors. A pair with any undefined factor emits failed
/// triples (`score: None`) over the metabolites that are still enumerable —
/// never silent zeros. Zero-valued triples are omitted from the list but a
/// defined pair still counts toward the total.
pub fn aggregate(
    organisms: &[String],
    scs: &ScoreMap,
    mus: &ScoreMap,
    mps: &ScoreMap,
) -> (Vec<SmetanaTriple>, Option<f64>) {
    let mut triples = Vec::new();
    let mut total = 0.0;
    let mut any_defined = false;

    for receiver in organisms {
        for donor in organisms {
            if receiver == donor {
                continue;
            }
            let scs_cell = defined(scs, receiver).map(|m| value_or_zero(m, donor));
            let mus_map = defined(mus, receiver);
            let mps_map = defined(mps, donor);

            let mut metabolites: IndexSet<&str> = IndexSet::new();
            if let Some(m) = mus_map {
                metabolites.extend(m.keys().map(String::as_str));
            }
            if let Some(m) = mps_map {
                metabolites.extend(m.keys().map(String::as_str));
            }

            let pair_defined = scs_cell.is_some() && mus_map.is_some() && mps_map.is_some();
            if pair_defined {
                any_defined = true;
            }

            for metabolite in metabolites {
                let mus_cell = mus_map.map(|m| value_or_zero(m, metabolite));
                let mps_cell = mps_map.map(|m| value_or_zero(m, metabolite));
                let score = match (scs_cell, mus_cell, mps_cell) {
                    (Some(s), Some(u), Some(p)) => Some(s * u * p),
                    _ => None,
                };
                match score {
                    Some(s) if s > 0.0 => {
                        total += s;
                        triples.push(SmetanaTriple {
                            receiver: receiver.clone(),
                            donor: donor.clone(),
                            metabolite: metabolite.to_string(),
                            scs: scs_cell,
                            mus: mus_cell,
                            mps: mps_cell,
                            score,
                        });
                    }
                    Some(_) => {}
                    None => triples.push(SmetanaTriple {
                        receiver: receiver.clone(),
                        donor: donor.clone(),
                        metabolite: metabolite.to_string(),
                        scs: scs_cell,
                        mus: mus_cell,
                        mps: mps_cell,
                        score,
                    }),
                }
            }
        }
    }

    (triples, any_defined.then_some(total))
}

fn defined<'a>(map: &'a ScoreMap, key: &str) -> Option<&'a IndexMap<String, f64>> {
    map.get(key).and_then(|cell| cell.as_ref())
}

fn value_or_zero(map: &IndexMap<String, f64>, key: &str) -> f64 {
    map.get(key).copied().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::lp::MiniLpOracle;
    use crate::core::models::reaction::Reaction;
    use approx::assert_relative_eq;

    /// Producer A grows on glucose and must secrete acid; consumer B grows
    /// only on that acid.
    fn members() -> Vec<MetabolicModel> {
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
        vec![a, b]
    }

    fn deterministic_config() -> ScoreConfig {
        ScoreConfig::builder().n_solutions(1).build().unwrap()
    }

    #[test]
    fn obligate_cross_feeding_scores_a_perfect_triple() {
        let members = members();
        let community = CommunityModel::merge("pair", &members).unwrap();
        let environment = Environment::from_reactions(["R_EX_glc_e"], 10.0);

        let result = run(
            &community,
            &members,
            "glucose",
            &environment,
            &Environment::empty(),
            ScoreSelection::All,
            &deterministic_config(),
            &MiniLpOracle::new(),
        )
        .unwrap();

        assert_eq!(result.fba_status, SolverStatus::Optimal);
        assert_eq!(result.minimal_medium.exchanges, vec!["R_EX_glc_e"]);

        let triple = result
            .smetana
            .iter()
            .find(|t| t.receiver == "B" && t.donor == "A" && t.metabolite == "M_ac_e")
            .expect("B<-A acid triple");
        assert_relative_eq!(triple.scs.unwrap(), 1.0);
        assert_relative_eq!(triple.mus.unwrap(), 1.0);
        assert_relative_eq!(triple.mps.unwrap(), 1.0);
        assert_relative_eq!(triple.score.unwrap(), 1.0);
        assert_relative_eq!(result.smetana_total.unwrap(), 1.0);
    }

    #[test]
    fn global_selection_skips_detailed_scores() {
        let members = members();
        let community = CommunityModel::merge("pair", &members).unwrap();
        let environment = Environment::from_reactions(["R_EX_glc_e"], 10.0);

        let result = run(
            &community,
            &members,
            "glucose",
            &environment,
            &Environment::empty(),
            ScoreSelection::Global,
            &deterministic_config(),
            &MiniLpOracle::new(),
        )
        .unwrap();

        assert!(result.smetana.is_empty());
        assert_eq!(result.smetana_total, None);
        assert!(result.scs.is_empty());
        // B cannot grow alone on glucose, so the isolated baseline fails
        assert_eq!(result.mip, None);
        assert_eq!(result.mro, None);
    }

    #[test]
    fn aggregate_marks_failed_pairs_not_zero() {
        let organisms = vec!["A".to_string(), "B".to_string()];
        let mut scs = ScoreMap::new();
        scs.insert("A".into(), Some(IndexMap::from([("B".into(), 0.0)])));
        scs.insert("B".into(), None); // B's growth LP was infeasible
        let mut mus = ScoreMap::new();
        mus.insert("A".into(), Some(IndexMap::from([("M_x_e".into(), 1.0)])));
        mus.insert("B".into(), None);
        let mut mps = ScoreMap::new();
        mps.insert("A".into(), Some(IndexMap::from([("M_x_e".into(), 1.0)])));
        mps.insert("B".into(), None);

        let (triples, total) = aggregate(&organisms, &scs, &mus, &mps);
        assert!(
            triples
                .iter()
                .all(|t| t.receiver == "B" || t.donor == "B"),
            "only pairs touching the failed organism appear"
        );
        assert!(triples.iter().all(|t| t.score.is_none()));
        // pair A<-B touched the failed organism; no pair was fully defined
        assert_eq!(total, None);
    }

    #[test]
    fn aggregate_is_the_product_of_factors() {
        let organisms = vec!["A".to_string(), "B".to_string()];
        let mut scs = ScoreMap::new();
        scs.insert("A".into(), Some(IndexMap::from([("B".into(), 0.5)])));
        scs.insert("B".into(), Some(IndexMap::from([("A".into(), 0.0)])));
        let mut mus = ScoreMap::new();
        mus.insert("A".into(), Some(IndexMap::from([("M_x_e".into(), 0.5)])));
        mus.insert("B".into(), Some(IndexMap::new()));
        let mut mps = ScoreMap::new();
        mps.insert("A".into(), Some(IndexMap::new()));
        mps.insert("B".into(), Some(IndexMap::from([("M_x_e".into(), 1.0)])));

        let (triples, total) = aggregate(&organisms, &scs, &mus, &mps);
        assert_eq!(triples.len(), 1);
        let triple = &triples[0];
        assert_eq!((triple.receiver.as_str(), triple.donor.as_str()), ("A", "B"));
        assert_relative_eq!(triple.score.unwrap(), 0.25);
        assert_relative_eq!(total.unwrap(), 0.25);
    }
}
