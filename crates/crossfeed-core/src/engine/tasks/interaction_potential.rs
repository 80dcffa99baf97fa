//! Metabolic Interaction Potential: how many external compounds cross-feeding
//! makes unnecessary, comparing the community's minimal medium against the union
//! of its members' isolated minimal media.

use super::minimal_medium::{self, MinimalMedium};
use crate::core::environment::Environment;
use crate::core::lp::LpOracle;
use crate::core::models::model::MetabolicModel;
use crate::engine::config::ScoreConfig;
use crate::engine::error::EngineError;
use indexmap::{IndexMap, IndexSet};
use tracing::{debug, instrument, warn};

/// Minimal media of every member grown alone on the same base environment.
#[derive(Debug, Clone, PartialEq)]
pub struct IsolatedMedia {
    pub media: IndexMap<String, MinimalMedium>,
}

impl IsolatedMedia {
    /// Whether every member's solve reached an optimal verdict.
    pub fn all_optimal(&self) -> bool {
        self.media.values().all(|m| m.status.is_optimal())
    }

    /// Union of all selected exchange reactions, in first-seen order.
    pub fn requirement_union(&self) -> IndexSet<&str> {
        self.media
            .values()
            .flat_map(|m| m.exchanges.iter().map(String::as_str))
            .collect()
    }
}

/// Solves one isolated minimal medium per member organism.
///
/// Isolation means the single-organism model with the base environment applied;
/// candidates are the environment's compounds present in that organism. Because
/// community exchange reactions keep their single-organism ids, the isolated and
/// community selections live in the same id space.
#[instrument(skip_all, name = "isolated_media_task", fields(members = members.len()))]
pub fn isolated_media(
    members: &[MetabolicModel],
    environment: &Environment,
    config: &ScoreConfig,
    oracle: &dyn LpOracle,
) -> Result<IsolatedMedia, EngineError> {
    let mut media = IndexMap::new();
    for member in members {
        let biomass =
            member
                .biomass_reaction
                .clone()
                .ok_or_else(|| EngineError::MissingObjective {
                    model: member.id.clone(),
                })?;
        let mut working = member.clone();
        environment.apply(&mut working);
        let candidates: Vec<String> = working
            .exchange_reactions()
            .filter(|r| environment.contains(&r.id))
            .map(|r| r.id.clone())
            .collect();
        let medium = minimal_medium::run(&working, &[biomass], &candidates, config, oracle);
        if !medium.status.is_optimal() {
            debug!(member = %member.id, status = %medium.status, "isolated medium failed");
        }
        media.insert(member.id.clone(), medium);
    }
    Ok(IsolatedMedia { media })
}

/// MIP and its normalized variant, from already-solved media.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct InteractionPotential {
    /// Compounds saved by cross-feeding; `None` when any participant solve failed.
    pub mip: Option<f64>,
    /// MIP divided by the non-interacting baseline size.
    pub nip: Option<f64>,
}

/// Computes MIP from the community's minimal medium and the isolated baselines.
///
/// Any failed participant solve makes the whole score undefined for this
/// community/medium; callers log and skip rather than abort.
pub fn run(community_medium: &MinimalMedium, isolated: &IsolatedMedia) -> InteractionPotential {
    if !community_medium.status.is_optimal() || !isolated.all_optimal() {
        return InteractionPotential {
            mip: None,
            nip: None,
        };
    }

    let union = isolated.requirement_union();
    let mut mip = union.len() as f64 - community_medium.exchanges.len() as f64;
    if mip < 0.0 {
        // the LP relaxation is not exact; a negative difference is noise
        warn!(
            union = union.len(),
            community = community_medium.exchanges.len(),
            "community medium larger than isolated union; clamping interaction potential to zero"
        );
        mip = 0.0;
    }
    let nip = if union.is_empty() {
        None
    } else {
        Some(mip / union.len() as f64)
    };
    InteractionPotential {
        mip: Some(mip),
        nip,
    }
}
