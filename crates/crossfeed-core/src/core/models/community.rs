use super::model::{MetabolicModel, Metabolite, ModelError};
use super::reaction::{DEFAULT_FLUX_BOUND, Reaction};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Links one organism's side of an extracellular exchange to the shared pool.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExchangeDescriptor {
    /// The organism-local extracellular metabolite (namespaced).
    pub organism_metabolite: String,
    /// The shared-pool metabolite (original id).
    pub pool_metabolite: String,
    /// The pool's own exchange reaction for this metabolite.
    pub community_exchange: String,
}

/// A community model: organism models merged into one shared extracellular pool.
///
/// Every organism entity is namespaced by suffixing the organism id. Each organism
/// exchange reaction becomes a shuttle between the organism's extracellular
/// metabolite and the corresponding pool metabolite, and the pool keeps exactly one
/// community exchange reaction per pool metabolite, under the original exchange id.
/// Environments phrased in single-organism exchange ids therefore apply to the
/// community unchanged.
///
/// Merging is deterministic and idempotent for a fixed member list: the same
/// organisms in the same order always produce a structurally identical model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CommunityModel {
    pub id: String,
    /// Member organism ids, in merge order.
    pub organisms: Vec<String>,
    /// The merged stoichiometric model (no single biomass; growth is per member).
    pub model: MetabolicModel,
    /// Organism id to its namespaced biomass reaction id.
    pub biomass_of: IndexMap<String, String>,
    /// Organism id to shuttle reaction id to exchange descriptor.
    pub organism_exchanges: IndexMap<String, IndexMap<String, ExchangeDescriptor>>,
    /// Community exchange reaction id to pool metabolite id.
    pub community_exchanges: IndexMap<String, String>,
}

impl CommunityModel {
    /// Merges organism models into a community sharing one extracellular pool.
    ///
    /// Every member must already carry a validated biomass reaction; exchange
    /// reactions must couple exactly one metabolite.
    pub fn merge(id: impl Into<String>, members: &[MetabolicModel]) -> Result<Self, ModelError> {
        let id = id.into();
        let mut merged = MetabolicModel::new(id.clone());
        let mut biomass_of = IndexMap::new();
        let mut organism_exchanges: IndexMap<String, IndexMap<String, ExchangeDescriptor>> =
            IndexMap::new();
        let mut community_exchanges: IndexMap<String, String> = IndexMap::new();
        // pool metabolite -> community exchange id, for dedup across members
        let mut pool_exchange_of: IndexMap<String, String> = IndexMap::new();

        for member in members {
            let org = member.id.as_str();
            let biomass = member
                .biomass_reaction
                .clone()
                .ok_or_else(|| ModelError::MissingBiomass {
                    model: member.id.clone(),
                })?;
            biomass_of.insert(org.to_string(), namespaced(&biomass, org));
            let mut shuttles = IndexMap::new();

            for metabolite in member.metabolites.values() {
                let mut local = metabolite.clone();
                local.id = namespaced(&metabolite.id, org);
                merged.add_metabolite(local);
            }

            for reaction in member.reactions.values() {
                if reaction.exchange {
                    let pool_met = reaction.exchange_metabolite().ok_or_else(|| {
                        ModelError::MalformedExchange {
                            reaction: reaction.id.clone(),
                            count: reaction.stoichiometry.len(),
                        }
                    })?;

                    if !pool_exchange_of.contains_key(pool_met) {
                        let source = member
                            .metabolite(pool_met)
                            .cloned()
                            .unwrap_or_else(|| Metabolite::new(pool_met));
                        merged.add_metabolite(source);
                        merged.add_reaction(Reaction::exchange(
                            reaction.id.clone(),
                            pool_met,
                            reaction.lower_bound,
                            reaction.upper_bound,
                        ));
                        pool_exchange_of.insert(pool_met.to_string(), reaction.id.clone());
                        community_exchanges.insert(reaction.id.clone(), pool_met.to_string());
                    }
                    let community_exchange = pool_exchange_of[pool_met].clone();

                    let shuttle_id = namespaced(&reaction.id, org);
                    let organism_met = namespaced(pool_met, org);
                    // organism extracellular -> pool; positive flux is export
                    merged.add_reaction(Reaction::new(
                        shuttle_id.clone(),
                        [(organism_met.clone(), -1.0), (pool_met.to_string(), 1.0)],
                        -DEFAULT_FLUX_BOUND,
                        DEFAULT_FLUX_BOUND,
                    ));
                    shuttles.insert(
                        shuttle_id,
                        ExchangeDescriptor {
                            organism_metabolite: organism_met,
                            pool_metabolite: pool_met.to_string(),
                            community_exchange,
                        },
                    );
                } else {
                    let mut local = reaction.clone();
                    local.id = namespaced(&reaction.id, org);
                    local.stoichiometry = reaction
                        .stoichiometry
                        .iter()
                        .map(|(m, &c)| (namespaced(m, org), c))
                        .collect();
                    if merged.reactions.contains_key(&local.id) {
                        return Err(ModelError::DuplicateReaction {
                            model: id.clone(),
                            reaction: local.id,
                        });
                    }
                    merged.add_reaction(local);
                }
            }

            organism_exchanges.insert(org.to_string(), shuttles);
        }

        Ok(Self {
            id,
            organisms: members.iter().map(|m| m.id.clone()).collect(),
            model: merged,
            biomass_of,
            organism_exchanges,
            community_exchanges,
        })
    }

    /// Number of member organisms.
    pub fn size(&self) -> usize {
        self.organisms.len()
    }

    /// The namespaced biomass reaction id of a member.
    pub fn biomass(&self, organism: &str) -> Option<&str> {
        self.biomass_of.get(organism).map(String::as_str)
    }
}

fn namespaced(entity_id: &str, organism: &str) -> String {
    format!("{entity_id}_{organism}")
}
