use super::reaction::Reaction;
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, Clone, PartialEq)]
pub enum ModelError {
    #[error("model '{model}' has no biomass reaction")]
    MissingBiomass { model: String },

    #[error("model '{model}' has ambiguous biomass reactions: {candidates:?}")]
    AmbiguousBiomass {
        model: String,
        candidates: Vec<String>,
    },

    #[error("model '{model}' designates unknown biomass reaction '{reaction}'")]
    UnknownBiomass { model: String, reaction: String },

    #[error("exchange reaction '{reaction}' couples {count} metabolites, expected exactly one")]
    MalformedExchange { reaction: String, count: usize },

    #[error("duplicate reaction id '{reaction}' in model '{model}'")]
    DuplicateReaction { model: String, reaction: String },
}

/// A metabolite (chemical species) participating in reactions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Metabolite {
    pub id: String,
    /// Optional display name.
    #[serde(default)]
    pub name: Option<String>,
    /// Optional molecular weight in g/mol, used by mass-weighted minimal media.
    #[serde(default)]
    pub weight: Option<f64>,
}

impl Metabolite {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: None,
            weight: None,
        }
    }

    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    pub fn with_weight(mut self, weight: f64) -> Self {
        self.weight = Some(weight);
        self
    }
}

/// Identifier dialect of a model source.
///
/// The flavor fixes the naming pattern linking compounds, extracellular metabolites,
/// and exchange reactions, so environments can be phrased as compound lists and
/// exchange reactions can be recognized when a source omits explicit flags.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "kebab-case")]
pub enum Flavor {
    /// COBRA-style prefixed ids: `M_glc__D_e`, `R_EX_glc__D_e`.
    #[default]
    Cobra,
    /// BiGG-style bare ids: `glc__D_e`, `EX_glc__D_e`.
    Bigg,
}

impl Flavor {
    /// The exchange reaction id for a compound.
    pub fn exchange_reaction_id(&self, compound: &str) -> String {
        match self {
            Flavor::Cobra => format!("R_EX_{compound}_e"),
            Flavor::Bigg => format!("EX_{compound}_e"),
        }
    }

    /// The extracellular metabolite id for a compound.
    pub fn extracellular_metabolite_id(&self, compound: &str) -> String {
        match self {
            Flavor::Cobra => format!("M_{compound}_e"),
            Flavor::Bigg => format!("{compound}_e"),
        }
    }

    /// Whether a reaction id follows this flavor's exchange naming pattern.
    pub fn is_exchange_id(&self, reaction_id: &str) -> bool {
        match self {
            Flavor::Cobra => reaction_id.starts_with("R_EX_"),
            Flavor::Bigg => reaction_id.starts_with("EX_"),
        }
    }
}

impl fmt::Display for Flavor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Flavor::Cobra => write!(f, "cobra"),
            Flavor::Bigg => write!(f, "bigg"),
        }
    }
}

impl FromStr for Flavor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "cobra" | "json-cobra" => Ok(Flavor::Cobra),
            "bigg" | "json-bigg" => Ok(Flavor::Bigg),
            other => Err(format!("unknown model flavor '{other}'")),
        }
    }
}

/// A single-organism (or merged community) genome-scale metabolic model.
///
/// Reactions and metabolites are kept in insertion-ordered, id-keyed maps so
/// iteration — and therefore LP formulation and scoring output — is deterministic.
/// Metabolites referenced by a reaction but never declared are registered implicitly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MetabolicModel {
    pub id: String,
    pub metabolites: IndexMap<String, Metabolite>,
    pub reactions: IndexMap<String, Reaction>,
    /// The designated growth objective. Single-organism models must have exactly
    /// one (see [`MetabolicModel::detect_biomass`]); merged community models track
    /// growth per member instead and leave this unset.
    pub biomass_reaction: Option<String>,
}

impl MetabolicModel {
    pub fn new(id: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            metabolites: IndexMap::new(),
            reactions: IndexMap::new(),
            biomass_reaction: None,
        }
    }

    /// Declares a metabolite, replacing any implicit registration.
    pub fn add_metabolite(&mut self, metabolite: Metabolite) {
        self.metabolites.insert(metabolite.id.clone(), metabolite);
    }

    /// Adds a reaction, implicitly registering any undeclared metabolites.
    pub fn add_reaction(&mut self, reaction: Reaction) {
        for m_id in reaction.stoichiometry.keys() {
            if !self.metabolites.contains_key(m_id) {
                self.metabolites
                    .insert(m_id.clone(), Metabolite::new(m_id.clone()));
            }
        }
        self.reactions.insert(reaction.id.clone(), reaction);
    }

    pub fn reaction(&self, id: &str) -> Option<&Reaction> {
        self.reactions.get(id)
    }

    pub fn reaction_mut(&mut self, id: &str) -> Option<&mut Reaction> {
        self.reactions.get_mut(id)
    }

    pub fn metabolite(&self, id: &str) -> Option<&Metabolite> {
        self.metabolites.get(id)
    }

    /// All reactions crossing the system boundary, in model order.
    pub fn exchange_reactions(&self) -> impl Iterator<Item = &Reaction> {
        self.reactions.values().filter(|r| r.exchange)
    }

    /// Designates an explicit biomass reaction, validating that it exists.
    pub fn set_biomass(&mut self, reaction_id: impl Into<String>) -> Result<(), ModelError> {
        let reaction_id = reaction_id.into();
        if !self.reactions.contains_key(&reaction_id) {
            return Err(ModelError::UnknownBiomass {
                model: self.id.clone(),
                reaction: reaction_id,
            });
        }
        self.biomass_reaction = Some(reaction_id);
        Ok(())
    }

    /// Detects the biomass reaction by id/name pattern and designates it.
    ///
    /// A reaction qualifies when its id or name contains `biomass`
    /// (case-insensitive). Exactly one match is required: zero or several
    /// candidates reject the organism model before any community is built.
    pub fn detect_biomass(&mut self) -> Result<&str, ModelError> {
        let mut candidates: Vec<String> = Vec::new();
        for reaction in self.reactions.values() {
            let in_id = reaction.id.to_ascii_lowercase().contains("biomass");
            let in_name = reaction
                .name
                .as_deref()
                .is_some_and(|n| n.to_ascii_lowercase().contains("biomass"));
            if in_id || in_name {
                candidates.push(reaction.id.clone());
            }
        }
        match candidates.len() {
            0 => Err(ModelError::MissingBiomass {
                model: self.id.clone(),
            }),
            1 => {
                self.biomass_reaction = Some(candidates[0].clone());
                Ok(self.biomass_reaction.as_deref().unwrap_or_default())
            }
            _ => Err(ModelError::AmbiguousBiomass {
                model: self.id.clone(),
                candidates,
            }),
        }
    }

    /// Confirms the single-organism biomass invariant, detecting if unset.
    pub fn ensure_biomass(&mut self) -> Result<(), ModelError> {
        match &self.biomass_reaction {
            Some(id) if self.reactions.contains_key(id) => Ok(()),
            Some(id) => Err(ModelError::UnknownBiomass {
                model: self.id.clone(),
                reaction: id.clone(),
            }),
            None => self.detect_biomass().map(|_| ()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy_model() -> MetabolicModel {
        let mut model = MetabolicModel::new("toy");
        model.add_reaction(Reaction::exchange("R_EX_glc_e", "M_glc_e", -10.0, 1000.0));
        model.add_reaction(Reaction::new(
            "R_Growth_biomass",
            [("M_glc_e", -1.0)],
            0.0,
            1000.0,
        ));
        model
    }

    #[test]
    fn detects_single_biomass_reaction() {
        let mut model = toy_model();
        assert_eq!(model.detect_biomass().unwrap(), "R_Growth_biomass");
        assert_eq!(model.biomass_reaction.as_deref(), Some("R_Growth_biomass"));
    }

    #[test]
    fn rejects_model_without_biomass() {
        let mut model = MetabolicModel::new("empty");
        model.add_reaction(Reaction::exchange("R_EX_glc_e", "M_glc_e", -10.0, 1000.0));
        assert_eq!(
            model.detect_biomass(),
            Err(ModelError::MissingBiomass {
                model: "empty".into()
            })
        );
    }

    #[test]
    fn rejects_ambiguous_biomass() {
        let mut model = toy_model();
        model.add_reaction(Reaction::new(
            "R_biomass_alt",
            [("M_glc_e", -1.0)],
            0.0,
            1000.0,
        ));
        assert!(matches!(
            model.detect_biomass(),
            Err(ModelError::AmbiguousBiomass { candidates, .. }) if candidates.len() == 2
        ));
    }

    #[test]
    fn implicit_metabolites_are_registered() {
        let model = toy_model();
        assert!(model.metabolite("M_glc_e").is_some());
    }

    #[test]
    fn flavor_naming_patterns() {
        assert_eq!(Flavor::Cobra.exchange_reaction_id("glc"), "R_EX_glc_e");
        assert_eq!(Flavor::Bigg.exchange_reaction_id("glc"), "EX_glc_e");
        assert!(Flavor::Cobra.is_exchange_id("R_EX_o2_e"));
        assert!(!Flavor::Cobra.is_exchange_id("R_PGI"));
        assert_eq!(Flavor::Cobra.extracellular_metabolite_id("glc"), "M_glc_e");
    }
}
