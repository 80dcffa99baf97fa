//! Growth-medium specifications and their application to models.
//!
//! An [`Environment`] maps exchange-reaction ids to flux bounds. A negative lower
//! bound permits uptake up to that magnitude; the upper bound caps secretion.
//! Applying an environment is a deterministic overwrite: named exchanges get
//! exactly the stored bounds, and every other exchange reaction is closed for
//! uptake. Applying the same environment twice is therefore equivalent to
//! applying it once.

use super::models::model::{Flavor, MetabolicModel};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Environment {
    bounds: IndexMap<String, (f64, f64)>,
}

impl Environment {
    pub fn empty() -> Self {
        Self::default()
    }

    /// A uniform environment opening the given exchange reactions for uptake.
    pub fn from_reactions<I, S>(reactions: I, max_uptake: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            bounds: reactions
                .into_iter()
                .map(|r| (r.into(), (-max_uptake, f64::INFINITY)))
                .collect(),
        }
    }

    /// An environment built from compound ids via the flavor's exchange naming.
    pub fn from_compounds<I, S>(compounds: I, flavor: Flavor, max_uptake: f64) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        Self::from_reactions(
            compounds
                .into_iter()
                .map(|c| flavor.exchange_reaction_id(c.as_ref())),
            max_uptake,
        )
    }

    /// The complete environment: every exchange reaction of a model opened.
    pub fn complete(model: &MetabolicModel, max_uptake: f64) -> Self {
        Self::from_reactions(
            model.exchange_reactions().map(|r| r.id.clone()),
            max_uptake,
        )
    }

    /// Sets the bounds for one exchange reaction, replacing any previous entry.
    pub fn insert(&mut self, reaction: impl Into<String>, lower: f64, upper: f64) {
        self.bounds.insert(reaction.into(), (lower, upper));
    }

    /// Applies the environment to a model in place.
    ///
    /// Exchange reactions named here receive exactly the stored bounds; exchange
    /// reactions absent from the environment are closed for uptake. Non-exchange
    /// reactions are never touched.
    pub fn apply(&self, model: &mut MetabolicModel) {
        for reaction in model.reactions.values_mut().filter(|r| r.exchange) {
            match self.bounds.get(&reaction.id) {
                Some(&(lower, upper)) => {
                    reaction.lower_bound = lower;
                    reaction.upper_bound = upper;
                }
                None => {
                    reaction.lower_bound = 0.0;
                }
            }
        }
    }

    pub fn get(&self, reaction: &str) -> Option<(f64, f64)> {
        self.bounds.get(reaction).copied()
    }

    pub fn contains(&self, reaction: &str) -> bool {
        self.bounds.contains_key(reaction)
    }

    /// Exchange-reaction ids in insertion order.
    pub fn ids(&self) -> impl Iterator<Item = &str> {
        self.bounds.keys().map(String::as_str)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, (f64, f64))> {
        self.bounds.iter().map(|(id, &b)| (id.as_str(), b))
    }

    pub fn len(&self) -> usize {
        self.bounds.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bounds.is_empty()
    }

    /// Merges another environment into this one; the other wins on conflicts.
    pub fn union(mut self, other: &Environment) -> Self {
        for (id, (lower, upper)) in other.iter() {
            self.bounds.insert(id.to_string(), (lower, upper));
        }
        self
    }

    /// Keeps only the named reactions.
    pub fn retain<F: FnMut(&str) -> bool>(&mut self, mut keep: F) {
        self.bounds.retain(|id, _| keep(id));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::models::reaction::Reaction;

    fn model_with_exchanges() -> MetabolicModel {
        let mut model = MetabolicModel::new("toy");
        model.add_reaction(Reaction::exchange("R_EX_glc_e", "M_glc_e", -10.0, 1000.0));
        model.add_reaction(Reaction::exchange("R_EX_o2_e", "M_o2_e", -20.0, 1000.0));
        model.add_reaction(Reaction::new(
            "R_PGI",
            [("M_glc_e", -1.0)],
            -1000.0,
            1000.0,
        ));
        model
    }

    #[test]
    fn apply_overwrites_named_and_closes_unnamed() {
        let mut model = model_with_exchanges();
        let env = Environment::from_reactions(["R_EX_glc_e"], 5.0);
        env.apply(&mut model);

        let glc = model.reaction("R_EX_glc_e").unwrap();
        assert_eq!(glc.lower_bound, -5.0);
        assert_eq!(glc.upper_bound, f64::INFINITY);

        // unnamed exchange closed for uptake, secretion untouched
        let o2 = model.reaction("R_EX_o2_e").unwrap();
        assert_eq!(o2.lower_bound, 0.0);
        assert_eq!(o2.upper_bound, 1000.0);

        // internal reactions are never touched
        let pgi = model.reaction("R_PGI").unwrap();
        assert_eq!(pgi.lower_bound, -1000.0);
    }

    #[test]
    fn apply_is_idempotent() {
        let mut once = model_with_exchanges();
        let mut twice = model_with_exchanges();
        let env = Environment::from_reactions(["R_EX_glc_e"], 5.0);
        env.apply(&mut once);
        env.apply(&mut twice);
        env.apply(&mut twice);
        assert_eq!(once, twice);
    }

    #[test]
    fn from_compounds_uses_flavor_naming() {
        let env = Environment::from_compounds(["glc", "o2"], Flavor::Cobra, 10.0);
        assert!(env.contains("R_EX_glc_e"));
        assert!(env.contains("R_EX_o2_e"));
        assert_eq!(env.get("R_EX_glc_e"), Some((-10.0, f64::INFINITY)));
    }

    #[test]
    fn union_prefers_the_other_side() {
        let base = Environment::from_reactions(["R_EX_glc_e"], 10.0);
        let mut override_env = Environment::empty();
        override_env.insert("R_EX_glc_e", -1.0, 1.0);
        let merged = base.union(&override_env);
        assert_eq!(merged.get("R_EX_glc_e"), Some((-1.0, 1.0)));
    }
}
