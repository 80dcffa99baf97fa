use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

/// Default magnitude used for otherwise unbounded flux variables.
///
/// Genome-scale models conventionally encode "unbounded" as ±1000; solvers behave
/// better with a finite big-M than with true infinities in indicator constraints.
pub const DEFAULT_FLUX_BOUND: f64 = 1000.0;

/// A reaction in a metabolic model.
///
/// Stoichiometry maps metabolite ids to signed coefficients (negative = consumed,
/// positive = produced). Flux is constrained to `[lower_bound, upper_bound]`;
/// a negative lower bound makes the reaction reversible. Exchange reactions couple
/// exactly one metabolite to an implicit external sink and model import (negative
/// flux) or export (positive flux) across the system boundary.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Reaction {
    /// Identifier, unique within a model.
    pub id: String,
    /// Optional human-readable name.
    #[serde(default)]
    pub name: Option<String>,
    /// Metabolite id to stoichiometric coefficient.
    pub stoichiometry: IndexMap<String, f64>,
    /// Lower flux bound.
    pub lower_bound: f64,
    /// Upper flux bound.
    pub upper_bound: f64,
    /// Whether this reaction crosses the system boundary.
    #[serde(default)]
    pub exchange: bool,
}

impl Reaction {
    /// Creates an internal reaction from (metabolite, coefficient) pairs.
    pub fn new<I, S>(id: impl Into<String>, stoichiometry: I, lower_bound: f64, upper_bound: f64) -> Self
    where
        I: IntoIterator<Item = (S, f64)>,
        S: Into<String>,
    {
        Self {
            id: id.into(),
            name: None,
            stoichiometry: stoichiometry
                .into_iter()
                .map(|(m, c)| (m.into(), c))
                .collect(),
            lower_bound,
            upper_bound,
            exchange: false,
        }
    }

    /// Creates an exchange reaction draining one metabolite to the external sink.
    pub fn exchange(
        id: impl Into<String>,
        metabolite: impl Into<String>,
        lower_bound: f64,
        upper_bound: f64,
    ) -> Self {
        Self {
            id: id.into(),
            name: None,
            stoichiometry: IndexMap::from([(metabolite.into(), -1.0)]),
            lower_bound,
            upper_bound,
            exchange: true,
        }
    }

    /// Attaches a display name.
    pub fn named(mut self, name: impl Into<String>) -> Self {
        self.name = Some(name.into());
        self
    }

    /// The single metabolite coupled by an exchange reaction.
    ///
    /// Returns `None` for internal reactions or malformed exchanges coupling more
    /// than one metabolite.
    pub fn exchange_metabolite(&self) -> Option<&str> {
        if !self.exchange || self.stoichiometry.len() != 1 {
            return None;
        }
        self.stoichiometry.keys().next().map(String::as_str)
    }

    /// Whether the reaction can carry negative flux.
    pub fn reversible(&self) -> bool {
        self.lower_bound < 0.0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exchange_couples_exactly_one_metabolite() {
        let ex = Reaction::exchange("R_EX_glc_e", "M_glc_e", -10.0, DEFAULT_FLUX_BOUND);
        assert!(ex.exchange);
        assert_eq!(ex.exchange_metabolite(), Some("M_glc_e"));
        assert_eq!(ex.stoichiometry.get("M_glc_e"), Some(&-1.0));
    }

    #[test]
    fn internal_reaction_has_no_exchange_metabolite() {
        let rxn = Reaction::new("R_PGI", [("M_g6p_c", -1.0), ("M_f6p_c", 1.0)], -1000.0, 1000.0);
        assert!(!rxn.exchange);
        assert_eq!(rxn.exchange_metabolite(), None);
        assert!(rxn.reversible());
    }
}
