//! Scoring tasks, one constrained-optimization procedure per module.
//!
//! Each task is a free function taking the (already environment-applied) model or
//! community, the scoring configuration, and the LP oracle. Tasks never abort on
//! solver failures: infeasibility and degeneracy surface as statuses or `None`
//! cells in the returned score maps.

pub mod alternate_optima;
pub mod fba;
pub mod interaction_potential;
pub mod minimal_medium;
pub mod resource_overlap;
