//! # Core Models Module
//!
//! This module contains the fundamental data structures used to represent genome-scale
//! metabolic models in crossfeed, providing the foundation for all scoring operations.
//!
//! ## Overview
//!
//! The models module defines the core abstractions for constraint-based metabolic
//! modeling. These models are designed to:
//!
//! - **Represent stoichiometry** - Reactions as metabolite/coefficient mappings with flux bounds
//! - **Mark the system boundary** - Exchange reactions coupling metabolites to external sinks
//! - **Designate growth** - One biomass reaction per organism model, validated at construction
//! - **Merge communities** - Namespaced organisms sharing one extracellular pool
//!
//! ## Key Components
//!
//! - [`reaction`] - Reactions, stoichiometry, flux bounds, and exchange classification
//! - [`model`] - Single-organism models, metabolites, biomass validation, and id dialects
//! - [`community`] - Merged community models with per-organism exchange bookkeeping
//!
//! ## Usage
//!
//! ```ignore
//! use crossfeed::core::models::{model::MetabolicModel, reaction::Reaction};
//!
//! let mut model = MetabolicModel::new("Ecoli");
//! model.add_reaction(Reaction::exchange("R_EX_glc_e", "M_glc_e", -10.0, 1000.0));
//! model.detect_biomass()?;
//! ```

pub mod community;
pub mod model;
pub mod reaction;

pub use community::{CommunityModel, ExchangeDescriptor};
pub use model::{Flavor, MetabolicModel, Metabolite, ModelError};
pub use reaction::Reaction;
