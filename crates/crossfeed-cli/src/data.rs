//! Tabular inputs and model loading.
//!
//! All tables are tab-separated with a header line. Model files are JSON in one
//! of the [`Flavor`] dialects; the flavor decides exchange-reaction detection
//! when the file omits explicit flags, and the compound naming used to map
//! media onto exchange reactions.

use crate::error::{CliError, Result};
use crossfeed::core::models::model::{Flavor, MetabolicModel, Metabolite};
use crossfeed::core::models::reaction::Reaction;
use indexmap::IndexMap;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use tracing::debug;

/// One community and its ordered member list, as configured.
#[derive(Debug, Clone, PartialEq)]
pub struct CommunitySpec {
    pub id: String,
    pub species: Vec<String>,
}

#[derive(Debug, Deserialize)]
struct CommunityRow {
    community: String,
    species: String,
}

fn tsv_reader(path: &Path) -> Result<csv::Reader<std::fs::File>> {
    csv::ReaderBuilder::new()
        .delimiter(b'\t')
        .from_path(path)
        .map_err(CliError::from)
}

/// Loads the community membership table, preserving first-seen order of both
/// communities and members.
pub fn load_communities(path: &Path) -> Result<Vec<CommunitySpec>> {
    let mut reader = tsv_reader(path)?;
    let mut grouped: IndexMap<String, Vec<String>> = IndexMap::new();
    for row in reader.deserialize() {
        let row: CommunityRow = row?;
        grouped.entry(row.community).or_default().push(row.species);
    }
    if grouped.is_empty() {
        return Err(CliError::Config(format!(
            "community table '{}' holds no rows",
            path.display()
        )));
    }
    Ok(grouped
        .into_iter()
        .map(|(id, species)| CommunitySpec { id, species })
        .collect())
}

/// The exchange-metabolite catalogue: compound id to display name.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CompoundCatalogue {
    entries: IndexMap<String, String>,
}

#[derive(Debug, Deserialize)]
struct CompoundRow {
    compound: String,
    #[serde(default)]
    name: Option<String>,
}

impl CompoundCatalogue {
    pub fn compounds(&self) -> impl Iterator<Item = &str> {
        self.entries.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

pub fn load_compounds(path: &Path) -> Result<CompoundCatalogue> {
    let mut reader = tsv_reader(path)?;
    let mut entries = IndexMap::new();
    for row in reader.deserialize() {
        let row: CompoundRow = row?;
        let name = row.name.unwrap_or_else(|| row.compound.clone());
        entries.insert(row.compound, name);
    }
    Ok(CompoundCatalogue { entries })
}

#[derive(Debug, Deserialize)]
struct InorganicRow {
    compound: String,
}

/// Always-present inorganic compounds (single-column table).
pub fn load_inorganic(path: &Path) -> Result<Vec<String>> {
    let mut reader = tsv_reader(path)?;
    let mut compounds = Vec::new();
    for row in reader.deserialize() {
        let row: InorganicRow = row?;
        compounds.push(row.compound);
    }
    Ok(compounds)
}

#[derive(Debug, Deserialize)]
struct MediumRow {
    medium: String,
    compound: String,
}

/// Named medium compound sets.
pub fn load_media_db(path: &Path) -> Result<IndexMap<String, Vec<String>>> {
    let mut reader = tsv_reader(path)?;
    let mut media: IndexMap<String, Vec<String>> = IndexMap::new();
    for row in reader.deserialize() {
        let row: MediumRow = row?;
        media.entry(row.medium).or_default().push(row.compound);
    }
    Ok(media)
}

#[derive(Debug, Deserialize)]
struct LocationRow {
    species: String,
    path: PathBuf,
}

/// Optional per-species model-file overrides.
pub fn load_model_locations(path: &Path) -> Result<IndexMap<String, PathBuf>> {
    let mut reader = tsv_reader(path)?;
    let mut locations = IndexMap::new();
    for row in reader.deserialize() {
        let row: LocationRow = row?;
        locations.insert(row.species, row.path);
    }
    Ok(locations)
}

#[derive(Debug, Deserialize)]
struct ModelFile {
    id: String,
    #[serde(default)]
    biomass: Option<String>,
    #[serde(default)]
    metabolites: Vec<MetaboliteFile>,
    reactions: Vec<ReactionFile>,
}

#[derive(Debug, Deserialize)]
struct MetaboliteFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    #[serde(default)]
    weight: Option<f64>,
}

#[derive(Debug, Deserialize)]
struct ReactionFile {
    id: String,
    #[serde(default)]
    name: Option<String>,
    stoichiometry: IndexMap<String, f64>,
    lower_bound: f64,
    upper_bound: f64,
    #[serde(default)]
    exchange: Option<bool>,
}

/// Loads and validates one organism model.
///
/// Exchange status falls back to the flavor's naming pattern when the file
/// carries no explicit flag. The single-biomass invariant is enforced here,
/// before any community is built.
pub fn load_model(path: &Path, flavor: Flavor) -> Result<MetabolicModel> {
    let text = std::fs::read_to_string(path).map_err(|source| CliError::FileParsing {
        path: path.to_path_buf(),
        source: source.into(),
    })?;
    let file: ModelFile = serde_json::from_str(&text).map_err(|source| CliError::FileParsing {
        path: path.to_path_buf(),
        source: source.into(),
    })?;

    let mut model = MetabolicModel::new(file.id);
    for metabolite in file.metabolites {
        let mut entry = Metabolite::new(metabolite.id);
        entry.name = metabolite.name;
        entry.weight = metabolite.weight;
        model.add_metabolite(entry);
    }
    for reaction in file.reactions {
        let exchange = reaction
            .exchange
            .unwrap_or_else(|| flavor.is_exchange_id(&reaction.id) && reaction.stoichiometry.len() == 1);
        model.add_reaction(Reaction {
            id: reaction.id,
            name: reaction.name,
            stoichiometry: reaction.stoichiometry,
            lower_bound: reaction.lower_bound,
            upper_bound: reaction.upper_bound,
            exchange,
        });
    }

    if let Some(biomass) = file.biomass {
        model.set_biomass(biomass)?;
    }
    model.ensure_biomass()?;
    debug!(
        model = %model.id,
        reactions = model.reactions.len(),
        metabolites = model.metabolites.len(),
        "model loaded"
    );
    Ok(model)
}
