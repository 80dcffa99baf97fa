//! Output schema and the incremental score-table writer.
//!
//! The column set depends on the data (maximum community size, compound
//! catalogue), so the schema is derived once, up front, as an immutable
//! template. Rows are sparse named-value maps validated against that template:
//! writing to a column the schema does not know is a programming error and
//! panics, never a silent branch.

use crate::data::CompoundCatalogue;
use crate::error::Result;
use crossfeed::core::models::model::Flavor;
use crossfeed::workflows::score::ScoreResult;
use std::collections::HashMap;
use std::fs::File;
use std::path::Path;

/// The immutable column template of one run.
#[derive(Debug, Clone)]
pub struct Schema {
    columns: Vec<String>,
    defaults: Vec<&'static str>,
    index: HashMap<String, usize>,
    max_size: usize,
}

const EMPTY: &str = "";
const ZERO: &str = "0";

impl Schema {
    /// Derives the template from the largest community and the catalogue.
    pub fn build(max_size: usize, catalogue: &CompoundCatalogue) -> Self {
        let mut columns: Vec<(String, &'static str)> = vec![
            ("community".into(), EMPTY),
            ("medium".into(), EMPTY),
            ("size".into(), ZERO),
            ("mip".into(), EMPTY),
            ("mro".into(), EMPTY),
            ("nip".into(), EMPTY),
            ("smetana".into(), EMPTY),
            ("fba_objective".into(), ZERO),
            ("fba_status".into(), EMPTY),
            ("medium_status".into(), EMPTY),
            ("stage".into(), EMPTY),
        ];
        for slot in 1..=max_size {
            columns.push((format!("org{slot}"), EMPTY));
            columns.push((format!("org{slot}_growth"), ZERO));
        }
        for compound in catalogue.compounds() {
            columns.push((format!("medium_{compound}"), ZERO));
        }
        for slot in 1..=max_size {
            for compound in catalogue.compounds() {
                columns.push((format!("mus_{slot}_{compound}"), EMPTY));
            }
        }
        for slot in 1..=max_size {
            for compound in catalogue.compounds() {
                columns.push((format!("mps_{slot}_{compound}"), EMPTY));
            }
        }
        for receiver in 1..=max_size {
            for donor in 1..=max_size {
                if receiver != donor {
                    columns.push((format!("scs_{receiver}_{donor}"), EMPTY));
                }
            }
        }

        let index = columns
            .iter()
            .enumerate()
            .map(|(i, (name, _))| (name.clone(), i))
            .collect();
        let (columns, defaults): (Vec<String>, Vec<&'static str>) =
            columns.into_iter().unzip();
        Self {
            columns,
            defaults,
            index,
            max_size,
        }
    }

    pub fn columns(&self) -> &[String] {
        &self.columns
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    /// A fresh row pre-filled with each column's documented default.
    pub fn row(&self) -> Row<'_> {
        Row {
            schema: self,
            values: self.defaults.iter().map(|d| d.to_string()).collect(),
        }
    }
}

/// One output row, valid against its schema by construction.
#[derive(Debug)]
pub struct Row<'s> {
    schema: &'s Schema,
    values: Vec<String>,
}

impl Row<'_> {
    /// Sets a cell. Panics on a column the schema does not know: every legal
    /// key was enumerated when the schema was built.
    pub fn set(&mut self, column: &str, value: impl ToString) {
        let index = *self
            .schema
            .index
            .get(column)
            .unwrap_or_else(|| panic!("unknown output column '{column}'"));
        self.values[index] = value.to_string();
    }

    pub fn get(&self, column: &str) -> Option<&str> {
        self.schema
            .index
            .get(column)
            .map(|&i| self.values[i].as_str())
    }

    pub fn values(&self) -> &[String] {
        &self.values
    }
}

/// Fills a row from a finished community evaluation.
///
/// Undefined score cells keep their defaults: numeric placeholders stay `0`,
/// optional scores stay empty — failures are visible, never `null`.
pub fn populate(row: &mut Row<'_>, result: &ScoreResult, catalogue: &CompoundCatalogue, flavor: Flavor) {
    row.set("size", result.organisms.len());
    if let Some(v) = result.mip {
        row.set("mip", v);
    }
    if let Some(v) = result.mro {
        row.set("mro", v);
    }
    if let Some(v) = result.nip {
        row.set("nip", v);
    }
    if let Some(v) = result.smetana_total {
        row.set("smetana", v);
    }
    if let Some(v) = result.fba_objective {
        row.set("fba_objective", v);
    }
    row.set("fba_status", result.fba_status);
    row.set("medium_status", result.minimal_medium.status);

    for (slot, organism) in result.organisms.iter().enumerate() {
        let slot = slot + 1;
        row.set(&format!("org{slot}"), organism);
        if let Some(growth) = result.organism_growth.get(organism) {
            row.set(&format!("org{slot}_growth"), growth);
        }
    }

    if result.minimal_medium.status.is_optimal() {
        for compound in catalogue.compounds() {
            if result
                .minimal_medium
                .contains(&flavor.exchange_reaction_id(compound))
            {
                row.set(&format!("medium_{compound}"), 1);
            }
        }
    }

    for (slot, organism) in result.organisms.iter().enumerate() {
        let slot = slot + 1;
        if let Some(Some(uptake)) = result.mus.get(organism) {
            for compound in catalogue.compounds() {
                let metabolite = flavor.extracellular_metabolite_id(compound);
                let value = uptake.get(&metabolite).copied().unwrap_or(0.0);
                row.set(&format!("mus_{slot}_{compound}"), value);
            }
        }
        if let Some(Some(production)) = result.mps.get(organism) {
            for compound in catalogue.compounds() {
                let metabolite = flavor.extracellular_metabolite_id(compound);
                let value = production.get(&metabolite).copied().unwrap_or(0.0);
                row.set(&format!("mps_{slot}_{compound}"), value);
            }
        }
    }

    for (r_slot, receiver) in result.organisms.iter().enumerate() {
        let Some(Some(couplings)) = result.scs.get(receiver) else {
            continue;
        };
        for (d_slot, donor) in result.organisms.iter().enumerate() {
            if r_slot == d_slot {
                continue;
            }
            let value = couplings.get(donor).copied().unwrap_or(0.0);
            row.set(&format!("scs_{}_{}", r_slot + 1, d_slot + 1), value);
        }
    }
}

/// Tab-separated writer flushing after every row, so a crash loses at most one
/// community's result.
pub struct TableWriter {
    writer: csv::Writer<File>,
}

impl TableWriter {
    pub fn create(path: &Path, schema: &Schema) -> Result<Self> {
        let mut writer = csv::WriterBuilder::new().delimiter(b'\t').from_path(path)?;
        writer.write_record(schema.columns())?;
        writer.flush()?;
        Ok(Self { writer })
    }

    pub fn write(&mut self, row: &Row<'_>) -> Result<()> {
        self.writer.write_record(row.values())?;
        self.writer.flush()?;
        Ok(())
    }
}
