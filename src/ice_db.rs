// 📚 ICE DB - Reference table of material carbon factors
// Loaded once at startup, read-only afterwards.
//
// Three cascading filters narrow the table down to one record:
//   Material → Sub-material → ICE DB Name

use anyhow::{anyhow, Context};
use serde::Deserialize;
use std::collections::{BTreeSet, HashMap};
use std::io::Read;
use std::path::Path;

use crate::error::{CalcError, Result};

// ============================================================================
// CORE TYPES
// ============================================================================

/// One row of the reference table.
#[derive(Debug, Clone, PartialEq)]
pub struct MaterialRecord {
    pub material: String,
    pub sub_material: String,

    /// Unique lookup key
    pub reference_name: String,

    pub declared_unit: String,

    /// kg CO2e per declared unit
    pub carbon_per_unit: f64,
}

impl MaterialRecord {
    pub fn new(
        material: &str,
        sub_material: &str,
        reference_name: &str,
        declared_unit: &str,
        carbon_per_unit: f64,
    ) -> Self {
        MaterialRecord {
            material: material.trim().to_string(),
            sub_material: sub_material.trim().to_string(),
            reference_name: reference_name.trim().to_string(),
            declared_unit: declared_unit.trim().to_string(),
            carbon_per_unit,
        }
    }
}

/// Row as it appears in the source file. Every cell may be blank.
#[derive(Debug, Deserialize)]
struct RawRow {
    #[serde(rename = "Material")]
    material: Option<String>,
    #[serde(rename = "Sub-material")]
    sub_material: Option<String>,
    #[serde(rename = "ICE DB Name")]
    reference_name: Option<String>,
    #[serde(rename = "Units of declared unit")]
    declared_unit: Option<String>,
    #[serde(rename = "Embodied Carbon (kg CO2e per declared unit)")]
    carbon_per_unit: Option<String>,
}

// ============================================================================
// REFERENCE TABLE
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct IceDb {
    records: Vec<MaterialRecord>,
    by_name: HashMap<String, usize>,
}

impl IceDb {
    /// Load the table from a CSV file with the ICE DB column headers.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let file = std::fs::File::open(path)
            .with_context(|| format!("Failed to open ICE DB file {}", path.display()))?;
        let db = Self::from_reader(file)
            .with_context(|| format!("Failed to load ICE DB from {}", path.display()))?;

        tracing::info!(
            path = %path.display(),
            records = db.len(),
            "ICE DB loaded"
        );
        Ok(db)
    }

    /// Parse CSV from any reader. Extra columns are ignored.
    pub fn from_reader<R: Read>(reader: R) -> anyhow::Result<Self> {
        let mut rdr = csv::ReaderBuilder::new()
            .trim(csv::Trim::All)
            .from_reader(reader);
        let headers = rdr.headers().context("Failed to read CSV headers")?.clone();

        let mut records = Vec::new();
        for result in rdr.records() {
            let row = result.context("Failed to read CSV row")?;
            let line = row.position().map(|p| p.line()).unwrap_or(0);
            let raw: RawRow = row
                .deserialize(Some(&headers))
                .with_context(|| format!("Failed to deserialize row on line {}", line))?;
            records.push(raw.into_record(line)?);
        }

        Ok(Self::from_records(records))
    }

    /// Build a table from records already in memory.
    ///
    /// The first record with a given reference name wins; later duplicates
    /// are dropped so lookups stay unambiguous.
    pub fn from_records(records: Vec<MaterialRecord>) -> Self {
        let mut db = IceDb::default();

        for record in records {
            if db.by_name.contains_key(&record.reference_name) {
                tracing::warn!(
                    reference_name = %record.reference_name,
                    "duplicate ICE DB Name, keeping first row"
                );
                continue;
            }
            db.by_name
                .insert(record.reference_name.clone(), db.records.len());
            db.records.push(record);
        }

        db
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn records(&self) -> &[MaterialRecord] {
        &self.records
    }

    // ========================================================================
    // FILTERS (sorted, distinct)
    // ========================================================================

    /// Distinct materials, sorted.
    pub fn materials(&self) -> Vec<String> {
        distinct(self.records.iter().map(|r| &r.material))
    }

    /// Distinct sub-materials of one material, sorted.
    pub fn sub_materials(&self, material: &str) -> Vec<String> {
        distinct(
            self.records
                .iter()
                .filter(|r| r.material == material)
                .map(|r| &r.sub_material),
        )
    }

    /// Distinct reference names matching both filters, sorted.
    pub fn reference_names(&self, material: &str, sub_material: &str) -> Vec<String> {
        distinct(
            self.records
                .iter()
                .filter(|r| r.material == material && r.sub_material == sub_material)
                .map(|r| &r.reference_name),
        )
    }

    // ========================================================================
    // LOOKUP
    // ========================================================================

    /// Exact match on reference name.
    pub fn lookup(&self, reference_name: &str) -> Result<&MaterialRecord> {
        self.by_name
            .get(reference_name)
            .map(|&i| &self.records[i])
            .ok_or_else(|| CalcError::RecordNotFound {
                reference_name: reference_name.to_string(),
            })
    }

    /// Declared unit of a record, for display next to the quantity input.
    pub fn unit_of(&self, reference_name: &str) -> Result<&str> {
        self.lookup(reference_name)
            .map(|r| r.declared_unit.as_str())
    }
}

impl RawRow {
    fn into_record(self, line: u64) -> anyhow::Result<MaterialRecord> {
        let reference_name = self.reference_name.unwrap_or_default();

        let carbon_per_unit = match self.carbon_per_unit.as_deref().map(str::trim) {
            None | Some("") => {
                tracing::warn!(
                    line,
                    reference_name = %reference_name,
                    "blank embodied carbon factor, using 0.0"
                );
                0.0
            }
            Some(text) => match text.parse::<f64>() {
                Ok(value) if value.is_finite() => value,
                Ok(_) => {
                    return Err(anyhow!(
                        "Invalid embodied carbon {:?} for {:?} on line {}: not a finite number",
                        text,
                        reference_name,
                        line
                    ))
                }
                Err(e) => {
                    return Err(anyhow!(
                        "Invalid embodied carbon {:?} for {:?} on line {}: {}",
                        text,
                        reference_name,
                        line,
                        e
                    ))
                }
            },
        };

        Ok(MaterialRecord::new(
            self.material.as_deref().unwrap_or(""),
            self.sub_material.as_deref().unwrap_or(""),
            &reference_name,
            self.declared_unit.as_deref().unwrap_or(""),
            carbon_per_unit,
        ))
    }
}

fn distinct<'a>(values: impl Iterator<Item = &'a String>) -> Vec<String> {
    values
        .cloned()
        .collect::<BTreeSet<_>>()
        .into_iter()
        .collect()
}

// ============================================================================
// TESTS
// ============================================================================
