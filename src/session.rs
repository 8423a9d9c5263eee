// 🧾 Session - the calculation being edited
// Two ordered lists of line items (adds and omits) plus a name and description.
//
// Line items are values: created once from a reference record, never edited,
// only appended or removed by index.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{CalcError, Result};
use crate::ice_db::IceDb;
use crate::totals::Totals;

// ============================================================================
// BUCKET
// ============================================================================

/// Which of the two accounting lists a line belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Bucket {
    Add,
    Omit,
}

impl Bucket {
    pub fn as_str(&self) -> &'static str {
        match self {
            Bucket::Add => "Add",
            Bucket::Omit => "Omit",
        }
    }
}

impl fmt::Display for Bucket {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// ============================================================================
// LINE ITEM
// ============================================================================

/// One accrued quantity of a material.
///
/// Field names on the wire match saved calculation files exactly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LineItem {
    #[serde(rename = "ICE DB Name")]
    pub reference_name: String,

    #[serde(rename = "Qty")]
    pub quantity: f64,

    /// Copied from the reference record when the line was created
    #[serde(rename = "EC_per_unit")]
    pub carbon_per_unit: f64,

    #[serde(rename = "Total_EC")]
    pub total_carbon: f64,
}

impl LineItem {
    pub fn new(reference_name: &str, quantity: f64, carbon_per_unit: f64) -> Self {
        LineItem {
            reference_name: reference_name.to_string(),
            quantity,
            carbon_per_unit,
            total_carbon: quantity * carbon_per_unit,
        }
    }

    /// Display row, numbered from `index` (zero based).
    pub fn summary(&self, index: usize) -> String {
        format!(
            "{}. {} - Qty: {:.2} - EC/unit: {:.2} - Total: {:.2}",
            index + 1,
            self.reference_name,
            self.quantity,
            self.carbon_per_unit,
            self.total_carbon
        )
    }
}

// ============================================================================
// SESSION
// ============================================================================

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Session {
    #[serde(default)]
    pub name: String,

    #[serde(default)]
    pub description: String,

    #[serde(default)]
    pub adds: Vec<LineItem>,

    #[serde(default)]
    pub omits: Vec<LineItem>,
}

impl Session {
    pub fn new(name: &str, description: &str) -> Self {
        Session {
            name: name.to_string(),
            description: description.to_string(),
            ..Default::default()
        }
    }

    pub fn items(&self, bucket: Bucket) -> &[LineItem] {
        match bucket {
            Bucket::Add => &self.adds,
            Bucket::Omit => &self.omits,
        }
    }

    fn items_mut(&mut self, bucket: Bucket) -> &mut Vec<LineItem> {
        match bucket {
            Bucket::Add => &mut self.adds,
            Bucket::Omit => &mut self.omits,
        }
    }

    pub fn is_empty(&self) -> bool {
        self.adds.is_empty() && self.omits.is_empty()
    }

    /// Look up `reference_name` and append a new line to `bucket`.
    ///
    /// The quantity is taken as given: zero and negative values are accepted,
    /// gating on `quantity > 0` is the caller's job. On a lookup miss the
    /// session is left untouched.
    pub fn add_line(
        &mut self,
        db: &IceDb,
        bucket: Bucket,
        reference_name: &str,
        quantity: f64,
    ) -> Result<&LineItem> {
        let record = db.lookup(reference_name)?;
        let item = LineItem::new(&record.reference_name, quantity, record.carbon_per_unit);

        tracing::debug!(
            bucket = %bucket,
            reference_name = %item.reference_name,
            quantity,
            total_carbon = item.total_carbon,
            "line added"
        );

        let items = self.items_mut(bucket);
        items.push(item);
        Ok(&items[items.len() - 1])
    }

    /// Remove the line at `index`, shifting later lines down.
    pub fn delete_line(&mut self, bucket: Bucket, index: usize) -> Result<LineItem> {
        let items = self.items_mut(bucket);
        if index >= items.len() {
            return Err(CalcError::IndexOutOfRange {
                bucket,
                index,
                len: items.len(),
            });
        }

        let removed = items.remove(index);
        tracing::debug!(
            bucket = %bucket,
            index,
            reference_name = %removed.reference_name,
            "line deleted"
        );
        Ok(removed)
    }

    pub fn totals(&self) -> Totals {
        Totals::compute(self)
    }
}

// ============================================================================
// TESTS
// ============================================================================
