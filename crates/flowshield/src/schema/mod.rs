//! Schema model: per-column type/range/nullability/grouping metadata.

mod column;

pub use column::{ColumnSpec, Dtype, PercentileRank};

use std::collections::HashSet;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::{FlowShieldError, Result};

/// Ordered collection of column specifications.
///
/// Read-only after construction; validation and repair both borrow the same
/// schema, so there is a single source of truth for dtype and range checks.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Schema {
    columns: IndexMap<String, ColumnSpec>,
}

impl Schema {
    /// Build a schema from column specs, checking structural invariants.
    ///
    /// Fails with [`FlowShieldError::Schema`] on a malformed column spec,
    /// a duplicate column name, or a duplicate rank within a percentile
    /// group.
    pub fn new(specs: Vec<ColumnSpec>) -> Result<Self> {
        let mut columns = IndexMap::with_capacity(specs.len());
        for spec in specs {
            spec.validate()?;
            let name = spec.name.clone();
            if columns.insert(name.clone(), spec).is_some() {
                return Err(FlowShieldError::Schema(format!(
                    "duplicate column name '{name}'"
                )));
            }
        }

        let schema = Self { columns };
        schema.check_percentile_ranks()?;
        Ok(schema)
    }

    fn check_percentile_ranks(&self) -> Result<()> {
        let mut seen: IndexMap<&str, HashSet<u32>> = IndexMap::new();
        for spec in self.columns.values() {
            if let Some(ref p) = spec.percentile {
                if !seen.entry(p.group.as_str()).or_default().insert(p.rank) {
                    return Err(FlowShieldError::Schema(format!(
                        "duplicate rank {} in percentile group '{}'",
                        p.rank, p.group
                    )));
                }
            }
        }
        Ok(())
    }

    /// Get a column spec by name.
    pub fn get(&self, name: &str) -> Option<&ColumnSpec> {
        self.columns.get(name)
    }

    /// Iterate over column specs in declaration order.
    pub fn columns(&self) -> impl Iterator<Item = &ColumnSpec> {
        self.columns.values()
    }

    /// Get all column names in declaration order.
    pub fn names(&self) -> Vec<&str> {
        self.columns.keys().map(|k| k.as_str()).collect()
    }

    /// Get the number of columns.
    pub fn len(&self) -> usize {
        self.columns.len()
    }

    /// Returns true if the schema declares no columns.
    pub fn is_empty(&self) -> bool {
        self.columns.is_empty()
    }

    /// Columns of each percentile group, sorted by rank.
    pub fn percentile_groups(&self) -> IndexMap<String, Vec<&ColumnSpec>> {
        let mut groups: IndexMap<String, Vec<&ColumnSpec>> = IndexMap::new();
        for spec in self.columns.values() {
            if let Some(ref p) = spec.percentile {
                groups.entry(p.group.clone()).or_default().push(spec);
            }
        }
        for members in groups.values_mut() {
            members.sort_by_key(|s| s.percentile.as_ref().map(|p| p.rank));
        }
        groups
    }
}
