//! Column specifications.

use serde::{Deserialize, Serialize};

use crate::error::{FlowShieldError, Result};

/// Declared data type for a feature column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Dtype {
    /// Whole numbers.
    Integer,
    /// Floating-point numbers.
    Float,
    /// String-valued category labels.
    Categorical,
}

impl Dtype {
    /// Returns true if this type is numeric.
    pub fn is_numeric(&self) -> bool {
        matches!(self, Dtype::Integer | Dtype::Float)
    }
}

/// Membership of a column in a ranked percentile group.
///
/// Columns sharing a `group` are expected to be non-decreasing in `rank`
/// order (e.g. p50 ≤ p95 ≤ p99 for latency percentiles).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PercentileRank {
    /// Group identifier.
    pub group: String,
    /// Position within the group; must be unique per group.
    pub rank: u32,
}

/// Specification for a single feature column.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnSpec {
    /// Column name.
    pub name: String,
    /// Declared data type, fixed at schema-load time.
    pub dtype: Dtype,
    /// Minimum allowed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    /// Maximum allowed value.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Whether null values are permitted.
    #[serde(default)]
    pub nullable: bool,
    /// Allowed values for categorical columns.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub categories: Option<Vec<String>>,
    /// Percentile group membership.
    #[serde(skip_serializing_if = "Option::is_none")]
    pub percentile: Option<PercentileRank>,
}

impl ColumnSpec {
    /// Create a column spec with no range or nullability allowances.
    pub fn new(name: impl Into<String>, dtype: Dtype) -> Self {
        Self {
            name: name.into(),
            dtype,
            min: None,
            max: None,
            nullable: false,
            categories: None,
            percentile: None,
        }
    }

    /// Set the allowed value range.
    pub fn with_range(mut self, min: Option<f64>, max: Option<f64>) -> Self {
        self.min = min;
        self.max = max;
        self
    }

    /// Allow null values.
    pub fn nullable(mut self) -> Self {
        self.nullable = true;
        self
    }

    /// Set the allowed category labels.
    pub fn with_categories(mut self, categories: Vec<String>) -> Self {
        self.categories = Some(categories);
        self
    }

    /// Assign this column to a percentile group.
    pub fn with_percentile(mut self, group: impl Into<String>, rank: u32) -> Self {
        self.percentile = Some(PercentileRank {
            group: group.into(),
            rank,
        });
        self
    }

    /// Check the spec's internal invariants.
    pub fn validate(&self) -> Result<()> {
        if self.name.is_empty() {
            return Err(FlowShieldError::Schema(
                "column name must be non-empty".to_string(),
            ));
        }
        if let (Some(min), Some(max)) = (self.min, self.max) {
            if min > max {
                return Err(FlowShieldError::Schema(format!(
                    "minimum greater than maximum for column '{}': {min} > {max}",
                    self.name
                )));
            }
        }
        if let Some(ref categories) = self.categories {
            let unique: std::collections::HashSet<&str> =
                categories.iter().map(|c| c.as_str()).collect();
            if unique.len() != categories.len() {
                return Err(FlowShieldError::Schema(format!(
                    "duplicate categories for column '{}'",
                    self.name
                )));
            }
        }
        Ok(())
    }

    /// Returns true if a numeric value lies within the declared range.
    pub fn in_range(&self, value: f64) -> bool {
        !self.min.is_some_and(|m| value < m) && !self.max.is_some_and(|m| value > m)
    }

    /// Clamp a numeric value into the declared range.
    pub fn clamp(&self, value: f64) -> f64 {
        let low = self.min.map_or(value, |m| value.max(m));
        self.max.map_or(low, |m| low.min(m))
    }
}
