//! One-hot feature encoding, learned once and reused for every prediction.
//!
//! Categorical columns expand into one 0/1 column per category, in sorted
//! order, with the first category dropped as the reference. Encoded columns
//! follow the numeric columns, each named `{column}_{category}`. A category
//! never seen while fitting encodes as all zeros, the same as the reference.

use super::table::{FeatureColumn, FeatureTable};
use crate::error::SchemaError;
use ndarray::Array2;
use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

/// A raw (pre-encoding) feature value supplied for prediction.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(untagged)]
pub enum FeatureValue {
    Number(f64),
    Category(String),
}

impl From<f64> for FeatureValue {
    fn from(v: f64) -> Self {
        FeatureValue::Number(v)
    }
}

impl From<&str> for FeatureValue {
    fn from(v: &str) -> Self {
        FeatureValue::Category(v.to_string())
    }
}

impl From<String> for FeatureValue {
    fn from(v: String) -> Self {
        FeatureValue::Category(v)
    }
}

/// One observation to predict, keyed by raw feature column name.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct PredictionRow {
    values: BTreeMap<String, FeatureValue>,
}

impl PredictionRow {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with(mut self, column: impl Into<String>, value: impl Into<FeatureValue>) -> Self {
        self.set(column, value);
        self
    }

    pub fn set(&mut self, column: impl Into<String>, value: impl Into<FeatureValue>) {
        self.values.insert(column.into(), value.into());
    }

    pub fn get(&self, column: &str) -> Option<&FeatureValue> {
        self.values.get(column)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureValue)> {
        self.values.iter().map(|(k, v)| (k.as_str(), v))
    }
}

#[derive(Debug, Clone, PartialEq)]
enum FeatureKind {
    Numeric { mean: f64 },
    /// Sorted categories; `categories[0]` is the dropped reference.
    Categorical { categories: Vec<String>, mode: String },
}

#[derive(Debug, Clone, PartialEq)]
struct RawFeature {
    name: String,
    kind: FeatureKind,
}

/// Encoding learned from a full feature table (target excluded).
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureEncoder {
    features: Vec<RawFeature>,
    encoded_names: Vec<String>,
}

impl FeatureEncoder {
    /// Learn the encoding from every column of `table` except `target`.
    ///
    /// `categorical` lists the columns to one-hot encode. When `None`, every
    /// text column is encoded. A text column left unencoded is an error.
    pub fn fit(
        table: &FeatureTable,
        target: &str,
        categorical: Option<&[String]>,
    ) -> Result<Self, SchemaError> {
        if let Some(listed) = categorical {
            if let Some(missing) = listed.iter().find(|c| table.column(c).is_none()) {
                return Err(SchemaError::UnknownColumn {
                    column: missing.clone(),
                });
            }
        }
        let wants_encoding = |name: &str, column: &FeatureColumn| match categorical {
            Some(listed) => listed.iter().any(|c| c == name),
            None => !column.is_numeric(),
        };

        let mut features = Vec::new();
        for (name, column) in table.iter().filter(|(name, _)| *name != target) {
            let kind = if wants_encoding(name, column) {
                let labels = category_labels(column);
                let categories: Vec<String> = labels
                    .iter()
                    .cloned()
                    .collect::<BTreeSet<_>>()
                    .into_iter()
                    .collect();
                FeatureKind::Categorical {
                    mode: most_frequent(&labels, &categories),
                    categories,
                }
            } else {
                match column {
                    FeatureColumn::Numeric(values) => FeatureKind::Numeric {
                        mean: values.iter().sum::<f64>() / values.len().max(1) as f64,
                    },
                    FeatureColumn::Text(_) => {
                        return Err(SchemaError::NonNumericColumn {
                            column: name.to_string(),
                        })
                    }
                }
            };
            features.push(RawFeature {
                name: name.to_string(),
                kind,
            });
        }

        let numeric = features
            .iter()
            .filter(|f| matches!(f.kind, FeatureKind::Numeric { .. }))
            .map(|f| f.name.clone());
        let dummies = features.iter().flat_map(|f| match &f.kind {
            FeatureKind::Categorical { categories, .. } => categories
                .iter()
                .skip(1)
                .map(|c| format!("{}_{c}", f.name))
                .collect(),
            FeatureKind::Numeric { .. } => Vec::new(),
        });
        let encoded_names = numeric.chain(dummies).collect();

        Ok(Self {
            features,
            encoded_names,
        })
    }

    /// Raw feature column names, in table order.
    pub fn raw_names(&self) -> impl Iterator<Item = &str> {
        self.features.iter().map(|f| f.name.as_str())
    }

    /// Encoded column names, in design-matrix order.
    pub fn encoded_names(&self) -> &[String] {
        &self.encoded_names
    }

    pub fn is_numeric(&self, column: &str) -> Option<bool> {
        self.feature(column)
            .map(|f| matches!(f.kind, FeatureKind::Numeric { .. }))
    }

    /// Encode every row of `table` into a design matrix.
    pub fn encode_table(&self, table: &FeatureTable) -> Result<Array2<f64>, SchemaError> {
        let mut matrix = Array2::zeros((table.rows(), self.encoded_names.len()));
        for row in 0..table.rows() {
            let mut values = BTreeMap::new();
            for feature in &self.features {
                let column = table.column(&feature.name).ok_or_else(|| SchemaError::UnknownColumn {
                    column: feature.name.clone(),
                })?;
                let value = match column {
                    FeatureColumn::Numeric(v) => FeatureValue::Number(v[row]),
                    FeatureColumn::Text(v) => FeatureValue::Category(v[row].clone()),
                };
                values.insert(feature.name.clone(), value);
            }
            let encoded = self.encode_row(&PredictionRow { values })?;
            for (j, v) in encoded.into_iter().enumerate() {
                matrix[[row, j]] = v;
            }
        }
        Ok(matrix)
    }

    /// Encode a single raw row. The row must name exactly the raw features.
    pub fn encode_row(&self, row: &PredictionRow) -> Result<Vec<f64>, SchemaError> {
        if let Some((extra, _)) = row.iter().find(|(name, _)| self.feature(name).is_none()) {
            return Err(SchemaError::PredictionRowMismatch {
                reason: format!("unknown column '{extra}'"),
            });
        }

        let mut numeric = Vec::new();
        let mut dummies = Vec::new();
        for feature in &self.features {
            let value = row
                .get(&feature.name)
                .ok_or_else(|| SchemaError::PredictionRowMismatch {
                    reason: format!("missing column '{}'", feature.name),
                })?;
            match (&feature.kind, value) {
                (FeatureKind::Numeric { .. }, FeatureValue::Number(v)) => numeric.push(*v),
                (FeatureKind::Numeric { .. }, FeatureValue::Category(c)) => {
                    return Err(SchemaError::PredictionRowMismatch {
                        reason: format!("column '{}' expects a number, got '{c}'", feature.name),
                    })
                }
                (FeatureKind::Categorical { categories, .. }, value) => {
                    let label = match value {
                        FeatureValue::Category(c) => c.clone(),
                        FeatureValue::Number(v) => v.to_string(),
                    };
                    dummies.extend(
                        categories
                            .iter()
                            .skip(1)
                            .map(|c| if *c == label { 1.0 } else { 0.0 }),
                    );
                }
            }
        }
        numeric.extend(dummies);
        Ok(numeric)
    }

    /// A row with every numeric feature at its mean and every categorical
    /// feature at its most frequent category.
    pub fn default_row(&self) -> PredictionRow {
        let values = self
            .features
            .iter()
            .map(|f| {
                let value = match &f.kind {
                    FeatureKind::Numeric { mean } => FeatureValue::Number(*mean),
                    FeatureKind::Categorical { mode, .. } => FeatureValue::Category(mode.clone()),
                };
                (f.name.clone(), value)
            })
            .collect();
        PredictionRow { values }
    }

    /// Parse a user-supplied override for `column` into the right value kind.
    pub fn parse_value(&self, column: &str, raw: &str) -> Result<FeatureValue, SchemaError> {
        match self.is_numeric(column) {
            None => Err(SchemaError::PredictionRowMismatch {
                reason: format!("unknown column '{column}'"),
            }),
            Some(true) => raw.trim().parse::<f64>().map(FeatureValue::Number).map_err(|_| {
                SchemaError::PredictionRowMismatch {
                    reason: format!("column '{column}' expects a number, got '{raw}'"),
                }
            }),
            Some(false) => Ok(FeatureValue::Category(raw.trim().to_string())),
        }
    }

    fn feature(&self, column: &str) -> Option<&RawFeature> {
        self.features.iter().find(|f| f.name == column)
    }
}

fn category_labels(column: &FeatureColumn) -> Vec<String> {
    match column {
        FeatureColumn::Text(v) => v.clone(),
        FeatureColumn::Numeric(v) => v.iter().map(f64::to_string).collect(),
    }
}

/// Most frequent label; ties go to the first in sorted order.
fn most_frequent(labels: &[String], sorted: &[String]) -> String {
    let mut counts: BTreeMap<&str, usize> = BTreeMap::new();
    for label in labels {
        *counts.entry(label.as_str()).or_default() += 1;
    }
    sorted
        .iter()
        .max_by(|a, b| {
            counts[a.as_str()]
                .cmp(&counts[b.as_str()])
                .then_with(|| b.cmp(a))
        })
        .cloned()
        .unwrap_or_default()
}
