//! FeatureTable — named columns of numbers or text, one row per observation.

use crate::error::SchemaError;
use std::collections::HashSet;
use std::io::Read;
use std::path::Path;

/// One column of a feature table.
#[derive(Debug, Clone, PartialEq)]
pub enum FeatureColumn {
    Numeric(Vec<f64>),
    Text(Vec<String>),
}

impl FeatureColumn {
    pub fn len(&self) -> usize {
        match self {
            FeatureColumn::Numeric(v) => v.len(),
            FeatureColumn::Text(v) => v.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    pub fn is_numeric(&self) -> bool {
        matches!(self, FeatureColumn::Numeric(_))
    }
}

/// Column-oriented table with unique column names and equal column lengths.
#[derive(Debug, Clone, PartialEq)]
pub struct FeatureTable {
    names: Vec<String>,
    columns: Vec<FeatureColumn>,
    rows: usize,
}

impl FeatureTable {
    pub fn new(columns: Vec<(String, FeatureColumn)>) -> Result<Self, SchemaError> {
        let rows = columns.first().map(|(_, c)| c.len()).unwrap_or(0);
        let mut seen = HashSet::new();
        for (name, column) in &columns {
            if !seen.insert(name.as_str()) {
                return Err(SchemaError::Csv(format!("duplicate column '{name}'")));
            }
            if column.len() != rows {
                return Err(SchemaError::RaggedColumns {
                    column: name.clone(),
                    expected: rows,
                    found: column.len(),
                });
            }
        }
        let (names, columns) = columns.into_iter().unzip();
        Ok(Self {
            names,
            columns,
            rows,
        })
    }

    /// Read a delimited table with a header row.
    ///
    /// A column is numeric when every cell parses as `f64`. A column whose
    /// non-empty cells are all numeric but which has blank cells is rejected
    /// rather than being reinterpreted as text.
    pub fn from_csv_reader<R: Read>(reader: R) -> Result<Self, SchemaError> {
        let mut csv_reader = csv::ReaderBuilder::new()
            .has_headers(true)
            .trim(csv::Trim::All)
            .from_reader(reader);

        let headers: Vec<String> = csv_reader
            .headers()
            .map_err(|e| SchemaError::Csv(e.to_string()))?
            .iter()
            .map(str::to_string)
            .collect();

        let mut cells: Vec<Vec<String>> = vec![Vec::new(); headers.len()];
        for record in csv_reader.records() {
            let record = record.map_err(|e| SchemaError::Csv(e.to_string()))?;
            for (column, cell) in cells.iter_mut().zip(record.iter()) {
                column.push(cell.to_string());
            }
        }

        let columns = headers
            .into_iter()
            .zip(cells)
            .map(|(name, raw)| {
                let column = infer_column(&name, raw)?;
                Ok((name, column))
            })
            .collect::<Result<Vec<_>, SchemaError>>()?;

        Self::new(columns)
    }

    pub fn from_csv_path(path: &Path) -> Result<Self, SchemaError> {
        let file = std::fs::File::open(path)
            .map_err(|e| SchemaError::Csv(format!("open {}: {e}", path.display())))?;
        Self::from_csv_reader(file)
    }

    pub fn rows(&self) -> usize {
        self.rows
    }

    pub fn names(&self) -> &[String] {
        &self.names
    }

    pub fn column(&self, name: &str) -> Option<&FeatureColumn> {
        self.names
            .iter()
            .position(|n| n == name)
            .map(|i| &self.columns[i])
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &FeatureColumn)> {
        self.names.iter().map(String::as_str).zip(&self.columns)
    }
}

fn infer_column(name: &str, raw: Vec<String>) -> Result<FeatureColumn, SchemaError> {
    let parsed: Vec<Option<f64>> = raw.iter().map(|s| s.parse::<f64>().ok()).collect();
    let non_empty_numeric = raw
        .iter()
        .zip(&parsed)
        .all(|(s, p)| s.is_empty() || p.is_some());
    let has_blank = raw.iter().any(String::is_empty);

    if non_empty_numeric && has_blank && raw.iter().any(|s| !s.is_empty()) {
        let row = raw.iter().position(String::is_empty).unwrap_or(0);
        return Err(SchemaError::Csv(format!(
            "missing value in numeric column '{name}' at row {}",
            row + 1
        )));
    }

    match parsed.into_iter().collect::<Option<Vec<f64>>>() {
        Some(values) => Ok(FeatureColumn::Numeric(values)),
        None => Ok(FeatureColumn::Text(raw)),
    }
}
