use crate::utils::error::{AgentError, Result};
use chrono::NaiveDate;
use serde::Serialize;
use std::collections::HashSet;

/// An uploaded binary file accompanying the question text.
#[derive(Debug, Clone)]
pub struct Attachment {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// One incoming analysis request. The question text is always present;
/// attachments may be empty and their order is significant.
#[derive(Debug, Clone)]
pub struct AnalysisRequest {
    pub question_text: String,
    pub attachments: Vec<Attachment>,
}

/// A single typed table cell.
#[derive(Debug, Clone, PartialEq)]
pub enum Cell {
    Number(f64),
    Text(String),
    Date(NaiveDate),
}

impl Cell {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Cell::Number(v) => Some(*v),
            Cell::Text(s) => s.trim().parse::<f64>().ok(),
            Cell::Date(_) => None,
        }
    }

    pub fn as_date(&self) -> Option<NaiveDate> {
        match self {
            Cell::Date(d) => Some(*d),
            _ => None,
        }
    }

    /// Textual form, used for substring matching and categorical grouping.
    pub fn render(&self) -> String {
        match self {
            Cell::Number(v) => format!("{}", v),
            Cell::Text(s) => s.clone(),
            Cell::Date(d) => d.format("%Y-%m-%d").to_string(),
        }
    }
}

/// An in-memory table of named, equal-length columns. Built once per
/// request from an attachment or a scraped remote table, dropped with the
/// request.
#[derive(Debug, Clone)]
pub struct TabularDataset {
    headers: Vec<String>,
    rows: Vec<Vec<Cell>>,
}

impl TabularDataset {
    pub fn new(headers: Vec<String>, rows: Vec<Vec<Cell>>) -> Result<Self> {
        let mut seen = HashSet::new();
        for header in &headers {
            if !seen.insert(header.as_str()) {
                return Err(AgentError::ProcessingError {
                    message: format!("duplicate column name: '{}'", header),
                });
            }
        }
        for (index, row) in rows.iter().enumerate() {
            if row.len() != headers.len() {
                return Err(AgentError::ProcessingError {
                    message: format!(
                        "row {} has {} cells, expected {}",
                        index,
                        row.len(),
                        headers.len()
                    ),
                });
            }
        }
        Ok(Self { headers, rows })
    }

    pub fn headers(&self) -> &[String] {
        &self.headers
    }

    pub fn row_count(&self) -> usize {
        self.rows.len()
    }

    pub fn column_index(&self, name: &str) -> Result<usize> {
        self.headers
            .iter()
            .position(|h| h == name)
            .ok_or_else(|| AgentError::ProcessingError {
                message: format!("column '{}' not found", name),
            })
    }

    pub fn column(&self, name: &str) -> Result<Vec<&Cell>> {
        let index = self.column_index(name)?;
        Ok(self.rows.iter().map(|row| &row[index]).collect())
    }

    /// Column as f64 values; errors on the first cell that does not parse.
    pub fn numeric_column(&self, name: &str) -> Result<Vec<f64>> {
        self.column(name)?
            .into_iter()
            .map(|cell| {
                cell.as_f64().ok_or_else(|| AgentError::ProcessingError {
                    message: format!(
                        "column '{}' contains a non-numeric value: '{}'",
                        name,
                        cell.render()
                    ),
                })
            })
            .collect()
    }

    pub fn text_column(&self, name: &str) -> Result<Vec<String>> {
        Ok(self.column(name)?.into_iter().map(Cell::render).collect())
    }

    /// Replaces a whole column in place. Used when a task re-types a
    /// column (e.g. parsing date text into temporal cells).
    pub fn set_column(&mut self, index: usize, cells: Vec<Cell>) -> Result<()> {
        if index >= self.headers.len() {
            return Err(AgentError::ProcessingError {
                message: format!("column index {} out of range", index),
            });
        }
        if cells.len() != self.rows.len() {
            return Err(AgentError::ProcessingError {
                message: format!(
                    "replacement column has {} cells, expected {}",
                    cells.len(),
                    self.rows.len()
                ),
            });
        }
        for (row, cell) in self.rows.iter_mut().zip(cells) {
            row[index] = cell;
        }
        Ok(())
    }
}

/// Films answer, serialized as the positional array
/// `[count, title, correlation, chart]`. Consumers index into it, so the
/// order is part of the contract.
#[derive(Debug, Clone, Serialize)]
pub struct FilmsAnswer(pub i64, pub String, pub Option<f64>, pub String);

/// Sales answer. Field order follows the response contract.
#[derive(Debug, Clone, Serialize)]
pub struct SalesAnswer {
    pub total_sales: f64,
    pub top_region: String,
    pub day_sales_correlation: Option<f64>,
    pub bar_chart: String,
    pub median_sales: f64,
    pub total_sales_tax: f64,
    pub cumulative_sales_chart: String,
}

/// The one outcome produced per request.
#[derive(Debug, Clone, Serialize)]
#[serde(untagged)]
pub enum AnalysisOutcome {
    Films(FilmsAnswer),
    Sales(Box<SalesAnswer>),
    Failure { error: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    fn text_row(values: &[&str]) -> Vec<Cell> {
        values.iter().map(|v| Cell::Text(v.to_string())).collect()
    }

    #[test]
    fn test_duplicate_headers_rejected() {
        let result = TabularDataset::new(
            vec!["a".to_string(), "a".to_string()],
            vec![text_row(&["1", "2"])],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_ragged_rows_rejected() {
        let result = TabularDataset::new(
            vec!["a".to_string(), "b".to_string()],
            vec![text_row(&["1"])],
        );
        assert!(result.is_err());
    }

    #[test]
    fn test_missing_column_names_the_column() {
        let dataset =
            TabularDataset::new(vec!["a".to_string()], vec![text_row(&["1"])]).unwrap();
        let err = dataset.column("b").unwrap_err();
        assert!(err.to_string().contains("column 'b' not found"));
    }

    #[test]
    fn test_numeric_column_parses_text() {
        let dataset = TabularDataset::new(
            vec!["sales".to_string()],
            vec![text_row(&["100"]), vec![Cell::Number(50.0)]],
        )
        .unwrap();
        assert_eq!(dataset.numeric_column("sales").unwrap(), vec![100.0, 50.0]);
    }

    #[test]
    fn test_numeric_column_rejects_text() {
        let dataset =
            TabularDataset::new(vec!["sales".to_string()], vec![text_row(&["n/a"])]).unwrap();
        assert!(dataset.numeric_column("sales").is_err());
    }

    #[test]
    fn test_films_answer_serializes_positionally() {
        let answer = FilmsAnswer(1, "Title".to_string(), Some(0.5), "data:".to_string());
        let value = serde_json::to_value(AnalysisOutcome::Films(answer)).unwrap();
        assert_eq!(value, serde_json::json!([1, "Title", 0.5, "data:"]));
    }

    #[test]
    fn test_failure_serializes_as_error_object() {
        let value = serde_json::to_value(AnalysisOutcome::Failure {
            error: "Unsupported question type".to_string(),
        })
        .unwrap();
        assert_eq!(value, serde_json::json!({"error": "Unsupported question type"}));
    }
}
