use crate::core::{chart, stats};
use crate::domain::model::{AnalysisOutcome, Cell, SalesAnswer, TabularDataset};
use crate::utils::error::{AgentError, Result};
use chrono::{Datelike, NaiveDate};
use std::collections::BTreeMap;

const DATE_FORMATS: &[&str] = &["%Y-%m-%d", "%Y/%m/%d", "%m/%d/%Y"];

/// Sales analysis over a dataset with `sales`, `region` and `date`
/// columns. Questions that do not ask for total sales are rejected here,
/// after loading, mirroring the request flow this endpoint replaces.
pub fn run(question_text: &str, mut dataset: TabularDataset) -> Result<AnalysisOutcome> {
    if !question_text.to_lowercase().contains("total sales") {
        return Ok(AnalysisOutcome::Failure {
            error: "Unsupported dataset query".to_string(),
        });
    }
    if dataset.row_count() == 0 {
        return Err(AgentError::ProcessingError {
            message: "dataset has no rows".to_string(),
        });
    }

    let sales = dataset.numeric_column("sales")?;
    let regions = dataset.text_column("region")?;
    let dates = parse_date_column(&mut dataset, "date")?;

    let total_sales: f64 = sales.iter().sum();

    // BTreeMap keeps regions sorted, which makes the top-region tie-break
    // lexicographic and the bar order deterministic.
    let mut by_region: BTreeMap<String, f64> = BTreeMap::new();
    for (region, amount) in regions.iter().zip(sales.iter()) {
        *by_region.entry(region.clone()).or_insert(0.0) += amount;
    }
    let mut top_region = String::new();
    let mut top_total = f64::NEG_INFINITY;
    for (region, total) in &by_region {
        if *total > top_total {
            top_total = *total;
            top_region = region.clone();
        }
    }

    let days: Vec<f64> = dates.iter().map(|d| f64::from(d.day())).collect();
    let day_sales_correlation = stats::pearson(&days, &sales).map(stats::round6);

    let median_sales =
        stats::median(&sales).ok_or_else(|| AgentError::ProcessingError {
            message: "median of an empty sales column".to_string(),
        })?;
    let total_sales_tax = total_sales * 0.10;

    let (bar_labels, bar_values): (Vec<String>, Vec<f64>) =
        by_region.iter().map(|(k, v)| (k.clone(), *v)).unzip();
    let bar_chart = chart::bar_chart(&bar_labels, &bar_values, "Region", "Total Sales")?;

    let mut ordered: Vec<(NaiveDate, f64)> =
        dates.iter().copied().zip(sales.iter().copied()).collect();
    ordered.sort_by_key(|(date, _)| *date);
    let mut running = 0.0;
    let cumulative: Vec<(NaiveDate, f64)> = ordered
        .into_iter()
        .map(|(date, amount)| {
            running += amount;
            (date, running)
        })
        .collect();
    let cumulative_sales_chart =
        chart::date_line_chart(&cumulative, "Date", "Cumulative Sales")?;

    Ok(AnalysisOutcome::Sales(Box::new(SalesAnswer {
        total_sales,
        top_region,
        day_sales_correlation,
        bar_chart,
        median_sales,
        total_sales_tax,
        cumulative_sales_chart,
    })))
}

/// Parses the named column into dates and re-types it in the dataset, so
/// every later step sees temporal cells.
fn parse_date_column(dataset: &mut TabularDataset, name: &str) -> Result<Vec<NaiveDate>> {
    let index = dataset.column_index(name)?;
    let cells = dataset.column(name)?;
    let mut dates = Vec::with_capacity(cells.len());
    for cell in cells {
        dates.push(parse_date(cell)?);
    }
    dataset.set_column(index, dates.iter().map(|d| Cell::Date(*d)).collect())?;
    Ok(dates)
}

fn parse_date(cell: &Cell) -> Result<NaiveDate> {
    if let Cell::Date(date) = cell {
        return Ok(*date);
    }
    let rendered = cell.render();
    let text = rendered.trim();
    for format in DATE_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Ok(date);
        }
    }
    if let Ok(dt) = chrono::NaiveDateTime::parse_from_str(text, "%Y-%m-%dT%H:%M:%S") {
        return Ok(dt.date());
    }
    Err(AgentError::ProcessingError {
        message: format!("column 'date' contains an unparseable date: '{}'", text),
    })
}
