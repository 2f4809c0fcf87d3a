use crate::core::{chart, loader, stats};
use crate::domain::model::FilmsAnswer;
use crate::utils::error::{AgentError, Result};
use regex::Regex;
use reqwest::Client;
use std::cmp::Ordering;

const GROSS_COLUMN: &str = "Worldwide gross";

/// Scrapes the highest-grossing-films table and answers the four fixed
/// questions over it.
pub async fn run(client: &Client, films_url: &str) -> Result<FilmsAnswer> {
    let table = loader::fetch_wikitable(client, films_url).await?;
    tracing::debug!("Scraped films table: {} rows", table.row_count());

    let gross = table.column(GROSS_COLUMN)?;
    let years = table.column("Year")?;
    let titles = table.column("Title")?;

    // Releases before 2000 whose gross text carries the "2.0" marker.
    let count = gross
        .iter()
        .zip(years.iter())
        .filter(|(g, y)| {
            g.render().contains("2.0") && y.as_f64().is_some_and(|year| year < 2000.0)
        })
        .count() as i64;

    // Earliest release grossing more than $1.5 billion.
    let amount_pattern =
        Regex::new(r"[^0-9.]").map_err(|e| AgentError::ProcessingError {
            message: format!("gross amount pattern: {}", e),
        })?;
    let mut qualifying: Vec<(Option<f64>, String)> = Vec::new();
    for ((g, y), t) in gross.iter().zip(years.iter()).zip(titles.iter()) {
        let rendered = g.render();
        let stripped = amount_pattern.replace_all(&rendered, "");
        let amount = stripped
            .parse::<f64>()
            .map_err(|_| AgentError::ProcessingError {
                message: format!("could not parse worldwide gross value: '{}'", rendered),
            })?;
        if amount > 1_500_000_000.0 {
            qualifying.push((y.as_f64(), t.render()));
        }
    }
    qualifying.sort_by(|a, b| compare_years(a.0, b.0));
    let title = qualifying
        .first()
        .map(|(_, title)| title.clone())
        .ok_or_else(|| AgentError::ProcessingError {
            message: "no film with worldwide gross over $1.5 billion found".to_string(),
        })?;

    // Rank/Peak correlation over pairwise-numeric rows.
    let pairs: Vec<(f64, f64)> = table
        .column("Rank")?
        .iter()
        .zip(table.column("Peak")?.iter())
        .filter_map(|(rank, peak)| Some((rank.as_f64()?, peak.as_f64()?)))
        .collect();
    let ranks: Vec<f64> = pairs.iter().map(|p| p.0).collect();
    let peaks: Vec<f64> = pairs.iter().map(|p| p.1).collect();
    let correlation = stats::pearson(&ranks, &peaks);

    // The trend line reuses the correlation coefficient as its slope with
    // a zero intercept. Not a least-squares fit.
    let chart = chart::scatter_with_trend(&pairs, correlation, "Rank", "Peak")?;

    Ok(FilmsAnswer(
        count,
        title,
        correlation.map(stats::round6),
        chart,
    ))
}

/// Ascending by year; rows without a numeric year sort last.
fn compare_years(a: Option<f64>, b: Option<f64>) -> Ordering {
    match (a, b) {
        (Some(x), Some(y)) => x.partial_cmp(&y).unwrap_or(Ordering::Equal),
        (Some(_), None) => Ordering::Less,
        (None, Some(_)) => Ordering::Greater,
        (None, None) => Ordering::Equal,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_compare_years_orders_missing_last() {
        assert_eq!(compare_years(Some(1997.0), Some(2009.0)), Ordering::Less);
        assert_eq!(compare_years(Some(2015.0), None), Ordering::Less);
        assert_eq!(compare_years(None, Some(1998.0)), Ordering::Greater);
        assert_eq!(compare_years(None, None), Ordering::Equal);
    }
}
