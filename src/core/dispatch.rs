use crate::core::{films, loader, sales};
use crate::domain::model::{AnalysisOutcome, AnalysisRequest};
use crate::utils::error::Result;
use reqwest::Client;

/// The closed set of analysis tasks this service knows how to run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskKind {
    HighestGrossingFilms,
    DatasetAnalysis,
}

/// Pure task selection over the question text and attachment filenames.
pub fn classify(question_text: &str, attachment_names: &[&str]) -> Option<TaskKind> {
    if question_text
        .to_lowercase()
        .contains("highest grossing films")
    {
        return Some(TaskKind::HighestGrossingFilms);
    }
    if attachment_names
        .iter()
        .any(|name| loader::has_supported_extension(name))
    {
        return Some(TaskKind::DatasetAnalysis);
    }
    None
}

/// Runs one request end to end. Every downstream failure is absorbed at
/// this boundary and reported in the outcome body.
pub struct Analyst {
    client: Client,
    films_url: String,
}

impl Analyst {
    pub fn new(films_url: impl Into<String>) -> Self {
        Self {
            client: Client::new(),
            films_url: films_url.into(),
        }
    }

    pub async fn handle(&self, request: &AnalysisRequest) -> AnalysisOutcome {
        tracing::info!(
            "Handling analysis request with {} attachment(s)",
            request.attachments.len()
        );
        match self.run(request).await {
            Ok(outcome) => outcome,
            Err(e) => {
                tracing::warn!("Analysis request failed: {}", e);
                AnalysisOutcome::Failure {
                    error: e.to_string(),
                }
            }
        }
    }

    async fn run(&self, request: &AnalysisRequest) -> Result<AnalysisOutcome> {
        let names: Vec<&str> = request
            .attachments
            .iter()
            .map(|a| a.filename.as_str())
            .collect();
        let task = classify(&request.question_text, &names);
        tracing::debug!("Classified question as {:?}", task);

        match task {
            Some(TaskKind::HighestGrossingFilms) => Ok(AnalysisOutcome::Films(
                films::run(&self.client, &self.films_url).await?,
            )),
            Some(TaskKind::DatasetAnalysis) => {
                let dataset = loader::load_attachment_table(&request.attachments)?;
                sales::run(&request.question_text, dataset)
            }
            None => Ok(AnalysisOutcome::Failure {
                error: "Unsupported question type".to_string(),
            }),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_films_phrase_case_insensitive() {
        assert_eq!(
            classify("Tell me about the Highest Grossing FILMS", &[]),
            Some(TaskKind::HighestGrossingFilms)
        );
    }

    #[test]
    fn test_classify_films_wins_over_attachments() {
        assert_eq!(
            classify("highest grossing films please", &["sales.csv"]),
            Some(TaskKind::HighestGrossingFilms)
        );
    }

    #[test]
    fn test_classify_tabular_attachment() {
        assert_eq!(
            classify("what is the total sales?", &["notes.txt", "sales.parquet"]),
            Some(TaskKind::DatasetAnalysis)
        );
    }

    #[test]
    fn test_classify_nothing_matches() {
        assert_eq!(classify("tell me a joke", &[]), None);
        assert_eq!(classify("tell me a joke", &["readme.md"]), None);
    }
}
