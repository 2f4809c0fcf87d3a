pub mod chart;
pub mod dispatch;
pub mod films;
pub mod loader;
pub mod sales;
pub mod stats;

pub use crate::domain::model::{AnalysisOutcome, AnalysisRequest, Attachment, TabularDataset};
pub use crate::utils::error::Result;
