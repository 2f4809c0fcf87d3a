pub mod config;
pub mod core;
pub mod domain;
pub mod server;
pub mod utils;

pub use crate::config::CliConfig;
pub use crate::core::dispatch::{classify, Analyst, TaskKind};
pub use crate::domain::model::{AnalysisOutcome, AnalysisRequest, Attachment};
pub use crate::utils::error::{AgentError, Result};
