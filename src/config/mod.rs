use crate::utils::error::Result;
use crate::utils::validation::{validate_non_empty_string, validate_url, Validate};
use clap::Parser;
use serde::{Deserialize, Serialize};

pub const DEFAULT_FILMS_URL: &str =
    "https://en.wikipedia.org/wiki/List_of_highest-grossing_films";

#[derive(Debug, Clone, Serialize, Deserialize, Parser)]
#[command(name = "analyst-agent")]
#[command(about = "Data analyst agent API: question in, statistics and charts out")]
pub struct CliConfig {
    #[arg(long, env = "HOST", default_value = "0.0.0.0")]
    pub host: String,

    #[arg(long, env = "PORT", default_value_t = 8000)]
    pub port: u16,

    #[arg(long, env = "FILMS_URL", default_value = DEFAULT_FILMS_URL)]
    pub films_url: String,

    #[arg(long, help = "Enable verbose output")]
    pub verbose: bool,
}

impl Validate for CliConfig {
    fn validate(&self) -> Result<()> {
        validate_non_empty_string("host", &self.host)?;
        validate_url("films_url", &self.films_url)?;
        Ok(())
    }
}
