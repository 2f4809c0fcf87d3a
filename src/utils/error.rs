use thiserror::Error;

#[derive(Error, Debug)]
pub enum AgentError {
    #[error("API request failed: {0}")]
    ApiError(#[from] reqwest::Error),

    #[error("CSV processing error: {0}")]
    CsvError(#[from] csv::Error),

    #[error("Parquet processing error: {0}")]
    ParquetError(#[from] parquet::errors::ParquetError),

    #[error("Arrow data error: {0}")]
    ArrowError(#[from] arrow::error::ArrowError),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("Chart encoding error: {0}")]
    ChartEncodeError(#[from] image::ImageError),

    #[error("Chart rendering error: {message}")]
    ChartError { message: String },

    #[error("Scrape error: {message}")]
    ScrapeError { message: String },

    #[error("Upload error: {message}")]
    UploadError { message: String },

    #[error("Data processing error: {message}")]
    ProcessingError { message: String },

    #[error("Invalid value for {field} ('{value}'): {reason}")]
    InvalidConfigValueError {
        field: String,
        value: String,
        reason: String,
    },
}

pub type Result<T> = std::result::Result<T, AgentError>;
