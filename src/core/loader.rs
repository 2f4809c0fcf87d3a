use crate::domain::model::{Attachment, Cell, TabularDataset};
use crate::utils::error::{AgentError, Result};
use arrow::array::{
    Array, BooleanArray, Date32Array, Float32Array, Float64Array, Int32Array, Int64Array,
    LargeStringArray, StringArray,
};
use arrow::datatypes::{DataType, Field};
use parquet::arrow::arrow_reader::ParquetRecordBatchReaderBuilder;
use reqwest::Client;
use scraper::{ElementRef, Html, Selector};

pub const SUPPORTED_EXTENSIONS: &[&str] = &[".csv", ".parquet"];

pub fn has_supported_extension(filename: &str) -> bool {
    SUPPORTED_EXTENSIONS
        .iter()
        .any(|ext| filename.ends_with(ext))
}

/// Walks the attachments in request order; the last one with a supported
/// extension wins. Unsupported extensions are skipped.
pub fn load_attachment_table(attachments: &[Attachment]) -> Result<TabularDataset> {
    let mut dataset = None;
    for attachment in attachments {
        if attachment.filename.ends_with(".csv") {
            tracing::debug!("Parsing CSV attachment: {}", attachment.filename);
            dataset = Some(parse_csv(&attachment.bytes)?);
        } else if attachment.filename.ends_with(".parquet") {
            tracing::debug!("Parsing Parquet attachment: {}", attachment.filename);
            dataset = Some(parse_parquet(&attachment.bytes)?);
        }
    }
    dataset.ok_or_else(|| AgentError::ProcessingError {
        message: "no supported tabular attachment (.csv or .parquet) found".to_string(),
    })
}

pub fn parse_csv(bytes: &[u8]) -> Result<TabularDataset> {
    let mut reader = csv::ReaderBuilder::new().from_reader(bytes);
    let headers: Vec<String> = reader
        .headers()?
        .iter()
        .map(|h| h.trim().to_string())
        .collect();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        rows.push(record.iter().map(infer_cell).collect());
    }
    TabularDataset::new(headers, rows)
}

fn infer_cell(raw: &str) -> Cell {
    let trimmed = raw.trim();
    match trimmed.parse::<f64>() {
        Ok(v) => Cell::Number(v),
        Err(_) => Cell::Text(trimmed.to_string()),
    }
}

pub fn parse_parquet(data: &[u8]) -> Result<TabularDataset> {
    let buffer = bytes::Bytes::copy_from_slice(data);
    let builder = ParquetRecordBatchReaderBuilder::try_new(buffer)?;
    let schema = builder.schema().clone();
    let reader = builder.build()?;

    let headers: Vec<String> = schema
        .fields()
        .iter()
        .map(|field| field.name().trim().to_string())
        .collect();
    let mut columns: Vec<Vec<Cell>> = vec![Vec::new(); headers.len()];
    for batch in reader {
        let batch = batch?;
        for (index, column) in batch.columns().iter().enumerate() {
            append_cells(&mut columns[index], column.as_ref(), schema.field(index))?;
        }
    }

    let row_count = columns.first().map_or(0, Vec::len);
    let mut rows = Vec::with_capacity(row_count);
    for r in 0..row_count {
        rows.push(columns.iter().map(|column| column[r].clone()).collect());
    }
    TabularDataset::new(headers, rows)
}

fn append_cells(cells: &mut Vec<Cell>, column: &dyn Array, field: &Field) -> Result<()> {
    fn downcast_err(field: &Field) -> AgentError {
        AgentError::ProcessingError {
            message: format!("column '{}' does not match its declared type", field.name()),
        }
    }

    match field.data_type() {
        DataType::Int32 => {
            let array = column
                .as_any()
                .downcast_ref::<Int32Array>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                cells.push(if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    Cell::Number(f64::from(array.value(i)))
                });
            }
        }
        DataType::Int64 => {
            let array = column
                .as_any()
                .downcast_ref::<Int64Array>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                cells.push(if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    Cell::Number(array.value(i) as f64)
                });
            }
        }
        DataType::Float32 => {
            let array = column
                .as_any()
                .downcast_ref::<Float32Array>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                cells.push(if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    Cell::Number(f64::from(array.value(i)))
                });
            }
        }
        DataType::Float64 => {
            let array = column
                .as_any()
                .downcast_ref::<Float64Array>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                cells.push(if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    Cell::Number(array.value(i))
                });
            }
        }
        DataType::Utf8 => {
            let array = column
                .as_any()
                .downcast_ref::<StringArray>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                cells.push(if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    Cell::Text(array.value(i).to_string())
                });
            }
        }
        DataType::LargeUtf8 => {
            let array = column
                .as_any()
                .downcast_ref::<LargeStringArray>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                cells.push(if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    Cell::Text(array.value(i).to_string())
                });
            }
        }
        DataType::Boolean => {
            let array = column
                .as_any()
                .downcast_ref::<BooleanArray>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                cells.push(if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    Cell::Text(array.value(i).to_string())
                });
            }
        }
        DataType::Date32 => {
            let array = column
                .as_any()
                .downcast_ref::<Date32Array>()
                .ok_or_else(|| downcast_err(field))?;
            for i in 0..array.len() {
                let cell = if array.is_null(i) {
                    Cell::Text(String::new())
                } else {
                    array
                        .value_as_date(i)
                        .map(Cell::Date)
                        .unwrap_or_else(|| Cell::Text(String::new()))
                };
                cells.push(cell);
            }
        }
        other => {
            return Err(AgentError::ProcessingError {
                message: format!(
                    "unsupported parquet column type {:?} for column '{}'",
                    other,
                    field.name()
                ),
            });
        }
    }
    Ok(())
}

/// Fetches the remote document and extracts the first table classified as
/// a wikitable.
pub async fn fetch_wikitable(client: &Client, url: &str) -> Result<TabularDataset> {
    tracing::debug!("Fetching films table from: {}", url);
    let html = client.get(url).send().await?.text().await?;
    parse_wikitable(&html)
}

pub fn parse_wikitable(html: &str) -> Result<TabularDataset> {
    let document = Html::parse_document(html);
    let table_selector = selector("table.wikitable")?;
    let row_selector = selector("tr")?;
    let cell_selector = selector("th, td")?;

    let table = document
        .select(&table_selector)
        .next()
        .ok_or_else(|| AgentError::ScrapeError {
            message: "no wikitable found in fetched document".to_string(),
        })?;

    let mut row_iter = table.select(&row_selector);
    let header_row = row_iter.next().ok_or_else(|| AgentError::ScrapeError {
        message: "wikitable has no header row".to_string(),
    })?;
    let headers: Vec<String> = header_row.select(&cell_selector).map(cell_text).collect();

    let mut rows = Vec::new();
    for row in row_iter {
        let cells: Vec<Cell> = row
            .select(&cell_selector)
            .map(|cell| Cell::Text(cell_text(cell)))
            .collect();
        if cells.is_empty() {
            continue;
        }
        // Rows truncated by rowspan markup are dropped rather than
        // misaligned against the header.
        if cells.len() != headers.len() {
            continue;
        }
        rows.push(cells);
    }
    TabularDataset::new(headers, rows)
}

fn selector(css: &str) -> Result<Selector> {
    Selector::parse(css).map_err(|e| AgentError::ScrapeError {
        message: format!("invalid selector '{}': {}", css, e),
    })
}

fn cell_text(cell: ElementRef) -> String {
    cell.text()
        .collect::<String>()
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_supported_extensions() {
        assert!(has_supported_extension("sample-sales.csv"));
        assert!(has_supported_extension("data.parquet"));
        assert!(!has_supported_extension("notes.txt"));
        assert!(!has_supported_extension("archive.csv.gz"));
    }

    #[test]
    fn test_csv_cell_inference() {
        let dataset = parse_csv(b"date,region,sales\n2023-01-01,East,100\n").unwrap();
        assert_eq!(dataset.headers(), ["date", "region", "sales"]);
        let sales = dataset.column("sales").unwrap();
        assert_eq!(sales[0], &Cell::Number(100.0));
        let dates = dataset.column("date").unwrap();
        assert_eq!(dates[0], &Cell::Text("2023-01-01".to_string()));
    }

    #[test]
    fn test_last_supported_attachment_wins() {
        let attachments = vec![
            Attachment {
                filename: "first.csv".to_string(),
                bytes: b"sales\n1\n".to_vec(),
            },
            Attachment {
                filename: "notes.txt".to_string(),
                bytes: b"ignore me".to_vec(),
            },
            Attachment {
                filename: "second.csv".to_string(),
                bytes: b"sales\n42\n".to_vec(),
            },
        ];
        let dataset = load_attachment_table(&attachments).unwrap();
        assert_eq!(dataset.numeric_column("sales").unwrap(), vec![42.0]);
    }

    #[test]
    fn test_no_supported_attachment_is_an_error() {
        let attachments = vec![Attachment {
            filename: "notes.txt".to_string(),
            bytes: b"plain text".to_vec(),
        }];
        let err = load_attachment_table(&attachments).unwrap_err();
        assert!(err.to_string().contains("no supported tabular attachment"));
    }

    #[test]
    fn test_parse_wikitable_trims_headers() {
        let html = r#"<table class="wikitable">
            <tr><th> Rank </th><th> Title </th></tr>
            <tr><td>1</td><td>Starfall</td></tr>
            <tr><td>2</td><td>Ocean Song</td></tr>
        </table>"#;
        let dataset = parse_wikitable(html).unwrap();
        assert_eq!(dataset.headers(), ["Rank", "Title"]);
        assert_eq!(dataset.row_count(), 2);
    }

    #[test]
    fn test_missing_wikitable_is_an_error() {
        let err = parse_wikitable("<html><body><p>no tables</p></body></html>").unwrap_err();
        assert!(err.to_string().contains("no wikitable"));
    }
}
