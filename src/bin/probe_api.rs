// Probes a running analyst-agent instance with the two sample requests
// and validates the response shapes. Usage:
//
//   probe_api [base-url]        (default http://localhost:8000)

use anyhow::Context;
use base64::{engine::general_purpose::STANDARD, Engine as _};
use reqwest::multipart::{Form, Part};

const FILMS_QUESTION: &str =
    "Scrape the list of highest grossing films from Wikipedia. How many $2 bn \
     movies were released before 2000? Which is the earliest film that grossed \
     over $1.5 bn? What's the correlation between the Rank and Peak?";

const SALES_QUESTION: &str = "What is the total sales and correlation?";

const SAMPLE_SALES_CSV: &str = "date,region,sales\n\
    2023-01-01,East,100\n\
    2023-01-02,West,200\n\
    2023-01-03,East,150\n\
    2023-01-04,North,120\n";

const SALES_KEYS: [&str; 7] = [
    "total_sales",
    "top_region",
    "day_sales_correlation",
    "bar_chart",
    "median_sales",
    "total_sales_tax",
    "cumulative_sales_chart",
];

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let base_url = std::env::args()
        .nth(1)
        .unwrap_or_else(|| "http://localhost:8000".to_string());
    let client = reqwest::Client::new();
    let mut failures = 0;

    println!("🎬 Highest grossing films probe");
    match probe_films(&client, &base_url).await {
        Ok(()) => println!("✅ films probe passed"),
        Err(e) => {
            failures += 1;
            println!("❌ films probe failed: {:#}", e);
        }
    }

    println!("📊 Sales dataset probe");
    match probe_sales(&client, &base_url).await {
        Ok(()) => println!("✅ sales probe passed"),
        Err(e) => {
            failures += 1;
            println!("❌ sales probe failed: {:#}", e);
        }
    }

    if failures > 0 {
        std::process::exit(1);
    }
    Ok(())
}

async fn probe_films(client: &reqwest::Client, base_url: &str) -> anyhow::Result<()> {
    let form = Form::new().part("file", Part::text(FILMS_QUESTION).file_name("question.txt"));
    let response = client
        .post(format!("{}/api/", base_url))
        .multipart(form)
        .send()
        .await?;
    anyhow::ensure!(
        response.status().is_success(),
        "unexpected status {}",
        response.status()
    );

    let body: serde_json::Value = response.json().await?;
    let array = body.as_array().context("films response is not an array")?;
    anyhow::ensure!(array.len() == 4, "expected 4 elements, got {}", array.len());
    anyhow::ensure!(array[0].is_i64() || array[0].is_u64(), "count is not an integer");
    anyhow::ensure!(array[1].is_string(), "title is not a string");
    anyhow::ensure!(
        array[2].is_number() || array[2].is_null(),
        "correlation is not numeric"
    );
    validate_image(array[3].as_str().context("chart is not a string")?)?;
    Ok(())
}

async fn probe_sales(client: &reqwest::Client, base_url: &str) -> anyhow::Result<()> {
    let form = Form::new()
        .part("file", Part::text(SALES_QUESTION).file_name("question.txt"))
        .part(
            "other_files",
            Part::text(SAMPLE_SALES_CSV).file_name("sample-sales.csv"),
        );
    let response = client
        .post(format!("{}/api/", base_url))
        .multipart(form)
        .send()
        .await?;
    anyhow::ensure!(
        response.status().is_success(),
        "unexpected status {}",
        response.status()
    );

    let body: serde_json::Value = response.json().await?;
    let object = body.as_object().context("sales response is not an object")?;
    for key in SALES_KEYS {
        anyhow::ensure!(object.contains_key(key), "missing key '{}'", key);
    }
    let total = object["total_sales"]
        .as_f64()
        .context("total_sales is not numeric")?;
    let tax = object["total_sales_tax"]
        .as_f64()
        .context("total_sales_tax is not numeric")?;
    anyhow::ensure!(
        (tax - total * 0.10).abs() < 1e-9,
        "total_sales_tax is not 10% of total_sales"
    );
    validate_image(object["bar_chart"].as_str().context("bar_chart")?)?;
    validate_image(
        object["cumulative_sales_chart"]
            .as_str()
            .context("cumulative_sales_chart")?,
    )?;
    Ok(())
}

fn validate_image(data_uri: &str) -> anyhow::Result<()> {
    let payload = data_uri
        .strip_prefix("data:image/png;base64,")
        .context("invalid chart header")?;
    let bytes = STANDARD.decode(payload)?;
    anyhow::ensure!(
        bytes.len() <= 100_000,
        "chart image too large: {} bytes",
        bytes.len()
    );
    anyhow::ensure!(
        bytes.starts_with(&[0x89, b'P', b'N', b'G', 0x0D, 0x0A, 0x1A, 0x0A]),
        "not a PNG image"
    );
    Ok(())
}
