use std::io::Cursor;
use std::process::Stdio;

use async_trait::async_trait;
use polars::prelude::*;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{info, warn};

use crate::error::{Error, Result};
use crate::listing_structs::{Preset, ScrapeParams};

/// Reads scraper kwargs as JSON on stdin and writes the resulting frame as CSV.
const BRIDGE_SCRIPT: &str = r#"
import json, sys
from homeharvest import scrape_property
df = scrape_property(**json.load(sys.stdin))
if df is not None and not df.empty:
    df.to_csv(sys.stdout, index=False)
"#;

/// The external listing scraper: filters in, table of listings out.
#[async_trait]
pub trait ListingScraper: Send + Sync {
    async fn scrape(&self, params: &ScrapeParams) -> Result<DataFrame>;
}

/// Runs the HomeHarvest library through a Python interpreter.
pub struct HomeHarvest {
    python_bin: String,
}

impl HomeHarvest {
    pub fn new(python_bin: impl Into<String>) -> Self {
        Self {
            python_bin: python_bin.into(),
        }
    }
}

#[async_trait]
impl ListingScraper for HomeHarvest {
    async fn scrape(&self, params: &ScrapeParams) -> Result<DataFrame> {
        let payload = serde_json::to_vec(params)?;

        let mut child = Command::new(&self.python_bin)
            .arg("-c")
            .arg(BRIDGE_SCRIPT)
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| Error::Scrape(format!("failed to start {}: {}", self.python_bin, e)))?;

        // stdin is closed when the handle drops so the script sees EOF
        if let Some(mut stdin) = child.stdin.take() {
            stdin
                .write_all(&payload)
                .await
                .map_err(|e| Error::Scrape(e.to_string()))?;
        }

        let output = child
            .wait_with_output()
            .await
            .map_err(|e| Error::Scrape(e.to_string()))?;

        if !output.status.success() {
            let stderr = String::from_utf8_lossy(&output.stderr);
            let reason = stderr
                .lines()
                .rev()
                .find(|line| !line.trim().is_empty())
                .unwrap_or("scraper exited without output");
            return Err(Error::Scrape(format!("{} ({})", reason.trim(), output.status)));
        }

        parse_listings_csv(output.stdout)
    }
}

/// Reads the bridge's CSV. Every column is read as text so ids and zip codes
/// keep leading zeros; `list_price` is re-typed afterwards.
pub(crate) fn parse_listings_csv(csv: Vec<u8>) -> Result<DataFrame> {
    if csv.iter().all(u8::is_ascii_whitespace) {
        return Ok(DataFrame::empty());
    }

    let mut df = CsvReader::new(Cursor::new(csv))
        .has_header(true)
        .infer_schema(Some(0))
        .finish()?;

    retype_price(&mut df)?;
    Ok(df)
}

/// Integer when every price parses as one, float otherwise, text as a last resort.
fn retype_price(df: &mut DataFrame) -> Result<()> {
    let Ok(price) = df.column("list_price") else {
        return Ok(());
    };

    let typed = price
        .strict_cast(&DataType::Int64)
        .or_else(|_| price.strict_cast(&DataType::Float64));

    if let Ok(typed) = typed {
        df.with_column(typed)?;
    }
    Ok(())
}

/// Scrapes one preset. A failing scrape is logged and yields an empty frame
/// so the remaining presets still run.
pub async fn fetch_one(scraper: &dyn ListingScraper, preset: &Preset) -> DataFrame {
    let params = ScrapeParams::from(preset);
    info!("Scraping: {:?}", params);

    match scraper.scrape(&params).await {
        Ok(listings) => {
            info!("Listings found: {}", listings.height());
            listings
        }
        Err(e) => {
            warn!("Scrape error for {}: {}", preset.location, e);
            DataFrame::empty()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_output_is_empty_frame() {
        let df = parse_listings_csv(b"\n".to_vec()).unwrap();
        assert_eq!(df.height(), 0);
        assert_eq!(df.width(), 0);
    }

    #[test]
    fn csv_keeps_text_columns_verbatim() {
        let csv = b"property_id,zip_code,list_price\n0042,02134,350000\n0043,02135,410000\n".to_vec();
        let df = parse_listings_csv(csv).unwrap();

        assert_eq!(df.height(), 2);
        assert_eq!(df.column("zip_code").unwrap().dtype(), &DataType::Utf8);
        assert_eq!(df.column("list_price").unwrap().dtype(), &DataType::Int64);

        let zip = df.column("zip_code").unwrap().get(0).unwrap();
        assert_eq!(zip, AnyValue::Utf8("02134"));
    }

    #[test]
    fn fractional_prices_become_floats() {
        let csv = b"list_price\n350000.0\n275000.5\n".to_vec();
        let df = parse_listings_csv(csv).unwrap();
        assert_eq!(df.column("list_price").unwrap().dtype(), &DataType::Float64);
    }

    #[test]
    fn unparsable_prices_stay_text() {
        let csv = b"list_price\ncall agent\n".to_vec();
        let df = parse_listings_csv(csv).unwrap();
        assert_eq!(df.column("list_price").unwrap().dtype(), &DataType::Utf8);
    }

    #[cfg(unix)]
    mod bridge {
        use super::*;
        use std::os::unix::fs::PermissionsExt;
        use std::path::{Path, PathBuf};

        /// Writes an executable stand-in for the interpreter. It ignores its
        /// arguments and reads the params payload off stdin like the real script.
        fn interpreter(dir: &Path, body: &str) -> PathBuf {
            let path = dir.join("python");
            std::fs::write(&path, format!("#!/bin/sh\ncat > /dev/null\n{body}\n")).unwrap();
            std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
            path
        }

        fn params() -> ScrapeParams {
            ScrapeParams::from(&Preset::new("Boston, MA"))
        }

        #[tokio::test]
        async fn csv_on_stdout_becomes_frame() {
            let dir = tempfile::tempdir().unwrap();
            let bin = interpreter(dir.path(), "printf 'zip_code,list_price\\n02134,350000\\n'");

            let df = HomeHarvest::new(bin.display().to_string())
                .scrape(&params())
                .await
                .unwrap();

            assert_eq!(df.shape(), (1, 2));
            assert_eq!(df.column("zip_code").unwrap().get(0).unwrap(), AnyValue::Utf8("02134"));
            assert_eq!(df.column("list_price").unwrap().dtype(), &DataType::Int64);
        }

        #[tokio::test]
        async fn empty_stdout_is_zero_listings() {
            let dir = tempfile::tempdir().unwrap();
            let bin = interpreter(dir.path(), "exit 0");

            let df = HomeHarvest::new(bin.display().to_string())
                .scrape(&params())
                .await
                .unwrap();

            assert_eq!(df.height(), 0);
        }

        #[tokio::test]
        async fn nonzero_exit_is_scrape_error() {
            let dir = tempfile::tempdir().unwrap();
            let bin = interpreter(dir.path(), "echo 'ValueError: bad location' >&2\nexit 1");

            let err = HomeHarvest::new(bin.display().to_string())
                .scrape(&params())
                .await
                .unwrap_err();

            match err {
                Error::Scrape(message) => assert!(message.contains("ValueError: bad location"), "{message}"),
                other => panic!("unexpected error: {other}"),
            }
        }

        #[tokio::test]
        async fn missing_interpreter_is_scrape_error() {
            let scraper = HomeHarvest::new("/nonexistent/python");

            let err = scraper.scrape(&params()).await.unwrap_err();
            assert!(matches!(err, Error::Scrape(_)));

            let df = fetch_one(&scraper, &Preset::new("Boston, MA")).await;
            assert_eq!(df.height(), 0);
        }
    }
}
