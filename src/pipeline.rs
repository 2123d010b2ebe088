use chrono::Local;
use tracing::info;

use crate::error::Result;
use crate::homeharvest::{fetch_one, ListingScraper};
use crate::ingest::{push_items, IngestSink};
use crate::listing_structs::{Preset, RunSummary, RunTotals};
use crate::normalize::df_to_items;

/// Drives presets one at a time: scrape, normalize, push, tally.
pub struct Pipeline<'a> {
    scraper: &'a dyn ListingScraper,
    sink: &'a dyn IngestSink,
    source: &'a str,
}

impl<'a> Pipeline<'a> {
    pub fn new(scraper: &'a dyn ListingScraper, sink: &'a dyn IngestSink, source: &'a str) -> Self {
        Pipeline { scraper, sink, source }
    }

    /// Runs every preset in order. A failed push stops the run; a failed
    /// scrape only empties that preset's batch.
    pub async fn run(&self, presets: &[Preset]) -> Result<RunSummary> {
        let started_at = Local::now();
        let mut totals = RunTotals::default();

        for (idx, preset) in presets.iter().enumerate() {
            info!("Preset {}/{}: {}", idx + 1, presets.len(), preset.location);

            let listings = fetch_one(self.scraper, preset).await;
            let items = df_to_items(Some(&listings));
            let response = push_items(self.sink, &items, self.source).await?;
            info!("Pushed: {}", response);

            totals += RunTotals::from_response(&response);
        }

        Ok(RunSummary {
            totals,
            presets: presets.len(),
            started_at,
        })
    }
}
