//! Batch collection driver: resumable page scraping over the working table.
//!
//! The working table's `has_campaign_data` column is the checkpoint. Each
//! batch draws a shuffled sample of pending URLs, scrapes them one at a time
//! with a courtesy sleep in between, then persists the flags and appends the
//! newly enriched rows. A rate-limit marker (or a transport failure) halts
//! the batch early with all prior progress kept, so re-running resumes where
//! the last run stopped and never re-fetches a handled URL.

use std::collections::{HashMap, HashSet};
use std::path::Path;
use std::time::{Duration, Instant};

use rand::seq::SliceRandom;

use kickdata_core::record::{CampaignInfo, CampaignRecord, EnrichedRecord};
use kickdata_scraper::{parse_campaign_page, CampaignClient, PageOutcome, ScraperError};

use crate::error::PipelineError;
use crate::table;

/// What one collection batch accomplished.
#[derive(Debug, Default)]
pub struct BatchStats {
    /// URLs attempted this batch.
    pub attempted: usize,
    /// Pages that yielded a full info row.
    pub collected: usize,
    /// Pages that were gone (flagged handled, no info row).
    pub gone: usize,
    /// Pages skipped on extraction errors (left pending).
    pub skipped: usize,
    /// Whether the batch stopped early on a rate limit or transport failure.
    pub halted: bool,
}

/// Runs one collection batch: scrape up to `max_requests` pending URLs,
/// persist the completion flags, and append the enriched rows to
/// `output_file` (created on first use).
///
/// # Errors
///
/// Fails only on file I/O and CSV problems. Scrape failures never error the
/// batch: rate limits and transport failures halt it early with progress
/// kept, and extraction failures leave the affected row pending.
pub async fn collect_batch(
    client: &CampaignClient,
    input_file: &Path,
    output_file: &Path,
    max_requests: usize,
    request_delay: Duration,
) -> Result<BatchStats, PipelineError> {
    let mut records: Vec<CampaignRecord> = table::read_records(input_file)?;

    let mut pending: Vec<String> = {
        let mut distinct = HashSet::new();
        records
            .iter()
            .filter(|r| r.has_campaign_data == 0)
            .map(|r| r.project_url.clone())
            .filter(|url| distinct.insert(url.clone()))
            .collect()
    };
    let mut rng = rand::rng();
    pending.shuffle(&mut rng);

    let mut stats = BatchStats::default();
    let mut handled: HashSet<String> = HashSet::new();
    let mut collected: Vec<CampaignInfo> = Vec::new();

    for url in &pending {
        if stats.attempted >= max_requests {
            break;
        }
        stats.attempted += 1;
        tracing::info!(url = %url, attempt = stats.attempted, max_requests, "collecting campaign info");

        let outcome = match client.fetch_page(url).await {
            Ok(page) => parse_campaign_page(url, &page),
            Err(e) => Err(e),
        };

        match outcome {
            Ok(PageOutcome::Info(info)) => {
                handled.insert(url.clone());
                collected.push(info);
                stats.collected += 1;
            }
            Ok(PageOutcome::Gone) => {
                handled.insert(url.clone());
                stats.gone += 1;
            }
            Ok(PageOutcome::RateLimited) => {
                tracing::warn!(url = %url, "rate limited — halting batch");
                stats.halted = true;
            }
            Err(error @ ScraperError::Http(_)) => {
                tracing::warn!(url = %url, %error, "transport failure — halting batch");
                stats.halted = true;
            }
            Err(error) => {
                tracing::warn!(url = %url, %error, "could not extract campaign info; leaving row pending");
                stats.skipped += 1;
            }
        }

        tokio::time::sleep(request_delay).await;

        if stats.halted {
            break;
        }
    }

    // Checkpoint: handled rows (collected or gone) are excluded from every
    // future batch's candidate pool.
    for record in &mut records {
        if handled.contains(&record.project_url) {
            record.has_campaign_data = 1;
        }
    }
    table::write_records(input_file, &records)?;

    let info_by_url: HashMap<&str, &CampaignInfo> = collected
        .iter()
        .map(|info| (info.project_url.as_str(), info))
        .collect();
    let mut enriched: Vec<EnrichedRecord> = if output_file.exists() {
        table::read_records(output_file)?
    } else {
        Vec::new()
    };
    for record in &records {
        if let Some(info) = info_by_url.get(record.project_url.as_str()) {
            enriched.push(EnrichedRecord::from_parts(record, info));
        }
    }
    table::write_records(output_file, &enriched)?;

    Ok(stats)
}

/// Runs `batches` collection batches with a cooldown of `batch_wait_secs`
/// between them (but not after the last), spreading the scrape over time.
///
/// # Errors
///
/// Propagates the first batch that fails on file I/O or CSV problems.
pub async fn collect_batches(
    client: &CampaignClient,
    input_file: &Path,
    output_file: &Path,
    batches: u32,
    batch_wait_secs: u64,
    max_requests: usize,
    request_delay: Duration,
) -> Result<(), PipelineError> {
    for k in 0..batches {
        let started = Instant::now();
        let stats = collect_batch(client, input_file, output_file, max_requests, request_delay)
            .await?;
        tracing::info!(
            batch = k + 1,
            batches,
            attempted = stats.attempted,
            collected = stats.collected,
            gone = stats.gone,
            skipped = stats.skipped,
            halted = stats.halted,
            elapsed_secs = started.elapsed().as_secs(),
            "batch finished"
        );
        if k + 1 < batches {
            tokio::time::sleep(Duration::from_secs(batch_wait_secs)).await;
        }
    }
    Ok(())
}
