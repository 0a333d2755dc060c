//! Campaign page classification and field extraction.
//!
//! Every page state — rate-limit notice, removed/unavailable tombstone, live
//! campaign — is served as ordinary HTML, so classification scans the page
//! text for marker phrases in priority order. Only a live page is mined for
//! reward tiers, the FAQ count, and the "Project We Love" badge.

use kickdata_core::record::CampaignInfo;
use regex::Regex;

use crate::error::ScraperError;

/// Classification of a fetched campaign page.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageOutcome {
    /// Rate-limit notice. The caller must stop the current batch; the
    /// campaign stays pending.
    RateLimited,
    /// The page is gone (hidden, removed, or unavailable). Counts as handled:
    /// the campaign is flagged complete but produces no info row.
    Gone,
    /// A live campaign page with its extracted info.
    Info(CampaignInfo),
}

/// Classifies a fetched page and, for a live campaign, extracts its info.
///
/// Marker phrases are checked in priority order; the rate-limit marker wins
/// over everything else.
///
/// # Errors
///
/// - [`ScraperError::NoRewardTiers`] — a live page with no recognizable
///   reward tier markup; there is nothing to aggregate.
/// - [`ScraperError::MissingFaqCount`] — neither the embedded data marker nor
///   the visible FAQ counter is present.
/// - [`ScraperError::NumberParse`] — a matched count is not a valid integer.
pub fn parse_campaign_page(url: &str, page: &str) -> Result<PageOutcome, ScraperError> {
    if page.contains("are sending too many requests") {
        return Ok(PageOutcome::RateLimited);
    }

    let removed_re = Regex::new(
        r"(?s)been hidden for privacy.*?This project has been removed from visibility at the request of the creator",
    )
    .expect("valid removed-page regex");
    if removed_re.is_match(page) {
        return Ok(PageOutcome::Gone);
    }
    if page.contains("currently unavailable") {
        return Ok(PageOutcome::Gone);
    }
    if page.contains("this project is no longer available") {
        return Ok(PageOutcome::Gone);
    }

    Ok(PageOutcome::Info(extract_campaign_info(url, page)?))
}

fn extract_campaign_info(url: &str, page: &str) -> Result<CampaignInfo, ScraperError> {
    let tier_re = Regex::new(
        r"(?s)About <span>.*?\$.*?([0-9,]+)</span>.*?pledge__reward-description.*?<p>(.*?)</p>",
    )
    .expect("valid reward tier regex");

    let mut amounts: Vec<i64> = Vec::new();
    let mut description_lengths: Vec<i64> = Vec::new();
    for caps in tier_re.captures_iter(page) {
        amounts.push(parse_count(url, "reward amount", &caps[1])?);
        description_lengths.push(caps[2].chars().count() as i64);
    }

    let (Some(&rewards_min), Some(&rewards_max)) = (amounts.iter().min(), amounts.iter().max())
    else {
        return Err(ScraperError::NoRewardTiers {
            url: url.to_owned(),
        });
    };

    let jsonld_faq_re =
        Regex::new(r"projectFAQsCount&quot;:([0-9,]+),").expect("valid FAQ data regex");
    let visible_faq_re = Regex::new(r#"(?s)FAQ.*?<span class="count">([0-9,]+)</span>"#)
        .expect("valid FAQ count regex");
    let faq_raw = jsonld_faq_re
        .captures(page)
        .or_else(|| visible_faq_re.captures(page))
        .map(|caps| caps[1].to_owned())
        .ok_or_else(|| ScraperError::MissingFaqCount {
            url: url.to_owned(),
        })?;

    Ok(CampaignInfo {
        project_url: url.to_owned(),
        rewards_levels: amounts.len() as i64,
        rewards_min,
        rewards_max,
        rewards_mean: truncated_mean(&amounts),
        has_one_dollar_reward: u8::from(amounts.contains(&1)),
        avg_reward_description: truncated_mean(&description_lengths),
        faq: parse_count(url, "FAQ count", &faq_raw)?,
        is_project_we_love: u8::from(page.contains("Project We Love")),
    })
}

/// Mean of `values`, truncated toward zero. `values` must be non-empty.
#[allow(clippy::cast_precision_loss, clippy::cast_possible_truncation)]
fn truncated_mean(values: &[i64]) -> i64 {
    let sum: i64 = values.iter().sum();
    (sum as f64 / values.len() as f64) as i64
}

/// Parses an integer count, stripping thousands separators first.
fn parse_count(url: &str, field: &'static str, raw: &str) -> Result<i64, ScraperError> {
    raw.replace(',', "")
        .parse::<i64>()
        .map_err(|_| ScraperError::NumberParse {
            field,
            url: url.to_owned(),
            value: raw.to_owned(),
        })
}
