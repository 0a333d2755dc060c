//! Feature table derivation: the enriched campaign table in, a numeric-only
//! table out.

use std::collections::BTreeMap;
use std::path::Path;

use chrono::DateTime;

use kickdata_core::record::EnrichedRecord;
use kickdata_core::vocab;

use crate::error::PipelineError;
use crate::table::{self, Table};

/// Blurb cues that open the asking-for-help check.
const HELP_OPENERS: [&str; 2] = ["please", "help us"];

/// Cues that confirm an opened check.
const HELP_CONFIRMERS: [&str; 4] = ["support", "help", "donate", "be a part of"];

/// Feature columns that are not one-hot expansions of a vocabulary.
const BASE_FEATURE_COLUMNS: [&str; 20] = [
    "avg_reward_description",
    "blurb_length",
    "blurb_word_count",
    "creator_project_no",
    "duration",
    "faq",
    "has_faq",
    "has_one_dollar_reward",
    "is_asking_for_help",
    "is_first_project_from_creator",
    "is_project_we_love",
    "name_length",
    "name_word_count",
    "rewards_levels",
    "rewards_max",
    "rewards_mean",
    "rewards_min",
    "state",
    "usd_goal",
    "usd_pledged",
];

/// Derives the numeric feature table from the enriched campaign table.
///
/// The output schema is generated statically — the base columns plus one
/// one-hot column per vocabulary entry — and sorted alphabetically. Text
/// fields are reduced to length/word counts, timestamps to a day-granularity
/// duration, and identifiers and URLs are dropped.
///
/// # Errors
///
/// Fails on I/O or CSV problems, on a state outside the terminal vocabulary,
/// or on a timestamp that cannot be represented.
pub fn preprocess_features(input_file: &Path, output_file: &Path) -> Result<(), PipelineError> {
    let records: Vec<EnrichedRecord> = table::read_records(input_file)?;

    let header = feature_columns();
    let mut rows = Vec::with_capacity(records.len());
    for record in &records {
        // Key set equals `feature_columns()` by construction, so the sorted
        // map values line up with the sorted header.
        rows.push(derive_features(record)?.into_values().collect());
    }

    tracing::info!(rows = rows.len(), columns = header.len(), "derived feature table");
    table::write_table(output_file, &Table { header, rows })
}

/// The full output schema: base columns plus one column per category and
/// country vocabulary entry, sorted alphabetically.
fn feature_columns() -> Vec<String> {
    let mut columns: Vec<String> = BASE_FEATURE_COLUMNS
        .iter()
        .map(|c| (*c).to_owned())
        .collect();
    columns.extend(vocab::CATEGORIES.iter().map(|c| vocab::category_column(c)));
    columns.extend(vocab::COUNTRIES.iter().map(|c| vocab::country_column(c)));
    columns.sort();
    columns
}

fn derive_features(
    record: &EnrichedRecord,
) -> Result<BTreeMap<String, String>, PipelineError> {
    let mut out = BTreeMap::new();

    let deadline_days = days_since_epoch("deadline", record.deadline)?;
    let launched_days = days_since_epoch("launched_at", record.launched_at)?;
    out.insert(
        "duration".to_owned(),
        (deadline_days - launched_days).to_string(),
    );

    out.insert(
        "is_asking_for_help".to_owned(),
        u8::from(is_asking_for_help(&record.blurb)).to_string(),
    );
    out.insert(
        "blurb_length".to_owned(),
        record.blurb.chars().count().to_string(),
    );
    out.insert(
        "blurb_word_count".to_owned(),
        record.blurb.split(' ').count().to_string(),
    );
    out.insert(
        "name_length".to_owned(),
        record.name.chars().count().to_string(),
    );
    out.insert(
        "name_word_count".to_owned(),
        record.name.split(' ').count().to_string(),
    );

    let state = vocab::state_code(&record.state).ok_or_else(|| PipelineError::UnknownState {
        value: record.state.clone(),
    })?;
    out.insert("state".to_owned(), state.to_string());

    // Unknown labels match no column and leave an all-zero row.
    for category in vocab::CATEGORIES {
        out.insert(
            vocab::category_column(category),
            u8::from(record.category == category).to_string(),
        );
    }
    for country in vocab::COUNTRIES {
        out.insert(
            vocab::country_column(country),
            u8::from(record.country == country).to_string(),
        );
    }

    out.insert("has_faq".to_owned(), u8::from(record.faq > 0).to_string());

    out.insert(
        "avg_reward_description".to_owned(),
        record.avg_reward_description.to_string(),
    );
    out.insert(
        "creator_project_no".to_owned(),
        record.creator_project_no.to_string(),
    );
    out.insert("faq".to_owned(), record.faq.to_string());
    out.insert(
        "has_one_dollar_reward".to_owned(),
        record.has_one_dollar_reward.to_string(),
    );
    out.insert(
        "is_first_project_from_creator".to_owned(),
        record.is_first_project_from_creator.to_string(),
    );
    out.insert(
        "is_project_we_love".to_owned(),
        record.is_project_we_love.to_string(),
    );
    out.insert(
        "rewards_levels".to_owned(),
        record.rewards_levels.to_string(),
    );
    out.insert("rewards_max".to_owned(), record.rewards_max.to_string());
    out.insert("rewards_mean".to_owned(), record.rewards_mean.to_string());
    out.insert("rewards_min".to_owned(), record.rewards_min.to_string());
    out.insert("usd_goal".to_owned(), record.usd_goal.clone());
    out.insert("usd_pledged".to_owned(), record.usd_pledged.clone());

    Ok(out)
}

/// Whole days between the Unix epoch and `timestamp`, in UTC.
fn days_since_epoch(column: &'static str, timestamp: i64) -> Result<i64, PipelineError> {
    let at = DateTime::from_timestamp(timestamp, 0).ok_or_else(|| {
        PipelineError::InvalidNumber {
            column,
            value: timestamp.to_string(),
        }
    })?;
    Ok(at.signed_duration_since(DateTime::UNIX_EPOCH).num_days())
}

/// Ordered blurb check for donation-seeking language.
///
/// A blurb containing `please` or `help us` counts only if one of the
/// follow-up cues also appears; failing that, a bare `help us` still counts
/// on its own. All matches are word-boundary containment on the lowercased
/// blurb.
pub(crate) fn is_asking_for_help(blurb: &str) -> bool {
    let lower = blurb.to_lowercase();
    if HELP_OPENERS.iter().any(|cue| contains_word(&lower, cue)) {
        return HELP_CONFIRMERS.iter().any(|cue| contains_word(&lower, cue));
    }
    contains_word(&lower, "help us")
}

/// Returns `true` if `needle` occurs in `haystack` with non-alphanumeric
/// characters (or the string edges) on both sides.
fn contains_word(haystack: &str, needle: &str) -> bool {
    let mut search_from = 0usize;
    while let Some(rel) = haystack[search_from..].find(needle) {
        let start = search_from + rel;
        let end = start + needle.len();
        let before_ok = start == 0
            || !haystack[..start]
                .chars()
                .last()
                .is_some_and(char::is_alphanumeric);
        let after_ok = end >= haystack.len()
            || !haystack[end..]
                .chars()
                .next()
                .is_some_and(char::is_alphanumeric);
        if before_ok && after_ok {
            return true;
        }
        search_from = start + 1;
    }
    false
}
