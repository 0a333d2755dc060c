//! Raw export merge: many per-period export files in, one deduplicated
//! campaign table out.
//!
//! Each export file is a CSV dump with `urls`, `creator`, and `category`
//! fields embedded as JSON-ish text. Rows are filtered to terminal states,
//! the embedded fields are flattened, and the survivors are appended to the
//! output file, which is periodically compacted because export periods
//! overlap heavily. A malformed embedded field aborts the whole merge.

use std::collections::{HashMap, HashSet};
use std::fs::{self, File};
use std::path::{Path, PathBuf};

use percent_encoding::percent_decode_str;
use regex::Regex;
use serde::Deserialize;

use crate::error::PipelineError;
use crate::table::{self, Table};

/// Raw columns pulled from each export file.
const EXTRACT_COLUMNS: [&str; 15] = [
    "blurb",
    "category",
    "country",
    "created_at",
    "deadline",
    "id",
    "launched_at",
    "name",
    "slug",
    "state",
    "usd_pledged",
    "static_usd_rate",
    "goal",
    "urls",
    "creator",
];

/// Columns of the merged table, in on-disk (alphabetical) order.
const MERGED_COLUMNS: [&str; 15] = [
    "blurb",
    "category",
    "country",
    "created_at",
    "creator_id",
    "deadline",
    "id",
    "launched_at",
    "name",
    "project_url",
    "reward_url",
    "slug",
    "state",
    "usd_goal",
    "usd_pledged",
];

#[derive(Debug, Deserialize)]
struct EmbeddedUrls {
    web: WebUrls,
}

#[derive(Debug, Deserialize)]
struct WebUrls {
    project: String,
    rewards: String,
}

/// Merges every `Kickstarter*.csv` under `<data_folder>/<period>/` into one
/// deduplicated campaign table at `output_file`, then appends the
/// `has_campaign_data` completion flag column initialized to 0.
///
/// The output is compacted (exact-duplicate rows dropped) after every
/// `dedup_every` input files and once more at the end, bounding growth from
/// overlapping export periods.
///
/// # Errors
///
/// Fails on unreadable files, a missing required column, or a malformed
/// embedded `urls`/`creator`/`category` field. There is no per-row recovery:
/// any of these aborts the merge.
pub fn merge_raw_exports(
    data_folder: &Path,
    output_file: &Path,
    dedup_every: usize,
) -> Result<(), PipelineError> {
    let files = list_export_files(data_folder)?;
    let total = files.len();

    let header = MERGED_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
    table::write_table(
        output_file,
        &Table {
            header,
            rows: Vec::new(),
        },
    )?;

    for (i, file) in files.iter().enumerate() {
        tracing::info!(file = %file.display(), index = i + 1, total, "merging export file");
        let rows = extract_export_rows(file)?;
        table::append_rows(output_file, &rows)?;

        if dedup_every > 0 && i % dedup_every == 0 {
            compact(output_file)?;
        }
    }

    compact(output_file)?;
    add_completion_flag_column(output_file)?;
    Ok(())
}

/// Collapses the table down to one row per campaign `id`, keeping the first
/// occurrence. Exact-duplicate rows are dropped first.
///
/// # Errors
///
/// Fails if the file cannot be read or has no `id` column.
pub fn collapse_project_duplicates(
    input_file: &Path,
    output_file: &Path,
) -> Result<(), PipelineError> {
    let mut t = table::read_table(input_file)?;
    t.rows = table::dedup_rows(t.rows);

    let id_col = t
        .header
        .iter()
        .position(|h| h == "id")
        .ok_or_else(|| PipelineError::MissingColumn {
            file: input_file.display().to_string(),
            column: "id",
        })?;

    let mut seen = HashSet::new();
    t.rows.retain(|row| seen.insert(row[id_col].clone()));

    table::write_table(output_file, &t)
}

/// Lists `Kickstarter*.csv` files one directory level below `data_folder`,
/// sorted for deterministic processing order.
fn list_export_files(data_folder: &Path) -> Result<Vec<PathBuf>, PipelineError> {
    let mut files = Vec::new();
    for entry in fs::read_dir(data_folder).map_err(|e| table::io_error(data_folder, e))? {
        let period_dir = entry.map_err(|e| table::io_error(data_folder, e))?.path();
        if !period_dir.is_dir() {
            continue;
        }
        for entry in fs::read_dir(&period_dir).map_err(|e| table::io_error(&period_dir, e))? {
            let path = entry.map_err(|e| table::io_error(&period_dir, e))?.path();
            let name = path.file_name().and_then(|n| n.to_str()).unwrap_or("");
            if name.starts_with("Kickstarter") && name.ends_with(".csv") {
                files.push(path);
            }
        }
    }
    files.sort();
    Ok(files)
}

/// Reads one export file and returns its terminal-state rows, flattened into
/// `MERGED_COLUMNS` order and deduplicated within the file.
fn extract_export_rows(file: &Path) -> Result<Vec<Vec<String>>, PipelineError> {
    let handle = File::open(file).map_err(|e| table::io_error(file, e))?;
    let mut reader = csv::Reader::from_reader(handle);

    let headers = reader.headers()?.clone();
    let mut cols: HashMap<&'static str, usize> = HashMap::new();
    for name in EXTRACT_COLUMNS {
        let position = headers.iter().position(|h| h == name).ok_or_else(|| {
            PipelineError::MissingColumn {
                file: file.display().to_string(),
                column: name,
            }
        })?;
        cols.insert(name, position);
    }

    let mut seen = HashSet::new();
    let mut rows = Vec::new();
    for record in reader.records() {
        let record = record?;
        let field = |name: &str| record.get(cols[name]).unwrap_or("").to_owned();

        let state = field("state");
        if state != "successful" && state != "failed" {
            continue;
        }

        let (project_url, reward_url) = parse_embedded_urls(&field("urls"))?;
        let creator_id = parse_creator_id(&field("creator"))?;
        let category = parse_category_label(&field("category"))?;
        let usd_goal = currency_adjusted_goal(&field("static_usd_rate"), &field("goal"))?;

        let row = vec![
            field("blurb"),
            category,
            field("country"),
            field("created_at"),
            creator_id,
            field("deadline"),
            field("id"),
            field("launched_at"),
            field("name"),
            project_url,
            reward_url,
            field("slug"),
            state,
            usd_goal,
            field("usd_pledged"),
        ];
        if seen.insert(row.clone()) {
            rows.push(row);
        }
    }
    Ok(rows)
}

/// Rewrites the output file with exact-duplicate rows dropped.
fn compact(path: &Path) -> Result<(), PipelineError> {
    let mut t = table::read_table(path)?;
    t.rows = table::dedup_rows(t.rows);
    table::write_table(path, &t)
}

/// Appends the `has_campaign_data` column, initialized to 0 for every row.
fn add_completion_flag_column(path: &Path) -> Result<(), PipelineError> {
    let mut t = table::read_table(path)?;
    t.header.push("has_campaign_data".to_owned());
    for row in &mut t.rows {
        row.push("0".to_owned());
    }
    table::write_table(path, &t)
}

/// Extracts the project and rewards URLs from the embedded `urls` JSON.
fn parse_embedded_urls(raw: &str) -> Result<(String, String), PipelineError> {
    let parsed: EmbeddedUrls =
        serde_json::from_str(raw).map_err(|e| PipelineError::MalformedUrls {
            raw: raw.to_owned(),
            source: e,
        })?;
    Ok((parsed.web.project, parsed.web.rewards))
}

/// Extracts the numeric creator id from the embedded `creator` text.
fn parse_creator_id(raw: &str) -> Result<String, PipelineError> {
    let re = Regex::new(r"id.*?([0-9]+)").expect("valid creator id regex");
    re.captures(raw)
        .map(|caps| caps[1].to_owned())
        .ok_or_else(|| PipelineError::MalformedCreator {
            raw: raw.to_owned(),
        })
}

/// Extracts the category label from the categorization URL embedded in the
/// `category` field: last path segment, percent-decoded, title-cased.
fn parse_category_label(raw: &str) -> Result<String, PipelineError> {
    let re = Regex::new(r#"https?://www.kickstarter.com/.*categories/([^/"}]*)"#)
        .expect("valid category url regex");
    let segment = re
        .captures(raw)
        .map(|caps| caps[1].to_owned())
        .ok_or_else(|| PipelineError::MalformedCategory {
            raw: raw.to_owned(),
        })?;
    let decoded = percent_decode_str(&segment)
        .decode_utf8()
        .map_err(|_| PipelineError::MalformedCategory {
            raw: raw.to_owned(),
        })?;
    Ok(title_case(&decoded))
}

/// The currency-normalized goal: `static_usd_rate × goal`.
fn currency_adjusted_goal(raw_rate: &str, raw_goal: &str) -> Result<String, PipelineError> {
    let rate: f64 = raw_rate
        .parse()
        .map_err(|_| PipelineError::InvalidNumber {
            column: "static_usd_rate",
            value: raw_rate.to_owned(),
        })?;
    let goal: f64 = raw_goal.parse().map_err(|_| PipelineError::InvalidNumber {
        column: "goal",
        value: raw_goal.to_owned(),
    })?;
    Ok(format!("{}", rate * goal))
}

/// Uppercases the first letter of every alphabetic run, lowercasing the rest.
fn title_case(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut prev_alpha = false;
    for c in s.chars() {
        if c.is_alphabetic() {
            if prev_alpha {
                out.extend(c.to_lowercase());
            } else {
                out.extend(c.to_uppercase());
            }
            prev_alpha = true;
        } else {
            out.push(c);
            prev_alpha = false;
        }
    }
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    fn urls_json(slug: &str) -> String {
        format!(
            "{{\"web\":{{\"project\":\"https://www.kickstarter.com/projects/{slug}?ref=category\",\
             \"rewards\":\"https://www.kickstarter.com/projects/{slug}/rewards\"}}}}"
        )
    }

    fn category_json(segment: &str) -> String {
        format!(
            "{{\"id\":11,\"slug\":\"x\",\"urls\":{{\"web\":{{\"discover\":\
             \"http://www.kickstarter.com/discover/categories/{segment}\"}}}}}}"
        )
    }

    fn write_export_file(path: &Path, rows: &[Vec<String>]) {
        let mut writer = csv::Writer::from_path(path).unwrap();
        writer
            .write_record([
                "backers_count",
                "blurb",
                "category",
                "country",
                "created_at",
                "creator",
                "deadline",
                "goal",
                "id",
                "launched_at",
                "name",
                "slug",
                "state",
                "static_usd_rate",
                "urls",
                "usd_pledged",
            ])
            .unwrap();
        for row in rows {
            writer.write_record(row).unwrap();
        }
        writer.flush().unwrap();
    }

    fn export_row(id: &str, state: &str, category_segment: &str, slug: &str) -> Vec<String> {
        vec![
            "42".to_owned(),
            format!("blurb for {slug}"),
            category_json(category_segment),
            "US".to_owned(),
            "1400000000".to_owned(),
            "{\"id\":777001,\"name\":\"Ann\"}".to_owned(),
            "1400200000".to_owned(),
            "1000".to_owned(),
            id.to_owned(),
            "1400100000".to_owned(),
            format!("Project {slug}"),
            slug.to_owned(),
            state.to_owned(),
            "1.5".to_owned(),
            urls_json(slug),
            "2345.67".to_owned(),
        ]
    }

    #[test]
    fn title_case_uppercases_each_alphabetic_run() {
        assert_eq!(title_case("film & video"), "Film & Video");
        assert_eq!(title_case("theater"), "Theater");
        assert_eq!(title_case("ART"), "Art");
    }

    #[test]
    fn category_label_decodes_and_title_cases() {
        let label = parse_category_label(&category_json("film%20&%20video")).unwrap();
        assert_eq!(label, "Film & Video");
    }

    #[test]
    fn category_without_url_is_malformed() {
        let result = parse_category_label("{\"id\":11}");
        assert!(matches!(
            result,
            Err(PipelineError::MalformedCategory { .. })
        ));
    }

    #[test]
    fn creator_id_takes_first_number_after_id() {
        assert_eq!(
            parse_creator_id("{\"id\":777001,\"name\":\"Ann\"}").unwrap(),
            "777001"
        );
    }

    #[test]
    fn malformed_urls_field_is_fatal() {
        let result = parse_embedded_urls("{\"web\":{}}");
        assert!(matches!(result, Err(PipelineError::MalformedUrls { .. })));
    }

    #[test]
    fn currency_adjusted_goal_multiplies() {
        assert_eq!(currency_adjusted_goal("1.5", "1000").unwrap(), "1500");
    }

    #[test]
    fn merge_filters_flattens_and_flags() {
        let dir = tempfile::tempdir().unwrap();
        let period = dir.path().join("2020-01");
        fs::create_dir(&period).unwrap();

        let rows = vec![
            export_row("1", "successful", "film%20&%20video", "one"),
            export_row("1", "successful", "film%20&%20video", "one"), // exact duplicate
            export_row("2", "failed", "games", "two"),
            export_row("3", "live", "games", "three"), // non-terminal, dropped
        ];
        write_export_file(&period.join("Kickstarter001.csv"), &rows);
        // Files without the export prefix are ignored.
        fs::write(period.join("notes.csv"), "a,b\n1,2\n").unwrap();

        let output = dir.path().join("merged.csv");
        merge_raw_exports(dir.path(), &output, 50).unwrap();

        let t = table::read_table(&output).unwrap();
        let mut expected_header: Vec<String> =
            MERGED_COLUMNS.iter().map(|c| (*c).to_owned()).collect();
        expected_header.push("has_campaign_data".to_owned());
        assert_eq!(t.header, expected_header);

        assert_eq!(t.rows.len(), 2);
        let by_id: HashMap<&str, &Vec<String>> =
            t.rows.iter().map(|r| (r[6].as_str(), r)).collect();
        let one = by_id["1"];
        assert_eq!(one[1], "Film & Video");
        assert_eq!(one[4], "777001");
        assert_eq!(
            one[9],
            "https://www.kickstarter.com/projects/one?ref=category"
        );
        assert_eq!(one[13], "1500");
        assert_eq!(one[15], "0"); // completion flag starts unset
        let two = by_id["2"];
        assert_eq!(two[1], "Games");
        assert_eq!(two[12], "failed");
    }

    #[test]
    fn compaction_is_idempotent() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let t = Table {
            header: vec!["a".to_owned(), "b".to_owned()],
            rows: vec![
                vec!["1".to_owned(), "x".to_owned()],
                vec!["1".to_owned(), "x".to_owned()],
                vec!["2".to_owned(), "y".to_owned()],
            ],
        };
        table::write_table(&path, &t).unwrap();

        compact(&path).unwrap();
        let first = fs::read(&path).unwrap();
        compact(&path).unwrap();
        let second = fs::read(&path).unwrap();

        assert_eq!(first, second);
        assert_eq!(table::read_table(&path).unwrap().rows.len(), 2);
    }

    #[test]
    fn collapse_keeps_first_row_per_id() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("table.csv");
        let t = Table {
            header: vec!["id".to_owned(), "slug".to_owned()],
            rows: vec![
                vec!["1".to_owned(), "first".to_owned()],
                vec!["1".to_owned(), "second".to_owned()],
                vec!["2".to_owned(), "other".to_owned()],
            ],
        };
        table::write_table(&path, &t).unwrap();

        collapse_project_duplicates(&path, &path).unwrap();

        let t = table::read_table(&path).unwrap();
        assert_eq!(t.rows.len(), 2);
        assert_eq!(t.rows[0][1], "first");
    }
}
