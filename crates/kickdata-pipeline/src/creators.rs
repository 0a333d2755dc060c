//! Creator history annotation.

use std::collections::HashMap;
use std::path::Path;

use kickdata_core::record::CampaignRecord;

use crate::error::PipelineError;
use crate::table;

/// Adds `creator_project_no` and `is_first_project_from_creator` to every
/// row of the working table.
///
/// Two passes: one to gather each creator's campaign creation timestamps,
/// one to rank every row against them. A row's number counts only strictly
/// earlier timestamps, so campaigns created at the same instant share the
/// same number.
///
/// # Errors
///
/// Fails if the table cannot be read, parsed, or written back.
pub fn annotate_creator_history(
    input_file: &Path,
    output_file: &Path,
) -> Result<(), PipelineError> {
    let mut records: Vec<CampaignRecord> = table::read_records(input_file)?;

    let mut creations: HashMap<String, Vec<i64>> = HashMap::new();
    for record in &records {
        creations
            .entry(record.creator_id.clone())
            .or_default()
            .push(record.created_at);
    }

    for record in &mut records {
        let earlier = creations[&record.creator_id]
            .iter()
            .filter(|&&t| t < record.created_at)
            .count();
        record.creator_project_no = u32::try_from(earlier).unwrap_or(u32::MAX).saturating_add(1);
        record.is_first_project_from_creator = u8::from(record.creator_project_no == 1);
    }

    tracing::info!(rows = records.len(), "annotated creator history");
    table::write_records(output_file, &records)
}
