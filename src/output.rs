//! CSV artifact writing.

use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use crate::record::ChatMessageRecord;

pub const HEADERS: [&str; 6] = [
    "Group Name",
    "Message Type",
    "Message Text",
    "Sender",
    "Timestamp",
    "URLs",
];

/// One conversation maps to one artifact named after it, whitespace
/// collapsed to underscores.
pub fn artifact_name(group_name: &str) -> String {
    let stem: String = group_name
        .chars()
        .map(|c| if c.is_whitespace() { '_' } else { c })
        .collect();
    format!("{stem}.csv")
}

/// Writes the record batch under `dir` and returns the canonical path.
/// URLs serialize as a single JSON-array field; the trailing `Degraded`
/// column only exists when `mark_degraded` is set.
pub fn write_chat_csv(
    dir: &Path,
    records: &[ChatMessageRecord],
    group_name: &str,
    mark_degraded: bool,
) -> Result<PathBuf> {
    fs::create_dir_all(dir)
        .with_context(|| format!("create output directory {}", dir.display()))?;
    let path = dir.join(artifact_name(group_name));
    let mut writer = csv::Writer::from_path(&path).context("create csv artifact")?;

    let mut header: Vec<&str> = HEADERS.to_vec();
    if mark_degraded {
        header.push("Degraded");
    }
    writer.write_record(&header)?;

    for record in records {
        let urls = serde_json::to_string(&record.urls)?;
        let mut row = vec![
            record.group_name.clone(),
            record.message_type.to_string(),
            record.message_text.clone(),
            record.sender.clone(),
            record.timestamp.clone(),
            urls,
        ];
        if mark_degraded {
            row.push(record.degraded.to_string());
        }
        writer.write_record(&row)?;
    }
    writer.flush()?;

    Ok(dunce::canonicalize(&path).unwrap_or(path))
}
