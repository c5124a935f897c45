//! Dump command implementation.

use super::RecordInfo;
use seglog_core::Log;

/// Reads up to `limit` records starting at `start` (the lowest offset by default).
pub fn collect(
    log: &Log,
    start: Option<u64>,
    limit: Option<usize>,
) -> Result<Vec<RecordInfo>, Box<dyn std::error::Error>> {
    let start = match start {
        Some(offset) => offset.max(log.lowest_offset()?),
        None => log.lowest_offset()?,
    };
    let end = log.highest_offset()?.saturating_add(1);
    let limit = limit.unwrap_or(usize::MAX);

    let mut records = Vec::new();
    for offset in (start..end).take(limit) {
        let record = log.read(offset)?;
        records.push(RecordInfo::from(&record));
    }

    Ok(records)
}

/// Runs the dump command.
pub fn run(
    log: &Log,
    start: Option<u64>,
    limit: Option<usize>,
    format: &str,
) -> Result<(), Box<dyn std::error::Error>> {
    let records = collect(log, start, limit)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&records)?);
        }
        _ => {
            for record in &records {
                println!("{record}");
            }
            println!();
            println!("{} record(s)", records.len());
        }
    }

    Ok(())
}
