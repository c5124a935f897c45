//! Inspect command implementation.

use super::format_size;
use seglog_core::{Log, SegmentInfo};
use serde::Serialize;

/// Log inspection result.
#[derive(Debug, Serialize)]
pub struct InspectResult {
    /// Log directory.
    pub path: String,
    /// Lowest retained offset.
    pub lowest_offset: u64,
    /// Offset of the newest record.
    pub highest_offset: u64,
    /// Number of records across all segments.
    pub record_count: u64,
    /// Total store size in bytes.
    pub total_store_size: u64,
    /// Per-segment details, oldest first.
    pub segments: Vec<SegmentStats>,
}

/// Statistics for a single segment.
#[derive(Debug, Serialize)]
pub struct SegmentStats {
    /// First offset the segment may hold.
    pub base_offset: u64,
    /// Offset the next append would receive.
    pub next_offset: u64,
    /// Store file size in bytes.
    pub store_size: u64,
    /// Bytes of written index entries.
    pub index_size: u64,
    /// Whether the segment reached a size limit.
    pub maxed: bool,
}

impl From<&SegmentInfo> for SegmentStats {
    fn from(info: &SegmentInfo) -> Self {
        Self {
            base_offset: info.base_offset,
            next_offset: info.next_offset,
            store_size: info.store_size,
            index_size: info.index_entries * seglog_storage::ENTRY_WIDTH,
            maxed: info.maxed,
        }
    }
}

/// Collects segment statistics for `log`.
pub fn inspect(log: &Log) -> Result<InspectResult, Box<dyn std::error::Error>> {
    let infos = log.segments();

    Ok(InspectResult {
        path: log.dir().display().to_string(),
        lowest_offset: log.lowest_offset()?,
        highest_offset: log.highest_offset()?,
        record_count: infos.iter().map(SegmentInfo::len).sum(),
        total_store_size: infos.iter().map(|s| s.store_size).sum(),
        segments: infos.iter().map(SegmentStats::from).collect(),
    })
}

/// Runs the inspect command.
pub fn run(log: &Log, format: &str) -> Result<(), Box<dyn std::error::Error>> {
    let result = inspect(log)?;

    match format {
        "json" => {
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        _ => {
            print_text_output(&result);
        }
    }

    Ok(())
}

fn print_text_output(result: &InspectResult) {
    println!("seglog Inspection");
    println!("=================");
    println!();
    println!("Path: {}", result.path);
    println!();
    println!("Offsets:");
    println!("  Lowest:  {}", result.lowest_offset);
    println!("  Highest: {}", result.highest_offset);
    println!("  Records: {}", result.record_count);
    println!();
    println!("Storage:");
    println!("  Store size: {}", format_size(result.total_store_size));
    println!();
    println!("Segments ({}):", result.segments.len());
    for seg in &result.segments {
        println!("  {}", segment_line(seg));
    }
}

fn segment_line(seg: &SegmentStats) -> String {
    format!(
        "[{}..{}) store {}, index {}{}",
        seg.base_offset,
        seg.next_offset,
        format_size(seg.store_size),
        format_size(seg.index_size),
        if seg.maxed { ", maxed" } else { "" }
    )
}
