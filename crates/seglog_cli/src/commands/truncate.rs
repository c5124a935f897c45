//! Truncate command implementation.

use seglog_core::Log;

/// Runs the truncate command.
pub fn run(log: &Log, lowest: u64) -> Result<(), Box<dyn std::error::Error>> {
    let before = log.segments().len();
    log.truncate(lowest)?;
    let after = log.segments().len();

    println!("Removed {} segment(s)", before - after);
    println!(
        "Remaining offsets: {}..={}",
        log.lowest_offset()?,
        log.highest_offset()?
    );

    tracing::info!(lowest, removed = before - after, "truncated log");
    Ok(())
}
