//! Read command implementation.

use super::RecordInfo;
use seglog_core::Log;

/// Runs the read command.
pub fn run(log: &Log, offset: u64) -> Result<(), Box<dyn std::error::Error>> {
    let record = log.read(offset)?;
    println!("{}", RecordInfo::from(&record));
    Ok(())
}
