//! Append command implementation.

use seglog_core::{Log, Record};

/// Appends each value as a record and returns the assigned offsets.
pub fn append(log: &Log, values: &[String]) -> Result<Vec<u64>, Box<dyn std::error::Error>> {
    let mut offsets = Vec::with_capacity(values.len());
    for value in values {
        offsets.push(log.append(Record::new(value.clone().into_bytes()))?);
    }
    Ok(offsets)
}

/// Runs the append command.
pub fn run(log: &Log, values: &[String]) -> Result<(), Box<dyn std::error::Error>> {
    let offsets = append(log, values)?;
    for offset in &offsets {
        println!("{offset}");
    }
    tracing::info!(count = offsets.len(), "appended records");
    Ok(())
}
