//! `devtrail list` command implementation.

use anyhow::Result;
use devtrail_core::DevtrailConfig;
use devtrail_logger::{LogRecord, Logger, RecordFilter};

pub async fn run(config: &DevtrailConfig, filter: &RecordFilter, json: bool) -> Result<()> {
    let logger = Logger::from_config(config)?;
    let records = logger.query(filter).await;
    println!("{}", render(&records, json)?);
    Ok(())
}

fn render(records: &[LogRecord], json: bool) -> Result<String> {
    if json {
        return Ok(serde_json::to_string_pretty(records)?);
    }
    if records.is_empty() {
        return Ok("no matching records".to_string());
    }
    Ok(records
        .iter()
        .map(LogRecord::to_log_line)
        .collect::<Vec<_>>()
        .join("\n"))
}
