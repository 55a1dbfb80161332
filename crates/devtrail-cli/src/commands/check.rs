//! `devtrail check` command implementation.
//!
//! Validates the configuration and reports which backend would be used.

use anyhow::Result;
use devtrail_core::{DevtrailConfig, StorageType};
use std::path::Path;

pub fn run(config: &DevtrailConfig, source: Option<&Path>) -> Result<()> {
    config.validate()?;
    for line in summary(config, source) {
        println!("{}", line);
    }
    Ok(())
}

fn summary(config: &DevtrailConfig, source: Option<&Path>) -> Vec<String> {
    let mut lines = vec![match source {
        Some(path) => format!("config: {}", path.display()),
        None => "config: defaults (or ./devtrail.yaml)".to_string(),
    }];

    match config.storage.storage_type {
        StorageType::File => lines.push(format!(
            "backend: file ({})",
            config.storage.file_path.display()
        )),
        StorageType::SearchIndex => lines.push(format!(
            "backend: search_index ({}/{})",
            config.storage.search_index.host.trim_end_matches('/'),
            config.storage.search_index.index_name
        )),
    }

    if config.authorized_actors.is_empty() {
        lines.push("WARN: no authorized actors; every record will be rejected".to_string());
    } else {
        lines.push(format!(
            "authorized actors: {}",
            config.authorized_actors.join(", ")
        ));
    }

    lines
}
