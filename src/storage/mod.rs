// src/storage/mod.rs

//! Output sinks for crawl records.
//!
//! Records are written in arrival order; no ordering across entity kinds is
//! promised. Two file backends exist: JSON Lines and flat CSV.

pub mod local;

use std::path::Path;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::error::Result;
use crate::models::Record;

// Re-export for convenience
pub use local::{CsvSink, JsonLinesSink};

/// Output serialization format.
#[derive(
    Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, clap::ValueEnum, Default,
)]
#[serde(rename_all = "lowercase")]
pub enum OutputFormat {
    /// One JSON object per line, tagged with `item_type`
    #[default]
    Jsonl,
    /// Flat CSV with a fixed column set across all record kinds
    Csv,
}

impl OutputFormat {
    /// File extension for the default output path.
    pub fn extension(self) -> &'static str {
        match self {
            OutputFormat::Jsonl => "jsonl",
            OutputFormat::Csv => "csv",
        }
    }
}

/// Destination for crawl records.
#[async_trait]
pub trait RecordSink: Send {
    /// Write one record.
    async fn write(&mut self, record: &Record) -> Result<()>;

    /// Flush buffered output. Called once, after the crawl completes.
    async fn finish(&mut self) -> Result<()>;
}

/// Open a sink of the requested format at `path`.
pub async fn open_sink(format: OutputFormat, path: &Path) -> Result<Box<dyn RecordSink>> {
    Ok(match format {
        OutputFormat::Jsonl => Box::new(JsonLinesSink::create(path).await?),
        OutputFormat::Csv => Box::new(CsvSink::create(path)?),
    })
}
