// src/pipeline/crawl.rs

//! Crawl pipeline entry point: orchestrator → dedup → sink.

use std::collections::HashSet;

use chrono::Utc;

use crate::error::Result;
use crate::models::{Config, Record};
use crate::pipeline::DedupFilter;
use crate::services::ExamCrawler;
use crate::storage::RecordSink;

/// Dedups records and forwards the survivors to the sink, in arrival order.
pub struct RecordPipeline {
    dedup: DedupFilter,
    sink: Box<dyn RecordSink>,
    written: usize,
    dropped: usize,
}

impl RecordPipeline {
    pub fn new(sink: Box<dyn RecordSink>) -> Self {
        Self {
            dedup: DedupFilter::new(),
            sink,
            written: 0,
            dropped: 0,
        }
    }

    /// Admit one record. Duplicates are routine and dropped quietly; a sink
    /// failure is the only error this can surface.
    pub async fn process(&mut self, record: Record) -> Result<()> {
        if self.dedup.admit(&record) {
            self.sink.write(&record).await?;
            self.written += 1;
        } else {
            log::debug!("duplicate {} dropped", record.item_type());
            self.dropped += 1;
        }
        Ok(())
    }

    /// Flush the sink and return `(written, dropped)` counts.
    pub async fn finish(mut self) -> Result<(usize, usize)> {
        self.sink.finish().await?;
        Ok((self.written, self.dropped))
    }
}

/// Run a full crawl against the configured site.
pub async fn run_crawl(
    config: &Config,
    megama_filter: Option<HashSet<i64>>,
    sink: Box<dyn RecordSink>,
) -> Result<()> {
    let started = Utc::now();
    log::info!("starting exam crawl against {}", config.site.domain);

    let crawler = ExamCrawler::new(config, megama_filter)?;
    let mut pipeline = RecordPipeline::new(sink);
    let outcome = crawler.crawl(&mut pipeline).await?;
    let (written, dropped) = pipeline.finish().await?;

    let elapsed = Utc::now() - started;
    log::info!(
        "crawl complete in {}s: {} megamot listed, {} course branches ({} failed), {} exam branches ({} failed), {} records written, {} duplicates dropped",
        elapsed.num_seconds(),
        outcome.megama_total,
        outcome.course_branches,
        outcome.course_failures,
        outcome.exam_branches,
        outcome.exam_failures,
        written,
        dropped,
    );

    Ok(())
}
