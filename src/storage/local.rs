// src/storage/local.rs

//! Local file sink implementations.

use std::path::Path;

use async_trait::async_trait;
use tokio::fs::File;
use tokio::io::{AsyncWriteExt, BufWriter};

use crate::error::Result;
use crate::models::Record;
use crate::storage::RecordSink;

/// One JSON object per line, tagged with `item_type`.
pub struct JsonLinesSink {
    writer: BufWriter<File>,
}

impl JsonLinesSink {
    /// Create the output file, including parent directories.
    pub async fn create(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            tokio::fs::create_dir_all(parent).await?;
        }
        let file = File::create(path).await?;
        Ok(Self {
            writer: BufWriter::new(file),
        })
    }
}

#[async_trait]
impl RecordSink for JsonLinesSink {
    async fn write(&mut self, record: &Record) -> Result<()> {
        let mut line = serde_json::to_vec(record)?;
        line.push(b'\n');
        self.writer.write_all(&line).await?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.writer.flush().await?;
        Ok(())
    }
}

/// CSV column set shared by all four record kinds; fields a kind does not
/// have stay empty.
const CSV_HEADER: [&str; 11] = [
    "item_type",
    "id",
    "name",
    "megama_id",
    "course_id",
    "year",
    "semester",
    "moed",
    "lecturer",
    "link",
    "is_solution",
];

/// Flat CSV sink.
pub struct CsvSink {
    writer: csv::Writer<std::fs::File>,
}

impl CsvSink {
    /// Create the output file with a header row.
    pub fn create(path: impl AsRef<Path>) -> Result<Self> {
        if let Some(parent) = path.as_ref().parent() {
            std::fs::create_dir_all(parent)?;
        }
        let mut writer = csv::Writer::from_path(path)?;
        writer.write_record(CSV_HEADER)?;
        Ok(Self { writer })
    }

    fn row(record: &Record) -> [String; 11] {
        let empty = String::new;
        match record {
            Record::Megama(megama) => [
                record.item_type().to_string(),
                megama.id.to_string(),
                megama.name.clone(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
            ],
            Record::Course(course) => [
                record.item_type().to_string(),
                course.id.to_string(),
                course.name.clone(),
                course.megama_id.to_string(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
            ],
            Record::Lecturer(lecturer) => [
                record.item_type().to_string(),
                empty(),
                lecturer.name.clone(),
                lecturer.megama_id.to_string(),
                lecturer.course_id.to_string(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
                empty(),
            ],
            Record::Exam(exam) => [
                record.item_type().to_string(),
                empty(),
                empty(),
                exam.megama_id.to_string(),
                exam.course_id.to_string(),
                exam.year.clone(),
                exam.semester.clone(),
                exam.moed.clone(),
                exam.lecturer.clone(),
                exam.link.clone(),
                exam.is_solution.to_string(),
            ],
        }
    }
}

#[async_trait]
impl RecordSink for CsvSink {
    async fn write(&mut self, record: &Record) -> Result<()> {
        self.writer.write_record(Self::row(record))?;
        Ok(())
    }

    async fn finish(&mut self) -> Result<()> {
        self.writer.flush()?;
        Ok(())
    }
}
