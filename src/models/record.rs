// src/models/record.rs

//! Crawl record types.
//!
//! Everything the crawl emits is one of four shapes: a megama (faculty),
//! a course, a lecturer, or an exam document. Solutions are exam documents
//! with `is_solution` set rather than a separate shape.

use serde::{Deserialize, Serialize};

/// A megama (faculty) parsed from the top-level dropdown.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Megama {
    pub id: i64,
    pub name: String,
}

/// A course within a megama.
///
/// Course ids are reused across megamot in the source data, so a course is
/// identified by `(name, megama_id)` rather than by id alone.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Course {
    pub id: i64,
    pub name: String,
    pub megama_id: i64,
}

/// A lecturer, attached to the course under which they were seen.
///
/// The site exposes no lecturer id; the full tuple is the identity.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub struct Lecturer {
    pub name: String,
    pub megama_id: i64,
    pub course_id: i64,
}

/// One exam document row.
///
/// `link` carries the sentinel `"NULL"` when the row had no usable anchor,
/// never an empty string. Exams are not deduplicated; repeats across moed
/// and semester variants are legitimate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Exam {
    pub megama_id: i64,
    pub course_id: i64,
    pub year: String,
    pub semester: String,
    pub moed: String,
    pub lecturer: String,
    pub link: String,
    pub is_solution: bool,
}

/// Tagged union over everything the crawl emits.
///
/// Serialized with an `item_type` discriminator so downstream consumers can
/// route records without inspecting their fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
#[serde(tag = "item_type", rename_all = "snake_case")]
pub enum Record {
    Megama(Megama),
    Course(Course),
    Lecturer(Lecturer),
    Exam(Exam),
}

impl Record {
    /// The discriminator tag, as it appears in serialized output.
    pub fn item_type(&self) -> &'static str {
        match self {
            Record::Megama(_) => "megama",
            Record::Course(_) => "course",
            Record::Lecturer(_) => "lecturer",
            Record::Exam(_) => "exam",
        }
    }
}
