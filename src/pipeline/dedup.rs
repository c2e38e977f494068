// src/pipeline/dedup.rs

//! Duplicate suppression for megama, course, and lecturer records.

use std::collections::{HashMap, HashSet};
use std::sync::Mutex;

use crate::models::{Lecturer, Record};

/// Crawl-wide membership tracker deciding which records may be emitted.
///
/// Branches admit records concurrently, so the three membership sets sit
/// behind a single mutex. Exams pass through untouched; repeats across moed
/// and semester variants are legitimate.
#[derive(Debug, Default)]
pub struct DedupFilter {
    inner: Mutex<Membership>,
}

#[derive(Debug, Default)]
struct Membership {
    /// Megamot seen, keyed by name
    megamot: HashSet<String>,
    /// Course names seen, scoped per megama id
    courses: HashMap<i64, HashSet<String>>,
    /// Lecturers seen, keyed by the full tuple
    lecturers: HashSet<Lecturer>,
}

impl DedupFilter {
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns whether the record should be emitted. `false` means an equal
    /// record was already admitted in this run; callers drop it and move on.
    pub fn admit(&self, record: &Record) -> bool {
        let mut sets = self.inner.lock().unwrap_or_else(|e| e.into_inner());
        match record {
            Record::Megama(megama) => sets.megamot.insert(megama.name.clone()),
            Record::Course(course) => sets
                .courses
                .entry(course.megama_id)
                .or_default()
                .insert(course.name.clone()),
            Record::Lecturer(lecturer) => sets.lecturers.insert(lecturer.clone()),
            Record::Exam(_) => true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Course, Exam, Megama};

    fn course(name: &str, megama_id: i64) -> Record {
        Record::Course(Course {
            id: 1,
            name: name.to_string(),
            megama_id,
        })
    }

    #[test]
    fn test_duplicate_course_pair_is_dropped() {
        let filter = DedupFilter::new();
        assert!(filter.admit(&course("Algebra", 5)));
        assert!(!filter.admit(&course("Algebra", 5)));
    }

    #[test]
    fn test_same_course_name_in_different_megamot_is_kept() {
        let filter = DedupFilter::new();
        assert!(filter.admit(&course("Algebra", 5)));
        assert!(filter.admit(&course("Algebra", 6)));
    }

    #[test]
    fn test_megama_dedup_keys_on_name() {
        let filter = DedupFilter::new();
        let first = Record::Megama(Megama {
            id: 1,
            name: "מדעי המחשב".to_string(),
        });
        let same_name = Record::Megama(Megama {
            id: 2,
            name: "מדעי המחשב".to_string(),
        });
        assert!(filter.admit(&first));
        assert!(!filter.admit(&same_name));
    }

    #[test]
    fn test_lecturer_dedup_keys_on_full_tuple() {
        let filter = DedupFilter::new();
        let lecturer = |course_id: i64| {
            Record::Lecturer(Lecturer {
                name: "Prof. Cohen".to_string(),
                megama_id: 5,
                course_id,
            })
        };
        assert!(filter.admit(&lecturer(20)));
        assert!(!filter.admit(&lecturer(20)));
        assert!(filter.admit(&lecturer(21)));
    }

    #[test]
    fn test_exams_are_never_deduplicated() {
        let filter = DedupFilter::new();
        let exam = Record::Exam(Exam {
            megama_id: 5,
            course_id: 20,
            year: "2014".to_string(),
            semester: "א".to_string(),
            moed: "1".to_string(),
            lecturer: "Prof. Cohen".to_string(),
            link: "/files/a.pdf".to_string(),
            is_solution: false,
        });
        assert!(filter.admit(&exam));
        assert!(filter.admit(&exam));
    }
}
