// src/services/exams.rs

//! Exam table row parsing.
//!
//! Each data row of the exam listing has five cells: document link, year,
//! semester, moed, lecturer. Rows tolerate missing anchors and missing
//! lecturer text; those degrade to sentinel values instead of failing the
//! row.

use scraper::{ElementRef, Selector};

use crate::models::{Exam, Lecturer};
use crate::utils::text_of;

/// Visible anchor text marking a solution document on the site.
pub const SOLUTION_TEXT: &str = "פתרון";

/// Sentinel written when a link or lecturer cannot be recovered.
pub const NULL_SENTINEL: &str = "NULL";

/// A parsed exam row: the exam itself plus the lecturer, when one could be
/// recovered from the row.
#[derive(Debug, Clone)]
pub struct ExamRow {
    /// Present only when the lecturer cell had real text. Rows with a
    /// sentinel lecturer still produce an exam but no lecturer record.
    pub lecturer: Option<Lecturer>,
    pub exam: Exam,
}

/// Parse a single `<tr>` of the exam table.
///
/// Returns `None` when the row does not have the expected five cells.
pub fn parse_exam_row(row: ElementRef<'_>, megama_id: i64, course_id: i64) -> Option<ExamRow> {
    let td_sel = Selector::parse("td").unwrap();
    let cells: Vec<ElementRef> = row.select(&td_sel).collect();
    let [document_cell, year, semester, moed, lecturer_cell] = cells[..] else {
        log::warn!(
            "course {course_id} in megama {megama_id} has an exam row with {} cells instead of 5, skipping",
            cells.len()
        );
        return None;
    };

    let lecturer_name = text_of(lecturer_cell);
    let lecturer = if lecturer_name.is_empty() {
        log::error!(
            "could not determine the lecturer of an exam in course {course_id}, megama {megama_id}"
        );
        None
    } else {
        Some(Lecturer {
            name: lecturer_name.clone(),
            megama_id,
            course_id,
        })
    };

    let (link, is_solution) = extract_link(document_cell, megama_id, course_id);

    let exam = Exam {
        megama_id,
        course_id,
        year: text_of(year).replace('"', ""),
        semester: text_of(semester),
        moed: text_of(moed),
        lecturer: if lecturer_name.is_empty() {
            NULL_SENTINEL.to_string()
        } else {
            lecturer_name
        },
        link,
        is_solution,
    };

    Some(ExamRow { lecturer, exam })
}

/// Scan the document cell for the first anchor with a non-empty href.
///
/// The anchor's visible text decides exam vs. solution. With no usable
/// anchor the link stays at the sentinel and the row counts as an exam.
fn extract_link(cell: ElementRef<'_>, megama_id: i64, course_id: i64) -> (String, bool) {
    let anchor_sel = Selector::parse("a").unwrap();
    for anchor in cell.select(&anchor_sel) {
        let href = anchor
            .value()
            .attr("href")
            .map(str::trim)
            .filter(|href| !href.is_empty());
        let Some(href) = href else {
            continue;
        };
        let is_solution = text_of(anchor) == SOLUTION_TEXT;
        return (href.to_string(), is_solution);
    }

    log::debug!("could not find the link of an exam in course {course_id}, megama {megama_id}");
    (NULL_SENTINEL.to_string(), false)
}
