// src/services/crawler.rs

//! Exam archive crawler service.
//!
//! Drives the cascading search form in three steps: GET the search page and
//! enumerate the megama dropdown, POST a megama selection to receive its
//! course dropdown, POST a course selection (re-sending the megama choice)
//! to receive the exam table. Every POST echoes the view-state token of the
//! response it reacts to, and each branch carries its own context forward;
//! nothing is shared between sibling branches except the dedup filter.

use std::collections::HashSet;
use std::time::Duration;

use futures::stream::{self, StreamExt};
use scraper::{Html, Selector};

use crate::error::Result;
use crate::models::{Config, Course, Megama, Record};
use crate::pipeline::RecordPipeline;
use crate::services::exams::parse_exam_row;
use crate::services::form::{self, EVENT_TARGET_FIELD, VIEW_STATE_FIELD};
use crate::utils::http::HttpClient;

/// Summary of a crawl run.
#[derive(Debug, Default)]
pub struct CrawlOutcome {
    /// Megamot found in the top-level dropdown
    pub megama_total: usize,
    /// Course-listing branches scheduled (after allowlist filtering)
    pub course_branches: usize,
    pub course_failures: usize,
    /// Exam-listing branches scheduled (one per discovered course)
    pub exam_branches: usize,
    pub exam_failures: usize,
}

/// Parsed search page: the dropdown contents plus the state needed to POST
/// a selection back.
#[derive(Debug)]
struct MegamaListing {
    view_state: String,
    megama_field: String,
    megamot: Vec<Megama>,
}

/// Context for one megama's course-listing request.
#[derive(Debug)]
struct MegamaBranch {
    megama: Megama,
    view_state: String,
    megama_field: String,
}

/// Context for one course's exam-listing request. The form requires prior
/// selections to be re-sent, so the megama field travels along.
#[derive(Debug)]
struct CourseBranch {
    course: Course,
    megama_field: String,
    course_field: String,
    view_state: String,
}

/// Service crawling the exam archive's cascading search form.
pub struct ExamCrawler {
    client: HttpClient,
    search_url: String,
    delay: Duration,
    max_concurrent: usize,
    megama_filter: Option<HashSet<i64>>,
}

impl ExamCrawler {
    /// Create a new crawler against the configured site.
    ///
    /// `megama_filter` restricts which megamot are descended into; all
    /// megamot are still listed and emitted.
    pub fn new(config: &Config, megama_filter: Option<HashSet<i64>>) -> Result<Self> {
        Ok(Self {
            client: HttpClient::new(&config.crawler)?,
            search_url: config.site.search_url(),
            delay: Duration::from_millis(config.crawler.request_delay_ms),
            max_concurrent: config.crawler.max_concurrent.max(1),
            megama_filter,
        })
    }

    /// Fetch the search page and return the megamot it lists, without
    /// descending into courses or exams.
    pub async fn list_megamot(&self) -> Result<Vec<Megama>> {
        let html = self.client.get_text(&self.search_url).await?;
        Ok(parse_megama_listing(&html)?.megamot)
    }

    /// Run the full crawl, feeding records to the pipeline as branches
    /// complete. Per-branch failures are counted and logged; only transport
    /// failure on the initial page or a sink failure aborts the run.
    pub async fn crawl(&self, pipeline: &mut RecordPipeline) -> Result<CrawlOutcome> {
        let html = self.client.get_text(&self.search_url).await?;
        let listing = parse_megama_listing(&html)?;

        let mut outcome = CrawlOutcome {
            megama_total: listing.megamot.len(),
            ..CrawlOutcome::default()
        };

        // Every megama is emitted; the allowlist only controls descent.
        let mut branches = Vec::new();
        for megama in listing.megamot {
            pipeline.process(Record::Megama(megama.clone())).await?;

            if !self.should_descend(megama.id) {
                log::warn!("excluding megama={}", megama.id);
                continue;
            }

            branches.push(MegamaBranch {
                megama,
                view_state: listing.view_state.clone(),
                megama_field: listing.megama_field.clone(),
            });
        }
        outcome.course_branches = branches.len();

        // Stage 1: course listings for all selected megamot, bounded by the
        // concurrency limit.
        let mut course_branches = Vec::new();
        let mut course_stream = stream::iter(&branches)
            .map(|branch| async move {
                let result = self.fetch_course_listing(branch).await;
                (branch, result)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((branch, result)) = course_stream.next().await {
            match result {
                Ok(found) => course_branches.extend(found),
                Err(error) => {
                    outcome.course_failures += 1;
                    log::warn!(
                        "failed to list courses for megama {}: {}",
                        branch.megama.id,
                        error
                    );
                }
            }
            self.pause().await;
        }
        outcome.exam_branches = course_branches.len();

        // Stage 2: exam listings for all discovered courses. Each branch's
        // records reach the pipeline together, in document order; branches
        // complete in whatever order the network dictates.
        let mut exam_stream = stream::iter(&course_branches)
            .map(|branch| async move {
                let result = self.fetch_exam_listing(branch).await;
                (branch, result)
            })
            .buffer_unordered(self.max_concurrent);

        while let Some((branch, result)) = exam_stream.next().await {
            match result {
                Ok(records) => {
                    for record in records {
                        pipeline.process(record).await?;
                    }
                }
                Err(error) => {
                    outcome.exam_failures += 1;
                    log::warn!(
                        "failed to list exams for course {} in megama {}: {}",
                        branch.course.id,
                        branch.course.megama_id,
                        error
                    );
                }
            }
            self.pause().await;
        }

        Ok(outcome)
    }

    /// POST the megama selection and parse the course dropdown out of the
    /// response.
    async fn fetch_course_listing(&self, branch: &MegamaBranch) -> Result<Vec<CourseBranch>> {
        let fields = vec![
            (VIEW_STATE_FIELD.to_string(), branch.view_state.clone()),
            (branch.megama_field.clone(), branch.megama.id.to_string()),
            (EVENT_TARGET_FIELD.to_string(), branch.megama_field.clone()),
        ];
        let html = self.client.post_form(&self.search_url, &fields).await?;
        parse_course_listing(&html, branch)
    }

    /// POST the course selection (with the megama re-selected) and parse the
    /// exam table.
    async fn fetch_exam_listing(&self, branch: &CourseBranch) -> Result<Vec<Record>> {
        let fields = vec![
            (VIEW_STATE_FIELD.to_string(), branch.view_state.clone()),
            (branch.course_field.clone(), branch.course.id.to_string()),
            (EVENT_TARGET_FIELD.to_string(), branch.course_field.clone()),
            (
                branch.megama_field.clone(),
                branch.course.megama_id.to_string(),
            ),
        ];
        let html = self.client.post_form(&self.search_url, &fields).await?;
        Ok(parse_exam_listing(&html, &branch.course))
    }

    /// Whether a megama branch proceeds past the listing stage.
    fn should_descend(&self, megama_id: i64) -> bool {
        match &self.megama_filter {
            Some(filter) => filter.contains(&megama_id),
            None => true,
        }
    }

    async fn pause(&self) {
        if self.delay.as_millis() > 0 {
            tokio::time::sleep(self.delay).await;
        }
    }
}

/// Parse the search page into the megama dropdown and its postback state.
fn parse_megama_listing(html: &str) -> Result<MegamaListing> {
    let document = Html::parse_document(html);
    let context = "megama listing";

    let view_state = form::extract_view_state(&document, context)?;
    let (select, megama_field) = form::get_select(&document, 1, context)?;
    let megamot = form::extract_options(select, "megama")
        .into_iter()
        .map(|option| Megama {
            id: option.id,
            name: option.name,
        })
        .collect();

    Ok(MegamaListing {
        view_state,
        megama_field,
        megamot,
    })
}

/// Parse a course-listing response into exam-listing branches, attaching
/// the megama context to every course.
fn parse_course_listing(html: &str, branch: &MegamaBranch) -> Result<Vec<CourseBranch>> {
    let document = Html::parse_document(html);
    let context = format!("course listing for megama {}", branch.megama.id);

    let view_state = form::extract_view_state(&document, &context)?;
    let (select, course_field) = form::get_select(&document, 2, &context)?;

    Ok(form::extract_options(select, "course")
        .into_iter()
        .map(|option| CourseBranch {
            course: Course {
                id: option.id,
                name: option.name,
                megama_id: branch.megama.id,
            },
            megama_field: branch.megama_field.clone(),
            course_field: course_field.clone(),
            view_state: view_state.clone(),
        })
        .collect())
}

/// Parse an exam-listing response into records, in document order.
///
/// The course record leads, but only once the table proves it has exam
/// rows; a course with an empty listing is never published.
fn parse_exam_listing(html: &str, course: &Course) -> Vec<Record> {
    let document = Html::parse_document(html);
    let row_sel = Selector::parse("table#calendar tr").unwrap();
    let rows: Vec<_> = document.select(&row_sel).collect();

    // First row is the header.
    let Some((_, data_rows)) = rows.split_first() else {
        log::error!(
            "course {} in megama {} has no exam table; if this happens frequently the page layout changed",
            course.id,
            course.megama_id
        );
        return Vec::new();
    };

    let td_sel = Selector::parse("td").unwrap();
    let has_exams = match data_rows.first() {
        Some(first) => first.select(&td_sel).count() > 1,
        None => false,
    };
    if !has_exams {
        log::warn!(
            "course {} in megama {} does not have any exams",
            course.id,
            course.megama_id
        );
        return Vec::new();
    }

    let mut records = Vec::with_capacity(data_rows.len() * 2 + 1);
    records.push(Record::Course(course.clone()));

    for row in data_rows {
        let Some(parsed) = parse_exam_row(*row, course.megama_id, course.id) else {
            continue;
        };
        if let Some(lecturer) = parsed.lecturer {
            records.push(Record::Lecturer(lecturer));
        }
        records.push(Record::Exam(parsed.exam));
    }

    records
}

#[cfg(test)]
mod tests {
    use super::*;

    const SEARCH_PAGE: &str = r#"
        <html><body><form>
        <input type="hidden" id="__VIEWSTATE" name="__VIEWSTATE" value="state-0" />
        <select name="ctl00$Trend">
            <option value="">בחר מגמה</option>
            <option value="3">מגמה ג</option>
            <option value="5">מגמה ה</option>
            <option value="7">מגמה ז</option>
        </select>
        </form></body></html>
    "#;

    const COURSE_PAGE: &str = r#"
        <html><body><form>
        <input type="hidden" id="__VIEWSTATE" name="__VIEWSTATE" value="state-1" />
        <select name="ctl00$Trend">
            <option value="">בחר מגמה</option>
            <option value="5">מגמה ה</option>
        </select>
        <select name="ctl00$Course">
            <option value="">בחר קורס</option>
            <option value="50000416">Algebra</option>
            <option value="50000417">Calculus</option>
        </select>
        </form></body></html>
    "#;

    fn sample_course() -> Course {
        Course {
            id: 50000416,
            name: "Algebra".to_string(),
            megama_id: 5,
        }
    }

    #[test]
    fn test_parse_megama_listing() {
        let listing = parse_megama_listing(SEARCH_PAGE).unwrap();
        assert_eq!(listing.view_state, "state-0");
        assert_eq!(listing.megama_field, "ctl00$Trend");
        assert_eq!(
            listing.megamot.iter().map(|m| m.id).collect::<Vec<_>>(),
            vec![3, 5, 7]
        );
    }

    #[test]
    fn test_parse_megama_listing_without_view_state() {
        let err = parse_megama_listing("<html><body><select></select></body></html>").unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::MissingViewState { .. }
        ));
    }

    #[test]
    fn test_megama_filter_restricts_descent() {
        let config = Config::default();
        let filter: HashSet<i64> = [5].into_iter().collect();
        let crawler = ExamCrawler::new(&config, Some(filter)).unwrap();

        let listing = parse_megama_listing(SEARCH_PAGE).unwrap();
        let descended: Vec<i64> = listing
            .megamot
            .iter()
            .map(|m| m.id)
            .filter(|id| crawler.should_descend(*id))
            .collect();
        assert_eq!(descended, vec![5]);

        let unfiltered = ExamCrawler::new(&config, None).unwrap();
        assert!(listing.megamot.iter().all(|m| unfiltered.should_descend(m.id)));
    }

    #[test]
    fn test_parse_course_listing_without_view_state_fails_branch() {
        let branch = MegamaBranch {
            megama: Megama {
                id: 5,
                name: "מגמה ה".to_string(),
            },
            view_state: "state-0".to_string(),
            megama_field: "ctl00$Trend".to_string(),
        };
        let err = parse_course_listing("<html><body></body></html>", &branch).unwrap_err();
        assert!(matches!(
            err,
            crate::error::AppError::MissingViewState { .. }
        ));
    }

    #[test]
    fn test_parse_course_listing_attaches_megama_context() {
        let branch = MegamaBranch {
            megama: Megama {
                id: 5,
                name: "מגמה ה".to_string(),
            },
            view_state: "state-0".to_string(),
            megama_field: "ctl00$Trend".to_string(),
        };

        let courses = parse_course_listing(COURSE_PAGE, &branch).unwrap();
        assert_eq!(courses.len(), 2);
        for course_branch in &courses {
            assert_eq!(course_branch.course.megama_id, 5);
            assert_eq!(course_branch.megama_field, "ctl00$Trend");
            assert_eq!(course_branch.course_field, "ctl00$Course");
            // Exam requests must carry the course page's token, not the
            // search page's.
            assert_eq!(course_branch.view_state, "state-1");
        }
        assert_eq!(courses[0].course.name, "Algebra");
    }

    #[test]
    fn test_parse_exam_listing_emits_course_first() {
        let html = r#"
            <table id="calendar">
                <tr><th>מסמך</th><th>שנה</th><th>סמסטר</th><th>מועד</th><th>מרצה</th></tr>
                <tr>
                    <td><a href="/files/a.pdf">בחינה</a></td>
                    <td>2014</td><td>א</td><td>1</td><td>Prof. Cohen</td>
                </tr>
                <tr>
                    <td><a href="/files/b.pdf">פתרון</a></td>
                    <td>2014</td><td>א</td><td>1</td><td>Prof. Cohen</td>
                </tr>
            </table>
        "#;

        let records = parse_exam_listing(html, &sample_course());
        assert_eq!(records.len(), 5);
        assert!(matches!(&records[0], Record::Course(c) if c.id == 50000416));
        assert!(matches!(&records[1], Record::Lecturer(l) if l.name == "Prof. Cohen"));
        assert!(matches!(&records[2], Record::Exam(e) if !e.is_solution));
        assert!(matches!(&records[4], Record::Exam(e) if e.is_solution));
    }

    #[test]
    fn test_parse_exam_listing_single_cell_row_means_no_exams() {
        let html = r#"
            <table id="calendar">
                <tr><th>header</th></tr>
                <tr><td>אין בחינות</td></tr>
            </table>
        "#;

        let records = parse_exam_listing(html, &sample_course());
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_exam_listing_missing_table() {
        let records = parse_exam_listing("<html><body></body></html>", &sample_course());
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_exam_listing_header_only() {
        let html = r#"<table id="calendar"><tr><th>header</th></tr></table>"#;
        let records = parse_exam_listing(html, &sample_course());
        assert!(records.is_empty());
    }

    #[test]
    fn test_parse_exam_listing_skips_malformed_row() {
        let html = r#"
            <table id="calendar">
                <tr><th>header</th></tr>
                <tr>
                    <td><a href="/files/a.pdf">בחינה</a></td>
                    <td>2014</td><td>א</td><td>1</td><td>Prof. Cohen</td>
                </tr>
                <tr><td>x</td><td>y</td></tr>
            </table>
        "#;

        let records = parse_exam_listing(html, &sample_course());
        // Course + lecturer + exam from the good row; the two-cell row is
        // dropped.
        assert_eq!(records.len(), 3);
    }
}
