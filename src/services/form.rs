// src/services/form.rs

//! Form state extraction for the exam-search page.
//!
//! The search page is a classic WebForms postback form: every response
//! carries a hidden `__VIEWSTATE` token and a set of cascading `<select>`
//! controls. A submission must echo the token back and name the triggering
//! control in `__EVENTTARGET`, or the server drops the selection.

use scraper::{ElementRef, Html, Selector};

use crate::error::{AppError, Result};
use crate::utils::text_of;

/// Hidden field carrying the server-side form state.
pub const VIEW_STATE_FIELD: &str = "__VIEWSTATE";

/// Field naming the control that triggered the postback.
pub const EVENT_TARGET_FIELD: &str = "__EVENTTARGET";

/// An `(id, name)` pair read from a dropdown option.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SelectOption {
    pub id: i64,
    pub name: String,
}

/// Extract the `__VIEWSTATE` token from a response document.
///
/// Without the token the rest of the form chain cannot proceed, so absence
/// is fatal for the page.
pub fn extract_view_state(document: &Html, context: &str) -> Result<String> {
    let input_sel = Selector::parse(r#"input[id="__VIEWSTATE"]"#).unwrap();
    document
        .select(&input_sel)
        .next()
        .and_then(|input| input.value().attr("value"))
        .map(|value| value.trim().to_string())
        .ok_or_else(|| AppError::missing_view_state(context))
}

/// Return the n-th `<select>` element (1-indexed) and its form field name.
pub fn get_select<'a>(
    document: &'a Html,
    select_num: usize,
    context: &str,
) -> Result<(ElementRef<'a>, String)> {
    let select_sel = Selector::parse("select").unwrap();
    let select = document
        .select(&select_sel)
        .nth(select_num - 1)
        .ok_or_else(|| AppError::missing_select(select_num, context))?;
    let field_name = select
        .value()
        .attr("name")
        .map(|name| name.trim().to_string())
        .ok_or_else(|| AppError::missing_select(select_num, context))?;
    Ok((select, field_name))
}

/// Enumerate the real options of a dropdown in document order.
///
/// The first option is always a "choose..." placeholder and is dropped.
/// Options without a usable numeric value are skipped with a warning; an
/// option that has a value but no text is skipped with an error, since that
/// points at a deeper change in the page markup.
pub fn extract_options(select: ElementRef<'_>, what: &str) -> Vec<SelectOption> {
    let option_sel = Selector::parse("option").unwrap();
    let mut records = Vec::new();

    for option in select.select(&option_sel).skip(1) {
        let raw_id = option
            .value()
            .attr("value")
            .map(str::trim)
            .filter(|value| !value.is_empty());
        let Some(raw_id) = raw_id else {
            log::warn!("{what} option does not have an id, skipping");
            continue;
        };
        let Ok(id) = raw_id.parse::<i64>() else {
            log::warn!("{what} option has a non-numeric id {raw_id:?}, skipping");
            continue;
        };

        let name = text_of(option);
        if name.is_empty() {
            log::error!("{what} option has an id={id} but not a name, skipping");
            continue;
        }

        records.push(SelectOption { id, name });
    }

    records
}
