// src/utils/mod.rs

//! Utility functions and helpers.

pub mod http;

use scraper::ElementRef;

/// Collect and trim the text content of an element.
pub fn text_of(element: ElementRef<'_>) -> String {
    element.text().collect::<String>().trim().to_string()
}

#[cfg(test)]
mod tests {
    use super::*;
    use scraper::{Html, Selector};

    #[test]
    fn test_text_of_trims_and_joins() {
        let document = Html::parse_document("<p>  hello <b>world</b>  </p>");
        let sel = Selector::parse("p").unwrap();
        let p = document.select(&sel).next().unwrap();
        assert_eq!(text_of(p), "hello world");
    }

    #[test]
    fn test_text_of_empty_element() {
        let document = Html::parse_document("<p>   </p>");
        let sel = Selector::parse("p").unwrap();
        let p = document.select(&sel).next().unwrap();
        assert_eq!(text_of(p), "");
    }
}
