//! Page assembly
//!
//! A [`Page`] combines parser output with the cursor that produced it.
//! The query fetched one row more than the page size; if that extra row
//! arrived, a further page exists and its cursor is derived from the
//! extra row's key/id before the row is trimmed away. The previous
//! cursor is simply the input cursor's retreat.

use crate::row::ViewResult;
use futon_core::{Error, PageRequest, Result};

/// One page of rows plus the cursors around it
#[derive(Debug, Clone, PartialEq)]
pub struct Page<T> {
    rows: Vec<T>,
    total_size: i64,
    page_size: usize,
    previous: Option<PageRequest>,
    next: Option<PageRequest>,
}

impl<T> Page<T> {
    /// Build a page from a parsed result and the cursor that fetched it
    pub fn assemble(result: ViewResult<T>, request: &PageRequest) -> Self {
        let page_size = request.page_size();
        let total_size = result.total_rows().map_or(-1, |n| n as i64);
        let mut rows = result.into_rows();

        let next = if rows.len() > page_size {
            rows.pop().map(|extra| {
                request.advance(extra.key, extra.id.unwrap_or_default())
            })
        } else {
            None
        };

        Self {
            rows: rows.into_iter().map(|row| row.item).collect(),
            total_size,
            page_size,
            previous: request.retreat(),
            next,
        }
    }

    /// Rows of this page, already trimmed to the page size
    pub fn rows(&self) -> &[T] {
        &self.rows
    }

    /// Consume the page, keeping the rows
    pub fn into_rows(self) -> Vec<T> {
        self.rows
    }

    /// Number of rows on this page
    pub fn len(&self) -> usize {
        self.rows.len()
    }

    /// True when the page carries no rows
    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }

    /// Total size reported by the server, or -1 when absent
    pub fn total_size(&self) -> i64 {
        self.total_size
    }

    /// Configured page size
    pub fn page_size(&self) -> usize {
        self.page_size
    }

    /// True when a further page exists
    pub fn has_next(&self) -> bool {
        self.next.is_some()
    }

    /// True when a previous page exists
    pub fn has_previous(&self) -> bool {
        self.previous.is_some()
    }

    /// Cursor for the next page, when one exists
    pub fn next_request(&self) -> Option<&PageRequest> {
        self.next.as_ref()
    }

    /// Cursor for the previous page, when one exists
    pub fn previous_request(&self) -> Option<&PageRequest> {
        self.previous.as_ref()
    }

    /// Opaque token for the next page
    ///
    /// Fails fast with a state error when there is no next page; check
    /// [`has_next`](Self::has_next) first.
    pub fn next_link(&self) -> Result<String> {
        self.next
            .as_ref()
            .map(PageRequest::to_token)
            .ok_or(Error::InvalidState("page has no next page"))
    }

    /// Opaque token for the previous page
    ///
    /// Fails fast with a state error when there is no previous page.
    pub fn previous_link(&self) -> Result<String> {
        self.previous
            .as_ref()
            .map(PageRequest::to_token)
            .ok_or(Error::InvalidState("page has no previous page"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::parser::parse_view_result;
    use serde_json::{json, Value};
    use std::io::Cursor;

    fn result_with_rows(n: usize, total: Option<usize>) -> ViewResult<Value> {
        let rows: Vec<String> = (1..=n)
            .map(|i| format!(r#"{{"id":"d{i}","key":"k{i}","value":{i}}}"#))
            .collect();
        let header = match total {
            Some(t) => format!(r#""total_rows":{t},"#),
            None => String::new(),
        };
        let body = format!(r#"{{{header}"rows":[{}]}}"#, rows.join(","));
        parse_view_result(Cursor::new(body.into_bytes()), false).unwrap()
    }

    #[test]
    fn test_extra_row_trimmed_and_next_cursor_derived() {
        // Page size five, six rows back: five visible, next points at row six.
        let request = PageRequest::first_page(5);
        let page = Page::assemble(result_with_rows(6, Some(20)), &request);

        assert_eq!(page.len(), 5);
        assert_eq!(page.page_size(), 5);
        assert!(page.has_next());
        let next = page.next_request().unwrap();
        let resume = next.resume_key().unwrap();
        assert_eq!(resume.key, json!("k6"));
        assert_eq!(resume.doc_id, "d6");
        assert_eq!(next.page_number(), 2);
    }

    #[test]
    fn test_exact_page_size_means_no_next() {
        let request = PageRequest::first_page(5);
        let page = Page::assemble(result_with_rows(5, Some(5)), &request);
        assert_eq!(page.len(), 5);
        assert!(!page.has_next());
        assert!(!page.has_previous());
    }

    #[test]
    fn test_short_page_means_no_next() {
        let request = PageRequest::first_page(5);
        let page = Page::assemble(result_with_rows(2, Some(2)), &request);
        assert_eq!(page.len(), 2);
        assert!(!page.has_next());
    }

    #[test]
    fn test_total_size_absent_is_minus_one() {
        let request = PageRequest::first_page(5);
        let page = Page::assemble(result_with_rows(2, None), &request);
        assert_eq!(page.total_size(), -1);
    }

    #[test]
    fn test_total_size_reported() {
        let request = PageRequest::first_page(5);
        let page = Page::assemble(result_with_rows(2, Some(42)), &request);
        assert_eq!(page.total_size(), 42);
    }

    #[test]
    fn test_previous_is_retreat_of_input() {
        let second = PageRequest::first_page(3).advance(json!("k4"), "d4");
        let page = Page::assemble(result_with_rows(3, Some(10)), &second);
        assert!(page.has_previous());
        assert_eq!(
            page.previous_request().unwrap(),
            &PageRequest::first_page(3)
        );
    }

    #[test]
    fn test_links_fail_fast_when_absent() {
        let request = PageRequest::first_page(5);
        let page = Page::assemble(result_with_rows(2, Some(2)), &request);
        assert!(matches!(page.next_link(), Err(Error::InvalidState(_))));
        assert!(matches!(page.previous_link(), Err(Error::InvalidState(_))));
    }

    #[test]
    fn test_links_round_trip_through_tokens() {
        let request = PageRequest::first_page(2);
        let page = Page::assemble(result_with_rows(3, Some(9)), &request);
        let token = page.next_link().unwrap();
        let decoded = PageRequest::from_token(&token).unwrap();
        assert_eq!(&decoded, page.next_request().unwrap());
    }
}
