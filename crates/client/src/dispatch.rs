//! URL-versus-body dispatch for multi-key queries
//!
//! A multi-key set can ride the URL as a `keys` parameter or travel as a
//! `{"keys":[...]}` POST body. Long key arrays must use the body (URLs
//! have practical length ceilings); short ones may use either, and on
//! hosted backends where GET and POST are billed differently the choice
//! matters. The strategy is therefore pluggable: the default switches on
//! encoded length, deployments can substitute their own.

use crate::query::ViewQuery;

/// Encoded-keys length above which the set must travel as a POST body
pub const KEYS_URL_LENGTH_LIMIT: usize = 3000;

/// Where a multi-key set travels
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum KeyDispatch {
    /// Append the encoded array to the URL as a `keys` parameter
    UrlParam,
    /// Send `{"keys":[...]}` as the request body
    RequestBody,
}

/// Pluggable choice of transport shape for multi-key queries
pub trait DispatchStrategy: Send + Sync {
    /// Decide how `encoded_keys` (the rendered JSON array) should travel
    fn dispatch(&self, query: &ViewQuery, encoded_keys: &str) -> KeyDispatch;
}

/// Default strategy: body above a fixed encoded-length threshold
#[derive(Debug, Clone)]
pub struct LengthThresholdDispatch {
    threshold: usize,
}

impl LengthThresholdDispatch {
    /// Strategy with a custom threshold
    pub fn with_threshold(threshold: usize) -> Self {
        Self { threshold }
    }
}

impl Default for LengthThresholdDispatch {
    fn default() -> Self {
        Self::with_threshold(KEYS_URL_LENGTH_LIMIT)
    }
}

impl DispatchStrategy for LengthThresholdDispatch {
    fn dispatch(&self, _query: &ViewQuery, encoded_keys: &str) -> KeyDispatch {
        if encoded_keys.len() > self.threshold {
            KeyDispatch::RequestBody
        } else {
            KeyDispatch::UrlParam
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn query() -> ViewQuery {
        ViewQuery::new()
            .db_path("db")
            .design_doc_id("d")
            .view_name("v")
    }

    #[test]
    fn test_short_keys_ride_the_url() {
        let strategy = LengthThresholdDispatch::default();
        let keys = r#"["a","b","c"]"#;
        assert_eq!(strategy.dispatch(&query(), keys), KeyDispatch::UrlParam);
    }

    #[test]
    fn test_long_keys_use_the_body() {
        let strategy = LengthThresholdDispatch::default();
        let keys = format!("[\"{}\"]", "x".repeat(KEYS_URL_LENGTH_LIMIT));
        assert_eq!(
            strategy.dispatch(&query(), &keys),
            KeyDispatch::RequestBody
        );
    }

    #[test]
    fn test_threshold_boundary_is_exclusive() {
        let strategy = LengthThresholdDispatch::with_threshold(10);
        assert_eq!(
            strategy.dispatch(&query(), &"k".repeat(10)),
            KeyDispatch::UrlParam
        );
        assert_eq!(
            strategy.dispatch(&query(), &"k".repeat(11)),
            KeyDispatch::RequestBody
        );
    }
}
