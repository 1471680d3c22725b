//! View query builder
//!
//! [`ViewQuery`] is a fluent descriptor of one view request: target path
//! (database, design document, view or list function), key bounds, and
//! paging/reduce/grouping flags. Setters consume and return the builder;
//! every setter invalidates the memoized rendered query string, because
//! callers commonly render, mutate, and render again.
//!
//! Rendering is split in two: [`ViewQuery::path`] validates the required
//! target fields and fails with a configuration error when one is
//! missing, while [`ViewQuery::query_string`] deterministically renders
//! the parameters. Parameters are only emitted when they deviate from the
//! server's defaults, so the wire form carries no default-value noise.
//!
//! The builder is single-writer while being mutated (the cached render
//! assumes that); once it is only read, sharing is safe.

use futon_core::{ComplexKey, Error, PageRequest, Result};
use percent_encoding::{utf8_percent_encode, AsciiSet, NON_ALPHANUMERIC};
use serde_json::Value;

/// RFC 3986 unreserved characters stay literal; everything else is escaped
const QUERY_VALUE: &AsciiSet = &NON_ALPHANUMERIC
    .remove(b'-')
    .remove(b'_')
    .remove(b'.')
    .remove(b'~');

/// View name selecting the built-in "all documents" index
pub const ALL_DOCS_VIEW: &str = "_all_docs";

/// A query key: typed (encoded by the key codec) or raw JSON text, never both
#[derive(Debug, Clone, PartialEq)]
pub enum Key {
    /// Any JSON value, encoded with its natural JSON encoding
    Json(Value),
    /// Composite key with collation sentinels
    Complex(ComplexKey),
    /// Pre-encoded JSON text, passed through verbatim
    Raw(String),
}

impl Key {
    /// Raw JSON text, bypassing encoding
    pub fn raw(text: impl Into<String>) -> Self {
        Key::Raw(text.into())
    }

    /// Encoded JSON text of this key
    pub fn to_json_text(&self) -> String {
        match self {
            Key::Json(value) => value.to_string(),
            Key::Complex(key) => key.encode(),
            Key::Raw(text) => text.clone(),
        }
    }
}

impl From<Value> for Key {
    fn from(value: Value) -> Self {
        Key::Json(value)
    }
}

impl From<ComplexKey> for Key {
    fn from(key: ComplexKey) -> Self {
        Key::Complex(key)
    }
}

impl From<&str> for Key {
    fn from(s: &str) -> Self {
        Key::Json(Value::String(s.to_string()))
    }
}

impl From<String> for Key {
    fn from(s: String) -> Self {
        Key::Json(Value::String(s))
    }
}

impl From<i64> for Key {
    fn from(n: i64) -> Self {
        Key::Json(Value::from(n))
    }
}

impl From<bool> for Key {
    fn from(b: bool) -> Self {
        Key::Json(Value::Bool(b))
    }
}

/// View freshness mode traded against query latency
///
/// Absent means strict: the view is updated before the query runs.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StaleMode {
    /// Serve from the current index without updating it
    Ok,
    /// Serve from the current index, then rebuild it afterwards
    UpdateAfter,
}

impl StaleMode {
    fn as_param(self) -> &'static str {
        match self {
            StaleMode::Ok => "ok",
            StaleMode::UpdateAfter => "update_after",
        }
    }
}

/// Fluent, deterministic view request descriptor
///
/// # Example
///
/// ```
/// use futon_client::ViewQuery;
///
/// let mut query = ViewQuery::new()
///     .db_path("orders")
///     .design_doc_id("reports")
///     .view_name("by_customer")
///     .start_key("acme")
///     .limit(20);
///
/// assert_eq!(query.path().unwrap(), "/orders/_design/reports/_view/by_customer");
/// assert_eq!(query.query_string(), "startkey=%22acme%22&limit=20");
/// ```
#[derive(Debug, Clone, Default)]
pub struct ViewQuery {
    db_path: Option<String>,
    design_doc_id: Option<String>,
    view_name: Option<String>,
    list_name: Option<String>,
    key: Option<Key>,
    keys: Vec<Key>,
    start_key: Option<Key>,
    start_doc_id: Option<String>,
    end_key: Option<Key>,
    end_doc_id: Option<String>,
    limit: Option<usize>,
    skip: Option<usize>,
    stale: Option<StaleMode>,
    descending: bool,
    inclusive_end: Option<bool>,
    group: bool,
    group_level: Option<u32>,
    reduce: Option<bool>,
    include_docs: bool,
    update_seq: bool,
    cacheable: bool,
    ignore_not_found: bool,
    extra_params: Vec<(String, String)>,
    cached_query: Option<String>,
}

impl ViewQuery {
    /// Create an empty query
    pub fn new() -> Self {
        Self::default()
    }

    /// Database path, e.g. `orders`
    ///
    /// Normally rewritten by the executing client on every run, which is
    /// why queries are cloned rather than mutated when reused.
    pub fn db_path(mut self, db_path: impl Into<String>) -> Self {
        self.cached_query = None;
        self.db_path = Some(db_path.into());
        self
    }

    /// Design document id; a bare name gets the `_design/` prefix
    pub fn design_doc_id(mut self, id: impl Into<String>) -> Self {
        self.cached_query = None;
        let id = id.into();
        self.design_doc_id = Some(if id.starts_with("_design/") {
            id
        } else {
            format!("_design/{id}")
        });
        self
    }

    /// View name; [`ALL_DOCS_VIEW`] selects the built-in index
    pub fn view_name(mut self, name: impl Into<String>) -> Self {
        self.cached_query = None;
        self.view_name = Some(name.into());
        self
    }

    /// Target the built-in "all documents" index
    pub fn all_docs(self) -> Self {
        self.view_name(ALL_DOCS_VIEW)
    }

    /// Server-side list function applied to the view's rows
    pub fn list_name(mut self, name: impl Into<String>) -> Self {
        self.cached_query = None;
        self.list_name = Some(name.into());
        self
    }

    /// Exact-match key
    pub fn key(mut self, key: impl Into<Key>) -> Self {
        self.cached_query = None;
        self.key = Some(key.into());
        self
    }

    /// Exact-match key as raw JSON text, bypassing encoding
    pub fn raw_key(self, text: impl Into<String>) -> Self {
        self.key(Key::Raw(text.into()))
    }

    /// Ordered multi-key match
    ///
    /// Mutually exclusive with single-key and range parameters: setting
    /// keys clears them, and rendering emits neither.
    pub fn keys<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<Key>,
    {
        self.cached_query = None;
        self.keys = keys.into_iter().map(Into::into).collect();
        self.key = None;
        self.start_key = None;
        self.start_doc_id = None;
        self.end_key = None;
        self.end_doc_id = None;
        self
    }

    /// Range scan lower bound
    pub fn start_key(mut self, key: impl Into<Key>) -> Self {
        self.cached_query = None;
        self.start_key = Some(key.into());
        self
    }

    /// Range scan lower bound as raw JSON text
    pub fn raw_start_key(self, text: impl Into<String>) -> Self {
        self.start_key(Key::Raw(text.into()))
    }

    /// Document id tie-breaker for the lower bound (duplicate keys)
    pub fn start_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.cached_query = None;
        self.start_doc_id = Some(doc_id.into());
        self
    }

    /// Range scan upper bound
    pub fn end_key(mut self, key: impl Into<Key>) -> Self {
        self.cached_query = None;
        self.end_key = Some(key.into());
        self
    }

    /// Range scan upper bound as raw JSON text
    pub fn raw_end_key(self, text: impl Into<String>) -> Self {
        self.end_key(Key::Raw(text.into()))
    }

    /// Document id tie-breaker for the upper bound
    pub fn end_doc_id(mut self, doc_id: impl Into<String>) -> Self {
        self.cached_query = None;
        self.end_doc_id = Some(doc_id.into());
        self
    }

    /// Maximum number of rows returned
    pub fn limit(mut self, limit: usize) -> Self {
        self.cached_query = None;
        self.limit = Some(limit);
        self
    }

    /// Number of rows skipped before the first returned row
    pub fn skip(mut self, skip: usize) -> Self {
        self.cached_query = None;
        self.skip = Some(skip);
        self
    }

    /// View freshness mode; unset means strict
    pub fn stale(mut self, mode: StaleMode) -> Self {
        self.cached_query = None;
        self.stale = Some(mode);
        self
    }

    /// Reverse the scan direction
    pub fn descending(mut self, descending: bool) -> Self {
        self.cached_query = None;
        self.descending = descending;
        self
    }

    /// Whether the end key itself is included (server default: true)
    pub fn inclusive_end(mut self, inclusive: bool) -> Self {
        self.cached_query = None;
        self.inclusive_end = Some(inclusive);
        self
    }

    /// Group reduce results by key
    pub fn group(mut self, group: bool) -> Self {
        self.cached_query = None;
        self.group = group;
        self
    }

    /// Number of leading composite-key components to group by
    pub fn group_level(mut self, level: u32) -> Self {
        self.cached_query = None;
        self.group_level = Some(level);
        self
    }

    /// Whether the reduce step runs (server default: true when defined)
    pub fn reduce(mut self, reduce: bool) -> Self {
        self.cached_query = None;
        self.reduce = Some(reduce);
        self
    }

    /// Embed each row's document in the response
    pub fn include_docs(mut self, include: bool) -> Self {
        self.cached_query = None;
        self.include_docs = include;
        self
    }

    /// Include the index update sequence in the response
    pub fn update_seq(mut self, update_seq: bool) -> Self {
        self.cached_query = None;
        self.update_seq = update_seq;
        self
    }

    /// Mark the query eligible for a cached transport call
    pub fn cacheable(mut self, cacheable: bool) -> Self {
        self.cached_query = None;
        self.cacheable = cacheable;
        self
    }

    /// Skip rows whose error is `not_found` instead of failing
    pub fn ignore_not_found(mut self, ignore: bool) -> Self {
        self.cached_query = None;
        self.ignore_not_found = ignore;
        self
    }

    /// Append a passthrough parameter, preserved in insertion order
    pub fn param(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.cached_query = None;
        self.extra_params.push((name.into(), value.into()));
        self
    }

    /// Inject a cursor: resume bounds plus one extra row past the page
    ///
    /// The extra row is how the assembler learns whether a further page
    /// exists without a second round trip; it is trimmed before the page
    /// reaches the caller.
    pub fn paginate(mut self, page: &PageRequest) -> Self {
        if let Some(resume) = page.resume_key() {
            self = self
                .start_key(Key::Json(resume.key.clone()))
                .start_doc_id(resume.doc_id.clone());
        }
        self.limit(page.page_size() + 1)
    }

    // ========== Accessors ==========

    /// True when a multi-key set is configured
    pub fn has_multiple_keys(&self) -> bool {
        !self.keys.is_empty()
    }

    /// The multi-key set rendered as a JSON array, e.g. `["a","b"]`
    pub fn encoded_keys(&self) -> Option<String> {
        if self.keys.is_empty() {
            return None;
        }
        let mut out = String::from("[");
        for (i, key) in self.keys.iter().enumerate() {
            if i > 0 {
                out.push(',');
            }
            out.push_str(&key.to_json_text());
        }
        out.push(']');
        Some(out)
    }

    /// The multi-key set as a `{"keys":[...]}` request body
    pub fn keys_body(&self) -> Option<String> {
        self.encoded_keys()
            .map(|keys| format!("{{\"keys\":{keys}}}"))
    }

    /// Cache eligibility of this query
    pub fn is_cacheable(&self) -> bool {
        self.cacheable
    }

    /// Whether `not_found` rows are skipped during parsing
    pub fn ignores_not_found(&self) -> bool {
        self.ignore_not_found
    }

    // ========== Rendering ==========

    /// Request path for this query
    ///
    /// Fails with a configuration error when the database path, view
    /// name, or (for design-document views) design document id is unset.
    pub fn path(&self) -> Result<String> {
        let db = self
            .db_path
            .as_deref()
            .ok_or_else(|| Error::Configuration("database path not set".to_string()))?;
        let view = self
            .view_name
            .as_deref()
            .ok_or_else(|| Error::Configuration("view name not set".to_string()))?;

        if view == ALL_DOCS_VIEW {
            return Ok(format!("/{db}/{ALL_DOCS_VIEW}"));
        }
        let ddoc = self.design_doc_id.as_deref().ok_or_else(|| {
            Error::Configuration("design document id not set".to_string())
        })?;
        match self.list_name.as_deref() {
            Some(list) => Ok(format!("/{db}/{ddoc}/_list/{list}/{view}")),
            None => Ok(format!("/{db}/{ddoc}/_view/{view}")),
        }
    }

    /// Rendered, percent-encoded query string (without the multi-key set)
    ///
    /// The result is memoized; any setter invalidates it.
    pub fn query_string(&mut self) -> String {
        if let Some(cached) = &self.cached_query {
            return cached.clone();
        }
        let rendered = self.render_query();
        tracing::debug!(target: "futon::query", query = %rendered, "rendered view query");
        self.cached_query = Some(rendered.clone());
        rendered
    }

    fn render_query(&self) -> String {
        let mut params: Vec<(&str, String)> = Vec::new();

        // A multi-key set disables single-key and range parameters; the
        // set itself travels via the dispatch strategy (URL or body).
        if self.keys.is_empty() {
            if let Some(key) = &self.key {
                params.push(("key", key.to_json_text()));
            }
            if let Some(key) = &self.start_key {
                params.push(("startkey", key.to_json_text()));
            }
            if let Some(doc_id) = &self.start_doc_id {
                params.push(("startkey_docid", doc_id.clone()));
            }
            if let Some(key) = &self.end_key {
                params.push(("endkey", key.to_json_text()));
            }
            if let Some(doc_id) = &self.end_doc_id {
                params.push(("endkey_docid", doc_id.clone()));
            }
        }
        if let Some(limit) = self.limit {
            params.push(("limit", limit.to_string()));
        }
        if let Some(stale) = self.stale {
            params.push(("stale", stale.as_param().to_string()));
        }
        if self.descending {
            params.push(("descending", "true".to_string()));
        }
        if let Some(skip) = self.skip {
            params.push(("skip", skip.to_string()));
        }
        if self.group {
            params.push(("group", "true".to_string()));
        }
        if let Some(level) = self.group_level {
            params.push(("group_level", level.to_string()));
        }
        if self.reduce == Some(false) {
            params.push(("reduce", "false".to_string()));
        }
        if self.include_docs {
            params.push(("include_docs", "true".to_string()));
        }
        if self.inclusive_end == Some(false) {
            params.push(("inclusive_end", "false".to_string()));
        }
        if self.update_seq {
            params.push(("update_seq", "true".to_string()));
        }

        let mut out = String::new();
        for (name, value) in params {
            push_param(&mut out, name, &value);
        }
        for (name, value) in &self.extra_params {
            push_param(&mut out, name, value);
        }
        out
    }
}

pub(crate) fn push_param(out: &mut String, name: &str, value: &str) {
    if !out.is_empty() {
        out.push('&');
    }
    out.push_str(name);
    out.push('=');
    out.push_str(&utf8_percent_encode(value, QUERY_VALUE).to_string());
}
